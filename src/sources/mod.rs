pub mod fs;
pub mod memory;

pub use fs::OsFragmentSource;
pub use memory::MemoryFragmentSource;
