/// Integration tests for the fragment loader
/// Covers error surfaces, strict parsing and the in-memory fragment source
use std::fs;
use std::path::Path;
use zapcfg::{ConfigError, ConfigLoader, MemoryFragmentSource, ZapConfiguration};

const SPIDER_FRAGMENT: &str = r#"
contexts:
  - name: shop
    url: http://shop.local/
spiders:
  - name: shop-spider
    context: shop
    maxDepth: 3
"#;

#[test]
fn test_missing_directory_is_an_error() {
    let result = ZapConfiguration::load("./tests/mocks/does-not-exist/", "http://shop.local/");
    match result {
        Err(ConfigError::MissingDirectory { path }) => {
            assert!(path.ends_with("does-not-exist"));
        }
        other => panic!("expected MissingDirectory, got {:?}", other),
    }
}

#[test]
fn test_empty_directory_yields_no_spider() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    fs::write(dir.path().join("notes.txt"), "not a fragment").unwrap();

    let config = ZapConfiguration::load(dir.path(), "http://shop.local/")
        .expect("empty directory is not an error");
    assert!(config.fragments().is_empty());
    assert!(config.contexts().is_empty());
    assert!(config.active_spider_config().is_none());
}

#[test]
fn test_malformed_fragment_fails_with_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.yaml"), SPIDER_FRAGMENT).unwrap();
    fs::write(dir.path().join("broken.yaml"), "contexts: [\n  - name: oops\n").unwrap();

    let result = ZapConfiguration::load(dir.path(), "http://shop.local/");
    match result {
        Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with("broken.yaml")),
        other => panic!("expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_scalar_fragment_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("scalar.yml"), "just a string").unwrap();

    let result = ZapConfiguration::load(dir.path(), "http://shop.local/");
    assert!(matches!(result, Err(ConfigError::NotAMapping { .. })));
}

#[test]
fn test_unknown_keys_fail_closed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("typo.yaml"),
        "spiders:\n  - name: s\n    maxDepht: 3\n",
    )
    .unwrap();

    let result = ZapConfiguration::load(dir.path(), "http://shop.local/");
    assert!(matches!(result, Err(ConfigError::Schema(_))));
}

#[test]
fn test_wrong_value_type_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("types.yaml"),
        "spiders:\n  - name: s\n    maxDepth: deep\n",
    )
    .unwrap();

    let result = ZapConfiguration::load(dir.path(), "http://shop.local/");
    assert!(matches!(result, Err(ConfigError::Schema(_))));
}

#[test]
fn test_invalid_scope_pattern_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("scope.yaml"),
        "contexts:\n  - name: shop\n    url: http://shop.local/\n    includePaths: [\"http://shop.local/(unclosed\"]\n",
    )
    .unwrap();

    let result = ZapConfiguration::load(dir.path(), "http://shop.local/");
    match result {
        Err(ConfigError::InvalidPattern { context, .. }) => assert_eq!(context, "shop"),
        other => panic!("expected InvalidPattern, got {:?}", other),
    }
}

#[test]
fn test_json_fragments_are_loaded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("spider.json"),
        r#"{"spiders": [{"name": "json-spider", "url": "http://shop.local/", "maxDuration": 2}]}"#,
    )
    .unwrap();

    let config = ZapConfiguration::load(dir.path(), "http://shop.local/products").unwrap();
    // No context declared, so the spider is matched by URL
    let spider = config.active_spider_config().expect("spider matched by url");
    assert_eq!(spider.name, "json-spider");
    assert_eq!(spider.max_duration, Some(2));
}

#[test]
fn test_memory_source_overlay_precedence() {
    let source = MemoryFragmentSource::new()
        .with_file("/cfg/base.yaml", SPIDER_FRAGMENT)
        .with_file(
            "/cfg/run-overlay.yaml",
            "spiders:\n  - name: shop-spider\n    maxDepth: 8\n    maxDuration: 4\n",
        )
        // Sorts after the overlay by name but is still a base fragment
        .with_file("/cfg/zz-base.yaml", "spiders:\n  - name: shop-spider\n    maxDepth: 1\n");

    let config = ConfigLoader::with_source(source)
        .load(Path::new("/cfg"), "http://shop.local/", None)
        .unwrap();

    let spider = config.active_spider_config().expect("spider present");
    assert_eq!(spider.max_depth, Some(8));
    assert_eq!(spider.max_duration, Some(4));
    assert_eq!(spider.context.as_deref(), Some("shop"));
}

#[test]
fn test_memory_source_without_spider() {
    let source = MemoryFragmentSource::new().with_file(
        "/cfg/context.yaml",
        "contexts:\n  - name: shop\n    url: http://shop.local/\n",
    );

    let config = ConfigLoader::with_source(source)
        .load("/cfg", "http://shop.local/", None)
        .unwrap();
    assert!(config.active_context_config().is_some());
    assert!(config.active_spider_config().is_none());
}

#[test]
fn test_environment_placeholders_are_expanded() {
    let source = MemoryFragmentSource::new().with_file(
        "/cfg/users.yaml",
        "contexts:\n  - name: shop\n    url: http://${SHOP_HOST}/\n    users:\n      - name: u\n        password: ${SHOP_PASSWORD}\n",
    );

    let config = ConfigLoader::with_source(source)
        .with_env_lookup(|name| match name {
            "SHOP_HOST" => Some("shop.local".to_string()),
            "SHOP_PASSWORD" => Some("s3cret".to_string()),
            _ => None,
        })
        .load("/cfg", "http://shop.local/", None)
        .unwrap();

    let context = config.active_context_config().expect("expanded url matches target");
    assert_eq!(context.url.as_deref(), Some("http://shop.local/"));
    assert_eq!(
        context.user_by_name("u").and_then(|u| u.password.as_deref()),
        Some("s3cret")
    );
}

#[test]
fn test_empty_fragment_file_is_ignored() {
    let source = MemoryFragmentSource::new()
        .with_file("/cfg/empty.yaml", "")
        .with_file("/cfg/spider.yaml", SPIDER_FRAGMENT);

    let config = ConfigLoader::with_source(source)
        .load("/cfg", "http://shop.local/", None)
        .unwrap();
    assert_eq!(config.fragments().len(), 2);
    assert!(config.active_spider_config().is_some());
}

#[cfg(unix)]
#[test]
fn test_symlinked_fragment_is_loaded() {
    // Mounted config maps expose every fragment as a symlink
    let store = tempfile::tempdir().unwrap();
    let mounted = tempfile::tempdir().unwrap();
    let real = store.path().join("scan.yaml");
    fs::write(&real, SPIDER_FRAGMENT).unwrap();
    std::os::unix::fs::symlink(&real, mounted.path().join("scan.yaml")).unwrap();

    let config = ZapConfiguration::load(mounted.path(), "http://shop.local/").unwrap();
    assert_eq!(config.fragments().len(), 1);
    let spider = config.active_spider_config().expect("symlinked spider should load");
    assert_eq!(spider.name, "shop-spider");
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("base.yaml"), SPIDER_FRAGMENT).unwrap();
    std::os::unix::fs::symlink(dir.path().join("gone.yaml"), dir.path().join("overlay.yaml"))
        .unwrap();

    let result = ZapConfiguration::load(dir.path(), "http://shop.local/");
    match result {
        Err(ConfigError::Io { path, .. }) => assert!(path.ends_with("overlay.yaml")),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_invalid_utf8_fragment_fails_with_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.yaml"), b"g: \xff\xfe\n").unwrap();

    let result = ZapConfiguration::load(dir.path(), "http://shop.local/");
    match result {
        Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with("bad.yaml")),
        other => panic!("expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_memory_invalid_utf8_fails_with_parse_error() {
    let source = MemoryFragmentSource::new()
        .with_file("/cfg/base.yaml", SPIDER_FRAGMENT)
        .with_bytes("/cfg/bad.yaml", b"g: \xff\xfe\n".to_vec());

    let result = ConfigLoader::with_source(source).load("/cfg", "http://shop.local/", None);
    match result {
        Err(ConfigError::Parse { path, .. }) => assert_eq!(path, Path::new("/cfg/bad.yaml")),
        other => panic!("expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_unreadable_fragment_fails_with_io_error() {
    let source = MemoryFragmentSource::new()
        .with_file("/cfg/base.yaml", SPIDER_FRAGMENT)
        .with_unreadable("/cfg/secret.yaml");

    let result = ConfigLoader::with_source(source).load("/cfg", "http://shop.local/", None);
    match result {
        Err(ConfigError::Io { path, source }) => {
            assert_eq!(path, Path::new("/cfg/secret.yaml"));
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_directory_with_only_nested_files_exists() {
    // Matches the filesystem source: fragments are not searched recursively
    let source = MemoryFragmentSource::new().with_file("/cfg/nested/scan.yaml", SPIDER_FRAGMENT);

    let config = ConfigLoader::with_source(source)
        .load("/cfg", "http://shop.local/", None)
        .expect("parent of nested files is a directory");
    assert!(config.fragments().is_empty());
    assert!(config.active_spider_config().is_none());
}
