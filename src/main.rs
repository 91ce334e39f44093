// Main CLI entry point for zapcfg
// Uses clap for argument parsing and tracing-subscriber for log output

use clap::{Arg, Command};
use std::path::Path;
use tracing_subscriber::EnvFilter;
use zapcfg::loader::ConfigLoader;
use zapcfg::reporting::{export_json, export_yaml, to_json, to_yaml};
use zapcfg::SpiderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Yaml,
}

fn parse_format(value: &str) -> Option<OutputFormat> {
    match value.to_ascii_lowercase().as_str() {
        "json" => Some(OutputFormat::Json),
        "yaml" | "yml" => Some(OutputFormat::Yaml),
        _ => None,
    }
}

/// RUST_LOG wins over --log-level when set
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let matches = Command::new("zapcfg")
        .version(clap::crate_version!())
        .author("Jake Abendroth")
        .about("Resolve layered ZAP scan configuration for a target")
        .after_help("EXAMPLES:\n  zapcfg --config-dir ./config/ --target http://juiceshop:3000/\n  zapcfg -c ./config/ -t https://example.io/ --context example-context --format yaml --export ./out/\n\nFragments (*.yaml, *.yml, *.json) are merged by file name; files whose name contains\n'overlay' are applied last. ${NAME} placeholders are read from the environment.")
        .arg(Arg::new("config_dir")
            .short('c')
            .long("config-dir")
            .required(true)
            .num_args(1)
            .help("Directory holding the configuration fragments"))
        .arg(Arg::new("target")
            .short('t')
            .long("target")
            .required(true)
            .num_args(1)
            .help("URL of the application to scan"))
        .arg(Arg::new("context")
            .long("context")
            .num_args(1)
            .help("Use this context instead of matching the target URL"))
        .arg(Arg::new("format")
            .short('f')
            .long("format")
            .num_args(1)
            .default_value("json")
            .help("Output format: json or yaml"))
        .arg(Arg::new("export")
            .short('o')
            .long("export")
            .num_args(1)
            .help("Also write the resolved configuration to a timestamped file in this directory"))
        .arg(Arg::new("log_level")
            .long("log-level")
            .num_args(1)
            .default_value("warn")
            .help("Log filter when RUST_LOG is unset"))
        .get_matches();

    let config_dir = matches.get_one::<String>("config_dir").expect("config_dir is required");
    let target = matches.get_one::<String>("target").expect("target is required");
    let forced_context = matches.get_one::<String>("context").map(|s| s.as_str());
    let log_level = matches.get_one::<String>("log_level").map(|s| s.as_str()).unwrap_or("warn");
    let format_arg = matches.get_one::<String>("format").map(|s| s.as_str()).unwrap_or("json");

    init_logging(log_level);

    let Some(format) = parse_format(format_arg) else {
        eprintln!("Unsupported output format: {}. Use json or yaml.", format_arg);
        std::process::exit(2);
    };

    let config = ConfigLoader::new()
        .load(config_dir, target, forced_context)
        .unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        });

    match config.active_spider_config() {
        Some(spider) => {
            let kind = match spider.kind() {
                SpiderKind::Ajax => "ajax",
                SpiderKind::Http => "http",
            };
            tracing::info!(spider = %spider.name, kind, "active spider configuration");
        }
        None => tracing::info!("no spider configured for target"),
    }

    let rendered = match format {
        OutputFormat::Json => to_json(&config),
        OutputFormat::Yaml => to_yaml(&config),
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    if let Some(out_dir) = matches.get_one::<String>("export") {
        let exported = match format {
            OutputFormat::Json => export_json(&config, Path::new(out_dir)),
            OutputFormat::Yaml => export_yaml(&config, Path::new(out_dir)),
        };
        match exported {
            Ok(path) => eprintln!("Wrote {}", path.display()),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }
}
