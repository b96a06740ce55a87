//! Pattern runner binary.
//!
//! Runs one of the bundled demos and prints its transcript.
//!
//! # Environment Variables
//!
//! - `RUST_LOG` — Tracing filter (default: "info,relay=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin pattern -- van:mediator
//! cargo run --bin pattern -- van:proxy:validation
//! cargo run --bin pattern -- van:observer relay.yaml
//! ```
//!
//! The optional second argument is a YAML [`RelayConfig`] file.

use anyhow::Context;
use relay::demos::{Demo, SelectorError};
use relay::RelayConfig;

fn print_usage() {
    eprintln!("Usage: pattern <type>:<pattern>[:<file>] [config.yaml]");
    eprintln!("Example: pattern van:proxy:validation");
    eprintln!("\nShorthand types:");
    eprintln!("  van  -> vanilla");
    eprintln!("\nAvailable demos:");
    for demo in Demo::all() {
        eprintln!("  - {demo}");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relay=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(selector) = args.next() else {
        print_usage();
        std::process::exit(1);
    };

    let demo = match Demo::from_selector(&selector) {
        Ok(demo) => demo,
        Err(err) => {
            eprintln!("Error: {err}");
            match &err {
                SelectorError::Malformed(_) => print_usage(),
                SelectorError::NotFound { available, .. } if available.is_empty() => {
                    eprintln!("  Pattern does not exist");
                }
                SelectorError::NotFound { available, .. } => {
                    eprintln!("\nAvailable files:");
                    for file in available {
                        eprintln!("  - {file}");
                    }
                }
            }
            std::process::exit(1);
        }
    };

    let config = match args.next() {
        Some(path) => RelayConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => RelayConfig::default(),
    };

    tracing::info!("Running: {}", demo);
    for line in demo.run(&config)? {
        println!("{line}");
    }
    Ok(())
}
