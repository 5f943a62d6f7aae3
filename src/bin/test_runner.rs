// Runs the YAML suites without going through the full CLI.
// Usage: cargo run --bin test_runner [suite dir] [name filter]

use std::{env, path::PathBuf};

use dl::{
    config::FrontendConfig,
    pipeline::print_error,
    test_harness::{run_suites, TestConfig},
};

fn main() {
    let mut args = env::args().skip(1);
    let root = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/suites"));
    let config = TestConfig {
        filter: args.next(),
        ..TestConfig::default()
    };
    match run_suites(&root, &config, &FrontendConfig::default()) {
        Ok(summary) if summary.failed == 0 => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            print_error(e);
            std::process::exit(1);
        }
    }
}
