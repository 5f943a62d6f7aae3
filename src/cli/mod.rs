//! The dl Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{path::Path, process};

use clap::Parser;

use crate::{
    cli::args::{Command, DlArgs},
    config::FrontendConfig,
    diagnostics::{DlError, SourceContext},
    pipeline::{print_error, CompilationUnit, Pipeline},
    test_harness::{run_suites, TestConfig},
    traverse::post_order_names,
};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = DlArgs::parse();
    output::init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => FrontendConfig::load(path).unwrap_or_else(|e| exit_with(e)),
        None => FrontendConfig::default(),
    };
    let pipeline = Pipeline::new(config);

    match args.command {
        Command::Ast { file, json } => {
            let source = read_file_or_exit(&file);
            let (program, _) = pipeline
                .parse_source(&source)
                .unwrap_or_else(|e| exit_with(e));
            if json {
                match serde_json::to_string_pretty(&program) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("cannot serialize tree: {e}");
                        process::exit(1);
                    }
                }
            } else {
                output::print_tree(&program);
            }
        }

        Command::Macroexpand { file, diff } => {
            let unit = compile_or_exit(&pipeline, &file);
            if diff {
                output::print_changes(
                    &output::render_tree(&unit.parsed),
                    &output::render_tree(&unit.expanded),
                );
            } else {
                output::print_tree(&unit.expanded);
            }
        }

        Command::Macrotrace { file } => {
            let unit = compile_or_exit(&pipeline, &file);
            output::print_trace(&unit.trace);
        }

        Command::Kinds { file } => {
            let unit = compile_or_exit(&pipeline, &file);
            println!("{}", post_order_names(&unit.expanded));
        }

        Command::ListMacros { file } => {
            let source = read_file_or_exit(&file);
            let (_, registry) = pipeline
                .parse_source(&source)
                .unwrap_or_else(|e| exit_with(e));
            output::print_macros(&registry);
        }

        Command::Test { path, filter } => {
            let test_config = TestConfig {
                filter,
                ..TestConfig::default()
            };
            let summary = run_suites(&path, &test_config, &pipeline.config)
                .unwrap_or_else(|e| exit_with(e));
            if summary.failed > 0 {
                process::exit(1);
            }
        }
    }
}

// ============================================================================
// CLI HELPERS
// ============================================================================

fn exit_with(error: DlError) -> ! {
    print_error(error);
    process::exit(1);
}

fn read_file_or_exit(path: &Path) -> SourceContext {
    Pipeline::read_file(path).unwrap_or_else(|e| exit_with(e))
}

fn compile_or_exit(pipeline: &Pipeline, path: &Path) -> CompilationUnit {
    let source = read_file_or_exit(path);
    pipeline.compile(&source).unwrap_or_else(|e| exit_with(e))
}
