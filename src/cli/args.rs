//! Defines the command-line arguments and subcommands for the dl CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "dl",
    version,
    about = "Parse dl source files and expand their macros."
)]
pub struct DlArgs {
    /// YAML file with front-end settings (duplicate policy, expansion depth).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log more: -v for debug, -vv for parser traces.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the syntax tree of a file, before macro expansion.
    Ast {
        #[arg(required = true)]
        file: PathBuf,
        /// Emit JSON instead of an indented tree.
        #[arg(long)]
        json: bool,
    },
    /// Print the fully macro-expanded tree.
    Macroexpand {
        #[arg(required = true)]
        file: PathBuf,
        /// Show a diff against the unexpanded tree.
        #[arg(long)]
        diff: bool,
    },
    /// Show a stepwise macro expansion trace with diffs.
    Macrotrace {
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Print the post-order node kinds of the expanded program.
    Kinds {
        #[arg(required = true)]
        file: PathBuf,
    },
    /// List the macros a file defines.
    ListMacros {
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Discover and run all YAML test suites under a directory.
    Test {
        #[arg(default_value = "tests/suites")]
        path: PathBuf,
        /// Only run cases whose name contains this text.
        #[arg(long)]
        filter: Option<String>,
    },
}
