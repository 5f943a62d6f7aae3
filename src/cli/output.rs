//! Handles all user-facing output for the CLI.
//!
//! Tree rendering, colored diffs, the expansion trace and the stderr logger
//! live here so every command prints the same way.

use std::{convert::Infallible, fmt::Write as _, io::Write as _};

use difference::{Changeset, Difference};
use log::{Level, LevelFilter, Log, Metadata, Record};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    ast::{Ast, Kind},
    macros::{ExpansionStep, MacroRegistry},
    traverse::{inspect, Inspector},
};

/// Colors only when the stream is a terminal.
fn stdout_colors() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn stderr_colors() -> ColorChoice {
    if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

// ============================================================================
// TREE RENDERING
// ============================================================================

/// One line per node, indented two spaces per level.
#[derive(Default)]
struct TreePrinter {
    out: String,
}

impl Inspector for TreePrinter {
    type Error = Infallible;

    fn before_node(&mut self, node: &Ast, depth: usize) -> Result<(), Infallible> {
        let _ = write!(self.out, "{}{}", "  ".repeat(depth), node.kind());
        if let Some(text) = node.text() {
            let _ = match node.kind() {
                Kind::Str => write!(self.out, " {text:?}"),
                _ => write!(self.out, " {text}"),
            };
        }
        self.out.push('\n');
        Ok(())
    }
}

pub fn render_tree(ast: &Ast) -> String {
    let mut printer = TreePrinter::default();
    if let Err(never) = inspect(ast, &mut printer) {
        match never {}
    }
    printer.out
}

pub fn print_tree(ast: &Ast) {
    print!("{}", render_tree(ast));
}

// ============================================================================
// DIFFS AND TRACES
// ============================================================================

/// Prints a line diff between two renderings.
pub fn print_changes(before: &str, after: &str) {
    let mut stdout = StandardStream::stdout(stdout_colors());
    let changeset = Changeset::new(before, after, "\n");
    print_diff(&mut stdout, &changeset.diffs);
    let _ = stdout.reset();
}

/// Prints a macro expansion trace to the console with colored diffs.
pub fn print_trace(trace: &[ExpansionStep]) {
    let mut stdout = StandardStream::stdout(stdout_colors());
    if trace.is_empty() {
        println!("(no macro expansions)");
        return;
    }
    for (i, step) in trace.iter().enumerate() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(
            stdout,
            "--- Step {}: {} at {} (depth {}) ---",
            i,
            step.macro_name,
            step.input.span(),
            step.depth
        );
        let _ = stdout.reset();
        let changeset = Changeset::new(&render_tree(&step.input), &render_tree(&step.output), "\n");
        print_diff(&mut stdout, &changeset.diffs);
        let _ = stdout.reset();
        println!();
    }
}

pub fn print_macros(registry: &MacroRegistry) {
    let mut stdout = StandardStream::stdout(stdout_colors());
    for name in registry.names() {
        let Some(definition) = registry.get(name) else {
            continue;
        };
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = write!(stdout, "{name}");
        let _ = stdout.reset();
        let _ = writeln!(
            stdout,
            " ({}) terminator '{}', {} rule(s), defined at {}",
            definition.parameters().join(" "),
            definition.terminator(),
            definition.rules().len(),
            definition.span()
        );
    }
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(x) => {
                let _ = stdout.reset();
                let _ = writeln!(stdout, " {}", x.replace('\n', "\n "));
            }
            Difference::Add(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                let _ = writeln!(stdout, "+{}", x.replace('\n', "\n+"));
            }
            Difference::Rem(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                let _ = writeln!(stdout, "-{}", x.replace('\n', "\n-"));
            }
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Green,
            Level::Debug => Color::Cyan,
            Level::Trace => Color::Magenta,
        };
        let mut stderr = StandardStream::stderr(stderr_colors());
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stderr, "{:>5}", record.level());
        let _ = stderr.reset();
        let _ = writeln!(stderr, " {}: {}", record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Installs the stderr logger; `verbosity` is the number of `-v` flags.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_program;

    #[test]
    fn renders_indented_tree() {
        let (program, _) = parse_program("[1, \"a\"]").unwrap();
        assert_eq!(render_tree(&program), "program\n  vector\n    num 1\n    string \"a\"\n");
    }
}
