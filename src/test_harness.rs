//! YAML test suites for the dl front end.
//!
//! Discovers YAML files under a directory, runs every case through the
//! parse → expand [`Pipeline`], and reports pass/fail/skip with colored
//! output.
//!
//! # Test Format
//!
//! ```yaml
//! - name: "vector of numbers"
//!   input: "[1, 2, 3]"
//!   expected_kinds: "num num num vector program"   # post-order kinds
//!   expected: "(program (vector 1 2 3))"          # pretty-printed tree
//! - name: "unterminated vector"
//!   input: "[1, 2"
//!   expect_error: "expected"                       # message substring
//!   expect_error_code: "dl::syntax"                # diagnostic code
//!   skip: false                                    # optional
//!   only: false                                    # optional
//!   config:                                        # optional overrides
//!     duplicate_macros: reject
//! ```
//!
//! `expected_kinds` and `expected` are both checked against the expanded
//! program. A case with neither only has to compile.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dl::{config::FrontendConfig, test_harness::{run_suites, TestConfig}};
//!
//! let summary = run_suites(Path::new("tests/suites"), &TestConfig::default(), &FrontendConfig::default()).unwrap();
//! if summary.failed > 0 {
//!     std::process::exit(1);
//! }
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::{
    config::FrontendConfig,
    diagnostics::DlError,
    pipeline::{CompilationUnit, Pipeline},
    traverse::post_order_names,
};

// =============================================================================
// CORE TYPES
// =============================================================================

/// Represents the result of executing a single test case.
#[derive(Debug, Clone)]
pub enum TestResult {
    Pass { file: String, name: String },
    Fail {
        file: String,
        name: String,
        error: String,
        /// Pretty-printed expanded program, when compilation got that far.
        expanded: Option<String>,
    },
    Skipped {
        file: String,
        name: String,
        reason: String,
    },
}

/// A single YAML test case.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub expected_kinds: Option<String>,
    pub expected: Option<String>,
    pub expect_error: Option<String>,
    pub expect_error_code: Option<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub only: bool,
    /// Replaces the suite-wide front-end configuration for this case.
    pub config: Option<FrontendConfig>,
}

/// Configuration for test execution and reporting.
pub struct TestConfig {
    /// Only run cases whose name contains this substring (case-insensitive).
    pub filter: Option<String>,
    pub use_colors: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            filter: None,
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

// Color constants for terminal output
const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

impl TestConfig {
    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

/// Counts over one run, plus every individual result.
#[derive(Debug, Default)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<TestResult>,
}

impl TestSummary {
    fn from_results(results: Vec<TestResult>) -> Self {
        let mut summary = TestSummary::default();
        for result in &results {
            match result {
                TestResult::Pass { .. } => summary.passed += 1,
                TestResult::Fail { .. } => summary.failed += 1,
                TestResult::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary.results = results;
        summary
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

// =============================================================================
// TEST DISCOVERY AND LOADING
// =============================================================================

/// Discovers all YAML files recursively under the given root directory,
/// in a stable order.
pub fn discover_yaml_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Load and parse test cases from a YAML file.
pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>, DlError> {
    let content = fs::read_to_string(path)
        .map_err(|e| DlError::io(format!("cannot read suite '{}'", path.display()), e))?;
    parse_test_cases(&content)
        .map_err(|e| DlError::config(format!("invalid suite '{}': {}", path.display(), e)))
}

/// Parses the text of one suite file.
pub fn parse_test_cases(content: &str) -> Result<Vec<TestCase>, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(content)
}

/// Helper for test skipping logic.
pub fn skip_reason(case: &TestCase, has_only: bool, filter: Option<&str>) -> Option<String> {
    if has_only && !case.only {
        return Some("Not marked 'only' in 'only' mode".to_string());
    }
    if case.skip {
        return Some("Marked 'skip'".to_string());
    }
    if let Some(f) = filter {
        if !case.name.to_lowercase().contains(&f.to_lowercase()) {
            return Some(format!("Filtered out by substring: {}", f));
        }
    }
    None
}

// =============================================================================
// TEST EXECUTION
// =============================================================================

/// Runs one case against `frontend`, unless the case carries its own config.
pub fn run_test_case(file: &str, case: &TestCase, frontend: &FrontendConfig) -> TestResult {
    let config = case.config.clone().unwrap_or_else(|| frontend.clone());
    let pipeline = Pipeline::new(config);
    debug!("running '{}' from {}", case.name, file);

    let outcome = match pipeline.compile_str(&case.name, &case.input) {
        Ok(unit) => check_unit(unit, case),
        Err(error) => check_error(&error, case),
    };

    match outcome {
        Ok(()) => TestResult::Pass {
            file: file.to_string(),
            name: case.name.clone(),
        },
        Err((error, expanded)) => TestResult::Fail {
            file: file.to_string(),
            name: case.name.clone(),
            error,
            expanded,
        },
    }
}

type Mismatch = (String, Option<String>);

fn expects_error(case: &TestCase) -> bool {
    case.expect_error.is_some() || case.expect_error_code.is_some()
}

fn check_unit(unit: CompilationUnit, case: &TestCase) -> Result<(), Mismatch> {
    let pretty = unit.expanded.pretty();

    if expects_error(case) {
        let wanted = case
            .expect_error_code
            .as_deref()
            .or(case.expect_error.as_deref())
            .unwrap_or_default();
        return Err((
            format!("Expected error '{}' but compilation succeeded", wanted),
            Some(pretty),
        ));
    }

    if let Some(expected) = case.expected_kinds.as_deref() {
        let actual = post_order_names(&unit.expanded);
        if normalize(expected) != normalize(&actual) {
            return Err((format_mismatch("Kinds", expected, &actual), Some(pretty)));
        }
    }

    if let Some(expected) = case.expected.as_deref() {
        if normalize(expected) != normalize(&pretty) {
            return Err((format_mismatch("Output", expected, &pretty), Some(pretty)));
        }
    }

    Ok(())
}

fn check_error(error: &DlError, case: &TestCase) -> Result<(), Mismatch> {
    let message = error.to_string();
    if !expects_error(case) {
        return Err((format!("[{}] {}", error.code_str(), message), None));
    }
    if let Some(code) = case.expect_error_code.as_deref() {
        if error.code_str() != code {
            return Err((
                format!(
                    "Expected error code '{}' but got '{}': {}",
                    code,
                    error.code_str(),
                    message
                ),
                None,
            ));
        }
    }
    if let Some(fragment) = case.expect_error.as_deref() {
        if !message.contains(fragment) {
            return Err((
                format!("Expected error containing '{}' but got: {}", fragment, message),
                None,
            ));
        }
    }
    Ok(())
}

/// Collapses runs of whitespace so suites can wrap long expectations.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_mismatch(what: &str, expected: &str, actual: &str) -> String {
    format!(
        "{} did not match expected\n  Expected: {}\n  Actual:   {}",
        what,
        normalize(expected),
        normalize(actual)
    )
}

// =============================================================================
// REPORTING AND OUTPUT
// =============================================================================

/// Print every result and the summary line.
pub fn report_results(summary: &TestSummary, config: &TestConfig) {
    for r in &summary.results {
        match r {
            TestResult::Pass { file, name } => {
                println!("{}: {} [{}]", config.colorize("PASS", GREEN), name, file)
            }
            TestResult::Fail { .. } => print_failure(r, config),
            TestResult::Skipped { file, name, reason } => {
                println!(
                    "{}: {} [{}] ({})",
                    config.colorize("SKIP", YELLOW),
                    name,
                    file,
                    reason
                )
            }
        }
    }

    println!(
        "\nTest summary: total {}, {} {}, {} {}, {} {}",
        summary.total(),
        config.colorize("passed", GREEN),
        summary.passed,
        config.colorize("failed", RED),
        summary.failed,
        config.colorize("skipped", YELLOW),
        summary.skipped,
    );

    if summary.failed > 0 {
        eprintln!("\nFailed tests:");
        for r in &summary.results {
            if let TestResult::Fail { name, .. } = r {
                eprintln!("  - {}", name);
            }
        }
    }
}

/// Print detailed failure information.
pub fn print_failure(r: &TestResult, config: &TestConfig) {
    if let TestResult::Fail {
        file,
        name,
        error,
        expanded,
    } = r
    {
        eprintln!("{}: {} [{}]", config.colorize("FAIL", RED), name, file);
        eprintln!("  Error: {}", error);
        if let Some(expanded) = expanded {
            eprintln!("  Expanded: {}", expanded);
        }
        if error.contains("did not match expected") {
            print_mismatch_diff(error, config);
        }
    }
}

/// Word-level diff between the expected and actual lines of a mismatch.
fn print_mismatch_diff(error: &str, config: &TestConfig) {
    let lines: Vec<_> = error.lines().collect();
    if lines.len() < 3 {
        return;
    }
    let expected = lines[1].trim().trim_start_matches("Expected:").trim();
    let actual = lines[2].trim().trim_start_matches("Actual:").trim();
    let changeset = difference::Changeset::new(expected, actual, " ");
    let mut rendered = Vec::new();
    for diff in &changeset.diffs {
        match diff {
            difference::Difference::Same(x) => rendered.push(x.clone()),
            difference::Difference::Add(x) => {
                rendered.push(config.colorize(&format!("+[{}]", x), GREEN))
            }
            difference::Difference::Rem(x) => {
                rendered.push(config.colorize(&format!("-[{}]", x), RED))
            }
        }
    }
    eprintln!("  Diff: {}", rendered.join(" "));
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Runs every suite under `root` and prints a report.
///
/// Fails only when `root` is missing or a suite file cannot be loaded;
/// failing cases are counted in the summary.
pub fn run_suites(
    root: &Path,
    config: &TestConfig,
    frontend: &FrontendConfig,
) -> Result<TestSummary, DlError> {
    let summary = collect_results(root, config, frontend)?;
    report_results(&summary, config);
    Ok(summary)
}

/// Like [`run_suites`], without printing.
pub fn collect_results(
    root: &Path,
    config: &TestConfig,
    frontend: &FrontendConfig,
) -> Result<TestSummary, DlError> {
    if !root.exists() {
        return Err(DlError::io(
            format!("cannot find suites under '{}'", root.display()),
            io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        ));
    }

    let mut all_cases = Vec::new();
    for file_path in discover_yaml_files(root) {
        let file_name = file_path.display().to_string();
        for case in load_test_cases(&file_path)? {
            all_cases.push((file_name.clone(), case));
        }
    }
    let has_only = all_cases.iter().any(|(_, case)| case.only);

    let results = all_cases
        .into_iter()
        .map(|(file, case)| {
            match skip_reason(&case, has_only, config.filter.as_deref()) {
                Some(reason) => TestResult::Skipped {
                    file,
                    name: case.name,
                    reason,
                },
                None => run_test_case(&file, &case, frontend),
            }
        })
        .collect();

    Ok(TestSummary::from_results(results))
}
