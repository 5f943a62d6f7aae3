// Regression tests for the `dl` binary: output shape, exit codes and
// miette diagnostics on stderr.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

/// A source file in the temp dir, removed on drop.
struct Script(PathBuf);

impl Script {
    fn new(name: &str, content: &str) -> Self {
        let path = env::temp_dir().join(format!("dl_cli_{}_{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        Script(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Script {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn dl() -> Command {
    Command::cargo_bin("dl").unwrap()
}

#[test]
fn ast_prints_an_indented_tree() {
    let script = Script::new("vector.dl", "[1, 2]");
    dl().arg("ast")
        .arg(script.path())
        .assert()
        .success()
        .stdout("program\n  vector\n    num 1\n    num 2\n");
}

#[test]
fn ast_json_serializes_kinds_in_snake_case() {
    let script = Script::new("json.dl", "%m(x)");
    dl().args(["ast", "--json"])
        .arg(script.path())
        .assert()
        .success()
        .stdout(contains("\"kind\": \"program\"").and(contains("\"kind\": \"macro_apply\"")));
}

#[test]
fn kinds_prints_the_expanded_post_order() {
    let script = Script::new("kinds.dl", "macro twice (x) stop (x) [x, x] end twice(1)");
    dl().arg("kinds")
        .arg(script.path())
        .assert()
        .success()
        .stdout("num num vector program\n");
}

#[test]
fn macroexpand_prints_the_expanded_tree() {
    let script = Script::new("expand.dl", "macro neg (x) stop (x) -x end neg(3)");
    dl().arg("macroexpand")
        .arg(script.path())
        .assert()
        .success()
        .stdout("program\n  sub\n    num 3\n");
}

#[test]
fn list_macros_names_every_definition() {
    let script = Script::new(
        "list.dl",
        "macro b (x) stop (x) x end macro a (x y) halt (x y) x end",
    );
    dl().arg("list-macros")
        .arg(script.path())
        .assert()
        .success()
        .stdout(contains("a (x y) terminator 'halt'").and(contains("b (x) terminator 'stop'")));
}

#[test]
fn cli_reports_miette_diagnostics_on_syntax_error() {
    let script = Script::new("bad.dl", "[1, 2");
    dl().arg("ast")
        .arg(script.path())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("dl::syntax").and(contains("expected ']'")));
}

#[test]
fn cli_reports_macro_errors() {
    let script = Script::new("unknown.dl", "%nothing(1)");
    dl().arg("macroexpand")
        .arg(script.path())
        .assert()
        .failure()
        .stderr(contains("dl::macro::unknown"));
}

#[test]
fn missing_file_is_an_io_error() {
    dl().args(["ast", "no/such/file.dl"])
        .assert()
        .failure()
        .stderr(contains("dl::io"));
}

#[test]
fn config_file_selects_duplicate_policy() {
    let source = Script::new(
        "dup.dl",
        "macro m (x) stop (x) x end macro m (x) stop (x) x end",
    );
    dl().arg("kinds").arg(source.path()).assert().success();

    let config = Script::new("reject.yaml", "duplicate_macros: reject\n");
    dl().arg("--config")
        .arg(config.path())
        .arg("kinds")
        .arg(source.path())
        .assert()
        .failure()
        .stderr(contains("dl::macro::duplicate"));
}

#[test]
fn invalid_config_is_reported() {
    let source = Script::new("ok.dl", "1");
    let config = Script::new("typo.yaml", "duplicate_macro: reject\n");
    dl().arg("--config")
        .arg(config.path())
        .arg("ast")
        .arg(source.path())
        .assert()
        .failure()
        .stderr(contains("dl::config"));
}

#[test]
fn test_command_runs_the_bundled_suites() {
    let suites = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/suites");
    dl().arg("test")
        .arg(suites)
        .assert()
        .success()
        .stdout(contains("Test summary"));
}
