use indoc::indoc;
use serde_json::Value;

use crate::common::{INSTA_FILTERS, TestContext};
use crate::reqcheck_snapshot;

const MANIFEST: &str = indoc! {r#"
    # Runtime dependencies
    numpy>=1.14,<1.20.0
    pandas

    # Linter
    flake8==3.5.0; python_version < "3.8"

    # Test
    pytest>=5.0
"#};

#[test]
fn list_grouped_by_category() {
    let context = TestContext::new();
    context.write("requirements.txt", MANIFEST);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().arg("list"), @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    Runtime dependencies (runtime):
      numpy>=1.14,<1.20.0
      pandas

    Linter (linter):
      flake8==3.5.0; python_version < "3.8"

    Test (test):
      pytest>=5.0
    ----- stderr -----
    "#);
}

#[test]
fn list_one_category() {
    let context = TestContext::new();
    context.write("requirements.txt", MANIFEST);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["list", "--category", "test"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    Test (test):
      pytest>=5.0
    ----- stderr -----
    ");
}

#[test]
fn list_unknown_category() {
    let context = TestContext::new();
    context.write("requirements.txt", MANIFEST);

    let output = context
        .command()
        .args(["list", "--category", "benchmarks"])
        .output()
        .expect("Failed to execute reqcheck");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn list_json() {
    let context = TestContext::new();
    context.write("requirements.txt", MANIFEST);

    let output = context
        .command()
        .args(["list", "--json"])
        .output()
        .expect("Failed to execute reqcheck");
    assert!(output.status.success());

    let listed: Value = serde_json::from_slice(&output.stdout).expect("invalid JSON");
    let listed = listed.as_array().expect("expected an array");
    assert_eq!(listed.len(), 4);

    assert_eq!(listed[0]["name"], "numpy");
    assert_eq!(listed[0]["specifiers"], ">=1.14,<1.20.0");
    assert_eq!(listed[0]["location"], "requirements.txt:2");
    assert_eq!(listed[0]["category"]["kind"], "runtime");
    assert_eq!(listed[0]["category"]["label"], "Runtime dependencies");

    assert_eq!(listed[2]["name"], "flake8");
    assert_eq!(listed[2]["marker"], r#"python_version < "3.8""#);
    assert_eq!(listed[2]["category"]["kind"], "linter");

    assert!(listed[1].get("marker").is_none());
}

#[test]
fn list_uncategorized() {
    let context = TestContext::new();
    context.write("requirements.txt", "Sphinx_RTD_Theme\n");

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().arg("list"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    uncategorized:
      Sphinx_RTD_Theme
    ----- stderr -----
    ");
}
