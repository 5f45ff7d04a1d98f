use indoc::indoc;

use crate::common::{INSTA_FILTERS, TestContext};
use crate::reqcheck_snapshot;

const CONFLICTING: &str = indoc! {"
    # Runtime dependencies
    numpy>=1.14,<1.20.0
    pandas

    # Test
    pytest>=5.0
    pytest<4
"};

#[test]
fn clean_manifest() {
    let context = TestContext::new();
    context.write(
        "requirements.txt",
        indoc! {"
            # Runtime dependencies
            numpy>=1.14,<1.20.0
            xlrd<2.0.0

            # Test
            pytest
        "},
    );

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().arg("check"), @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    Checked `requirements.txt`: 3 packages, 0 errors, 0 warnings
    ");
}

#[test]
fn conflicting_requirements() {
    let context = TestContext::new();
    context.write("requirements.txt", CONFLICTING);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["check", "requirements.txt"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    requirements.txt:6: error: no version of `pytest` satisfies `>=5.0,<4`: `pytest>=5.0` (requirements.txt:6) and `pytest<4` (requirements.txt:7)
      = also at requirements.txt:7
    requirements.txt:6: warning: `pytest` is declared 2 times
      = also at requirements.txt:7
    Checked `requirements.txt`: 3 packages, 1 error, 1 warning
    ");
}

#[test]
fn quiet_keeps_errors() {
    let context = TestContext::new();
    context.write("requirements.txt", CONFLICTING);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["--quiet", "check"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    requirements.txt:6: error: no version of `pytest` satisfies `>=5.0,<4`: `pytest>=5.0` (requirements.txt:6) and `pytest<4` (requirements.txt:7)
      = also at requirements.txt:7
    ");
}

#[test]
fn reports_every_bad_line() {
    let context = TestContext::new();
    context.write(
        "requirements.txt",
        indoc! {"
            numpy>=1.14
            pandas>=
            --no-such-option
            xlrd<2.0.0
        "},
    );

    let output = context
        .command()
        .arg("check")
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("requirements.txt:2: error:"), "got: {stderr}");
    assert!(stderr.contains("requirements.txt:3: error:"), "got: {stderr}");
    assert!(stderr.contains("2 packages, 2 errors, 0 warnings"), "got: {stderr}");
}

#[test]
fn strict_fails_on_warnings() {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=1.14\nnumpy<1.20.0\n");

    let output = context
        .command()
        .arg("check")
        .output()
        .expect("Failed to execute reqcheck");
    assert_eq!(output.status.code(), Some(0));

    let output = context
        .command()
        .args(["check", "--strict"])
        .output()
        .expect("Failed to execute reqcheck");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn post_release_bounds_without_a_version() {
    let context = TestContext::new();
    context.write("requirements.txt", "foo>1.0.post1,<1.0.post2\n");

    let output = context
        .command()
        .arg("check")
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("error: no version of `foo` satisfies `>1.0.post1,<1.0.post2`"),
        "got: {stderr}"
    );
}

#[test]
fn strict_from_settings_file() {
    let context = TestContext::new();
    context
        .write("requirements.txt", "numpy>=1.14\nnumpy<1.20.0\n")
        .write("reqcheck.toml", "strict = true\n");

    let output = context
        .command()
        .arg("check")
        .output()
        .expect("Failed to execute reqcheck");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn includes_are_followed() {
    let context = TestContext::new();
    context
        .write("requirements.txt", "numpy>=1.20\n")
        .write(
            "requirements-dev.txt",
            indoc! {"
                -r requirements.txt
                -c constraints.txt
                pytest
            "},
        )
        .write("constraints.txt", "numpy<1.14\n");

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().arg("check"), @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    constraints.txt:1: error: no version of `numpy` satisfies `>=1.20,<1.14`: `numpy>=1.20` (requirements.txt:1) and `numpy<1.14` (constraints.txt:1)
      = also at requirements.txt:1
    Checked `requirements-dev.txt`: 2 packages, 1 error, 0 warnings
    ");
}

#[test]
fn include_cycle_is_an_error() {
    let context = TestContext::new();
    context
        .write("requirements.txt", "-r requirements-dev.txt\nnumpy\n")
        .write("requirements-dev.txt", "-r requirements.txt\npytest\n");

    let output = context
        .command()
        .arg("check")
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("failed to load `requirements-dev.txt`"), "got: {stderr}");
    assert!(stderr.contains("Caused by"), "got: {stderr}");
}

#[test]
fn no_manifest_found() {
    let context = TestContext::new();

    let output = context
        .command()
        .env("REQCHECK_MAX_DEPTH", "0")
        .arg("check")
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("no `requirements-dev.txt` or `requirements.txt` in"), "got: {stderr}");
}
