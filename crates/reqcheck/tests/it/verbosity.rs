use crate::common::TestContext;

#[test]
fn quiet_suppresses_summary() {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=1.14\n");

    let output = context
        .command()
        .args(["--quiet", "check"])
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(0));
    assert!(
        stderr.is_empty(),
        "Expected no output with --quiet, got: {stderr}"
    );
}

#[test]
fn quiet_keeps_results() {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=1.14\n");

    let output = context
        .command()
        .args(["-q", "list"])
        .output()
        .expect("Failed to execute reqcheck");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("numpy>=1.14"), "got: {stdout}");

    let output = context
        .command()
        .args(["-qq", "list"])
        .output()
        .expect("Failed to execute reqcheck");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn double_quiet_keeps_errors() {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=2\nnumpy<1\n");

    let output = context
        .command()
        .args(["-qq", "check"])
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr.contains("error: no version of `numpy`"), "got: {stderr}");
    assert!(!stderr.contains("warning:"), "got: {stderr}");
}

#[test]
fn verbose_emits_debug_logs() {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=1.14\n");

    let output = context
        .command()
        .args(["--verbose", "check"])
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(0));
    assert!(
        stderr.contains("Reading requirements from `requirements.txt`"),
        "Expected a debug trace with --verbose, got: {stderr}"
    );
}

#[test]
fn log_env_overrides_verbosity() {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=1.14\n");

    let output = context
        .command()
        .env("REQCHECK_LOG", "reqcheck_manifest=debug")
        .arg("check")
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.contains("Reading requirements"), "got: {stderr}");
}

#[test]
fn double_verbose_accepted() {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=1.14\n");

    let output = context
        .command()
        .args(["-vv", "check"])
        .output()
        .expect("Failed to execute reqcheck");

    assert_eq!(output.status.code(), Some(0));
}
