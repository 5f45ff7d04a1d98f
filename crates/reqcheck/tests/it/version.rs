use crate::common::reqcheck_command;

#[test]
fn version_flag_shows_version() {
    let mut cmd = reqcheck_command();
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute reqcheck");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert_eq!(
        stdout.trim(),
        concat!("reqcheck ", env!("CARGO_PKG_VERSION")),
        "Expected version string starting with 'reqcheck ', got: {stdout}"
    );
}

#[test]
fn short_version_flag_works() {
    let mut cmd = reqcheck_command();
    cmd.arg("-V");

    let output = cmd.output().expect("Failed to execute reqcheck");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.starts_with("reqcheck "),
        "Expected version string starting with 'reqcheck ', got: {stdout}"
    );
}
