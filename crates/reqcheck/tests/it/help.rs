use crate::common::{INSTA_FILTERS, reqcheck_command, reqcheck_help};
use crate::reqcheck_snapshot;

#[test]
fn help_shows_all_commands() {
    reqcheck_snapshot!(&INSTA_FILTERS, reqcheck_help(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    Check, list and pin Python requirements manifests.

    Usage: reqcheck [OPTIONS] <COMMAND>

    Commands:
      check      Check that every line parses and that no two requirements conflict
      list       List the requirements of a manifest, grouped by category
      satisfies  Report whether versions satisfy a requirement
      resolve    Pin every requirement to the highest version the index offers
      help       Print this message or the help of the given subcommand(s)

    Options:
      -v, --verbose...     Increase logging verbosity
      -q, --quiet...       Use quiet output. Repeat to also silence command results
          --config <PATH>  Read settings from this file instead of `reqcheck.toml`
      -h, --help           Print help
      -V, --version        Print version

    Use `reqcheck help <command>` for more information on a specific command.
    ----- stderr -----
    ");
}

#[test]
fn help_resolve() {
    let mut cmd = reqcheck_command();
    cmd.args(["help", "resolve"]);

    let output = cmd.output().expect("Failed to execute reqcheck");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Pin every requirement"));
    assert!(stdout.contains("--index-url <URL>"));
    assert!(stdout.contains("--index-file <PATH>"));
    assert!(stdout.contains("--prerelease <MODE>"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let output = reqcheck_command()
        .output()
        .expect("Failed to execute reqcheck");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: reqcheck"));
}

#[test]
fn index_url_conflicts_with_index_file() {
    let mut cmd = reqcheck_command();
    cmd.args([
        "resolve",
        "--index-url",
        "https://example.org/simple",
        "--index-file",
        "index.json",
    ]);

    let output = cmd.output().expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("cannot be used with"), "got: {stderr}");
}
