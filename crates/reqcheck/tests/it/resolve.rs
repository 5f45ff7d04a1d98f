use indoc::indoc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{INSTA_FILTERS, TestContext};
use crate::reqcheck_snapshot;

const INDEX: &str = r#"{
    "numpy": ["1.14.0", "1.19.5", "1.20.0rc1", "1.20.0"],
    "black": ["19.3b0", "19.10b0", "22.1.0"],
    "pytest": ["6.2.5", "7.0.0rc1"]
}"#;

const MANIFEST: &str = indoc! {"
    numpy>=1.14,<1.20.0

    # Formatter
    black==19.10b0

    # Test
    pytest
"};

#[test]
fn resolve_from_index_file() {
    let context = TestContext::new();
    context
        .write("requirements.txt", MANIFEST)
        .write("index.json", INDEX);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["resolve", "--index-file", "index.json"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    # Pinned by reqcheck from requirements.txt.

    numpy==1.19.5

    # Formatter
    black==19.10b0

    # Test
    pytest==6.2.5
    ----- stderr -----
    requirements.txt:4: info: `black==19.10b0` names a pre-release, so pre-releases of `black` are accepted
    ");
}

#[test]
fn resolve_allowing_prereleases() {
    let context = TestContext::new();
    context
        .write("requirements.txt", "pytest\n")
        .write("index.json", INDEX);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["resolve", "--index-file", "index.json", "--prerelease", "allow"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    # Pinned by reqcheck from requirements.txt.

    pytest==7.0.0rc1
    ----- stderr -----
    ");
}

#[test]
fn resolve_to_output_file() {
    let context = TestContext::new();
    context
        .write("requirements.txt", "numpy>=1.14,<1.20.0\n")
        .write("index.json", INDEX);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["resolve", "--index-file", "index.json", "-o", "pinned.txt"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    Pinned 1 package to `pinned.txt`
    ");

    let pinned = fs_err::read_to_string(context.path().join("pinned.txt")).unwrap();
    assert_eq!(
        pinned,
        "# Pinned by reqcheck from requirements.txt.\n\nnumpy==1.19.5\n"
    );
}

#[test]
fn resolve_keeps_markers() {
    let context = TestContext::new();
    context
        .write(
            "requirements.txt",
            indoc! {r#"
                numpy<1.20; python_version < "3.7"
                numpy>=1.20; python_version >= "3.7"
            "#},
        )
        .write("index.json", r#"{"numpy": ["1.19.5", "1.20.0"]}"#);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["resolve", "--index-file", "index.json"]), @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    # Pinned by reqcheck from requirements.txt.

    numpy==1.19.5; python_version < "3.7"
    numpy==1.20.0; python_version >= "3.7"
    ----- stderr -----
    "#);
}

#[test]
fn resolve_reports_every_failure() {
    let context = TestContext::new();
    context
        .write(
            "requirements.txt",
            indoc! {"
                numpy>=2.0
                not-on-the-index
                pytest>=6.3
            "},
        )
        .write("index.json", INDEX);

    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["resolve", "--index-file", "index.json", "--prerelease", "disallow"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    error: no version of `numpy` satisfies `>=2.0`
    error: `not-on-the-index` was not found in the index
    error: no version of `pytest` satisfies `>=6.3` (only pre-releases match; use `--prerelease allow`)
    error: failed to resolve 3 of 3 packages
    ");
}

#[test]
fn resolve_refuses_conflicting_manifest() {
    let context = TestContext::new();
    context
        .write("requirements.txt", "numpy>=1.20\nnumpy<1.14\n")
        .write("index.json", INDEX);

    let output = context
        .command()
        .args(["resolve", "--index-file", "index.json"])
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("cannot resolve `requirements.txt`: found 1 error"),
        "got: {stderr}"
    );
}

#[test]
fn resolve_index_file_from_settings() {
    let context = TestContext::new();
    context
        .write("requirements.txt", "numpy>=1.14,<1.20.0\n")
        .write("reqcheck.toml", "index-file = \"index.json\"\n")
        .write("index.json", INDEX);

    let output = context
        .command()
        .arg("resolve")
        .output()
        .expect("Failed to execute reqcheck");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("numpy==1.19.5"), "got: {stdout}");
}

#[tokio::test]
async fn resolve_from_simple_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/numpy/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"meta": {"api-version": "1.1"}, "name": "numpy", "files": [], "versions": ["1.19.5", "1.20.0"]}"#,
            "application/vnd.pypi.simple.v1+json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/simple/missing/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let context = TestContext::new();
    context.write("requirements.txt", "numpy<1.20\n");

    let index_url = format!("{}/simple", server.uri());
    reqcheck_snapshot!(&INSTA_FILTERS, context.command().args(["resolve", "--index-url", &index_url]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    # Pinned by reqcheck from requirements.txt.

    numpy==1.19.5
    ----- stderr -----
    ");

    // The environment variable stands in for the flag.
    context.write("requirements.txt", "missing\n");
    reqcheck_snapshot!(&INSTA_FILTERS, context.command().env("REQCHECK_INDEX_URL", &index_url).arg("resolve"), @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    error: `missing` was not found in the index
    error: failed to resolve 1 of 1 packages
    ");
}

#[test]
fn resolve_warns_about_extra_indexes() {
    let context = TestContext::new();
    context
        .write(
            "requirements.txt",
            "--extra-index-url https://mirror.example.org/simple\nnumpy<1.20\n",
        )
        .write("index.json", INDEX);

    let output = context
        .command()
        .args(["resolve", "--index-file", "index.json"])
        .output()
        .expect("Failed to execute reqcheck");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(
        stderr.contains(
            "warning: Ignoring `--extra-index-url https://mirror.example.org/simple`"
        ),
        "got: {stderr}"
    );
}
