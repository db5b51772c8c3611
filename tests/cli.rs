//! End-to-end tests of the `app_packager` binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn packager(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("app_packager").unwrap();
    cmd.current_dir(dir);
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn params_lists_bundler_parameters() {
    let dir = tempfile::tempdir().unwrap();
    packager(dir.path())
        .args(["params", "deb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bundler Parameters for Linux DEB Installer (deb) --"))
        .stdout(predicate::str::contains("linux.bundleName - "));
}

#[test]
fn unknown_bundler_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    packager(dir.path())
        .args(["params", "msi"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No bundler matching the id msi was found"));
}

#[test]
fn missing_srcdir_fails() {
    let dir = tempfile::tempdir().unwrap();
    packager(dir.path())
        .args(["deploy", "--outdir", "out", "--native", "image", "--srcdir", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"--srcdir\" is not a directory"));
}

#[test]
fn deploy_without_native_builds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    packager(dir.path())
        .args(["deploy", "--outdir", "out", "--appclass", "a.B"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No bundles requested"));
    assert!(!dir.path().join("out").exists());
}

#[cfg(target_os = "linux")]
#[test]
fn bundlers_lists_linux_image() {
    let dir = tempfile::tempdir().unwrap();
    packager(dir.path())
        .args(["bundlers", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linux.app - Linux Application Image - IMAGE"))
        .stdout(predicate::str::contains("mac.app").not())
        .stdout(predicate::str::contains("exe -").not());
}

#[cfg(target_os = "linux")]
#[test]
fn deploy_builds_linux_image() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");
    std::fs::create_dir_all(&dist).unwrap();
    std::fs::write(dist.join("hello.jar"), b"jar").unwrap();

    packager(dir.path())
        .args([
            "deploy",
            "--outdir",
            "out",
            "--native",
            "image",
            "--name",
            "Hello",
            "--appclass",
            "com.example.Hello",
            "--srcdir",
            "dist",
            "--report",
            "report.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("linux.app"));

    let image = dir.path().join("out/Hello");
    assert!(image.join("Hello").is_file());
    assert!(image.join("app/hello.jar").is_file());
    assert!(image.join("app/Hello.cfg").is_file());

    let report = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    assert!(report.contains("\"bundler\": \"linux.app\""));
}
