//! End-to-end runs against real extended attributes.
//!
//! Every test returns early when the temporary filesystem does not support
//! user attributes.

use clap::Parser;
use hashstamp::cli::Cli;
use hashstamp::error::ExitCode;
use hashstamp::regen::NoopRegenerator;
use hashstamp::stamp::{Action, Stamper, StamperConfig};
use hashstamp::store::{AttributeStore, XattrStore, DEFAULT_ATTR_NAME};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const SHA256_X: &str = "4b68ab3847feda7d6c62c1fbcbeebfa35eab7351ed5e78f4ddadea5df64b8015";
const SHA256_Y: &str = "18f5384d58bcb1bba0bcd9e6a6781d1a6ac2cc280c330ecbab6cb7931b721552";

fn xattr_dir() -> Option<TempDir> {
    let dir = TempDir::new().unwrap();
    let scratch = dir.path().join(".xattr-check");
    fs::write(&scratch, b"").unwrap();
    let supported = xattr::set(&scratch, "user.hashstamp.check", b"1").is_ok();
    fs::remove_file(&scratch).unwrap();
    if supported {
        Some(dir)
    } else {
        eprintln!("skipping: user extended attributes unavailable");
        None
    }
}

fn stored(path: &Path) -> Option<String> {
    xattr::get(path, DEFAULT_ATTR_NAME)
        .unwrap()
        .map(|v| String::from_utf8(v).unwrap())
}

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["hashstamp"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_stamper_writes_ascii_hex_digest() {
    let Some(dir) = xattr_dir() else { return };
    let file = dir.path().join("mod.py");
    fs::write(&file, "X").unwrap();

    let stamper = Stamper::new(
        StamperConfig::default(),
        Arc::new(XattrStore::new()),
        Arc::new(NoopRegenerator),
    );
    let report = stamper.run(dir.path()).unwrap();

    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Added));
    assert_eq!(stored(&file).as_deref(), Some(SHA256_X));
    assert_eq!(fs::read(&file).unwrap(), b"X");
}

#[test]
fn test_update_replaces_attribute() {
    let Some(dir) = xattr_dir() else { return };
    let file = dir.path().join("mod.py");
    fs::write(&file, "X").unwrap();
    let stamper = Stamper::new(
        StamperConfig::default(),
        Arc::new(XattrStore::new()),
        Arc::new(NoopRegenerator),
    );

    stamper.run(dir.path()).unwrap();
    fs::write(&file, "Y").unwrap();
    let report = stamper.run(dir.path()).unwrap();

    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Updated));
    assert_eq!(stored(&file).as_deref(), Some(SHA256_Y));
}

#[test]
fn test_other_attributes_are_preserved() {
    let Some(dir) = xattr_dir() else { return };
    let file = dir.path().join("mod.py");
    fs::write(&file, "X").unwrap();
    xattr::set(&file, "user.unrelated", b"keep").unwrap();

    Stamper::new(
        StamperConfig::default(),
        Arc::new(XattrStore::new()),
        Arc::new(NoopRegenerator),
    )
    .run(dir.path())
    .unwrap();

    assert_eq!(
        xattr::get(&file, "user.unrelated").unwrap(),
        Some(b"keep".to_vec())
    );
}

#[test]
fn test_run_app_stamp_then_verify() {
    let _env = crate::env_lock();
    let Some(dir) = xattr_dir() else { return };
    let config = dir.path().join("hashstamp.toml");
    fs::write(&config, "").unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir(&tree).unwrap();
    let file = tree.join("a.py");
    fs::write(&file, "X").unwrap();

    let config = config.to_str().unwrap();
    let root = tree.to_str().unwrap();

    let code = hashstamp::run_app(cli(&["--config", config, "verify", root])).unwrap();
    assert_eq!(code, ExitCode::StaleFound);
    assert_eq!(stored(&file), None);

    let code = hashstamp::run_app(cli(&["--config", config, "stamp", root])).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(stored(&file).as_deref(), Some(SHA256_X));

    let code = hashstamp::run_app(cli(&["--config", config, "verify", root])).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
#[cfg(unix)]
fn test_run_app_failing_regen_cmd_keeps_old_digest() {
    let _env = crate::env_lock();
    let Some(dir) = xattr_dir() else { return };
    let config = dir.path().join("hashstamp.toml");
    fs::write(&config, "").unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir(&tree).unwrap();
    let file = tree.join("a.py");
    fs::write(&file, "X").unwrap();

    let config = config.to_str().unwrap();
    let root = tree.to_str().unwrap();

    hashstamp::run_app(cli(&["--config", config, "stamp", root, "--regen-cmd", "true"])).unwrap();
    fs::write(&file, "Y").unwrap();

    let code = hashstamp::run_app(cli(&[
        "--config",
        config,
        "stamp",
        root,
        "--regen-cmd",
        "false",
        "--strict",
    ]))
    .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
    assert_eq!(stored(&file).as_deref(), Some(SHA256_X));
}

#[test]
fn test_check_support_accepts_supported_directory() {
    let Some(dir) = xattr_dir() else { return };
    assert!(XattrStore::new()
        .check_support(dir.path(), DEFAULT_ATTR_NAME)
        .is_ok());
}

fn run_binary(args: &[&str]) -> std::process::Output {
    let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_hashstamp"));
    command.args(args).env_remove("RUST_LOG");
    for (key, _) in std::env::vars().filter(|(k, _)| k.starts_with("HASHSTAMP_")) {
        command.env_remove(key);
    }
    command.output().unwrap()
}

#[test]
fn test_verbose_idle_run_is_silent() {
    let Some(dir) = xattr_dir() else { return };
    let config = dir.path().join("hashstamp.toml");
    fs::write(&config, "").unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir(&tree).unwrap();
    fs::write(tree.join("a.py"), "X").unwrap();

    let config = config.to_str().unwrap();
    let root = tree.to_str().unwrap();

    let first = run_binary(&["--config", config, "-v", "stamp", root]);
    assert!(first.status.success());
    assert!(String::from_utf8_lossy(&first.stdout).contains("Adding digest to"));

    let second = run_binary(&["--config", config, "-v", "stamp", root]);
    assert!(second.status.success());
    assert_eq!(String::from_utf8_lossy(&second.stdout), "");
    assert_eq!(String::from_utf8_lossy(&second.stderr), "");
}
