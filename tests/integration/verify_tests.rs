use hashstamp::regen::{NoopRegenerator, RegenError};
use hashstamp::scanner::WalkerConfig;
use hashstamp::stamp::{Action, RunMode, Stamper, StamperConfig};
use hashstamp::store::{MemoryStore, DEFAULT_ATTR_NAME};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn src_config() -> StamperConfig {
    StamperConfig::default()
        .with_walker(WalkerConfig::default().with_suffixes(vec![".src".to_string()]))
}

#[test]
fn test_verify_reports_without_side_effects() {
    let dir = tempdir().unwrap();
    let fresh = dir.path().join("fresh.src");
    let edited = dir.path().join("edited.src");
    let new = dir.path().join("new.src");
    fs::write(&fresh, "1").unwrap();
    fs::write(&edited, "2").unwrap();

    let store = Arc::new(MemoryStore::new());
    Stamper::new(src_config(), store.clone(), Arc::new(NoopRegenerator))
        .run(dir.path())
        .unwrap();

    fs::write(&edited, "2b").unwrap();
    fs::write(&new, "3").unwrap();
    let before_edited = store.value(&edited, DEFAULT_ATTR_NAME);

    let exploding = |path: &Path| -> Result<(), RegenError> {
        panic!("verify must not regenerate {}", path.display());
    };
    let report = Stamper::new(src_config(), store.clone(), Arc::new(exploding))
        .verify(dir.path())
        .unwrap();

    assert_eq!(report.mode, RunMode::Verify);
    assert_eq!(report.file(&fresh).unwrap().action(), Some(Action::Unchanged));
    assert_eq!(report.file(&edited).unwrap().action(), Some(Action::Updated));
    assert_eq!(report.file(&new).unwrap().action(), Some(Action::Added));
    assert_eq!(report.summary.transitions(), 2);

    assert_eq!(store.value(&edited, DEFAULT_ATTR_NAME), before_edited);
    assert_eq!(store.value(&new, DEFAULT_ATTR_NAME), None);
}

#[test]
fn test_verify_after_stamp_is_clean() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.src"), "a").unwrap();
    let store = Arc::new(MemoryStore::new());
    let stamper = Stamper::new(src_config(), store, Arc::new(NoopRegenerator));

    stamper.run(dir.path()).unwrap();
    let report = stamper.verify(dir.path()).unwrap();

    assert_eq!(report.summary.transitions(), 0);
    assert_eq!(report.summary.unchanged, 1);
}

#[test]
fn test_verify_records_digest() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.src");
    fs::write(&file, "abc").unwrap();

    let report = Stamper::new(
        src_config(),
        Arc::new(MemoryStore::new()),
        Arc::new(NoopRegenerator),
    )
    .verify(dir.path())
    .unwrap();

    assert_eq!(
        report.file(&file).unwrap().digest.as_deref(),
        Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
}
