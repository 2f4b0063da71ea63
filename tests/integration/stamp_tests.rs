use hashstamp::regen::{NoopRegenerator, RegenError, Regenerator};
use hashstamp::scanner::{HashAlgorithm, Hasher, WalkerConfig};
use hashstamp::stamp::{Action, SkipReason, Stamper, StamperConfig};
use hashstamp::store::{MemoryStore, DEFAULT_ATTR_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn src_config() -> StamperConfig {
    StamperConfig::default()
        .with_walker(WalkerConfig::default().with_suffixes(vec![".src".to_string()]))
}

fn hex(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    Hasher::new(algorithm).digest_bytes(data).as_bytes().to_vec()
}

/// Regenerator whose success can be toggled between runs.
struct Switchable {
    ok: AtomicBool,
    calls: Mutex<Vec<PathBuf>>,
}

impl Switchable {
    fn new(ok: bool) -> Self {
        Self {
            ok: AtomicBool::new(ok),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Regenerator for Switchable {
    fn regenerate(&self, path: &Path) -> Result<(), RegenError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        if self.ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RegenError::Failed {
                path: path.to_path_buf(),
                status: "exit status: 1".to_string(),
            })
        }
    }
}

#[test]
fn test_lifecycle_of_a_single_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.src");
    let store = Arc::new(MemoryStore::new());
    let regen = Arc::new(Switchable::new(true));
    let stamper = Stamper::new(src_config(), store.clone(), regen.clone());

    // Run 1: first encounter.
    fs::write(&file, "X").unwrap();
    let report = stamper.run(dir.path()).unwrap();
    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Added));
    assert_eq!(
        store.value(&file, DEFAULT_ATTR_NAME),
        Some(hex(HashAlgorithm::Sha256, b"X"))
    );

    // Run 2: content changed.
    fs::write(&file, "Y").unwrap();
    let report = stamper.run(dir.path()).unwrap();
    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Updated));
    assert_eq!(
        store.value(&file, DEFAULT_ATTR_NAME),
        Some(hex(HashAlgorithm::Sha256, b"Y"))
    );

    // Run 3: no edit, no regeneration.
    let calls_before = regen.calls.lock().unwrap().len();
    let report = stamper.run(dir.path()).unwrap();
    assert_eq!(report.transitions().count(), 0);
    assert_eq!(regen.calls.lock().unwrap().len(), calls_before);

    // Run 4: changed, but regeneration fails.
    fs::write(&file, "Z").unwrap();
    regen.ok.store(false, Ordering::SeqCst);
    let report = stamper.run(dir.path()).unwrap();
    assert!(matches!(
        report.file(&file).unwrap().skip_reason(),
        Some(SkipReason::Regenerate(_))
    ));
    assert_eq!(
        store.value(&file, DEFAULT_ATTR_NAME),
        Some(hex(HashAlgorithm::Sha256, b"Y"))
    );

    // Run 5: regeneration works again; the file is still stale.
    regen.ok.store(true, Ordering::SeqCst);
    let report = stamper.run(dir.path()).unwrap();
    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Updated));
    assert_eq!(
        store.value(&file, DEFAULT_ATTR_NAME),
        Some(hex(HashAlgorithm::Sha256, b"Z"))
    );
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("pkg")).unwrap();
    fs::write(dir.path().join("a.src"), "a").unwrap();
    fs::write(dir.path().join("pkg/b.src"), "b").unwrap();
    fs::write(dir.path().join("pkg/empty.src"), "").unwrap();

    let store = Arc::new(MemoryStore::new());
    let stamper = Stamper::new(src_config(), store.clone(), Arc::new(NoopRegenerator));

    let first = stamper.run(dir.path()).unwrap();
    assert_eq!(first.summary.added, 3);

    let second = stamper.run(dir.path()).unwrap();
    assert_eq!(second.summary.unchanged, 3);
    assert_eq!(second.summary.transitions(), 0);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_unselected_files_are_untouched() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.src"), "a").unwrap();
    fs::write(dir.path().join("notes.txt"), "n").unwrap();

    let store = Arc::new(MemoryStore::new());
    let report = Stamper::new(src_config(), store.clone(), Arc::new(NoopRegenerator))
        .run(dir.path())
        .unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(
        store.value(&dir.path().join("notes.txt"), DEFAULT_ATTR_NAME),
        None
    );
}

#[test]
fn test_switching_algorithm_restamps_once() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.src");
    fs::write(&file, "X").unwrap();
    let store = Arc::new(MemoryStore::new());

    Stamper::new(src_config(), store.clone(), Arc::new(NoopRegenerator))
        .run(dir.path())
        .unwrap();

    let blake = Stamper::new(
        src_config().with_algorithm(HashAlgorithm::Blake3),
        store.clone(),
        Arc::new(NoopRegenerator),
    );
    let report = blake.run(dir.path()).unwrap();
    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Updated));
    assert_eq!(
        store.value(&file, DEFAULT_ATTR_NAME),
        Some(hex(HashAlgorithm::Blake3, b"X"))
    );

    let report = blake.run(dir.path()).unwrap();
    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Unchanged));
}

#[test]
fn test_attribute_names_are_independent() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.src");
    fs::write(&file, "X").unwrap();
    let store = Arc::new(MemoryStore::new());

    Stamper::new(src_config(), store.clone(), Arc::new(NoopRegenerator))
        .run(dir.path())
        .unwrap();
    let report = Stamper::new(
        src_config().with_attr_name("user.other.digest"),
        store.clone(),
        Arc::new(NoopRegenerator),
    )
    .run(dir.path())
    .unwrap();

    assert_eq!(report.file(&file).unwrap().action(), Some(Action::Added));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_parallel_run_regenerates_each_file_once() {
    let dir = tempdir().unwrap();
    for i in 0..50 {
        fs::write(dir.path().join(format!("f{i:02}.src")), i.to_string()).unwrap();
    }
    let store = Arc::new(MemoryStore::new());
    let regen = Arc::new(Switchable::new(true));

    let report = Stamper::new(src_config().with_jobs(8), store.clone(), regen.clone())
        .run(dir.path())
        .unwrap();

    assert_eq!(report.summary.added, 50);
    let mut calls = regen.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 50);
    calls.sort();
    calls.dedup();
    assert_eq!(calls.len(), 50);
    assert_eq!(store.len(), 50);

    let names: Vec<_> = report
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_vanished_file_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.src"), "a").unwrap();
    let gone = dir.path().join("b.src");
    fs::write(&gone, "b").unwrap();

    // Delete b.src as soon as a.src is regenerated; its directory was already listed.
    let victim = gone.clone();
    let deleter = move |path: &Path| -> Result<(), RegenError> {
        if path.ends_with("a.src") {
            let _ = fs::remove_file(&victim);
        }
        Ok(())
    };
    let store = Arc::new(MemoryStore::new());
    let report = Stamper::new(src_config(), store.clone(), Arc::new(deleter))
        .run(dir.path())
        .unwrap();

    assert_eq!(report.summary.added, 1);
    if let Some(entry) = report.file(&gone) {
        assert!(matches!(
            entry.skip_reason(),
            Some(SkipReason::Read(_) | SkipReason::Walk(_))
        ));
    }
}
