use hashstamp::regen::{NoopRegenerator, RegenError};
use hashstamp::scanner::{Walker, WalkerConfig};
use hashstamp::stamp::{Stamper, StamperConfig};
use hashstamp::store::MemoryStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn build_tree(root: &Path) {
    for dir in ["b", "a", "a/z", "a/y"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    for file in [
        "top2.py",
        "top1.py",
        "b/x.py",
        "a/m.pyc",
        "a/k.py",
        "a/z/deep.py",
        "a/y/deep.py",
        "ignored.txt",
    ] {
        fs::write(root.join(file), file).unwrap();
    }
}

fn relative(root: &Path, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

const EXPECTED: &[&str] = &[
    "top1.py",
    "top2.py",
    "a/k.py",
    "a/m.pyc",
    "a/y/deep.py",
    "a/z/deep.py",
    "b/x.py",
];

#[test]
fn test_walker_yields_files_before_subdirectories() {
    let dir = tempdir().unwrap();
    build_tree(dir.path());

    let walker = Walker::new(dir.path(), WalkerConfig::default());
    let paths: Vec<PathBuf> = walker.walk().map(|e| e.unwrap().path).collect();

    assert_eq!(relative(dir.path(), &paths), EXPECTED);
}

#[test]
fn test_regeneration_follows_walk_order() {
    let dir = tempdir().unwrap();
    build_tree(dir.path());
    let root = std::path::absolute(dir.path()).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let seen = Arc::clone(&seen);
        move |path: &Path| -> Result<(), RegenError> {
            seen.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    };
    Stamper::new(
        StamperConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(recorder),
    )
    .run(&root)
    .unwrap();

    assert_eq!(relative(&root, &seen.lock().unwrap()), EXPECTED);
}

#[test]
fn test_report_order_is_independent_of_jobs() {
    let dir = tempdir().unwrap();
    build_tree(dir.path());
    let root = std::path::absolute(dir.path()).unwrap();

    for jobs in [1, 2, 7] {
        let report = Stamper::new(
            StamperConfig::default().with_jobs(jobs),
            Arc::new(MemoryStore::new()),
            Arc::new(NoopRegenerator),
        )
        .run(&root)
        .unwrap();
        let paths: Vec<PathBuf> = report.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(relative(&root, &paths), EXPECTED, "jobs = {jobs}");
    }
}
