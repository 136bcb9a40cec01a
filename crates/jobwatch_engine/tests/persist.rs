use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use jobwatch_engine::{ensure_dir, write_atomically, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_target_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("exports");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("j1.xlsx", b"PK\x03\x04first").unwrap();
    assert_eq!(first.file_name().unwrap(), "j1.xlsx");
    assert_eq!(fs::read(&first).unwrap(), b"PK\x03\x04first");

    let second = writer.write("j1.xlsx", b"PK\x03\x04second").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"PK\x03\x04second");
}

#[test]
fn no_partial_file_when_dir_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("state.ron", b"()").is_err());
    assert!(!file_path.with_file_name("state.ron").exists());
}

#[test]
fn write_atomically_creates_parent_dirs() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested").join("state.ron");

    let written = write_atomically(&target, b"(theme: \"dark\")").unwrap();
    assert_eq!(written, target);
    assert_eq!(fs::read_to_string(&target).unwrap(), "(theme: \"dark\")");
}

#[test]
fn readers_always_find_a_complete_file_while_it_is_rewritten() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("state.ron");
    let first = b"(last_job_id: Some(\"j1\"))".to_vec();
    let second = b"(last_job_id: Some(\"j2\"), theme: Some(\"light\"))".to_vec();
    write_atomically(&target, &first).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let target = target.clone();
        let done = done.clone();
        let (first, second) = (first.clone(), second.clone());
        thread::spawn(move || {
            let mut reads = 0;
            loop {
                let content = fs::read(&target).expect("state file vanished during rewrite");
                assert!(content == first || content == second);
                reads += 1;
                if done.load(Ordering::SeqCst) {
                    return reads;
                }
            }
        })
    };

    for round in 0..200 {
        let content = if round % 2 == 0 { &second } else { &first };
        write_atomically(&target, content).unwrap();
    }
    done.store(true, Ordering::SeqCst);
    assert!(reader.join().unwrap() > 0);

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| {
            entry
                .unwrap()
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(names, vec!["state.ron".to_string()]);
}
