//! End-to-end tests of the dirsort binary.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// A dirsort command isolated from any user configuration.
fn dirsort(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dirsort"));
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .current_dir(home)
        .stdin(std::process::Stdio::null());
    cmd
}

fn populate(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), "dummy content").unwrap();
    }
}

#[test]
fn simulate_logs_plan_and_moves_nothing() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("downloads");
    populate(&target, &["photo.jpg", "report.pdf"]);

    dirsort(home.path())
        .arg(&target)
        .arg("--simulate")
        .arg("--no-log-file")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[SIMULATE] Move 'photo.jpg' to 'Images/'",
        ))
        .stdout(predicate::str::contains(
            "[SIMULATE] Move 'report.pdf' to 'Documents/'",
        ))
        .stdout(predicate::str::contains("Images: 1"));

    assert!(target.join("photo.jpg").is_file());
    assert!(target.join("report.pdf").is_file());
    assert!(!target.join("Images").exists());
}

#[test]
fn organizes_and_writes_log_file() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("downloads");
    populate(
        &target,
        &["photo.jpg", "report.pdf", "clip.mp4", "mystery.xyz", "main.py"],
    );
    let log_path = home.path().join("logs").join("run.log");

    dirsort(home.path())
        .arg(&target)
        .arg("--log-file")
        .arg(&log_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved 'main.py' to 'Code/'"));

    for rel in [
        "Images/photo.jpg",
        "Documents/report.pdf",
        "Videos/clip.mp4",
        "Others/mystery.xyz",
        "Code/main.py",
    ] {
        assert!(target.join(rel).is_file(), "{rel} should exist");
    }

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("INFO"));
    assert!(log.contains("Moved 'photo.jpg' to 'Images/'"));
    assert!(log.contains("Summary of moved files:"));
    assert!(log.contains("Videos: 1"));
}

#[test]
fn log_file_is_appended_across_runs() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("downloads");
    let log_path = home.path().join("dirsort.log");

    populate(&target, &["a.jpg"]);
    dirsort(home.path()).arg(&target).assert().success();
    populate(&target, &["b.pdf"]);
    dirsort(home.path()).arg(&target).assert().success();

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Moved 'a.jpg' to 'Images/'"));
    assert!(log.contains("Moved 'b.pdf' to 'Documents/'"));
}

#[test]
fn active_log_file_inside_target_stays_put() {
    let home = TempDir::new().unwrap();
    populate(home.path(), &["notes.txt"]);

    // Default log file is ./dirsort.log, which is inside the target here.
    dirsort(home.path())
        .arg(".")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping 'dirsort.log'"));

    assert!(home.path().join("dirsort.log").is_file());
    assert!(home.path().join("Documents/notes.txt").is_file());
    assert!(!home.path().join("Others").exists());
}

#[test]
fn empty_directory_reports_no_files() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("empty");
    fs::create_dir(&target).unwrap();

    dirsort(home.path())
        .arg(&target)
        .arg("--no-log-file")
        .assert()
        .success()
        .stdout(predicate::str::contains("No files were found to organize."));

    assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
}

#[test]
fn invalid_directory_is_rejected() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("does-not-exist");

    dirsort(home.path())
        .arg(&missing)
        .arg("--no-log-file")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("is not an existing directory"));
}

#[test]
fn file_as_target_is_rejected() {
    let home = TempDir::new().unwrap();
    populate(home.path(), &["file.txt"]);

    dirsort(home.path())
        .arg(home.path().join("file.txt"))
        .arg("--no-log-file")
        .assert()
        .failure()
        .stdout(predicate::str::contains("is not an existing directory"));

    assert!(home.path().join("file.txt").is_file());
}

#[test]
fn local_config_filters_files() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("downloads");
    populate(&target, &["movie.mkv", "movie.mkv.part"]);
    fs::write(
        home.path().join(".dirsortrc.toml"),
        "[logging]\nfile = \"\"\n\n[filters.exclude]\nextensions = [\"part\"]\n",
    )
    .unwrap();

    dirsort(home.path())
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping 'movie.mkv.part'"));

    assert!(target.join("Videos/movie.mkv").is_file());
    assert!(target.join("movie.mkv.part").is_file());
    assert!(!home.path().join("dirsort.log").exists());
}

#[test]
fn broken_config_exits_with_setup_failure() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    fs::write(&config, "[logging\n").unwrap();

    dirsort(home.path())
        .arg(home.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error loading configuration"));
}

#[test]
fn json_logs_are_structured() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("downloads");
    populate(&target, &["song.mp3"]);

    dirsort(home.path())
        .arg(&target)
        .arg("--json")
        .arg("--no-log-file")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"level\":\"INFO\""))
        .stdout(predicate::str::contains("Moved 'song.mp3' to 'Audio/'"));
}

#[test]
fn missing_path_without_terminal_fails() {
    let home = TempDir::new().unwrap();

    dirsort(home.path())
        .arg("--no-log-file")
        .assert()
        .failure()
        .code(1);
}
