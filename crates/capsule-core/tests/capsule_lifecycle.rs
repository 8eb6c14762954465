//! End-to-end capsule tests: create, gate, open, tamper.

use std::fs;
use std::path::{Path, PathBuf};

use capsule_core::{
    CapsuleError, CapsuleHeader, CapsuleKey, CreateRequest, OpenOutcome, Secret, TimeCapsule,
};
use chrono::NaiveDate;
use tempfile::TempDir;

fn date(day: u32, month: u32, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn today() -> NaiveDate {
    date(19, 10, 2026)
}

fn store(dir: &TempDir) -> TimeCapsule {
    TimeCapsule::new(dir.path().join("time_capsules"), CapsuleKey::generate()).expect("store")
}

fn request(title: &str, content: &str, unlock: &str, files: Vec<String>) -> CreateRequest {
    CreateRequest {
        title: title.to_string(),
        content: content.to_string(),
        unlock_date: unlock.to_string(),
        files,
    }
}

fn write_file(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    fs::create_dir_all(dir).expect("mkdir");
    let path = dir.join(name);
    fs::write(&path, body).expect("write");
    path
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn birthday_capsule_opens_after_unlock_date() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);

    let report = capsules
        .create_at(&request("bday", "Happy Birthday!", "31-12-2030", vec![]), today())
        .expect("create");
    assert!(report.path.ends_with("bday_31-12-2030.capsule"));
    assert!(report.attachments.is_empty());

    let outcome = capsules.open_at(&report.path, date(1, 1, 2031)).expect("open");
    match outcome {
        OpenOutcome::Opened {
            content,
            extracted_path,
            files,
            creation_date,
            ..
        } => {
            assert_eq!(content, "Happy Birthday!");
            assert!(extracted_path.ends_with("bday_extracted"));
            assert!(extracted_path.is_dir());
            assert!(files.is_empty());
            assert_eq!(creation_date, today());
        }
        other => panic!("expected opened capsule, got {other:?}"),
    }
}

#[test]
fn roundtrip_extracts_exactly_the_attachments() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let src = dir.path().join("src");
    let photo = write_file(&src, "photo.jpg", &[0xff, 0xd8, 0xff, 0x00, 0x42]);
    let letter = write_file(&src, "letter.txt", b"dear future me");

    let report = capsules
        .create_at(
            &request(
                "family",
                "See you in ten years",
                "01-01-2036",
                vec![
                    format!("  \"{}\" ", photo.display()),
                    format!(" {}", letter.display()),
                ],
            ),
            today(),
        )
        .expect("create");
    assert_eq!(report.attachments, vec!["letter.txt", "photo.jpg"]);
    assert!(report.skipped.is_empty());

    let outcome = capsules.open_at(&report.path, date(2, 1, 2036)).expect("open");
    let OpenOutcome::Opened {
        content,
        extracted_path,
        files,
        ..
    } = outcome
    else {
        panic!("capsule should be open");
    };
    assert_eq!(content, "See you in ten years");
    assert_eq!(files, vec!["letter.txt", "photo.jpg"]);
    assert_eq!(entries(&extracted_path), vec!["letter.txt", "photo.jpg"]);
    assert_eq!(
        fs::read(extracted_path.join("photo.jpg")).unwrap(),
        vec![0xff, 0xd8, 0xff, 0x00, 0x42]
    );
    assert_eq!(
        fs::read_to_string(extracted_path.join("letter.txt")).unwrap(),
        "dear future me"
    );
}

#[test]
fn only_the_capsule_survives_create() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let note = write_file(&dir.path().join("src"), "note.md", b"# hi");

    capsules
        .create_at(
            &request("tidy", "msg", "05-05-2030", vec![note.display().to_string()]),
            today(),
        )
        .expect("create");

    assert_eq!(entries(capsules.root()), vec!["tidy_05-05-2030.capsule"]);
}

#[test]
fn past_or_present_dates_are_rejected_without_artifacts() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);

    for unlock in ["19-10-2026", "18-10-2026", "01-01-1999"] {
        let err = capsules
            .create_at(&request("late", "too late", unlock, vec![]), today())
            .expect_err(unlock);
        assert!(
            matches!(err, CapsuleError::PastOrPresentDate { .. }),
            "{unlock}: {err:?}"
        );
    }
    assert!(entries(capsules.root()).is_empty());
}

#[test]
fn malformed_dates_are_rejected() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let err = capsules
        .create_at(&request("t", "m", "2030-12-31", vec![]), today())
        .expect_err("iso date");
    assert!(matches!(err, CapsuleError::InvalidDateFormat { .. }));
    assert!(err.is_validation());
}

#[test]
fn locked_capsule_reports_days_and_extracts_nothing() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let note = write_file(&dir.path().join("src"), "note.txt", b"secret");

    let report = capsules
        .create_at(
            &request("later", "not yet", "31-12-2030", vec![note.display().to_string()]),
            today(),
        )
        .expect("create");

    let outcome = capsules.open_at(&report.path, date(1, 12, 2030)).expect("open");
    assert_eq!(
        outcome,
        OpenOutcome::Locked {
            title: "later".to_string(),
            unlock_date: date(31, 12, 2030),
            days_remaining: 30,
        }
    );

    let outcome = capsules.open_at(&report.path, date(30, 12, 2030)).expect("open");
    assert!(matches!(
        outcome,
        OpenOutcome::Locked {
            days_remaining: 1,
            ..
        }
    ));

    assert_eq!(entries(capsules.root()), vec!["later_31-12-2030.capsule"]);
}

#[test]
fn opens_on_the_unlock_date_itself() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let report = capsules
        .create_at(&request("day", "today is the day", "20-10-2026", vec![]), today())
        .expect("create");
    let outcome = capsules.open_at(&report.path, date(20, 10, 2026)).expect("open");
    assert!(matches!(outcome, OpenOutcome::Opened { .. }));
}

#[test]
fn missing_capsule_is_an_outcome() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let missing = dir.path().join("nope.capsule");
    let outcome = capsules.open_at(&missing, today()).expect("not an error");
    assert_eq!(outcome, OpenOutcome::NotFound { path: missing });
    assert!(capsules.inspect(dir.path().join("nope.capsule")).unwrap().is_none());
}

#[test]
fn tampered_ciphertext_fails_decryption() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let report = capsules
        .create_at(&request("tamper", "original", "01-01-2030", vec![]), today())
        .expect("create");

    let mut bytes = fs::read(&report.path).unwrap();
    let last = bytes.len() - 1;
    bytes[CapsuleHeader::SIZE + 3] ^= 0x01;
    bytes[last] ^= 0x80;
    fs::write(&report.path, &bytes).unwrap();

    let err = capsules
        .open_at(&report.path, date(2, 1, 2030))
        .expect_err("tampered");
    assert!(matches!(err, CapsuleError::DecryptionFailed { .. }), "{err:?}");
    assert_eq!(entries(capsules.root()), vec!["tamper_01-01-2030.capsule"]);
}

#[test]
fn wrong_key_fails_decryption() {
    let dir = TempDir::new().expect("tmp");
    let root = dir.path().join("time_capsules");
    let creator = TimeCapsule::new(&root, CapsuleKey::generate()).expect("store");
    let report = creator
        .create_at(&request("keyed", "m", "01-01-2030", vec![]), today())
        .expect("create");

    let stranger = TimeCapsule::new(&root, CapsuleKey::generate()).expect("store");
    let err = stranger
        .open_at(&report.path, date(1, 1, 2031))
        .expect_err("wrong key");
    assert!(matches!(err, CapsuleError::DecryptionFailed { .. }));
}

#[test]
fn saved_key_opens_capsule_in_a_new_instance() {
    let dir = TempDir::new().expect("tmp");
    let root = dir.path().join("time_capsules");
    let key_path = root.join("capsule.key");

    let (key, created) = CapsuleKey::load_or_generate(&key_path).expect("key");
    assert!(created);
    let report = TimeCapsule::new(&root, key)
        .expect("store")
        .create_at(&request("restart", "survives restarts", "01-06-2027", vec![]), today())
        .expect("create");

    let (key, created) = CapsuleKey::load_or_generate(&key_path).expect("reload");
    assert!(!created);
    let outcome = TimeCapsule::new(&root, key)
        .expect("store")
        .open_at(&report.path, date(1, 6, 2027))
        .expect("open");
    assert!(matches!(outcome, OpenOutcome::Opened { content, .. } if content == "survives restarts"));
}

#[test]
fn passphrase_capsule_roundtrips() {
    let dir = TempDir::new().expect("tmp");
    let root = dir.path().join("time_capsules");
    let capsules = TimeCapsule::new(&root, Secret::passphrase("correct horse")).expect("store");
    let report = capsules
        .create_at(&request("pw", "stretched", "01-01-2028", vec![]), today())
        .expect("create");

    let summary = capsules
        .inspect_at(&report.path, today())
        .expect("inspect")
        .expect("present");
    assert_eq!(summary.sealed_with, "passphrase");

    let outcome = capsules.open_at(&report.path, date(1, 1, 2028)).expect("open");
    assert!(matches!(outcome, OpenOutcome::Opened { .. }));

    let keyed = TimeCapsule::new(&root, CapsuleKey::generate()).expect("store");
    let err = keyed
        .open_at(&report.path, date(1, 1, 2028))
        .expect_err("kind mismatch");
    assert!(matches!(err, CapsuleError::DecryptionFailed { .. }));
}

#[test]
fn missing_attachments_are_skipped_and_reported() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let real = write_file(&dir.path().join("src"), "real.txt", b"here");
    let ghost = dir.path().join("src").join("ghost.txt");

    let report = capsules
        .create_at(
            &request(
                "partial",
                "m",
                "01-01-2030",
                vec![
                    real.display().to_string(),
                    ghost.display().to_string(),
                    "   ".to_string(),
                ],
            ),
            today(),
        )
        .expect("create");
    assert_eq!(report.attachments, vec!["real.txt"]);
    assert_eq!(report.skipped, vec![ghost]);

    let OpenOutcome::Opened { extracted_path, .. } =
        capsules.open_at(&report.path, date(1, 1, 2030)).expect("open")
    else {
        panic!("capsule should be open");
    };
    assert_eq!(entries(&extracted_path), vec!["real.txt"]);
}

#[test]
fn strict_mode_fails_on_missing_attachment() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir).strict_attachments(true);
    let real = write_file(&dir.path().join("src"), "real.txt", b"here");
    let ghost = dir.path().join("src").join("ghost.txt");

    let err = capsules
        .create_at(
            &request(
                "strict",
                "m",
                "01-01-2030",
                vec![real.display().to_string(), ghost.display().to_string()],
            ),
            today(),
        )
        .expect_err("strict");
    assert!(matches!(err, CapsuleError::MissingAttachment { path } if path == ghost));
    assert!(entries(capsules.root()).is_empty());
}

#[test]
fn same_base_name_keeps_the_last_file() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let first = write_file(&dir.path().join("a"), "notes.txt", b"first");
    let second = write_file(&dir.path().join("b"), "notes.txt", b"second");

    let report = capsules
        .create_at(
            &request(
                "dupes",
                "m",
                "01-01-2030",
                vec![first.display().to_string(), second.display().to_string()],
            ),
            today(),
        )
        .expect("create");
    assert_eq!(report.attachments, vec!["notes.txt"]);

    let OpenOutcome::Opened { extracted_path, .. } =
        capsules.open_at(&report.path, date(1, 1, 2030)).expect("open")
    else {
        panic!("capsule should be open");
    };
    assert_eq!(
        fs::read_to_string(extracted_path.join("notes.txt")).unwrap(),
        "second"
    );
}

#[test]
fn reopening_uses_a_fresh_extraction_dir() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let report = capsules
        .create_at(&request("twice", "m", "01-01-2030", vec![]), today())
        .expect("create");

    let open = |n: &str| match capsules.open_at(&report.path, date(1, 1, 2030)).expect("open") {
        OpenOutcome::Opened { extracted_path, .. } => {
            assert!(extracted_path.ends_with(n), "{}", extracted_path.display());
        }
        other => panic!("unexpected {other:?}"),
    };
    open("twice_extracted");
    open("twice_extracted_2");
}

#[test]
fn existing_capsule_is_not_overwritten() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let req = request("once", "first", "01-01-2030", vec![]);
    let report = capsules.create_at(&req, today()).expect("create");
    let before = fs::read(&report.path).unwrap();

    let err = capsules.create_at(&req, today()).expect_err("exists");
    assert!(matches!(err, CapsuleError::CapsuleExists { .. }));
    assert_eq!(fs::read(&report.path).unwrap(), before);
}

#[test]
fn hostile_titles_stay_inside_the_root() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let report = capsules
        .create_at(&request("../../escape", "m", "01-01-2030", vec![]), today())
        .expect("create");
    assert_eq!(report.path.parent(), Some(capsules.root()));
    assert_eq!(report.title, "_.._escape");

    let err = capsules
        .create_at(&request("..", "m", "01-01-2030", vec![]), today())
        .expect_err("empty title");
    assert!(matches!(err, CapsuleError::InvalidTitle { .. }));
}

#[test]
fn inspect_reveals_dates_but_not_content() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let note = write_file(&dir.path().join("src"), "a.txt", b"a");
    let report = capsules
        .create_at(
            &request("peek", "hidden message", "29-10-2026", vec![note.display().to_string()]),
            today(),
        )
        .expect("create");

    let summary = capsules
        .inspect_at(&report.path, today())
        .expect("inspect")
        .expect("present");
    assert_eq!(summary.title, "peek");
    assert_eq!(summary.days_remaining, 10);
    assert_eq!(summary.attachment_count, 1);
    assert_eq!(summary.sealed_with, "key-file");
    assert_eq!(summary.unlock_date, date(29, 10, 2026));
    assert_eq!(entries(capsules.root()), vec!["peek_29-10-2026.capsule"]);
}

#[test]
fn list_finds_capsules_only() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    for (title, unlock) in [("b", "01-01-2030"), ("a", "02-02-2031")] {
        capsules
            .create_at(&request(title, "m", unlock, vec![]), today())
            .expect("create");
    }
    write_file(capsules.root(), "config.json", b"{}");

    let listed: Vec<String> = capsules
        .list()
        .expect("list")
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(listed, vec!["a_02-02-2031.capsule", "b_01-01-2030.capsule"]);
}

#[test]
fn every_header_byte_is_authenticated() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let report = capsules
        .create_at(&request("header", "original", "01-01-2030", vec![]), today())
        .expect("create");
    let sealed = fs::read(&report.path).expect("read");

    for index in 0..CapsuleHeader::SIZE {
        let mut bytes = sealed.clone();
        bytes[index] ^= 0xFF;
        fs::write(&report.path, &bytes).expect("write");
        let err = capsules
            .open_at(&report.path, date(2, 1, 2030))
            .expect_err("edited header");
        assert!(
            matches!(err, CapsuleError::DecryptionFailed { .. }),
            "byte {index}: {err:?}"
        );
    }
    assert_eq!(entries(capsules.root()), vec!["header_01-01-2030.capsule"]);
}

#[test]
fn truncated_capsule_fails_decryption() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let report = capsules
        .create_at(&request("short", "original", "01-01-2030", vec![]), today())
        .expect("create");
    let sealed = fs::read(&report.path).expect("read");

    for len in [40, CapsuleHeader::SIZE, sealed.len() - 1] {
        fs::write(&report.path, &sealed[..len]).expect("write");
        let err = capsules
            .open_at(&report.path, date(2, 1, 2030))
            .expect_err("truncated");
        assert!(matches!(err, CapsuleError::DecryptionFailed { .. }), "{len}: {err:?}");
    }
}

#[test]
fn non_capsule_file_cannot_be_decrypted() {
    let dir = TempDir::new().expect("tmp");
    let capsules = store(&dir);
    let bogus = write_file(capsules.root(), "bogus.capsule", b"PK\x03\x04 plain zip, not sealed");
    let err = capsules.open_at(&bogus, today()).expect_err("bogus");
    assert!(matches!(err, CapsuleError::DecryptionFailed { .. }), "{err:?}");
}
