use std::fs;

use marknote::commands::FormatCommand;
use marknote::session::{NoteSession, SAMPLE_DOCUMENT, SessionOptions, UploadOutcome};
use marknote::storage::{FileStore, KeyValueStore};
use marknote::sync::SurfaceId;

fn options(key: &str) -> SessionOptions {
    SessionOptions {
        storage_key: key.to_string(),
        ..SessionOptions::default()
    }
}

#[test]
fn test_edits_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut session = NoteSession::open(FileStore::new(&path), options("note"));
    assert_eq!(session.document(), SAMPLE_DOCUMENT);
    session.editor_ref(Some(SurfaceId(1)));
    session.edit(|ed| {
        ed.select_all();
        ed.insert_str("saved text");
    });
    session.edit(|ed| ed.select_all());
    session.format(&FormatCommand::Italic);
    assert_eq!(session.document(), "_saved text_");
    drop(session);

    let reopened = NoteSession::open(FileStore::new(&path), options("note"));
    assert_eq!(reopened.document(), "_saved text_");
    assert!(reopened.html().contains("<em>saved text</em>"));
}

#[test]
fn test_slots_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut work = NoteSession::open(FileStore::new(&path), options("work"));
    work.editor_ref(Some(SurfaceId(1)));
    work.edit(|ed| {
        ed.select_all();
        ed.insert_str("work note");
    });

    let home = NoteSession::open(FileStore::new(&path), options("home"));
    assert_eq!(home.document(), SAMPLE_DOCUMENT);
    assert_eq!(
        FileStore::new(&path).get("work").unwrap().as_deref(),
        Some("work note")
    );
}

#[test]
fn test_corrupt_store_falls_back_to_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{not json").unwrap();

    let session = NoteSession::open(FileStore::new(&path), options("note"));
    assert_eq!(session.document(), SAMPLE_DOCUMENT);
}

#[test]
fn test_upload_then_download_round_trips_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.md");
    fs::write(&source, "# Imported\n\n- one\n- two\n").unwrap();
    let exports = dir.path().join("out");

    let mut session = NoteSession::open(FileStore::new(dir.path().join("s.json")), options("n"));
    session.editor_ref(Some(SurfaceId(1)));
    session.set_upload_dialog_visible(true);

    let outcome = session.handle_file_upload(&source).unwrap();
    assert_eq!(outcome, UploadOutcome::Loaded);
    assert!(!session.upload_dialog_visible());
    assert_eq!(session.editor().unwrap().text(), "# Imported\n\n- one\n- two\n");
    assert!(session.html().contains("<li>one</li>"));

    let download = session.handle_download(&exports).unwrap();
    assert_eq!(download.path, exports.join("markdown-note.md"));
    assert_eq!(download.mime, "text/markdown");
    assert_eq!(
        fs::read_to_string(&download.path).unwrap(),
        "# Imported\n\n- one\n- two\n"
    );
}

#[test]
fn test_preview_strips_unsafe_markup() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = NoteSession::open(FileStore::new(dir.path().join("s.json")), options("n"));
    session.editor_ref(Some(SurfaceId(1)));
    session.edit(|ed| {
        ed.select_all();
        ed.insert_str("<script>alert(1)</script>\n\n[x](javascript:alert(1)) <img src=x onerror=alert(1)>");
    });
    let html = session.html();
    assert!(!html.contains("<script"));
    assert!(!html.contains("href=\"javascript:"));
    assert!(!html.contains("onerror"));
    assert!(html.contains(">x</a>") || html.contains("<p>x"), "link text survives");
    assert!(session.document().contains("<script>"), "source is kept verbatim");
}
