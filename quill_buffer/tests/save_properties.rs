use std::fs;
use std::path::Path;

use quill_buffer::{Buffer, LARGE_FILE_THRESHOLD, Loc, SaveContext, SaveError};
use quill_config::BufferSettings;
use quill_fs::{Encoding, LineEnding, read_lines};

fn plain() -> BufferSettings {
    BufferSettings {
        eofnewline: false,
        ..BufferSettings::default()
    }
}

fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn test_scratch_buffers_touch_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("scratch.txt");
    let ctx = SaveContext::default();
    let mut buffer = Buffer::scratch(BufferSettings::default());
    buffer.insert(Loc::new(0, 0), "do not persist");

    assert!(matches!(buffer.save(&ctx), Err(SaveError::Scratch)));
    assert!(matches!(buffer.save_as(&ctx, &dest), Err(SaveError::Scratch)));
    assert!(matches!(buffer.save_with_sudo(&ctx), Err(SaveError::Scratch)));
    assert!(matches!(buffer.save_as_with_sudo(&ctx, &dest), Err(SaveError::Scratch)));
    assert!(dir_is_empty(dir.path()));
}

#[test]
fn test_unix_and_dos_serialization() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = SaveContext::default();

    let mut buffer = Buffer::from_bytes(b"one\ntwo\nthree", plain());
    buffer.save_as(&ctx, dir.path().join("unix.txt")).unwrap();
    assert_eq!(fs::read(dir.path().join("unix.txt")).unwrap(), b"one\ntwo\nthree");

    buffer.line_ending = LineEnding::Dos;
    buffer.save_as(&ctx, dir.path().join("dos.txt")).unwrap();
    assert_eq!(fs::read(dir.path().join("dos.txt")).unwrap(), b"one\r\ntwo\r\nthree");
}

#[test]
fn test_single_line_has_no_terminator() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("one.txt");
    let mut buffer = Buffer::from_bytes(b"lonely", plain());
    buffer.line_ending = LineEnding::Dos;

    buffer.save_as(&SaveContext::default(), &dest).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"lonely");
}

#[test]
fn test_round_trip_through_read_path() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("round.txt");
    let text = "first \u{00E9}t\u{00E9}\n\tsecond\n\nlast \u{1F980}";
    let mut buffer = Buffer::from_bytes(text.as_bytes(), plain());

    buffer.save_as(&SaveContext::default(), &dest).unwrap();
    let loaded = read_lines(&dest, Encoding::Utf8).unwrap();

    let saved: Vec<&[u8]> = buffer.lines().collect();
    let reloaded: Vec<&[u8]> = loaded.lines.iter().map(Vec::as_slice).collect();
    assert_eq!(saved, reloaded);
    assert_eq!(loaded.line_ending, LineEnding::Unix);
}

#[test]
fn test_saving_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("twice.txt");
    let ctx = SaveContext::default();
    let mut buffer = Buffer::from_bytes(b"keep  \nthis", BufferSettings {
        rmtrailingws: true,
        ..BufferSettings::default()
    });

    buffer.save_as(&ctx, &dest).unwrap();
    let first = fs::read(&dest).unwrap();
    buffer.save(&ctx).unwrap();
    let second = fs::read(&dest).unwrap();

    assert_eq!(first, b"keep\nthis\n");
    assert_eq!(first, second);
}

/// Grow a small buffer to `size` serialized bytes so it starts out hashed
fn buffer_of_size(size: u64) -> Buffer {
    let mut buffer = Buffer::from_bytes(b"x", plain());
    let fill = "y".repeat(size as usize - 1);
    buffer.insert(Loc::new(1, 0), &fill);
    assert_eq!(buffer.byte_len(), size);
    buffer
}

#[test]
fn test_threshold_exact_size_keeps_hash() {
    let dir = tempfile::tempdir().unwrap();
    let mut buffer = buffer_of_size(LARGE_FILE_THRESHOLD);

    let outcome = buffer.save_as(&SaveContext::default(), dir.path().join("edge.txt")).unwrap();

    assert_eq!(outcome.bytes_written, LARGE_FILE_THRESHOLD);
    assert!(!outcome.fast_dirty_engaged);
    assert!(!buffer.settings.fastdirty);
    assert!(buffer.orig_hash().is_some());
    assert!(!buffer.modified());
}

#[test]
fn test_threshold_one_byte_over_engages_fast_dirty() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("big.txt");
    let mut buffer = buffer_of_size(LARGE_FILE_THRESHOLD + 1);

    let outcome = buffer.save_as(&SaveContext::default(), &dest).unwrap();

    assert!(outcome.fast_dirty_engaged);
    assert!(buffer.settings.fastdirty);
    assert!(buffer.orig_hash().is_none());
    assert!(!buffer.modified());

    // Stays on after the content shrinks again
    buffer.remove(Loc::new(0, 0), buffer.end());
    let outcome = buffer.save(&SaveContext::default()).unwrap();
    assert!(!outcome.fast_dirty_engaged);
    assert!(buffer.settings.fastdirty);
    assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
}

#[test]
fn test_eofnewline_appends_once() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("eof.txt");
    let ctx = SaveContext::default();
    let mut buffer = Buffer::from_bytes(b"no newline", BufferSettings::default());

    buffer.save_as(&ctx, &dest).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), b"no newline\n");

    buffer.save(&ctx).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), b"no newline\n");
    assert_eq!(buffer.line_count(), 2);
}

#[test]
fn test_rmtrailingws_relocates_cursors() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("ws.txt");
    let mut buffer = Buffer::from_bytes("a b  \n\u{00E9}\t\t\nkeep".as_bytes(), BufferSettings {
        rmtrailingws: true,
        eofnewline: false,
        ..BufferSettings::default()
    });
    buffer.set_cursor(0, Loc::new(5, 0));
    buffer.set_cursor(1, Loc::new(2, 1));
    buffer.set_cursor(2, Loc::new(4, 2));

    buffer.save_as(&SaveContext::default(), &dest).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), "a b\n\u{00E9}\nkeep".as_bytes());
    assert_eq!(buffer.cursors(), &[Loc::new(3, 0), Loc::new(1, 1), Loc::new(4, 2)]);
}

#[test]
fn test_missing_parents_without_mkparents() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a").join("b").join("file.txt");
    let mut buffer = Buffer::from_bytes(b"x", plain());

    let err = buffer.save_as(&SaveContext::default(), &dest).unwrap_err();

    assert!(matches!(err, SaveError::MissingParents { .. }));
    assert!(err.to_string().contains("mkparents"));
    assert!(dir_is_empty(dir.path()));
}

#[test]
fn test_missing_parents_with_mkparents() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a").join("b").join("file.txt");
    let mut buffer = Buffer::from_bytes(b"x", BufferSettings {
        mkparents: true,
        ..plain()
    });

    buffer.save_as(&SaveContext::default(), &dest).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"x");
}

#[test]
fn test_reopen_restores_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cursor.txt");
    let store = quill_buffer::StateStore::new(dir.path().join("state"));
    let ctx = SaveContext::default().with_state_store(store.clone());
    let settings = BufferSettings {
        savecursor: true,
        ..BufferSettings::default()
    };

    let mut buffer = Buffer::from_bytes(b"first\nsecond", settings.clone());
    buffer.set_cursor(0, Loc::new(3, 1));
    buffer.save_as(&ctx, &dest).unwrap();

    let mut reopened = Buffer::from_file(&dest, settings).unwrap();
    let state = store.restore(&reopened.abs_path).unwrap().unwrap();
    assert!(reopened.apply_state(&state));
    assert_eq!(reopened.cursors()[0], Loc::new(3, 1));
}

#[test]
fn test_opening_crlf_file_sizes_with_crlf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dos.txt");
    let mut bytes = vec![b'x'; LARGE_FILE_THRESHOLD as usize - 2];
    bytes.extend_from_slice(b"\r\ny");
    fs::write(&path, &bytes).unwrap();

    let buffer = Buffer::from_file(&path, BufferSettings::default()).unwrap();

    assert_eq!(buffer.line_ending, LineEnding::Dos);
    assert_eq!(buffer.byte_len(), LARGE_FILE_THRESHOLD + 1);
    assert!(buffer.settings.fastdirty);
    assert!(buffer.orig_hash().is_none());
}
