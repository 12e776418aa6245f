//! Runs in its own process: it removes the working directory.

use std::env;
use std::fs;

use quill_buffer::{Buffer, Loc, SaveContext, SaveError, StateStore};
use quill_config::BufferSettings;

#[cfg(unix)]
#[test]
fn test_state_persisted_when_destination_cannot_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("kept.txt");
    let store = StateStore::new(dir.path().join("state"));
    let ctx = SaveContext::default().with_state_store(store.clone());
    let mut buffer = Buffer::from_bytes(b"first\nsecond", BufferSettings {
        savecursor: true,
        eofnewline: false,
        ..BufferSettings::default()
    });

    buffer.save_as(&ctx, &dest).unwrap();
    let saved_mod_time = buffer.mod_time;
    assert_eq!(store.restore(&dest).unwrap().unwrap().cursor, Loc::new(0, 0));

    // A relative destination cannot be resolved once the cwd is gone
    let doomed = dir.path().join("doomed");
    fs::create_dir(&doomed).unwrap();
    env::set_current_dir(&doomed).unwrap();
    fs::remove_dir(&doomed).unwrap();

    buffer.set_cursor(0, Loc::new(2, 1));
    let err = buffer.save_as(&ctx, "elsewhere.txt").unwrap_err();

    assert!(matches!(err, SaveError::Resolve { .. }));
    assert_eq!(buffer.abs_path, dest);
    assert_eq!(buffer.mod_time, saved_mod_time);
    let state = store.restore(&dest).unwrap().unwrap();
    assert_eq!(state.cursor, Loc::new(2, 1));

    env::set_current_dir(dir.path()).unwrap();
}
