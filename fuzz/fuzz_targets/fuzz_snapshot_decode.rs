//! Fuzz target: persisted snapshot decoding
//!
//! Feeds arbitrary bytes to `PersistedSnapshot::from_bytes` (the path taken
//! for whatever blob is found in NVS at boot) and verifies:
//! - No panics under arbitrary byte inputs
//! - Any snapshot that decodes is already sanitized
//! - A decoded snapshot re-encodes and decodes to itself
//!
//! cargo fuzz run fuzz_snapshot_decode

#![no_main]

use compressor::history::FILL_HISTORY_LEN;
use compressor::persistence::PersistedSnapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = PersistedSnapshot::from_bytes(data) else {
        return;
    };

    assert_eq!(snapshot.clone().sanitized(), snapshot);
    assert!(snapshot.history.len() <= FILL_HISTORY_LEN);
    assert!(snapshot.config.temp_ceiling_c.is_finite());

    let bytes = snapshot.to_bytes().expect("encode");
    let again = PersistedSnapshot::from_bytes(&bytes).expect("decode");
    assert_eq!(again, snapshot);
});
