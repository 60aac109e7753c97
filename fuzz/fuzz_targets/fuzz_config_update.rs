//! Fuzz target: partial configuration updates
//!
//! Builds `ConfigUpdate`s from raw bytes and applies them in sequence:
//! - No panics, whatever the field values
//! - The config never leaves its valid range
//! - `changed` is always a subset of `accepted`
//!
//! cargo fuzz run fuzz_config_update

#![no_main]

use compressor::config::{
    ConfigField, ConfigUpdate, MIN_ON_DURATION_MS, MIN_REST_DURATION_MS, OperatingConfig,
};
use libfuzzer_sys::fuzz_target;

fn take_u32(data: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[..4]);
    u32::from_le_bytes(buf)
}

fuzz_target!(|data: &[u8]| {
    let mut config = OperatingConfig::default();

    // 13 bytes per update: presence flags + three 4-byte fields.
    for chunk in data.chunks_exact(13) {
        let flags = chunk[0];
        let update = ConfigUpdate {
            on_duration_ms: (flags & 1 != 0).then(|| take_u32(&chunk[1..])),
            rest_duration_ms: (flags & 2 != 0).then(|| take_u32(&chunk[5..])),
            temp_ceiling_c: (flags & 4 != 0).then(|| f32::from_bits(take_u32(&chunk[9..]))),
        };

        let report = config.apply(&update);

        for field in [
            ConfigField::OnDuration,
            ConfigField::RestDuration,
            ConfigField::TempCeiling,
        ] {
            if report.changed.contains(field) {
                assert!(report.accepted.contains(field));
            }
        }
        assert!(config.on_duration_ms >= MIN_ON_DURATION_MS);
        assert!(config.rest_duration_ms >= MIN_REST_DURATION_MS);
        assert!(config.temp_ceiling_c.is_finite() && config.temp_ceiling_c > 0.0);
    }
});
