#![no_main]

use jwekit::core::types::{Key, SealedEnvelope};
use jwekit::Registry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and decrypting arbitrary input should never panic
    let Ok(envelope) = SealedEnvelope::parse_any(data) else {
        return;
    };
    let _ = envelope.to_json_general();
    let _ = envelope.to_json_flattened();
    let registry = Registry::with_defaults();
    let _ = jwekit::decrypt(&registry, &envelope, &Key::symmetric([0u8; 32]));
});
