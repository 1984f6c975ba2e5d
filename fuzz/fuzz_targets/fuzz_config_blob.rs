//! Fuzz target: persisted config blob decoder
//!
//! Feeds arbitrary bytes to `config_store::decode` and checks:
//! - No panics on any input
//! - Anything accepted is valid and re-encodes to a blob that decodes
//!   to the same config
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use coopdoor::adapters::config_store::{MAX_BLOB_SIZE, decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = decode(data) else {
        return;
    };
    assert!(config.system.validate().is_ok());

    let mut buf = [0u8; MAX_BLOB_SIZE];
    let len = encode(&config, &mut buf).expect("decoded config must re-encode");
    assert_eq!(decode(&buf[..len]), Ok(config));
});
