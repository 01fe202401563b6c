//! Fuzz target for bundle.json configuration parsing.

#![no_main]

use dpb_config::BundleConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = BundleConfig::from_str(text) {
            let _ = config.validate();
        }
    }
});
