//! Fuzz target for bundle spec parsing and construction.
//!
//! Parsed specs are fed to the factory; every outcome must be a bundle or
//! an error, never a panic.

#![no_main]

use dpb_core::test_utils::test_registry;
use dpb_core::{BundleFactory, BundleSpec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(spec) = serde_json::from_slice::<BundleSpec>(data) else {
        return;
    };
    let registry = test_registry();
    match BundleFactory::new(&registry).create(&spec) {
        Ok(bundle) => assert_eq!(bundle.num_mechanisms(), spec.nested_specs.len()),
        Err(err) => assert!(err.is_invalid_argument()),
    }
});
