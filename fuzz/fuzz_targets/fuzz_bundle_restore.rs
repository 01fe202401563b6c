//! Fuzz target for restoring a bundle from arbitrary checkpoint bytes.

#![no_main]

use dpb_core::test_utils::{sum_bundle_spec, test_registry};
use dpb_core::BundleFactory;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let registry = test_registry();
    let spec = sum_bundle_spec(&[1, 2], 1.0, 1e-6);
    if let Ok(bundle) = BundleFactory::new(&registry).restore_from_bytes(&spec, data) {
        assert_eq!(bundle.num_mechanisms(), 2);
        assert_eq!(bundle.inputs_per_mechanism(), &[1, 2]);
    }
});
