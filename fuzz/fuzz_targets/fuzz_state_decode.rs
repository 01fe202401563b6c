//! Fuzz target for bundle checkpoint decoding.
//!
//! Checkpoints are read back from storage the bundle does not control, so
//! decoding must reject anything malformed without panicking.

#![no_main]

use dpb_state::BundleState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(state) = BundleState::from_bytes(data) {
        // Anything accepted must re-encode and decode to the same state
        let bytes = state.to_bytes().expect("re-encode decoded state");
        let again = BundleState::from_bytes(&bytes).expect("decode re-encoded state");
        assert_eq!(again.total_inputs_seen, state.total_inputs_seen);
        assert_eq!(again.nested_count(), state.nested_count());
    }
});
