//! Checkpoint state for DP aggregator bundles.
//!
//! A bundle checkpoint records how many inputs the bundle has absorbed and
//! one opaque blob per nested mechanism, in nested-mechanism order. The
//! blob bytes belong to the mechanism that produced them; this crate only
//! frames them.
//!
//! # Format
//!
//! Checkpoints encode as JSON:
//! - `schema_version`: checkpoint format version
//! - `created_at`: when the checkpoint was taken (RFC 3339)
//! - `total_inputs_seen`: bundle input counter
//! - `nested`: per-mechanism entries with identifier tag, SHA-256, size,
//!   and base64 blob
//!
//! # Example
//!
//! ```
//! use dpb_state::BundleState;
//!
//! let mut state = BundleState::new(7);
//! state.push_nested(Some("dp_sum"), b"opaque".to_vec());
//!
//! let bytes = state.to_bytes().unwrap();
//! let restored = BundleState::from_bytes(&bytes).unwrap();
//! assert_eq!(restored.total_inputs_seen, 7);
//! assert_eq!(restored.nested[0].blob, b"opaque");
//! ```

pub mod error;
pub mod state;

pub use error::{Result, StateError};
pub use state::{BundleState, NestedState, STATE_SCHEMA_VERSION};
