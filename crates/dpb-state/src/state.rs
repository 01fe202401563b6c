//! Bundle checkpoint types and serialization.
//!
//! The checkpoint is the source of truth for resuming a bundle:
//! - The bundle's input counter
//! - One framed blob per nested mechanism, with SHA-256 checksums
//! - The identifier of the mechanism that produced each blob

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{Result, StateError};

/// Current checkpoint schema version.
pub const STATE_SCHEMA_VERSION: &str = "1.0.0";

/// Serialized bookkeeping of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleState {
    /// Checkpoint format version.
    pub schema_version: String,

    /// When the checkpoint was taken.
    pub created_at: DateTime<Utc>,

    /// Number of accumulate calls the bundle has absorbed.
    pub total_inputs_seen: u64,

    /// Nested mechanism states, in nested-mechanism order.
    #[serde(default)]
    pub nested: Vec<NestedState>,
}

impl BundleState {
    /// Create an empty checkpoint with the given counter.
    pub fn new(total_inputs_seen: u64) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            total_inputs_seen,
            nested: Vec::new(),
        }
    }

    /// Append the state of the next nested mechanism.
    pub fn push_nested(&mut self, identifier: Option<&str>, blob: Vec<u8>) {
        self.nested.push(NestedState::new(identifier, blob));
    }

    /// Number of nested entries.
    pub fn nested_count(&self) -> usize {
        self.nested.len()
    }

    /// Blob of the nested entry at `index`.
    pub fn blob(&self, index: usize) -> Option<&[u8]> {
        self.nested.get(index).map(|n| n.blob.as_slice())
    }

    /// Validate version, sizes, and checksums.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != STATE_SCHEMA_VERSION {
            return Err(StateError::UnsupportedVersion {
                version: self.schema_version.clone(),
                supported: STATE_SCHEMA_VERSION.to_string(),
            });
        }

        for (index, entry) in self.nested.iter().enumerate() {
            if entry.sha256.len() != 64 {
                return Err(StateError::CorruptedState(format!(
                    "nested state {} has invalid checksum length",
                    index
                )));
            }
            if entry.bytes != entry.blob.len() as u64 {
                return Err(StateError::CorruptedState(format!(
                    "nested state {} declares {} bytes but holds {}",
                    index,
                    entry.bytes,
                    entry.blob.len()
                )));
            }
            let actual = NestedState::compute_checksum(&entry.blob);
            if actual != entry.sha256 {
                warn!(index, expected = %entry.sha256, actual = %actual, "Nested state checksum mismatch");
                return Err(StateError::ChecksumMismatch {
                    index,
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }

        Ok(())
    }

    /// Encode as compact JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec(self)?;
        debug!(
            nested = self.nested.len(),
            total_inputs_seen = self.total_inputs_seen,
            bytes = bytes.len(),
            "Encoded bundle state"
        );
        Ok(bytes)
    }

    /// Decode and verify a checkpoint.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let state: Self = serde_json::from_slice(bytes)?;
        state.validate()?;
        debug!(
            nested = state.nested.len(),
            total_inputs_seen = state.total_inputs_seen,
            "Decoded bundle state"
        );
        Ok(state)
    }
}

/// Serialized state of one nested mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedState {
    /// Identifier of the mechanism that produced the blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// SHA-256 checksum of `blob` (64 hex characters).
    pub sha256: String,

    /// Size of `blob` in bytes.
    pub bytes: u64,

    /// Opaque mechanism state.
    #[serde(with = "blob_base64")]
    pub blob: Vec<u8>,
}

impl NestedState {
    /// Frame a blob with its checksum.
    pub fn new(identifier: Option<&str>, blob: Vec<u8>) -> Self {
        Self {
            identifier: identifier.map(str::to_string),
            sha256: Self::compute_checksum(&blob),
            bytes: blob.len() as u64,
            blob,
        }
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the stored checksum against the blob.
    pub fn verify(&self) -> bool {
        Self::compute_checksum(&self.blob) == self.sha256
    }
}

mod blob_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(blob: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(blob))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> BundleState {
        let mut state = BundleState::new(3);
        state.push_nested(Some("dp_sum"), vec![1, 2, 3]);
        state.push_nested(None, Vec::new());
        state
    }

    #[test]
    fn test_new_state() {
        let state = BundleState::new(0);
        assert_eq!(state.schema_version, STATE_SCHEMA_VERSION);
        assert_eq!(state.nested_count(), 0);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_push_nested_frames_blob() {
        let state = sample_state();
        assert_eq!(state.nested_count(), 2);
        assert_eq!(state.nested[0].identifier.as_deref(), Some("dp_sum"));
        assert_eq!(state.nested[0].bytes, 3);
        assert!(state.nested[0].verify());
        assert_eq!(state.blob(1), Some(&[][..]));
        assert_eq!(state.blob(2), None);
    }

    #[test]
    fn test_bytes_roundtrip_preserves_blobs() {
        let state = sample_state();
        let bytes = state.to_bytes().unwrap();
        let parsed = BundleState::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_untagged_entry_omits_identifier() {
        let state = sample_state();
        let json: serde_json::Value = serde_json::from_slice(&state.to_bytes().unwrap()).unwrap();
        assert!(json["nested"][1].get("identifier").is_none());
        assert_eq!(json["nested"][0]["blob"], "AQID");
    }

    #[test]
    fn test_tampered_blob_fails_checksum() {
        let mut state = sample_state();
        state.nested[0].blob = vec![9, 9, 9];
        let err = state.validate().unwrap_err();
        assert!(matches!(err, StateError::ChecksumMismatch { index: 0, .. }));
    }

    #[test]
    fn test_size_mismatch_is_corrupted() {
        let mut state = sample_state();
        state.nested[0].bytes = 10;
        assert!(matches!(
            state.validate().unwrap_err(),
            StateError::CorruptedState(_)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut state = sample_state();
        state.schema_version = "2.0.0".to_string();
        let bytes = serde_json::to_vec(&state).unwrap();
        assert!(matches!(
            BundleState::from_bytes(&bytes).unwrap_err(),
            StateError::UnsupportedVersion { .. }
        ));
    }

    #[test]
    fn test_garbage_is_json_error() {
        assert!(matches!(
            BundleState::from_bytes(b"not a checkpoint").unwrap_err(),
            StateError::Json(_)
        ));
    }

    #[test]
    fn test_bad_base64_is_json_error() {
        let json = br#"{"schema_version":"1.0.0","created_at":"2026-01-15T14:30:22Z","total_inputs_seen":0,"nested":[{"sha256":"","bytes":0,"blob":"***"}]}"#;
        assert!(matches!(
            BundleState::from_bytes(json).unwrap_err(),
            StateError::Json(_)
        ));
    }
}
