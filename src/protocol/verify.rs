//! Index-claim verification.
//!
//! After a compare, the server remembers which slot carries the true
//! score. The client decrypts, finds the one slot near 1 (or none), and
//! claims it back. Claims are compared as strings, exactly: the stored
//! index, the literal "-1" reject sentinel, or anything else.

use serde::{Deserialize, Serialize};

use crate::protocol::error::ProtocolError;

/// The claim a client sends when no slot clears the cutoff.
pub const REJECT_SENTINEL: &str = "-1";

/// The server's secret record of where the true score went.
///
/// Serialized as JSON with the index as a decimal string, the shape the
/// protocol has always used on disk: `{"idx":"42"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub idx: String,
}

impl IndexRecord {
    pub fn new(index: usize) -> Self {
        Self {
            idx: index.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Outcome of judging a claim against the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Claim matches the stored index: the vectors matched
    Allow,
    /// Client honestly reported no qualifying slot
    Disallow,
    /// Claim named some other slot: either a lucky decoy or tampering
    Untrusted,
}

impl Decision {
    /// Response line for each outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Decision::Allow => "Identical Verified. Enter Allowed.",
            Decision::Disallow => "Not identical Verified. Enter Disallowed.",
            Decision::Untrusted => "Untrusted Response. Enter Disallowed.",
        }
    }
}

/// Judges a claim string against the stored record.
pub fn judge(claim: &str, record: &IndexRecord) -> Decision {
    if claim == record.idx {
        Decision::Allow
    } else if claim == REJECT_SENTINEL {
        Decision::Disallow
    } else {
        Decision::Untrusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_truth_table() {
        let record = IndexRecord::new(42);
        assert_eq!(judge("42", &record), Decision::Allow);
        assert_eq!(judge("-1", &record), Decision::Disallow);
        assert_eq!(judge("41", &record), Decision::Untrusted);
        assert_eq!(judge("", &record), Decision::Untrusted);
        assert_eq!(judge("042", &record), Decision::Untrusted);
        assert_eq!(judge("42 ", &record), Decision::Untrusted);
    }

    #[test]
    fn test_record_json_shape() {
        let record = IndexRecord::new(42);
        let json = String::from_utf8(record.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"idx":"42"}"#);

        let back = IndexRecord::from_json(json.as_bytes()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_malformed_record_rejected() {
        assert!(matches!(
            IndexRecord::from_json(b"{\"index\": 42}"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            IndexRecord::from_json(b"not json"),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_decision_messages() {
        assert_eq!(Decision::Allow.message(), "Identical Verified. Enter Allowed.");
        assert_eq!(
            Decision::Disallow.message(),
            "Not identical Verified. Enter Disallowed."
        );
        assert_eq!(
            Decision::Untrusted.message(),
            "Untrusted Response. Enter Disallowed."
        );
    }
}
