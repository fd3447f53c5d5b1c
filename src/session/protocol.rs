//! Wire protocol of the result stream.
//!
//! Every frame is a JSON object with a `type` discriminant. Frames that
//! fail to parse are [`MalformedFrame`]s: the reconciler drops them
//! without touching the session state. A well-formed object with an
//! unknown `type` decodes to [`StreamEvent::Unrecognized`] and is
//! ignored the same way.

use crate::models::ContradictionRecord;
use serde::{Deserialize, Deserializer};
use std::fmt;
use thiserror::Error;

/// Opaque session identifier issued by the upload call.
///
/// The backend may send a string or a number; numbers are kept as their
/// decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        let id = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        };

        if id.trim().is_empty() {
            return Err(serde::de::Error::custom("session_id is empty"));
        }

        Ok(SessionId(id))
    }
}

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub session_id: SessionId,
    /// Number of documents the backend accepted.
    #[serde(default)]
    pub count: Option<usize>,
}

/// One decoded frame of the result stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A newly detected contradiction.
    Contradiction(ContradictionRecord),
    /// Analysis progress, in sentences.
    Progress { processed: u64, total: u64 },
    /// Informational status from the backend.
    Info { message: String },
    /// Error reported by the backend; the stream may continue.
    Error { message: String },
    /// Analysis finished; the stream closes after this.
    Done,
    /// Any other discriminant.
    #[serde(other)]
    Unrecognized,
}

/// A frame that could not be decoded into a [`StreamEvent`].
#[derive(Debug, Error)]
pub enum MalformedFrame {
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("progress {processed}/{total} exceeds its total")]
    ProgressOverflow { processed: u64, total: u64 },
}

/// Decode a text frame.
pub fn parse_frame(text: &str) -> Result<StreamEvent, MalformedFrame> {
    let event: StreamEvent = serde_json::from_str(text)?;

    if let StreamEvent::Progress { processed, total } = event {
        if processed > total {
            return Err(MalformedFrame::ProgressOverflow { processed, total });
        }
    }

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    #[test]
    fn test_parse_contradiction() {
        let frame = r#"{"type":"contradiction","doc1":"a.txt","doc2":"b.txt",
            "sentence1":"X","sentence2":"not X","severity":"High",
            "confidence":92,"similarity":0.81}"#;

        match parse_frame(frame).unwrap() {
            StreamEvent::Contradiction(record) => {
                assert_eq!(record.doc1, "a.txt");
                assert_eq!(record.doc2, "b.txt");
                assert_eq!(record.sentence2, "not X");
                assert_eq!(record.severity, Severity::High);
                assert_eq!(record.confidence, 92.0);
                assert_eq!(record.similarity, 0.81);
            }
            other => panic!("expected contradiction, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_events() {
        assert_eq!(
            parse_frame(r#"{"type":"progress","processed":1,"total":2}"#).unwrap(),
            StreamEvent::Progress {
                processed: 1,
                total: 2
            }
        );
        assert_eq!(
            parse_frame(r#"{"type":"info","message":"Starting analysis..."}"#).unwrap(),
            StreamEvent::Info {
                message: "Starting analysis...".to_string()
            }
        );
        assert_eq!(
            parse_frame(r#"{"type":"error","message":"parse failed"}"#).unwrap(),
            StreamEvent::Error {
                message: "parse failed".to_string()
            }
        );
        assert_eq!(parse_frame(r#"{"type":"done"}"#).unwrap(), StreamEvent::Done);
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        assert_eq!(
            parse_frame(r#"{"type":"heartbeat","at":12}"#).unwrap(),
            StreamEvent::Unrecognized
        );
    }

    #[test]
    fn test_malformed_frames() {
        assert!(parse_frame("not json").is_err());
        assert!(parse_frame(r#"{"message":"no type"}"#).is_err());
        assert!(parse_frame(r#"{"type":"progress","processed":-1,"total":2}"#).is_err());
        assert!(parse_frame(r#"{"type":"info"}"#).is_err());
        assert!(parse_frame(
            r#"{"type":"contradiction","doc1":"a","doc2":"b","sentence1":"x",
                "sentence2":"y","severity":"Severe","confidence":1,"similarity":1}"#
        )
        .is_err());
        assert!(matches!(
            parse_frame(r#"{"type":"progress","processed":3,"total":2}"#),
            Err(MalformedFrame::ProgressOverflow { .. })
        ));
    }

    #[test]
    fn test_upload_response_session_id_forms() {
        let text: UploadResponse =
            serde_json::from_str(r#"{"session_id":"abc","count":2}"#).unwrap();
        assert_eq!(text.session_id.as_str(), "abc");
        assert_eq!(text.count, Some(2));

        let number: UploadResponse = serde_json::from_str(r#"{"session_id":42}"#).unwrap();
        assert_eq!(number.session_id.to_string(), "42");
        assert_eq!(number.count, None);

        assert!(serde_json::from_str::<UploadResponse>(r#"{"count":2}"#).is_err());
        assert!(serde_json::from_str::<UploadResponse>(r#"{"session_id":""}"#).is_err());
    }
}
