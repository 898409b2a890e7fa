//! Wire Codec
//!
//! Encodes history snapshots for UDP transport. There is exactly one
//! encoding: a versioned JSON envelope.
//!
//! ```json
//! {"version":1,"type":"history","origin":"<uuid>","history":[
//!   {"content":"...","timestamp":"2024-05-01T10:00:00.123456789Z","preview":"...","click_count":0}
//! ]}
//! ```
//!
//! Decoding never guesses: anything that is not a complete, known
//! envelope is rejected with a [`DecodeError`].

use crate::domain::entities::CaptureItem;
use crate::domain::value_objects::InstanceId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current envelope format version.
pub const WIRE_VERSION: u32 = 1;

/// Largest payload that fits in a single UDP datagram.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Kind of sync message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Full history snapshot
    History,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::History => "history",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

/// Decoded sync envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncMessage {
    pub kind: MessageKind,
    /// Instance that produced the message, if it said so
    pub origin: Option<InstanceId>,
    pub history: Vec<CaptureItem>,
}

impl SyncMessage {
    pub fn history(history: Vec<CaptureItem>, origin: Option<InstanceId>) -> Self {
        Self {
            kind: MessageKind::History,
            origin,
            history,
        }
    }
}

/// Errors produced while encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("payload of {size} bytes exceeds datagram limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Errors produced while decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u32),
    #[error("unknown message kind {0:?}")]
    UnknownKind(String),
    #[error("history message without history")]
    MissingHistory,
    #[error("history contains duplicate content")]
    DuplicateContent,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<InstanceId>,
    history: &'a [CaptureItem],
}

#[derive(Deserialize)]
struct RawEnvelope {
    version: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    origin: Option<InstanceId>,
    #[serde(default)]
    history: Option<Vec<CaptureItem>>,
}

/// Encode a message.
pub fn encode(message: &SyncMessage) -> Result<Vec<u8>, EncodeError> {
    encode_parts(message.kind, message.origin, &message.history)
}

/// Encode a history snapshot as a single datagram payload.
pub fn encode_history(
    history: &[CaptureItem],
    origin: Option<InstanceId>,
) -> Result<Bytes, EncodeError> {
    let data = encode_parts(MessageKind::History, origin, history)?;
    if data.len() > MAX_DATAGRAM_SIZE {
        return Err(EncodeError::PayloadTooLarge {
            size: data.len(),
            limit: MAX_DATAGRAM_SIZE,
        });
    }
    Ok(Bytes::from(data))
}

fn encode_parts(
    kind: MessageKind,
    origin: Option<InstanceId>,
    history: &[CaptureItem],
) -> Result<Vec<u8>, EncodeError> {
    let envelope = EnvelopeRef {
        version: WIRE_VERSION,
        kind: kind.as_str(),
        origin,
        history,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode a payload.
pub fn decode(data: &[u8]) -> Result<SyncMessage, DecodeError> {
    let raw: RawEnvelope = serde_json::from_slice(data)?;

    if raw.version != WIRE_VERSION {
        return Err(DecodeError::UnsupportedVersion(raw.version));
    }

    let kind = MessageKind::parse(&raw.kind).ok_or(DecodeError::UnknownKind(raw.kind))?;

    match kind {
        MessageKind::History => {
            let history = raw.history.ok_or(DecodeError::MissingHistory)?;
            let mut seen = HashSet::with_capacity(history.len());
            if !history.iter().all(|item| seen.insert(item.content())) {
                return Err(DecodeError::DuplicateContent);
            }
            Ok(SyncMessage {
                kind,
                origin: raw.origin,
                history,
            })
        }
    }
}
