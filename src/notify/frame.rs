//! Frame parsing and payload decoding
//!
//! A frame is one multi-part message: topic, body and a 4-byte
//! little-endian sequence suffix. Decoding is a pure function of one frame.

use bytes::Bytes;
use std::fmt;

use super::topic::{PayloadShape, Topic};
use crate::common::DecodeError;

/// Length of a block or transaction hash
pub const HASH_LEN: usize = 32;

/// Length of a serialized block header
pub const BLOCK_HEADER_LEN: usize = 80;

/// Length of the per-topic sequence suffix
pub const SEQUENCE_SUFFIX_LEN: usize = 4;

/// Length of a `sequence` payload that carries a mempool sequence number
pub const SEQUENCE_WITH_MEMPOOL_LEN: usize = HASH_LEN + 1 + 8;

/// One received multi-part message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFrame {
    pub topic: Bytes,
    pub body: Bytes,
    /// 4 bytes when well formed; anything else means an unknown sequence
    pub sequence: Bytes,
}

impl NotificationFrame {
    pub fn new(topic: impl Into<Bytes>, body: impl Into<Bytes>, sequence: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            body: body.into(),
            sequence: sequence.into(),
        }
    }

    /// Build a frame from message parts
    ///
    /// A missing sequence part is treated as an unknown sequence, extra
    /// parts are ignored.
    pub fn from_parts(parts: Vec<Bytes>) -> Result<Self, DecodeError> {
        let mut parts = parts.into_iter();
        let topic = parts.next().ok_or(DecodeError::MissingPart("topic"))?;
        let body = parts.next().ok_or(DecodeError::MissingPart("body"))?;
        let sequence = parts.next().unwrap_or_default();

        Ok(Self { topic, body, sequence })
    }

    /// Publisher sequence number, if the suffix is exactly 4 bytes
    pub fn sequence_number(&self) -> Option<u32> {
        let bytes = <[u8; SEQUENCE_SUFFIX_LEN]>::try_from(&self.sequence[..]).ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

/// Meaning of the label byte of a `sequence` notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEvent {
    BlockConnected,
    BlockDisconnected,
    TxRemoved,
    TxAdded,
}

impl SequenceEvent {
    pub fn from_label(label: char) -> Option<Self> {
        match label {
            'C' => Some(Self::BlockConnected),
            'D' => Some(Self::BlockDisconnected),
            'R' => Some(Self::TxRemoved),
            'A' => Some(Self::TxAdded),
            _ => None,
        }
    }
}

/// Decoded payload, one variant per payload shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedNotification {
    BlockHash { hash: String },
    TxHash { hash: String },
    RawBlockHeader { header_prefix: String },
    RawTx { tx: String },
    Sequence {
        hash: String,
        label: char,
        mempool_sequence: Option<u64>,
    },
}

impl DecodedNotification {
    /// Event kind of a `sequence` notification with a known label
    pub fn sequence_event(&self) -> Option<SequenceEvent> {
        match self {
            Self::Sequence { label, .. } => SequenceEvent::from_label(*label),
            _ => None,
        }
    }
}

/// A decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: Topic,
    /// `None` when the sequence suffix was not 4 bytes
    pub sequence: Option<u32>,
    pub payload: DecodedNotification,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {} (", self.topic.label())?;
        match self.sequence {
            Some(sequence) => write!(f, "{}", sequence)?,
            None => f.write_str("Unknown")?,
        }
        f.write_str(") - ")?;

        match &self.payload {
            DecodedNotification::BlockHash { hash } | DecodedNotification::TxHash { hash } => {
                f.write_str(hash)
            }
            DecodedNotification::RawBlockHeader { header_prefix } => f.write_str(header_prefix),
            DecodedNotification::RawTx { tx } => f.write_str(tx),
            DecodedNotification::Sequence { hash, label, mempool_sequence } => match mempool_sequence {
                Some(mempool_sequence) => write!(f, "{} {} {}", hash, label, mempool_sequence),
                None => write!(f, "{} {} None", hash, label),
            },
        }
    }
}

/// Decode one frame according to its topic
///
/// # Errors
///
/// Unknown topics and `sequence` payloads shorter than hash plus label.
pub fn decode_frame(frame: &NotificationFrame) -> Result<Notification, DecodeError> {
    let topic = Topic::from_bytes(&frame.topic)
        .ok_or_else(|| DecodeError::UnknownTopic(String::from_utf8_lossy(&frame.topic).into_owned()))?;
    let body = frame.body.as_ref();

    let payload = match (topic.shape(), topic) {
        (PayloadShape::Hash, Topic::HashBlock) => DecodedNotification::BlockHash { hash: hex::encode(body) },
        (PayloadShape::Hash, _) => DecodedNotification::TxHash { hash: hex::encode(body) },
        (PayloadShape::BlockHeader, _) => {
            // Display truncation; shorter bodies are shown whole
            let header = &body[..body.len().min(BLOCK_HEADER_LEN)];
            DecodedNotification::RawBlockHeader { header_prefix: hex::encode(header) }
        }
        (PayloadShape::Transaction, _) => DecodedNotification::RawTx { tx: hex::encode(body) },
        (PayloadShape::SequenceEvent, _) => decode_sequence(topic, body)?,
    };

    Ok(Notification {
        topic,
        sequence: frame.sequence_number(),
        payload,
    })
}

fn decode_sequence(topic: Topic, body: &[u8]) -> Result<DecodedNotification, DecodeError> {
    if body.len() <= HASH_LEN {
        return Err(DecodeError::ShortPayload {
            topic: topic.name(),
            expected: HASH_LEN + 1,
            actual: body.len(),
        });
    }

    // Mempool sequence only when the length is exact; other lengths are tolerated
    let mempool_sequence = if body.len() == SEQUENCE_WITH_MEMPOOL_LEN {
        <[u8; 8]>::try_from(&body[HASH_LEN + 1..])
            .ok()
            .map(u64::from_le_bytes)
    } else {
        None
    };

    Ok(DecodedNotification::Sequence {
        hash: hex::encode(&body[..HASH_LEN]),
        label: char::from(body[HASH_LEN]),
        mempool_sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_bytes() -> Vec<u8> {
        (0..HASH_LEN as u8).collect()
    }

    #[test]
    fn test_hashtx_with_sequence_one() {
        let frame = NotificationFrame::new(&b"hashtx"[..], hash_bytes(), vec![0x01, 0x00, 0x00, 0x00]);
        let notification = decode_frame(&frame).unwrap();

        assert_eq!(notification.topic, Topic::HashTx);
        assert_eq!(notification.sequence, Some(1));
        assert_eq!(
            notification.payload,
            DecodedNotification::TxHash { hash: hex::encode(hash_bytes()) }
        );
        assert_eq!(
            notification.to_string(),
            format!("- HASH TX (1) - {}", hex::encode(hash_bytes()))
        );
    }

    #[test]
    fn test_irregular_sequence_suffix_is_unknown() {
        for suffix in [vec![], vec![1, 2, 3], vec![1, 2, 3, 4, 5]] {
            let frame = NotificationFrame::new(&b"hashblock"[..], hash_bytes(), suffix);
            let notification = decode_frame(&frame).unwrap();
            assert_eq!(notification.sequence, None);
            assert!(notification.to_string().starts_with("- HASH BLOCK (Unknown) - "));
        }
    }

    #[test]
    fn test_rawblock_keeps_only_header() {
        let block: Vec<u8> = (0..=255u8).cycle().take(285).collect();
        let frame = NotificationFrame::new(&b"rawblock"[..], block.clone(), 7u32.to_le_bytes().to_vec());
        let notification = decode_frame(&frame).unwrap();

        assert_eq!(
            notification.payload,
            DecodedNotification::RawBlockHeader { header_prefix: hex::encode(&block[..80]) }
        );
    }

    #[test]
    fn test_rawblock_shorter_than_header() {
        let frame = NotificationFrame::new(&b"rawblock"[..], vec![0xab; 10], Bytes::new());
        let notification = decode_frame(&frame).unwrap();
        assert_eq!(
            notification.payload,
            DecodedNotification::RawBlockHeader { header_prefix: "ab".repeat(10) }
        );
    }

    #[test]
    fn test_rawtx_in_full() {
        let tx = vec![0x02; 250];
        let frame = NotificationFrame::new(&b"rawtx"[..], tx.clone(), Bytes::new());
        let notification = decode_frame(&frame).unwrap();
        assert_eq!(notification.payload, DecodedNotification::RawTx { tx: hex::encode(tx) });
    }

    #[test]
    fn test_sequence_with_mempool_sequence() {
        let mut body = hash_bytes();
        body.push(b'A');
        body.extend_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(body.len(), SEQUENCE_WITH_MEMPOOL_LEN);

        let frame = NotificationFrame::new(&b"sequence"[..], body, 3u32.to_le_bytes().to_vec());
        let notification = decode_frame(&frame).unwrap();

        assert_eq!(
            notification.payload,
            DecodedNotification::Sequence {
                hash: hex::encode(hash_bytes()),
                label: 'A',
                mempool_sequence: Some(0x0102_0304_0506_0708),
            }
        );
        assert_eq!(notification.payload.sequence_event(), Some(SequenceEvent::TxAdded));
    }

    #[test]
    fn test_sequence_without_mempool_sequence() {
        let mut body = hash_bytes();
        body.push(b'C');
        let frame = NotificationFrame::new(&b"sequence"[..], body.clone(), Bytes::new());
        let notification = decode_frame(&frame).unwrap();
        assert_eq!(
            notification.payload,
            DecodedNotification::Sequence {
                hash: hex::encode(hash_bytes()),
                label: 'C',
                mempool_sequence: None,
            }
        );
        assert!(notification.to_string().ends_with(" C None"));

        // Irregular lengths still decode, without a mempool sequence
        body.extend_from_slice(&[0u8; 5]);
        let frame = NotificationFrame::new(&b"sequence"[..], body, Bytes::new());
        match decode_frame(&frame).unwrap().payload {
            DecodedNotification::Sequence { mempool_sequence, .. } => assert_eq!(mempool_sequence, None),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_short_sequence_is_an_error() {
        let frame = NotificationFrame::new(&b"sequence"[..], hash_bytes(), Bytes::new());
        assert_eq!(
            decode_frame(&frame),
            Err(DecodeError::ShortPayload { topic: "sequence", expected: 33, actual: 32 })
        );
    }

    #[test]
    fn test_unknown_topic() {
        let frame = NotificationFrame::new(&b"pubrawtx"[..], vec![1, 2], Bytes::new());
        assert_eq!(
            decode_frame(&frame),
            Err(DecodeError::UnknownTopic("pubrawtx".to_string()))
        );
    }

    #[test]
    fn test_from_parts() {
        let frame = NotificationFrame::from_parts(vec![
            Bytes::from_static(b"hashtx"),
            Bytes::from_static(b"body"),
        ])
        .unwrap();
        assert!(frame.sequence.is_empty());
        assert_eq!(frame.sequence_number(), None);

        assert_eq!(
            NotificationFrame::from_parts(vec![Bytes::from_static(b"hashtx")]),
            Err(DecodeError::MissingPart("body"))
        );
        assert_eq!(NotificationFrame::from_parts(vec![]), Err(DecodeError::MissingPart("topic")));
    }

    #[test]
    fn test_sequence_event_labels() {
        assert_eq!(SequenceEvent::from_label('C'), Some(SequenceEvent::BlockConnected));
        assert_eq!(SequenceEvent::from_label('D'), Some(SequenceEvent::BlockDisconnected));
        assert_eq!(SequenceEvent::from_label('R'), Some(SequenceEvent::TxRemoved));
        assert_eq!(SequenceEvent::from_label('x'), None);
    }
}
