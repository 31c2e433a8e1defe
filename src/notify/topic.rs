//! Topic decode table
//!
//! The notification feed carries a closed set of topics. Each entry of the
//! table names the wire topic, the label used in log output, and the shape
//! of the payload the decoder expects.

/// Payload layout of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// 32-byte hash, emitted in full
    Hash,
    /// Serialized block; only the 80-byte header is emitted
    BlockHeader,
    /// Serialized transaction, emitted in full
    Transaction,
    /// `{hash:32}{label:1}{mempool sequence:8 LE, optional}`
    SequenceEvent,
}

/// Subscribed notification topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    HashBlock,
    HashTx,
    RawBlock,
    RawTx,
    Sequence,
}

struct TopicEntry {
    topic: Topic,
    name: &'static str,
    label: &'static str,
    shape: PayloadShape,
}

const TABLE: [TopicEntry; 5] = [
    TopicEntry { topic: Topic::HashBlock, name: "hashblock", label: "HASH BLOCK", shape: PayloadShape::Hash },
    TopicEntry { topic: Topic::HashTx, name: "hashtx", label: "HASH TX", shape: PayloadShape::Hash },
    TopicEntry { topic: Topic::RawBlock, name: "rawblock", label: "RAW BLOCK HEADER", shape: PayloadShape::BlockHeader },
    TopicEntry { topic: Topic::RawTx, name: "rawtx", label: "RAW TX", shape: PayloadShape::Transaction },
    TopicEntry { topic: Topic::Sequence, name: "sequence", label: "SEQUENCE", shape: PayloadShape::SequenceEvent },
];

impl Topic {
    /// Every topic, in subscription order
    pub const ALL: [Topic; 5] = [
        Topic::HashBlock,
        Topic::HashTx,
        Topic::RawBlock,
        Topic::RawTx,
        Topic::Sequence,
    ];

    fn entry(self) -> &'static TopicEntry {
        // TABLE is indexed in declaration order
        &TABLE[self as usize]
    }

    /// Topic string on the wire
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Label used in log lines
    pub fn label(self) -> &'static str {
        self.entry().label
    }

    pub fn shape(self) -> PayloadShape {
        self.entry().shape
    }

    /// Look up a wire topic; `None` for anything outside the table
    pub fn from_bytes(topic: &[u8]) -> Option<Topic> {
        TABLE.iter().find(|entry| entry.name.as_bytes() == topic).map(|entry| entry.topic)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
