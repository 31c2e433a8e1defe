//! Notification decoder module
//!
//! Subscribes to the node's pub/sub feed and decodes each frame by topic.

mod decoder;
mod frame;
mod source;
mod topic;

pub use decoder::{Decoder, DecoderStats};
pub use frame::{
    decode_frame, DecodedNotification, Notification, NotificationFrame, SequenceEvent,
    BLOCK_HEADER_LEN, HASH_LEN, SEQUENCE_SUFFIX_LEN, SEQUENCE_WITH_MEMPOOL_LEN,
};
pub use source::{ChannelSource, FrameSource, ZmqSource};
pub use topic::{PayloadShape, Topic};
