//! # Message Processing
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         MESSAGE PIPELINE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SEAL                                                                   │
//! │  data ─► [compress] ─► [sign] ─► [encrypt + wrap key] ─► [armor] ─► out │
//! │                                                                         │
//! │  OPEN                                                                   │
//! │  in ─► [un-armor] ─► [unwrap key + decrypt] ─► [verify] ─► [inflate]    │
//! │                                                               │         │
//! │                                                               ▼         │
//! │                                                   data, file name,      │
//! │                                                   flags, signature      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage is optional and recorded in the envelope header, so the
//! reader never needs to be told what the writer did.

mod packet;
mod pipeline;

pub use packet::{
    encode_packets, parse_packets, CompressedData, Envelope, Flags, LiteralData, Packet,
    SessionKeyPacket, SignaturePacket,
};
pub use pipeline::{
    open, read_envelope, seal, OpenKeys, OpenOptions, OpenedMessage, PrivateKeyRef,
    PublicKeyLookup, PublicKeyRef, SealKeys, SealOptions, SignatureCheck,
};
