//! # Envelope Framing
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            ENVELOPE                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌────────┬─────────┬───────┬────────┐                                 │
//! │  │ "PGPC" │ version │ flags │ cipher │  header (7 bytes)               │
//! │  └────────┴─────────┴───────┴────────┘                                 │
//! │  ┌─────┬──────────────┬──────────────────────┐                         │
//! │  │ tag │ length (u32) │ body                 │  packet, repeated       │
//! │  └─────┴──────────────┴──────────────────────┘                         │
//! │                                                                         │
//! │  flags : bit0 compressed  bit1 encrypted  bit2 signed  bit3 armored    │
//! │  cipher: 0 none, otherwise the OpenPGP symmetric algorithm id          │
//! │                                                                         │
//! │  Plain body     : [Signature] (LiteralData | CompressedData)           │
//! │  Encrypted body : SessionKey EncryptedData                             │
//! │                   └─ EncryptedData decrypts to a plain body            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. Every read is bounds-checked; truncated or
//! trailing input is `MalformedMessage`.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;

use crate::crypto::{KeyId, SymmetricAlgorithm};
use crate::error::{Error, Result};

/// Envelope magic bytes
pub const MAGIC: &[u8; 4] = b"PGPC";

/// Envelope format version
pub const VERSION: u8 = 1;

/// Hash algorithm id for SHA-256 (OpenPGP numbering)
pub const HASH_SHA256: u8 = 8;

/// Compression algorithm id for zlib (OpenPGP numbering)
pub const COMPRESSION_ZLIB: u8 = 2;

/// Literal data format: binary
pub const LITERAL_BINARY: u8 = b'b';

const HEADER_SIZE: usize = 7;
const MAX_FILE_NAME: usize = u8::MAX as usize;

const FLAG_COMPRESSED: u8 = 0b0001;
const FLAG_ENCRYPTED: u8 = 0b0010;
const FLAG_SIGNED: u8 = 0b0100;
const FLAG_ARMORED: u8 = 0b1000;

// ============================================================================
// FLAGS
// ============================================================================

/// Which pipeline stages were applied to a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub compressed: bool,
    pub encrypted: bool,
    pub signed: bool,
    pub armored: bool,
}

impl Flags {
    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.compressed {
            byte |= FLAG_COMPRESSED;
        }
        if self.encrypted {
            byte |= FLAG_ENCRYPTED;
        }
        if self.signed {
            byte |= FLAG_SIGNED;
        }
        if self.armored {
            byte |= FLAG_ARMORED;
        }
        byte
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        let known = FLAG_COMPRESSED | FLAG_ENCRYPTED | FLAG_SIGNED | FLAG_ARMORED;
        if byte & !known != 0 {
            return Err(Error::MalformedMessage(format!("unknown flag bits 0x{:02x}", byte)));
        }
        Ok(Self {
            compressed: byte & FLAG_COMPRESSED != 0,
            encrypted: byte & FLAG_ENCRYPTED != 0,
            signed: byte & FLAG_SIGNED != 0,
            armored: byte & FLAG_ARMORED != 0,
        })
    }
}

// ============================================================================
// PACKETS
// ============================================================================

/// Session key wrapped for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeyPacket {
    pub recipient: KeyId,
    /// RSA-OAEP of `cipher id || session key`
    pub wrapped: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePacket {
    pub signer: KeyId,
    pub created_at: i64,
    pub hash_algorithm: u8,
    /// First two bytes of the signed digest, a cheap pre-check before RSA
    pub digest_prefix: [u8; 2],
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralData {
    pub format: u8,
    pub file_name: String,
    pub timestamp: i64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    pub algorithm: u8,
    /// zlib stream of one encoded LiteralData packet
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    SessionKey(SessionKeyPacket),
    EncryptedData(Vec<u8>),
    Signature(SignaturePacket),
    LiteralData(LiteralData),
    CompressedData(CompressedData),
}

impl Packet {
    pub fn tag(&self) -> u8 {
        match self {
            Packet::SessionKey(_) => 1,
            Packet::EncryptedData(_) => 2,
            Packet::Signature(_) => 3,
            Packet::LiteralData(_) => 4,
            Packet::CompressedData(_) => 5,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Packet::SessionKey(_) => "SessionKey",
            Packet::EncryptedData(_) => "EncryptedData",
            Packet::Signature(_) => "Signature",
            Packet::LiteralData(_) => "LiteralData",
            Packet::CompressedData(_) => "CompressedData",
        }
    }

    /// Encode the packet body (without tag and length)
    pub fn body(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        match self {
            Packet::SessionKey(p) => {
                buf.put_u64(p.recipient.as_u64());
                buf.put_slice(&p.wrapped);
            }
            Packet::EncryptedData(ciphertext) => buf.put_slice(ciphertext),
            Packet::Signature(p) => {
                buf.put_u64(p.signer.as_u64());
                buf.put_i64(p.created_at);
                buf.put_u8(p.hash_algorithm);
                buf.put_slice(&p.digest_prefix);
                buf.put_slice(&p.signature);
            }
            Packet::LiteralData(p) => {
                let name = truncate_file_name(&p.file_name);
                buf.put_u8(p.format);
                buf.put_u8(name.len() as u8);
                buf.put_slice(name.as_bytes());
                buf.put_i64(p.timestamp);
                buf.put_slice(&p.data);
            }
            Packet::CompressedData(p) => {
                buf.put_u8(p.algorithm);
                buf.put_slice(&p.data);
            }
        }
        buf.to_vec()
    }

    fn decode(tag: u8, body: &[u8]) -> Result<Self> {
        let mut r = Reader::new(body);
        let packet = match tag {
            1 => Packet::SessionKey(SessionKeyPacket {
                recipient: KeyId::from_u64(r.u64("recipient key id")?),
                wrapped: r.rest().to_vec(),
            }),
            2 => Packet::EncryptedData(r.rest().to_vec()),
            3 => {
                let signer = KeyId::from_u64(r.u64("signer key id")?);
                let created_at = r.i64("signature time")?;
                let hash_algorithm = r.u8("hash algorithm")?;
                let prefix = r.take(2, "digest prefix")?;
                Packet::Signature(SignaturePacket {
                    signer,
                    created_at,
                    hash_algorithm,
                    digest_prefix: [prefix[0], prefix[1]],
                    signature: r.rest().to_vec(),
                })
            }
            4 => {
                let format = r.u8("literal format")?;
                let name_len = r.u8("file name length")? as usize;
                let name = r.take(name_len, "file name")?;
                let file_name = String::from_utf8(name.to_vec())
                    .map_err(|_| Error::MalformedMessage("file name is not UTF-8".into()))?;
                let timestamp = r.i64("literal timestamp")?;
                Packet::LiteralData(LiteralData {
                    format,
                    file_name,
                    timestamp,
                    data: r.rest().to_vec(),
                })
            }
            5 => Packet::CompressedData(CompressedData {
                algorithm: r.u8("compression algorithm")?,
                data: r.rest().to_vec(),
            }),
            other => {
                return Err(Error::MalformedMessage(format!("unknown packet tag {}", other)));
            }
        };
        Ok(packet)
    }
}

fn truncate_file_name(name: &str) -> &str {
    if name.len() <= MAX_FILE_NAME {
        return name;
    }
    let mut end = MAX_FILE_NAME;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Append `tag | length | body` for each packet
pub fn encode_packets(packets: &[Packet]) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    for packet in packets {
        let body = packet.body();
        let len = u32::try_from(body.len()).map_err(|_| {
            Error::InvalidRequest(format!("{} packet exceeds 4 GiB", packet.name()))
        })?;
        buf.put_u8(packet.tag());
        buf.put_u32(len);
        buf.put_slice(&body);
    }
    Ok(buf.to_vec())
}

/// Parse a packet stream until the input is exhausted
pub fn parse_packets(data: &[u8]) -> Result<Vec<Packet>> {
    let mut r = Reader::new(data);
    let mut packets = Vec::new();
    while r.has_remaining() {
        let tag = r.u8("packet tag")?;
        let len = r.u32("packet length")? as usize;
        let body = r.take(len, "packet body")?;
        packets.push(Packet::decode(tag, body)?);
    }
    Ok(packets)
}

// ============================================================================
// ENVELOPE
// ============================================================================

/// A parsed (but not yet opened) message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub flags: Flags,
    /// Payload cipher; `None` unless the envelope is encrypted
    pub cipher: Option<SymmetricAlgorithm>,
    pub packets: Vec<Packet>,
}

impl Envelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let packets = encode_packets(&self.packets)?;
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + packets.len());
        buf.put_slice(MAGIC);
        buf.put_u8(VERSION);
        buf.put_u8(self.flags.to_byte());
        buf.put_u8(self.cipher.map(|c| c.id()).unwrap_or(0));
        buf.put_slice(&packets);
        Ok(buf.to_vec())
    }

    /// Parse a binary envelope and check its header against its packets
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        if r.take(MAGIC.len(), "magic")? != MAGIC {
            return Err(Error::MalformedMessage("not a pgp-core message".into()));
        }
        let version = r.u8("version")?;
        if version != VERSION {
            return Err(Error::MalformedMessage(format!("unsupported version {}", version)));
        }
        let flags = Flags::from_byte(r.u8("flags")?)?;
        let cipher = match r.u8("cipher")? {
            0 => None,
            id => Some(SymmetricAlgorithm::from_id(id).ok_or_else(|| {
                Error::MalformedMessage(format!("unknown cipher id {}", id))
            })?),
        };

        let envelope = Self {
            flags,
            cipher,
            packets: parse_packets(r.rest())?,
        };
        envelope.check_layout()?;
        Ok(envelope)
    }

    fn check_layout(&self) -> Result<()> {
        if self.flags.encrypted != self.cipher.is_some() {
            return Err(Error::MalformedMessage(
                "cipher byte disagrees with the encrypted flag".into(),
            ));
        }
        if self.flags.encrypted {
            match self.packets.as_slice() {
                [Packet::SessionKey(_), Packet::EncryptedData(_)] => Ok(()),
                _ => Err(Error::MalformedMessage(
                    "encrypted message must hold a session key and encrypted data".into(),
                )),
            }
        } else {
            split_plain_body(&self.packets, self.flags).map(|_| ())
        }
    }

    /// Recipient the session key is wrapped for, if encrypted
    pub fn recipient(&self) -> Option<KeyId> {
        match self.packets.first() {
            Some(Packet::SessionKey(p)) => Some(p.recipient),
            _ => None,
        }
    }

    /// Signer key id, if it is visible without decrypting
    pub fn signer(&self) -> Option<KeyId> {
        self.packets.iter().find_map(|packet| match packet {
            Packet::Signature(p) => Some(p.signer),
            _ => None,
        })
    }
}

/// Split a plain body into its optional signature and its payload packet,
/// checking both against the flags
pub fn split_plain_body(packets: &[Packet], flags: Flags) -> Result<(Option<&SignaturePacket>, &Packet)> {
    let (signature, payload) = match packets {
        [Packet::Signature(sig), payload] => (Some(sig), payload),
        [payload] => (None, payload),
        _ => {
            return Err(Error::MalformedMessage(format!(
                "expected one payload packet, found {} packets",
                packets.len()
            )))
        }
    };

    if signature.is_some() != flags.signed {
        return Err(Error::MalformedMessage(
            "signature packet disagrees with the signed flag".into(),
        ));
    }

    let compressed = match payload {
        Packet::CompressedData(_) => true,
        Packet::LiteralData(_) => false,
        other => {
            return Err(Error::MalformedMessage(format!(
                "unexpected {} packet in payload position",
                other.name()
            )))
        }
    };
    if compressed != flags.compressed {
        return Err(Error::MalformedMessage(
            "payload packet disagrees with the compressed flag".into(),
        ));
    }

    Ok((signature, payload))
}

// ============================================================================
// READER
// ============================================================================

/// Bounds-checked cursor over a byte slice
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(Error::MalformedMessage(format!("truncated {}", what)));
        }
        Ok(())
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        self.need(1, what)?;
        Ok(self.buf.get_u8())
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.need(4, what)?;
        Ok(self.buf.get_u32())
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        self.need(8, what)?;
        Ok(self.buf.get_u64())
    }

    fn i64(&mut self, what: &str) -> Result<i64> {
        self.need(8, what)?;
        Ok(self.buf.get_i64())
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        self.need(n, what)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buf)
    }
}
