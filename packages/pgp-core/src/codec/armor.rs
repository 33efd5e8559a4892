//! # Radix-64 Armor
//!
//! ASCII armor wraps a binary artifact so it survives copy/paste and
//! text-only transports.
//!
//! ## Armor Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ARMORED BLOCK                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  -----BEGIN PGP MESSAGE-----          ◄── boundary, names the kind     │
//! │  Version: pgp-core 0.1.0              ◄── optional "Key: value" lines  │
//! │                                       ◄── blank separator               │
//! │  owGbwMvMwCEWx...(64 columns)         ◄── base64 body                   │
//! │  ...                                                                    │
//! │  =njUN                                ◄── base64 CRC-24 of the data    │
//! │  -----END PGP MESSAGE-----            ◄── must name the same kind       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checksum is the OpenPGP CRC-24 (init `0xB704CE`, polynomial
//! `0x1864CFB`). Decoding accepts a missing checksum line but rejects a
//! present one that does not match.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};

/// Base64 characters per body line
const LINE_WIDTH: usize = 64;

const CRC24_INIT: u32 = 0x00B7_04CE;
const CRC24_POLY: u32 = 0x0186_4CFB;

/// What an armored block contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmorKind {
    /// A processed message envelope
    Message,
    /// A public key
    PublicKey,
    /// A password-wrapped key pair
    PrivateKey,
}

impl ArmorKind {
    /// The label used in the BEGIN/END boundary lines
    pub fn label(&self) -> &'static str {
        match self {
            ArmorKind::Message => "PGP MESSAGE",
            ArmorKind::PublicKey => "PGP PUBLIC KEY BLOCK",
            ArmorKind::PrivateKey => "PGP PRIVATE KEY BLOCK",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "PGP MESSAGE" => Some(ArmorKind::Message),
            "PGP PUBLIC KEY BLOCK" => Some(ArmorKind::PublicKey),
            "PGP PRIVATE KEY BLOCK" => Some(ArmorKind::PrivateKey),
            _ => None,
        }
    }
}

/// Compute the OpenPGP CRC-24 of `data`
pub fn crc24(data: &[u8]) -> u32 {
    let mut crc = CRC24_INIT;
    for &byte in data {
        crc ^= u32::from(byte) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24_POLY;
            }
        }
    }
    crc & 0x00FF_FFFF
}

fn checksum_line(data: &[u8]) -> String {
    let crc = crc24(data).to_be_bytes();
    format!("={}", STANDARD.encode(&crc[1..]))
}

/// Armor `data` as a `PGP MESSAGE` block
pub fn armor_encode(data: &[u8]) -> String {
    armor_encode_as(ArmorKind::Message, data)
}

/// Armor `data` under the given kind
pub fn armor_encode_as(kind: ArmorKind, data: &[u8]) -> String {
    let body = STANDARD.encode(data);
    let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 128);

    out.push_str("-----BEGIN ");
    out.push_str(kind.label());
    out.push_str("-----\n");
    out.push_str("Version: pgp-core ");
    out.push_str(crate::version());
    out.push_str("\n\n");

    let mut rest = body.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(LINE_WIDTH));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }

    out.push_str(&checksum_line(data));
    out.push('\n');
    out.push_str("-----END ");
    out.push_str(kind.label());
    out.push_str("-----\n");
    out
}

/// Decode an armored block, whatever its kind
pub fn armor_decode(text: &str) -> Result<Vec<u8>> {
    armor_decode_with_kind(text).map(|(_, data)| data)
}

/// Decode an armored block and report its kind
pub fn armor_decode_with_kind(text: &str) -> Result<(ArmorKind, Vec<u8>)> {
    let mut lines = text
        .lines()
        .map(str::trim_end)
        .skip_while(|line| line.is_empty());

    let begin = lines
        .next()
        .ok_or_else(|| Error::MalformedArmor("empty input".into()))?;
    let kind = parse_boundary(begin, "BEGIN")?;

    let mut body = String::new();
    let mut checksum: Option<&str> = None;
    let mut in_headers = true;
    let mut terminated = false;

    for line in lines {
        if line.starts_with("-----END ") {
            let end_kind = parse_boundary(line, "END")?;
            if end_kind != kind {
                return Err(Error::MalformedArmor(format!(
                    "BEGIN {} closed by END {}",
                    kind.label(),
                    end_kind.label()
                )));
            }
            terminated = true;
            break;
        }

        if in_headers {
            if line.is_empty() {
                in_headers = false;
                continue;
            }
            if line.contains(": ") {
                continue;
            }
            // No header block at all; this is already body.
            in_headers = false;
        }

        if checksum.is_some() {
            return Err(Error::MalformedArmor("data after checksum line".into()));
        }
        if let Some(crc) = line.strip_prefix('=') {
            checksum = Some(crc);
            continue;
        }
        if !line.is_empty() {
            body.push_str(line);
        }
    }

    if !terminated {
        return Err(Error::MalformedArmor(format!(
            "missing END {} line",
            kind.label()
        )));
    }

    let data = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| Error::MalformedArmor(format!("invalid base64 body: {}", e)))?;

    if let Some(crc) = checksum {
        let expected = STANDARD
            .decode(crc.as_bytes())
            .map_err(|e| Error::MalformedArmor(format!("invalid checksum encoding: {}", e)))?;
        let actual = crc24(&data).to_be_bytes();
        if expected.as_slice() != &actual[1..] {
            return Err(Error::MalformedArmor("checksum mismatch".into()));
        }
    }

    Ok((kind, data))
}

/// Whether `input` starts (after leading whitespace) with an armor boundary
pub fn is_armored(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input[start..].starts_with(b"-----BEGIN PGP ")
}

fn parse_boundary(line: &str, marker: &str) -> Result<ArmorKind> {
    let label = line
        .strip_prefix("-----")
        .and_then(|l| l.strip_prefix(marker))
        .and_then(|l| l.strip_prefix(' '))
        .and_then(|l| l.strip_suffix("-----"))
        .ok_or_else(|| Error::MalformedArmor(format!("expected {} boundary line", marker)))?;

    ArmorKind::from_label(label)
        .ok_or_else(|| Error::MalformedArmor(format!("unknown armor kind: {}", label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc24_check_value() {
        // CRC-24/OPENPGP check value
        assert_eq!(crc24(b"123456789"), 0x21CF02);
        assert_eq!(crc24(b""), CRC24_INIT);
    }

    #[test]
    fn test_armor_round_trip() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let text = armor_encode(&data);

        assert!(text.starts_with("-----BEGIN PGP MESSAGE-----\n"));
        assert!(text.ends_with("-----END PGP MESSAGE-----\n"));
        assert!(text.lines().all(|l| l.len() <= LINE_WIDTH || l.starts_with("-----")));

        assert_eq!(armor_decode(&text).unwrap(), data);
    }

    #[test]
    fn test_armor_empty_payload() {
        let text = armor_encode(b"");
        assert_eq!(armor_decode(&text).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_armor_kind_preserved() {
        let text = armor_encode_as(ArmorKind::PrivateKey, b"key material");
        let (kind, data) = armor_decode_with_kind(&text).unwrap();
        assert_eq!(kind, ArmorKind::PrivateKey);
        assert_eq!(data, b"key material");
    }

    #[test]
    fn test_armor_accepts_crlf_and_no_headers() {
        let text = armor_encode(b"hello world");
        let stripped: String = text
            .lines()
            .filter(|l| !l.starts_with("Version:") && !l.is_empty())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert_eq!(armor_decode(&stripped).unwrap(), b"hello world");
    }

    #[test]
    fn test_armor_checksum_mismatch() {
        let text = armor_encode(b"hello world");
        let tampered: String = text
            .lines()
            .map(|l| if l.starts_with('=') { "=AAAA" } else { l })
            .collect::<Vec<_>>()
            .join("\n");

        let err = armor_decode(&tampered).unwrap_err();
        assert!(matches!(err, Error::MalformedArmor(_)));
    }

    #[test]
    fn test_armor_truncated() {
        let text = armor_encode(b"hello world");
        let truncated = &text[..text.find("-----END").unwrap()];
        assert!(matches!(
            armor_decode(truncated),
            Err(Error::MalformedArmor(_))
        ));
    }

    #[test]
    fn test_armor_mismatched_boundaries() {
        let text = armor_encode(b"abc").replace("END PGP MESSAGE", "END PGP PUBLIC KEY BLOCK");
        assert!(matches!(armor_decode(&text), Err(Error::MalformedArmor(_))));
    }

    #[test]
    fn test_armor_invalid_alphabet() {
        let text = "-----BEGIN PGP MESSAGE-----\n\n!!!!\n-----END PGP MESSAGE-----\n";
        assert!(matches!(armor_decode(text), Err(Error::MalformedArmor(_))));
    }

    #[test]
    fn test_armor_rejects_unknown_kind() {
        let text = "-----BEGIN PGP SIGNATURE-----\n\nAAAA\n-----END PGP SIGNATURE-----\n";
        assert!(matches!(armor_decode(text), Err(Error::MalformedArmor(_))));
    }

    #[test]
    fn test_is_armored() {
        assert!(is_armored(armor_encode(b"x").as_bytes()));
        assert!(is_armored(b"\n  -----BEGIN PGP MESSAGE-----"));
        assert!(!is_armored(b"PGPC\x01"));
        assert!(!is_armored(b""));
    }
}
