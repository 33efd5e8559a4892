//! Seal and open state machines.
//!
//! Stages run in a fixed order. Sealing compresses before signing and signs
//! before encrypting; opening undoes them in reverse. Both directions are
//! pure functions of their inputs: keys are borrowed for the call only.

use std::collections::HashMap;

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use zeroize::Zeroizing;

use super::packet::{
    encode_packets, parse_packets, split_plain_body, CompressedData, Envelope, Flags, LiteralData,
    Packet, SessionKeyPacket, SignaturePacket, COMPRESSION_ZLIB, HASH_SHA256, LITERAL_BINARY,
};
use crate::codec::{
    armor_decode_with_kind, armor_encode, compress, decompress, is_armored, ArmorKind,
    DEFAULT_DECOMPRESS_LIMIT,
};
use crate::crypto::{asym_decrypt, asym_encrypt, digest, sign, verify, KeyId, SessionKey, SymmetricAlgorithm};
use crate::error::{Error, Result};

// ============================================================================
// KEYS AND OPTIONS
// ============================================================================

/// Resolves signer key ids to public keys during verification
pub trait PublicKeyLookup {
    fn public_key(&self, key_id: KeyId) -> Option<RsaPublicKey>;
}

impl PublicKeyLookup for HashMap<KeyId, RsaPublicKey> {
    fn public_key(&self, key_id: KeyId) -> Option<RsaPublicKey> {
        self.get(&key_id).cloned()
    }
}

/// A private key together with its id
#[derive(Clone, Copy)]
pub struct PrivateKeyRef<'a> {
    pub key_id: KeyId,
    pub key: &'a RsaPrivateKey,
}

/// A public key together with its id
#[derive(Clone, Copy)]
pub struct PublicKeyRef<'a> {
    pub key_id: KeyId,
    pub key: &'a RsaPublicKey,
}

#[derive(Clone, Copy, Default)]
pub struct SealKeys<'a> {
    pub signer: Option<PrivateKeyRef<'a>>,
    pub recipient: Option<PublicKeyRef<'a>>,
}

pub struct OpenKeys<'a> {
    /// Needed only for encrypted messages
    pub recipient: Option<PrivateKeyRef<'a>>,
    pub verifiers: &'a dyn PublicKeyLookup,
}

/// Which stages to apply when sealing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealOptions {
    pub encrypt: bool,
    pub sign: bool,
    pub compress: bool,
    pub armor: bool,
    pub cipher: SymmetricAlgorithm,
    /// Stored in the literal packet; truncated to 255 bytes
    pub file_name: String,
    /// Stored in the literal packet and the signature (unix seconds)
    pub timestamp: i64,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            encrypt: false,
            sign: false,
            compress: false,
            armor: false,
            cipher: SymmetricAlgorithm::default(),
            file_name: String::new(),
            timestamp: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Largest payload accepted after decompression
    pub max_message_size: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_DECOMPRESS_LIMIT,
        }
    }
}

/// Outcome of checking a message signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignatureCheck {
    /// Verified against the signer's public key
    Valid { signer: KeyId, created_at: i64 },
    /// The signer's public key is not available; the payload is unverified
    UnknownSigner { signer: KeyId },
}

/// The recovered payload and what was done to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedMessage {
    pub data: Vec<u8>,
    pub file_name: String,
    pub timestamp: i64,
    pub flags: Flags,
    pub cipher: Option<SymmetricAlgorithm>,
    pub signature: Option<SignatureCheck>,
}

// ============================================================================
// SEAL
// ============================================================================

/// Run `data` through the requested stages
///
/// ## Errors
///
/// - `NoSigningKey` if `sign` is set without a signer
/// - `NoRecipientKey` if `encrypt` is set without a recipient
///
/// Both are checked before any work is done.
pub fn seal(data: &[u8], options: &SealOptions, keys: &SealKeys<'_>) -> Result<Vec<u8>> {
    let signer = match (options.sign, keys.signer) {
        (true, None) => return Err(Error::NoSigningKey),
        (true, signer) => signer,
        (false, _) => None,
    };
    let recipient = match (options.encrypt, keys.recipient) {
        (true, None) => return Err(Error::NoRecipientKey),
        (true, recipient) => recipient,
        (false, _) => None,
    };

    let literal = Packet::LiteralData(LiteralData {
        format: LITERAL_BINARY,
        file_name: options.file_name.clone(),
        timestamp: options.timestamp,
        data: data.to_vec(),
    });

    let payload = if options.compress {
        let inner = encode_packets(std::slice::from_ref(&literal))?;
        let packed = compress(&inner);
        tracing::debug!("Compressed {} bytes to {}", inner.len(), packed.len());
        Packet::CompressedData(CompressedData {
            algorithm: COMPRESSION_ZLIB,
            data: packed,
        })
    } else {
        literal
    };

    let mut body = Vec::with_capacity(2);
    if let Some(signer) = signer {
        body.push(Packet::Signature(sign_payload(&payload, signer, options.timestamp)?));
        tracing::debug!("Signed payload with key {}", signer.key_id);
    }
    body.push(payload);

    let flags = Flags {
        compressed: options.compress,
        encrypted: recipient.is_some(),
        signed: signer.is_some(),
        armored: options.armor,
    };

    let envelope = match recipient {
        Some(recipient) => {
            let session_key = SessionKey::generate(options.cipher);
            let ciphertext = session_key.encrypt(&encode_packets(&body)?)?;

            let mut secret = Zeroizing::new(Vec::with_capacity(1 + options.cipher.key_size()));
            secret.push(options.cipher.id());
            secret.extend_from_slice(session_key.as_bytes());
            let wrapped = asym_encrypt(recipient.key, &secret)?;

            tracing::debug!(
                "Encrypted payload with {} for key {}",
                options.cipher,
                recipient.key_id
            );
            Envelope {
                flags,
                cipher: Some(options.cipher),
                packets: vec![
                    Packet::SessionKey(SessionKeyPacket {
                        recipient: recipient.key_id,
                        wrapped,
                    }),
                    Packet::EncryptedData(ciphertext),
                ],
            }
        }
        None => Envelope {
            flags,
            cipher: None,
            packets: body,
        },
    };

    let bytes = envelope.to_bytes()?;
    if options.armor {
        Ok(armor_encode(&bytes).into_bytes())
    } else {
        Ok(bytes)
    }
}

/// Bytes covered by a signature: payload body, then creation time and key id
fn signed_bytes(payload: &Packet, created_at: i64, signer: KeyId) -> Vec<u8> {
    let mut bytes = payload.body();
    bytes.extend_from_slice(&created_at.to_be_bytes());
    bytes.extend_from_slice(&signer.as_u64().to_be_bytes());
    bytes
}

fn sign_payload(payload: &Packet, signer: PrivateKeyRef<'_>, created_at: i64) -> Result<SignaturePacket> {
    let signed = signed_bytes(payload, created_at, signer.key_id);
    let hash = digest(&signed);
    Ok(SignaturePacket {
        signer: signer.key_id,
        created_at,
        hash_algorithm: HASH_SHA256,
        digest_prefix: [hash[0], hash[1]],
        signature: sign(signer.key, &signed)?,
    })
}

// ============================================================================
// OPEN
// ============================================================================

/// Parse raw or armored input into an [`Envelope`]
pub fn read_envelope(input: &[u8]) -> Result<Envelope> {
    if is_armored(input) {
        let text = std::str::from_utf8(input)
            .map_err(|_| Error::MalformedArmor("armored text is not UTF-8".into()))?;
        let (kind, bytes) = armor_decode_with_kind(text)?;
        if kind != ArmorKind::Message {
            return Err(Error::MalformedArmor(format!(
                "expected {}, found {}",
                ArmorKind::Message.label(),
                kind.label()
            )));
        }
        let mut envelope = Envelope::from_bytes(&bytes)?;
        envelope.flags.armored = true;
        Ok(envelope)
    } else {
        // The header bit records how the message was sealed, not how it arrived
        let mut envelope = Envelope::from_bytes(input)?;
        envelope.flags.armored = false;
        Ok(envelope)
    }
}

/// Undo every stage recorded in `envelope`
///
/// ## Errors
///
/// - `NoRecipientKey` if the message is encrypted and no key was supplied
/// - `KeyNotFound` if the supplied key is not the one the message is for
/// - `DecryptionFailed` if the session key or payload does not decrypt
/// - `SignatureMismatch` if a signature from a known signer does not verify
/// - `MalformedMessage` if the decrypted body is inconsistent
pub fn open(envelope: &Envelope, keys: &OpenKeys<'_>, options: &OpenOptions) -> Result<OpenedMessage> {
    let decrypted;
    let body: &[Packet] = match envelope.packets.as_slice() {
        [Packet::SessionKey(session), Packet::EncryptedData(ciphertext)] if envelope.flags.encrypted => {
            let recipient = keys.recipient.ok_or(Error::NoRecipientKey)?;
            if recipient.key_id != session.recipient {
                return Err(Error::KeyNotFound(session.recipient));
            }
            let cipher = envelope
                .cipher
                .ok_or_else(|| Error::MalformedMessage("encrypted message without cipher".into()))?;

            let session_key = unwrap_session_key(recipient.key, &session.wrapped, cipher)?;
            let plaintext = Zeroizing::new(session_key.decrypt(ciphertext)?);
            decrypted = parse_packets(&plaintext)?;
            tracing::debug!("Decrypted {} payload for key {}", cipher, recipient.key_id);
            &decrypted
        }
        packets if !envelope.flags.encrypted => packets,
        _ => {
            return Err(Error::MalformedMessage(
                "encrypted message must hold a session key and encrypted data".into(),
            ))
        }
    };

    let (signature, payload) = split_plain_body(body, envelope.flags)?;

    let signature = match signature {
        Some(sig) => Some(check_signature(sig, payload, keys.verifiers)?),
        None => None,
    };

    let literal = match payload {
        Packet::LiteralData(literal) => literal.clone(),
        Packet::CompressedData(compressed) => inflate_literal(compressed, options.max_message_size)?,
        _ => return Err(Error::MalformedMessage("payload is not literal data".into())),
    };

    if literal.data.len() > options.max_message_size {
        return Err(Error::MalformedMessage(format!(
            "payload of {} bytes exceeds limit of {}",
            literal.data.len(),
            options.max_message_size
        )));
    }

    Ok(OpenedMessage {
        data: literal.data,
        file_name: literal.file_name,
        timestamp: literal.timestamp,
        flags: envelope.flags,
        cipher: envelope.cipher,
        signature,
    })
}

fn unwrap_session_key(
    private_key: &RsaPrivateKey,
    wrapped: &[u8],
    cipher: SymmetricAlgorithm,
) -> Result<SessionKey> {
    let secret = asym_decrypt(private_key, wrapped)?;
    match secret.split_first() {
        Some((&id, key)) if id == cipher.id() => SessionKey::from_bytes(cipher, key)
            .map_err(|_| Error::DecryptionFailed("session key has the wrong length".into())),
        _ => Err(Error::DecryptionFailed(
            "session key does not match the message cipher".into(),
        )),
    }
}

fn check_signature(
    sig: &SignaturePacket,
    payload: &Packet,
    verifiers: &dyn PublicKeyLookup,
) -> Result<SignatureCheck> {
    if sig.hash_algorithm != HASH_SHA256 {
        return Err(Error::MalformedSignature(format!(
            "unsupported hash algorithm {}",
            sig.hash_algorithm
        )));
    }

    let Some(public_key) = verifiers.public_key(sig.signer) else {
        tracing::warn!("Signer {} not in key ring; signature not checked", sig.signer);
        return Ok(SignatureCheck::UnknownSigner { signer: sig.signer });
    };

    let signed = signed_bytes(payload, sig.created_at, sig.signer);
    let hash = digest(&signed);
    if hash[..2] != sig.digest_prefix {
        return Err(Error::SignatureMismatch(sig.signer));
    }

    match verify(&public_key, &signed, &sig.signature) {
        Ok(true) => Ok(SignatureCheck::Valid {
            signer: sig.signer,
            created_at: sig.created_at,
        }),
        Ok(false) | Err(Error::MalformedSignature(_)) => Err(Error::SignatureMismatch(sig.signer)),
        Err(e) => Err(e),
    }
}

fn inflate_literal(compressed: &CompressedData, limit: usize) -> Result<LiteralData> {
    if compressed.algorithm != COMPRESSION_ZLIB {
        return Err(Error::CorruptCompressedData(format!(
            "unsupported compression algorithm {}",
            compressed.algorithm
        )));
    }
    // Leave room for the literal packet framing around the payload.
    let inflated = decompress(&compressed.data, limit.saturating_add(512))?;
    match <[Packet; 1]>::try_from(parse_packets(&inflated)?) {
        Ok([Packet::LiteralData(literal)]) => Ok(literal),
        _ => Err(Error::MalformedMessage(
            "compressed data must hold exactly one literal data packet".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_keys::{ALICE, BOB};

    struct Parties {
        alice_id: KeyId,
        alice_public: RsaPublicKey,
        bob_id: KeyId,
        bob_public: RsaPublicKey,
    }

    fn parties() -> Parties {
        let alice_public = ALICE.to_public_key();
        let bob_public = BOB.to_public_key();
        Parties {
            alice_id: KeyId::of(&alice_public).unwrap(),
            bob_id: KeyId::of(&bob_public).unwrap(),
            alice_public,
            bob_public,
        }
    }

    fn no_verifiers() -> HashMap<KeyId, RsaPublicKey> {
        HashMap::new()
    }

    fn options(encrypt: bool, sign: bool, compress: bool, armor: bool) -> SealOptions {
        SealOptions {
            encrypt,
            sign,
            compress,
            armor,
            file_name: "hello.txt".into(),
            timestamp: 1_700_000_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_every_flag_combination_round_trips() {
        let p = parties();
        let verifiers = HashMap::from([(p.alice_id, p.alice_public.clone())]);
        let data = b"The quick brown fox jumps over the lazy dog. ".repeat(20);

        for bits in 0u8..16 {
            let opts = options(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let sealed = seal(
                &data,
                &opts,
                &SealKeys {
                    signer: Some(PrivateKeyRef { key_id: p.alice_id, key: &ALICE }),
                    recipient: Some(PublicKeyRef { key_id: p.bob_id, key: &p.bob_public }),
                },
            )
            .unwrap();

            let envelope = read_envelope(&sealed).unwrap();
            let opened = open(
                &envelope,
                &OpenKeys {
                    recipient: Some(PrivateKeyRef { key_id: p.bob_id, key: &BOB }),
                    verifiers: &verifiers,
                },
                &OpenOptions::default(),
            )
            .unwrap();

            assert_eq!(opened.data, data, "flags {:04b}", bits);
            assert_eq!(opened.file_name, "hello.txt");
            assert_eq!(opened.timestamp, 1_700_000_000);
            assert_eq!(opened.flags.encrypted, opts.encrypt);
            assert_eq!(opened.flags.signed, opts.sign);
            assert_eq!(opened.flags.compressed, opts.compress);
            assert_eq!(opened.flags.armored, opts.armor);
            if opts.sign {
                assert_eq!(
                    opened.signature,
                    Some(SignatureCheck::Valid {
                        signer: p.alice_id,
                        created_at: 1_700_000_000
                    })
                );
            } else {
                assert_eq!(opened.signature, None);
            }
        }
    }

    #[test]
    fn test_each_cipher_round_trips() {
        let p = parties();
        for cipher in [
            SymmetricAlgorithm::Aes128,
            SymmetricAlgorithm::Aes256,
            SymmetricAlgorithm::TripleDes,
        ] {
            let opts = SealOptions {
                encrypt: true,
                cipher,
                ..Default::default()
            };
            let sealed = seal(
                b"secret",
                &opts,
                &SealKeys {
                    recipient: Some(PublicKeyRef { key_id: p.bob_id, key: &p.bob_public }),
                    ..Default::default()
                },
            )
            .unwrap();
            let envelope = read_envelope(&sealed).unwrap();
            assert_eq!(envelope.cipher, Some(cipher));

            let opened = open(
                &envelope,
                &OpenKeys {
                    recipient: Some(PrivateKeyRef { key_id: p.bob_id, key: &BOB }),
                    verifiers: &no_verifiers(),
                },
                &OpenOptions::default(),
            )
            .unwrap();
            assert_eq!(opened.data, b"secret");
        }
    }

    #[test]
    fn test_missing_keys_fail_fast() {
        assert!(matches!(
            seal(b"x", &options(false, true, false, false), &SealKeys::default()),
            Err(Error::NoSigningKey)
        ));
        assert!(matches!(
            seal(b"x", &options(true, false, false, false), &SealKeys::default()),
            Err(Error::NoRecipientKey)
        ));
    }

    #[test]
    fn test_plain_armor_is_a_pgp_message() {
        let sealed = seal(b"hi", &options(false, false, false, true), &SealKeys::default()).unwrap();
        let text = String::from_utf8(sealed).unwrap();
        assert!(text.starts_with("-----BEGIN PGP MESSAGE-----"));
        assert!(text.trim_end().ends_with("-----END PGP MESSAGE-----"));
    }

    #[test]
    fn test_tampered_ciphertext_fails_decryption() {
        let p = parties();
        let sealed = seal(
            b"attack at dawn",
            &options(true, false, false, false),
            &SealKeys {
                recipient: Some(PublicKeyRef { key_id: p.bob_id, key: &p.bob_public }),
                ..Default::default()
            },
        )
        .unwrap();

        let mut envelope = read_envelope(&sealed).unwrap();
        if let Packet::EncryptedData(ciphertext) = &mut envelope.packets[1] {
            let last = ciphertext.len() - 1;
            ciphertext[last] ^= 0x01;
        }

        let result = open(
            &envelope,
            &OpenKeys {
                recipient: Some(PrivateKeyRef { key_id: p.bob_id, key: &BOB }),
                verifiers: &no_verifiers(),
            },
            &OpenOptions::default(),
        );
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_wrong_recipient_key() {
        let p = parties();
        let sealed = seal(
            b"for bob",
            &options(true, false, false, false),
            &SealKeys {
                recipient: Some(PublicKeyRef { key_id: p.bob_id, key: &p.bob_public }),
                ..Default::default()
            },
        )
        .unwrap();
        let envelope = read_envelope(&sealed).unwrap();
        assert_eq!(envelope.recipient(), Some(p.bob_id));

        let no_key = open(
            &envelope,
            &OpenKeys { recipient: None, verifiers: &no_verifiers() },
            &OpenOptions::default(),
        );
        assert!(matches!(no_key, Err(Error::NoRecipientKey)));

        let wrong_key = open(
            &envelope,
            &OpenKeys {
                recipient: Some(PrivateKeyRef { key_id: p.alice_id, key: &ALICE }),
                verifiers: &no_verifiers(),
            },
            &OpenOptions::default(),
        );
        assert!(matches!(wrong_key, Err(Error::KeyNotFound(id)) if id == p.bob_id));

        // Right id, wrong key material
        let mismatched = open(
            &envelope,
            &OpenKeys {
                recipient: Some(PrivateKeyRef { key_id: p.bob_id, key: &ALICE }),
                verifiers: &no_verifiers(),
            },
            &OpenOptions::default(),
        );
        assert!(matches!(mismatched, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_signature_from_wrong_key_is_mismatch() {
        let p = parties();
        let sealed = seal(
            b"signed",
            &options(false, true, false, false),
            &SealKeys {
                signer: Some(PrivateKeyRef { key_id: p.alice_id, key: &ALICE }),
                ..Default::default()
            },
        )
        .unwrap();
        let envelope = read_envelope(&sealed).unwrap();

        // Alice's id mapped to Bob's key
        let verifiers = HashMap::from([(p.alice_id, p.bob_public.clone())]);
        let result = open(
            &envelope,
            &OpenKeys { recipient: None, verifiers: &verifiers },
            &OpenOptions::default(),
        );
        assert!(matches!(result, Err(Error::SignatureMismatch(id)) if id == p.alice_id));
    }

    #[test]
    fn test_mutated_signed_payload_is_mismatch() {
        let p = parties();
        let sealed = seal(
            b"pay 10",
            &options(false, true, false, false),
            &SealKeys {
                signer: Some(PrivateKeyRef { key_id: p.alice_id, key: &ALICE }),
                ..Default::default()
            },
        )
        .unwrap();
        let mut envelope = read_envelope(&sealed).unwrap();
        if let Packet::LiteralData(literal) = &mut envelope.packets[1] {
            literal.data = b"pay 99".to_vec();
        }

        let verifiers = HashMap::from([(p.alice_id, p.alice_public.clone())]);
        let result = open(
            &envelope,
            &OpenKeys { recipient: None, verifiers: &verifiers },
            &OpenOptions::default(),
        );
        assert!(matches!(result, Err(Error::SignatureMismatch(_))));
    }

    #[test]
    fn test_unknown_signer_returns_plaintext() {
        let p = parties();
        let sealed = seal(
            b"from alice",
            &options(false, true, true, false),
            &SealKeys {
                signer: Some(PrivateKeyRef { key_id: p.alice_id, key: &ALICE }),
                ..Default::default()
            },
        )
        .unwrap();
        let envelope = read_envelope(&sealed).unwrap();
        let opened = open(
            &envelope,
            &OpenKeys { recipient: None, verifiers: &no_verifiers() },
            &OpenOptions::default(),
        )
        .unwrap();

        assert_eq!(opened.data, b"from alice");
        assert_eq!(
            opened.signature,
            Some(SignatureCheck::UnknownSigner { signer: p.alice_id })
        );
    }

    #[test]
    fn test_decompression_limit() {
        let data = vec![0u8; 64 * 1024];
        let sealed = seal(&data, &options(false, false, true, false), &SealKeys::default()).unwrap();
        let envelope = read_envelope(&sealed).unwrap();

        let result = open(
            &envelope,
            &OpenKeys { recipient: None, verifiers: &no_verifiers() },
            &OpenOptions { max_message_size: 1024 },
        );
        assert!(matches!(result, Err(Error::CorruptCompressedData(_))));
    }

    #[test]
    fn test_compressed_stream_with_extra_packets_rejected() {
        let literal = |text: &str| {
            Packet::LiteralData(LiteralData {
                format: LITERAL_BINARY,
                file_name: String::new(),
                timestamp: 0,
                data: text.as_bytes().to_vec(),
            })
        };
        let inner = encode_packets(&[literal("decoy"), literal("payload")]).unwrap();
        let envelope = Envelope {
            flags: Flags {
                compressed: true,
                ..Default::default()
            },
            cipher: None,
            packets: vec![Packet::CompressedData(CompressedData {
                algorithm: COMPRESSION_ZLIB,
                data: compress(&inner),
            })],
        };

        let result = open(
            &envelope,
            &OpenKeys { recipient: None, verifiers: &no_verifiers() },
            &OpenOptions::default(),
        );
        assert!(matches!(result, Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_dearmored_input_reports_binary() {
        let sealed = seal(b"hello", &options(false, false, true, true), &SealKeys::default()).unwrap();
        let text = std::str::from_utf8(&sealed).unwrap();
        let raw = crate::codec::armor_decode(text).unwrap();

        assert!(read_envelope(&sealed).unwrap().flags.armored);
        let envelope = read_envelope(&raw).unwrap();
        assert!(!envelope.flags.armored);

        let opened = open(
            &envelope,
            &OpenKeys { recipient: None, verifiers: &no_verifiers() },
            &OpenOptions::default(),
        )
        .unwrap();
        assert_eq!(opened.data, b"hello");
        assert!(!opened.flags.armored);
    }

    #[test]
    fn test_armor_of_wrong_kind_rejected() {
        let text = crate::codec::armor_encode_as(ArmorKind::PublicKey, b"not a message");
        assert!(matches!(
            read_envelope(text.as_bytes()),
            Err(Error::MalformedArmor(_))
        ));
    }
}
