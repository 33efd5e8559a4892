//! Message dispatch handlers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::dispatcher::{
    core_err, err, flag, json_parse, ok_json, optional_key_id, optional_str, payload, with_suffix,
    DResult,
};
use crate::crypto::SymmetricAlgorithm;
use crate::service::{EncryptRequest, PgpService};

/// Default output name for text input
const DEFAULT_FILE_NAME: &str = "message";

/// Encrypt, sign, compress and/or armor a message.
///
/// Args:
/// `{ "encrypt", "sign", "compress", "radix64", "cipher"?,
///    "private_key_id"?, "private_key_password"?, "public_key_id"?,
///    "text" | "file", "fileName"? }`
///
/// Returns `{ "file_name", "armored", "data_b64", "text"? }`; `text` is set
/// when the output is armored.
pub fn encr_api(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let cipher = optional_str(&data, "cipher")
        .map(|c| c.parse::<SymmetricAlgorithm>())
        .transpose()
        .map_err(core_err)?;
    let file_name = optional_str(&data, "fileName").unwrap_or(DEFAULT_FILE_NAME);

    let request = EncryptRequest {
        data: payload(&data)?,
        file_name: file_name.to_string(),
        encrypt: flag(&data, "encrypt"),
        sign: flag(&data, "sign"),
        compress: flag(&data, "compress"),
        radix64: flag(&data, "radix64"),
        cipher,
        private_key_id: optional_key_id(&data, "private_key_id")?,
        private_key_password: optional_str(&data, "private_key_password").map(str::to_string),
        public_key_id: optional_key_id(&data, "public_key_id")?,
    };

    let output = service.encrypt_message(&request).map_err(core_err)?;

    let mut response = serde_json::json!({
        "file_name": with_suffix(file_name, ".pgp"),
        "armored": request.radix64,
        "data_b64": STANDARD.encode(&output),
    });
    if request.radix64 {
        let text = String::from_utf8(output)
            .map_err(|e| err(902, "Internal", format!("armored output is not UTF-8: {}", e)))?;
        response["text"] = serde_json::Value::String(text);
    }
    ok_json(response)
}

/// Open a message produced by `encr_api`.
///
/// Args: `{ "text" | "file", "password"? }`
///
/// Returns the payload as `data_b64` (and `text` when it is UTF-8), the
/// stored file name and timestamp, the applied flags and the signature
/// status.
pub fn decr_api(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let input = payload(&data)?;
    let password = optional_str(&data, "password").unwrap_or_default();

    let opened = service.decrypt_message(&input, password).map_err(core_err)?;

    ok_json(serde_json::json!({
        "file_name": opened.file_name,
        "timestamp": opened.timestamp,
        "flags": opened.flags,
        "cipher": opened.cipher.map(|c| c.name()),
        "signature": opened.signature,
        "text": std::str::from_utf8(&opened.data).ok(),
        "data_b64": STANDARD.encode(&opened.data),
    }))
}
