//! # API Dispatcher
//!
//! JSON method router that maps endpoint names to [`PgpService`] calls.
//!
//! Handler implementations live in domain sub-modules:
//!   - `dispatch_keys`: key ring, import and export methods
//!   - `dispatch_messages`: encr_api / decr_api
//!
//! Returns `Ok(json_string)` on success, `Err((error_code, error_json))` on
//! failure, where `error_json` is `{"error": kind, "code": n, "message": text}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use super::{dispatch_keys, dispatch_messages};
use crate::crypto::{Fingerprint, KeyId};
use crate::error::Error;
use crate::keyring::KeyRecord;
use crate::service::PgpService;
use crate::time::to_rfc3339;

pub type DResult = Result<String, (i32, String)>;

// ============================================================================
// HELPERS  (pub(super) so domain modules can use them)
// ============================================================================

/// Build an error payload
pub fn err(code: i32, kind: &str, msg: impl ToString) -> (i32, String) {
    let payload = serde_json::json!({ "error": kind, "code": code, "message": msg.to_string() });
    (code, payload.to_string())
}

/// Render a library error
pub fn core_err(e: Error) -> (i32, String) {
    err(e.code(), e.kind(), &e)
}

/// Parse call arguments; an empty string is an empty object
pub fn json_parse(args: &str) -> Result<Value, (i32, String)> {
    if args.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(args).map_err(|e| err(1, "InvalidJson", format!("Invalid JSON: {}", e)))
}

pub fn require_str<'a>(data: &'a Value, field: &str) -> Result<&'a str, (i32, String)> {
    data[field]
        .as_str()
        .ok_or_else(|| err(2, "MissingField", format!("Missing {}", field)))
}

pub fn optional_str<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data[field].as_str().filter(|s| !s.is_empty())
}

/// Boolean flag; absent means false
pub fn flag(data: &Value, field: &str) -> bool {
    match &data[field] {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "true" | "on" | "1"),
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}

pub fn require_key_id(data: &Value, field: &str) -> Result<KeyId, (i32, String)> {
    KeyId::from_hex(require_str(data, field)?).map_err(core_err)
}

pub fn optional_key_id(data: &Value, field: &str) -> Result<Option<KeyId>, (i32, String)> {
    optional_str(data, field)
        .map(|s| KeyId::from_hex(s).map_err(core_err))
        .transpose()
}

/// Request body: `text` (UTF-8) or `file` (base64)
pub fn payload(data: &Value) -> Result<Vec<u8>, (i32, String)> {
    if let Some(text) = data["text"].as_str() {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(file) = data["file"].as_str() {
        return STANDARD
            .decode(file)
            .map_err(|e| err(3, "InvalidBase64", format!("file is not base64: {}", e)));
    }
    Err(err(2, "MissingField", "Missing text or file"))
}

pub fn ok_json(v: Value) -> DResult {
    Ok(v.to_string())
}

pub fn ok_success() -> DResult {
    Ok(r#"{"success":true}"#.to_string())
}

/// Append `suffix` unless the name already carries it
pub fn with_suffix(name: &str, suffix: &str) -> String {
    if name.to_ascii_lowercase().ends_with(suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

// JSON converter for records; never includes private key material
pub fn key_record_json(r: &KeyRecord) -> Value {
    serde_json::json!({
        "key_id": r.key_id, "name": r.name, "user_id": r.user_id, "email": r.email,
        "created_at": r.created_at, "created_at_rfc3339": to_rfc3339(r.created_at),
        "key_size": r.key_size, "has_private_key": r.has_private_key(),
        "fingerprint": Fingerprint::of_der(&r.public_key).to_hex(),
    })
}

// ============================================================================
// MAIN DISPATCHER
// ============================================================================

/// Routes method calls to a [`PgpService`]
pub struct ApiDispatcher {
    service: PgpService,
}

impl ApiDispatcher {
    pub fn new(service: PgpService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &PgpService {
        &self.service
    }

    pub fn dispatch(&self, method: &str, args: &str) -> DResult {
        let s = &self.service;
        let result = match method {
            // ── Messages ────────────────────────────────────────────────
            "encr_api" => dispatch_messages::encr_api(s, args),
            "decr_api" => dispatch_messages::decr_api(s, args),

            // ── Key ring ────────────────────────────────────────────────
            "generate_key_pair" => dispatch_keys::generate_key_pair(s, args),
            "list_private_key_ring" => dispatch_keys::list_private_key_ring(s),
            "list_public_key_ring" => dispatch_keys::list_public_key_ring(s),
            "get_private_key_by_id" => dispatch_keys::get_private_key_by_id(s, args),
            "remove_key" => dispatch_keys::remove_key(s, args),
            "update_key_metadata" => dispatch_keys::update_key_metadata(s, args),
            "find_keys_by_user_id" => dispatch_keys::find_keys_by_user_id(s, args),
            "find_keys_by_name" => dispatch_keys::find_keys_by_name(s, args),

            // ── Import / export ─────────────────────────────────────────
            "import_public_key" => dispatch_keys::import_public_key(s, args),
            "import_key_pair" => dispatch_keys::import_key_pair(s, args),
            "export_public_key" => dispatch_keys::export_public_key(s, args),
            "export_key_pair" => dispatch_keys::export_key_pair(s, args),

            _ => Err(err(404, "UnknownMethod", format!("Unknown method: {}", method))),
        };

        if let Err((code, _)) = &result {
            tracing::debug!("{} failed with code {}", method, code);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_shape() {
        let (code, body) = core_err(Error::IncorrectPassword);
        assert_eq!(code, 202);
        let v: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["error"], "IncorrectPassword");
        assert_eq!(v["code"], 202);
        assert_eq!(v["message"], "Incorrect password");
    }

    #[test]
    fn test_flag_forms() {
        let v = serde_json::json!({ "a": true, "b": "on", "c": 1, "d": false, "e": "off" });
        assert!(flag(&v, "a"));
        assert!(flag(&v, "b"));
        assert!(flag(&v, "c"));
        assert!(!flag(&v, "d"));
        assert!(!flag(&v, "e"));
        assert!(!flag(&v, "missing"));
    }

    #[test]
    fn test_payload_sources() {
        assert_eq!(payload(&serde_json::json!({ "text": "hi" })).unwrap(), b"hi");
        assert_eq!(payload(&serde_json::json!({ "file": "aGk=" })).unwrap(), b"hi");
        assert_eq!(payload(&serde_json::json!({ "file": "***" })).unwrap_err().0, 3);
        assert_eq!(payload(&serde_json::json!({})).unwrap_err().0, 2);
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("note.txt", ".pgp"), "note.txt.pgp");
        assert_eq!(with_suffix("note.PGP", ".pgp"), "note.PGP");
        assert_eq!(with_suffix("alice", ".pem"), "alice.pem");
    }

    #[test]
    fn test_empty_args_are_empty_object() {
        assert!(json_parse("").unwrap().as_object().unwrap().is_empty());
        assert_eq!(json_parse("{").unwrap_err().0, 1);
    }
}
