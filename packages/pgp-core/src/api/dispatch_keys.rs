//! Key ring, import and export dispatch handlers.

use super::dispatcher::{
    core_err, json_parse, key_record_json, ok_json, ok_success, optional_str, payload,
    require_key_id, require_str, with_suffix, DResult,
};
use crate::keyring::MetadataUpdate;
use crate::service::PgpService;

/// Default modulus size when the request omits one
const DEFAULT_KEY_SIZE: usize = 2048;

/// Args: `{ "name", "email", "password", "key_size"? }`
pub fn generate_key_pair(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let name = require_str(&data, "name")?;
    let email = require_str(&data, "email")?;
    let password = require_str(&data, "password")?;
    let key_size = match &data["key_size"] {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0) as usize,
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => DEFAULT_KEY_SIZE,
    };

    let record = service
        .generate_key_pair(name, email, password, key_size)
        .map_err(core_err)?;
    ok_json(key_record_json(&record))
}

pub fn list_private_key_ring(service: &PgpService) -> DResult {
    let keys: Vec<_> = service.list_private_key_ring().iter().map(key_record_json).collect();
    ok_json(serde_json::json!({ "keys": keys }))
}

pub fn list_public_key_ring(service: &PgpService) -> DResult {
    let keys: Vec<_> = service.list_public_key_ring().iter().map(key_record_json).collect();
    ok_json(serde_json::json!({ "keys": keys }))
}

/// Args: `{ "key_id", "password" }`
///
/// Only reports whether the password unlocks the key.
pub fn get_private_key_by_id(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let key_id = require_key_id(&data, "key_id")?;
    let password = require_str(&data, "password")?;

    service.check_private_key(key_id, password).map_err(core_err)?;
    ok_success()
}

/// Args: `{ "key_id" }`
pub fn remove_key(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let key_id = require_key_id(&data, "key_id")?;

    let removed = service.remove_key(key_id).map_err(core_err)?;
    ok_json(serde_json::json!({ "success": true, "key_id": removed.key_id }))
}

/// Args: `{ "key_id", "name"?, "user_id"?, "email"? }`
pub fn update_key_metadata(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let key_id = require_key_id(&data, "key_id")?;
    let update = MetadataUpdate {
        name: optional_str(&data, "name").map(str::to_string),
        user_id: optional_str(&data, "user_id").map(str::to_string),
        email: optional_str(&data, "email").map(str::to_string),
    };

    let record = service.update_metadata(key_id, &update).map_err(core_err)?;
    ok_json(key_record_json(&record))
}

/// Args: `{ "user_id" }`
pub fn find_keys_by_user_id(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let user_id = require_str(&data, "user_id")?;
    let keys: Vec<_> = service.find_by_user_id(user_id).iter().map(key_record_json).collect();
    ok_json(serde_json::json!({ "keys": keys }))
}

/// Args: `{ "name" }`
pub fn find_keys_by_name(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let name = require_str(&data, "name")?;
    let keys: Vec<_> = service.find_by_name(name).iter().map(key_record_json).collect();
    ok_json(serde_json::json!({ "keys": keys }))
}

/// Args: `{ "text" | "file", "user_id", "name" }`
pub fn import_public_key(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let bytes = payload(&data)?;
    let user_id = require_str(&data, "user_id")?;
    let name = require_str(&data, "name")?;

    let record = service
        .import_public_key(&bytes, user_id, name)
        .map_err(core_err)?;
    ok_json(key_record_json(&record))
}

/// Args: `{ "text" | "file", "password", "user_id"?, "name"? }`
pub fn import_key_pair(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let bytes = payload(&data)?;
    let password = require_str(&data, "password")?;
    let user_id = optional_str(&data, "user_id").unwrap_or_default();
    let name = optional_str(&data, "name").unwrap_or_default();

    let record = service
        .import_key_pair(&bytes, password, user_id, name)
        .map_err(core_err)?;
    ok_json(key_record_json(&record))
}

/// Args: `{ "key_id", "fileName"? }`
pub fn export_public_key(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let key_id = require_key_id(&data, "key_id")?;
    let file_name = optional_str(&data, "fileName")
        .map(str::to_string)
        .unwrap_or_else(|| key_id.to_hex());

    let content = service.export_public_key(key_id).map_err(core_err)?;
    ok_json(serde_json::json!({
        "file_name": with_suffix(&file_name, ".pem"),
        "content": content,
    }))
}

/// Args: `{ "key_id", "password", "export_password"?, "filename"? }`
pub fn export_key_pair(service: &PgpService, args: &str) -> DResult {
    let data = json_parse(args)?;
    let key_id = require_key_id(&data, "key_id")?;
    let password = require_str(&data, "password")?;
    let export_password = optional_str(&data, "export_password");
    let file_name = optional_str(&data, "filename")
        .map(str::to_string)
        .unwrap_or_else(|| key_id.to_hex());

    let content = service
        .export_key_pair(key_id, password, export_password)
        .map_err(core_err)?;
    ok_json(serde_json::json!({
        "file_name": with_suffix(&file_name, ".asc"),
        "content": content,
    }))
}
