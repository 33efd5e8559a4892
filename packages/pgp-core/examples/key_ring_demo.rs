//! # Key Ring Demo
//!
//! Generates two key pairs, moves one of them to a second ring through an
//! exported key-pair block, and shows how password isolation behaves.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example key_ring_demo
//! ```

use pgp_core::{EngineConfig, Error, KdfParams, PgpService};

fn main() {
    println!("=== PGP Core: Key Ring Demo ===\n");

    // Light Argon2 settings so the demo finishes quickly
    let config = EngineConfig {
        kdf: KdfParams {
            memory_kib: 8 * 1024,
            iterations: 1,
            parallelism: 1,
        },
        ..Default::default()
    };

    // Step 1: Generate key pairs
    println!("Step 1: Generating two 2048-bit key pairs...");
    let service = PgpService::open(config.clone()).expect("Failed to open ring");
    let alice = service
        .generate_key_pair("Alice", "alice@example.com", "alice-pw", 2048)
        .expect("Failed to generate Alice");
    let bob = service
        .generate_key_pair("Bob", "bob@example.com", "bob-pw", 2048)
        .expect("Failed to generate Bob");
    println!("  Alice: {}", alice.key_id);
    println!("  Bob:   {}", bob.key_id);
    println!();

    // Step 2: List both rings
    println!("Step 2: Ring contents");
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │  Private ring: key pairs (wrapped under their password)    │");
    println!("  │  Public ring:  public halves of everything we know         │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    for record in service.list_private_key_ring() {
        println!("  [private] {} {} <{}>", record.key_id, record.name, record.email);
    }
    for record in service.list_public_key_ring() {
        println!("  [public]  {} {} <{}>", record.key_id, record.name, record.email);
    }
    println!();

    // Step 3: Password checks
    println!("Step 3: Checking passwords...");
    match service.check_private_key(alice.key_id, "alice-pw") {
        Ok(()) => println!("  [OK] alice-pw unlocks Alice"),
        Err(e) => println!("  [FAILED] {}", e),
    }
    match service.check_private_key(alice.key_id, "bob-pw") {
        Err(Error::IncorrectPassword) => println!("  [OK] bob-pw does not unlock Alice"),
        other => println!("  [FAILED] unexpected result: {:?}", other),
    }
    println!();

    // Step 4: Export Alice and import her into a fresh ring
    println!("Step 4: Moving Alice to another ring...");
    let block = service
        .export_key_pair(alice.key_id, "alice-pw", Some("transfer-pw"))
        .expect("Failed to export");
    println!("  Exported block: {} bytes", block.len());
    println!("  {}", block.lines().next().unwrap_or_default());

    let other = PgpService::open(config).expect("Failed to open second ring");
    let imported = other
        .import_key_pair(block.as_bytes(), "transfer-pw", "alice@laptop", "Alice")
        .expect("Failed to import");
    println!("  Imported as {} ({})", imported.key_id, imported.user_id);
    println!(
        "  Same public key: {}",
        if imported.public_key == alice.public_key { "yes" } else { "no" }
    );
    println!();

    // Step 5: Public key export
    println!("Step 5: Exporting Bob's public key...");
    let pem = service.export_public_key(bob.key_id).expect("Failed to export");
    let known = other
        .import_public_key(pem.as_bytes(), "bob@example.com", "Bob")
        .expect("Failed to import Bob");
    println!("  Second ring now knows {} publicly", known.key_id);
    println!("  Private ring size: {}", other.list_private_key_ring().len());
    println!("  Public ring size:  {}", other.list_public_key_ring().len());
    println!();

    println!("=== Demo Complete ===");
}
