//! # Message Demo
//!
//! Seals a message with every option enabled, opens it again, and shows
//! what happens when the armored text is tampered with.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example message_demo
//! ```

use pgp_core::{EncryptRequest, EngineConfig, KdfParams, PgpService, SignatureCheck, SymmetricAlgorithm};

fn main() {
    println!("=== PGP Core: Message Demo ===\n");

    let service = PgpService::open(EngineConfig {
        kdf: KdfParams {
            memory_kib: 8 * 1024,
            iterations: 1,
            parallelism: 1,
        },
        ..Default::default()
    })
    .expect("Failed to open ring");

    println!("Step 1: Generating sender and recipient keys...");
    let alice = service
        .generate_key_pair("Alice", "alice@example.com", "alice-pw", 2048)
        .expect("Failed to generate Alice");
    let bob = service
        .generate_key_pair("Bob", "bob@example.com", "bob-pw", 2048)
        .expect("Failed to generate Bob");
    println!();

    println!("Step 2: Understanding the pipeline");
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │  data ─► literal ─► compress ─► sign ─► encrypt ─► armor   │");
    println!("  │                                                             │");
    println!("  │  Opening runs the same stages in reverse and checks the    │");
    println!("  │  signature before any payload is returned.                 │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    println!("Step 3: Alice seals a note for Bob...");
    let message = "Meet at the usual place at noon.";
    let request = EncryptRequest {
        data: message.as_bytes().to_vec(),
        file_name: "note.txt".into(),
        encrypt: true,
        sign: true,
        compress: true,
        radix64: true,
        cipher: Some(SymmetricAlgorithm::Aes256),
        private_key_id: Some(alice.key_id),
        private_key_password: Some("alice-pw".into()),
        public_key_id: Some(bob.key_id),
    };
    let sealed = service.encrypt_message(&request).expect("Failed to seal");
    let text = String::from_utf8(sealed.clone()).expect("armored output is text");
    for line in text.lines().take(4) {
        println!("  {}", line);
    }
    println!("  ...");
    println!();

    println!("Step 4: Bob opens it...");
    let opened = service.decrypt_message(&sealed, "bob-pw").expect("Failed to open");
    println!("  File name: {}", opened.file_name);
    println!("  Cipher:    {:?}", opened.cipher);
    println!("  Text:      {}", String::from_utf8_lossy(&opened.data));
    match opened.signature {
        Some(SignatureCheck::Valid { signer, .. }) => println!("  [OK] Signed by {}", signer),
        other => println!("  [FAILED] signature: {:?}", other),
    }
    println!();

    println!("Step 5: Tampering with the armored body...");
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    if let Some(line) = lines.iter_mut().skip(2).find(|l| l.len() > 10) {
        let flipped = if line.starts_with('A') { "B" } else { "A" };
        line.replace_range(0..1, flipped);
    }
    let tampered = lines.join("\n");
    match service.decrypt_message(tampered.as_bytes(), "bob-pw") {
        Ok(_) => println!("  [FAILED] tampered message was accepted"),
        Err(e) => println!("  [OK] rejected: {} ({})", e, e.kind()),
    }
    println!();

    println!("=== Demo Complete ===");
}
