//! pgp: command-line front end for pgp-core.
//!
//! Manages the key ring, seals and opens messages, and forwards raw JSON
//! calls to the same dispatcher a web front end would use.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use pgp_core::{
    ApiDispatcher, EncryptRequest, EngineConfig, KdfParams, KeyId, KeyRecord, PgpService,
    SignatureCheck, SymmetricAlgorithm,
};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pgp", version, about = "OpenPGP-style key ring and message tool")]
struct Args {
    /// Key ring database file
    #[arg(long, env = "PGP_DB")]
    db: Option<PathBuf>,

    /// Argon2id memory cost in KiB for newly wrapped private keys
    #[arg(long, default_value_t = 65536, env = "PGP_KDF_MEMORY_KIB")]
    kdf_memory_kib: u32,

    /// Argon2id passes
    #[arg(long, default_value_t = 3, env = "PGP_KDF_ITERATIONS")]
    kdf_iterations: u32,

    /// Argon2id lanes
    #[arg(long, default_value_t = 1, env = "PGP_KDF_PARALLELISM")]
    kdf_parallelism: u32,

    /// Payload cipher when a command does not name one (aes128, aes256, 3des)
    #[arg(long, default_value = "aes128", env = "PGP_CIPHER")]
    cipher: SymmetricAlgorithm,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair
    Generate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PGP_PASSWORD")]
        password: String,
        #[arg(long, default_value_t = 2048)]
        key_size: usize,
    },
    /// List the private ring (or the public ring with --public)
    List {
        #[arg(long)]
        public: bool,
    },
    /// Seal a file
    Encrypt {
        input: PathBuf,
        /// Defaults to the input path with ".pgp" appended
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Recipient key id; enables encryption
        #[arg(long)]
        to: Option<KeyId>,
        /// Signing key id; enables signing
        #[arg(long)]
        sign_with: Option<KeyId>,
        /// Password of the signing key
        #[arg(long, env = "PGP_PASSWORD")]
        password: Option<String>,
        #[arg(long)]
        compress: bool,
        #[arg(long)]
        armor: bool,
        #[arg(long)]
        cipher: Option<SymmetricAlgorithm>,
    },
    /// Open a sealed file
    Decrypt {
        input: PathBuf,
        /// Defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Password of the recipient key
        #[arg(long, env = "PGP_PASSWORD", default_value = "")]
        password: String,
    },
    /// Write a public key as PEM
    ExportPublic {
        key_id: KeyId,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a password-protected key pair block
    ExportPair {
        key_id: KeyId,
        #[arg(long, env = "PGP_PASSWORD")]
        password: String,
        /// Protects the exported copy; defaults to the ring password
        #[arg(long)]
        export_password: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add someone's public key to the public ring
    ImportPublic {
        input: PathBuf,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: String,
    },
    /// Add an exported key pair to the private ring
    ImportPair {
        input: PathBuf,
        #[arg(long, env = "PGP_PASSWORD")]
        password: String,
        #[arg(long, default_value = "")]
        user_id: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Remove a key from both rings
    Remove { key_id: KeyId },
    /// Invoke a dispatcher method with JSON arguments
    Call {
        method: String,
        #[arg(default_value = "{}")]
        args: String,
    },
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgp_core=info,pgp=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = EngineConfig {
        database_path: Some(database_path(args.db)?),
        kdf: KdfParams {
            memory_kib: args.kdf_memory_kib,
            iterations: args.kdf_iterations,
            parallelism: args.kdf_parallelism,
        },
        default_cipher: args.cipher,
        ..Default::default()
    };
    tracing::info!("pgp v{} using {:?}", pgp_core::version(), config.database_path);

    let service = PgpService::open(config).wrap_err("failed to open key ring")?;
    run(service, args.command).await
}

fn database_path(explicit: Option<PathBuf>) -> color_eyre::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let dir = dirs::data_dir()
        .ok_or_else(|| eyre!("no data directory; pass --db"))?
        .join("pgp-core");
    std::fs::create_dir_all(&dir).wrap_err_with(|| format!("cannot create {}", dir.display()))?;
    Ok(dir.join("keyring.db"))
}

async fn run(service: PgpService, command: Command) -> color_eyre::Result<()> {
    match command {
        Command::Generate {
            name,
            email,
            password,
            key_size,
        } => {
            let record = service
                .generate_key_pair_async(name, email, password, key_size)
                .await?;
            println!("Generated {}", describe(&record));
        }

        Command::List { public } => {
            let records = if public {
                service.list_public_key_ring()
            } else {
                service.list_private_key_ring()
            };
            if records.is_empty() {
                println!("(no keys)");
            }
            for record in &records {
                println!("{}", describe(record));
            }
        }

        Command::Encrypt {
            input,
            output,
            to,
            sign_with,
            password,
            compress,
            armor,
            cipher,
        } => {
            let data = read(&input)?;
            let file_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let request = EncryptRequest {
                data,
                file_name,
                encrypt: to.is_some(),
                sign: sign_with.is_some(),
                compress,
                radix64: armor,
                cipher,
                private_key_id: sign_with,
                private_key_password: password,
                public_key_id: to,
            };
            let sealed = service.encrypt_message_async(request).await?;

            let output = output.unwrap_or_else(|| {
                let mut name = input.clone().into_os_string();
                name.push(".pgp");
                PathBuf::from(name)
            });
            write(&output, &sealed)?;
            println!("Wrote {}", output.display());
        }

        Command::Decrypt {
            input,
            output,
            password,
        } => {
            let opened = service.decrypt_message_async(read(&input)?, password).await?;

            match opened.signature {
                Some(SignatureCheck::Valid { signer, .. }) => {
                    eprintln!("Good signature from {}", signer)
                }
                Some(SignatureCheck::UnknownSigner { signer }) => {
                    eprintln!("Signed by {} (key not in ring, not verified)", signer)
                }
                None => {}
            }

            match output {
                Some(path) => {
                    write(&path, &opened.data)?;
                    eprintln!("Wrote {} ({})", path.display(), opened.file_name);
                }
                None => std::io::stdout().write_all(&opened.data)?,
            }
        }

        Command::ExportPublic { key_id, output } => {
            let pem = service.export_public_key(key_id)?;
            emit(output.as_deref(), pem.as_bytes())?;
        }

        Command::ExportPair {
            key_id,
            password,
            export_password,
            output,
        } => {
            let block = service.export_key_pair(key_id, &password, export_password.as_deref())?;
            emit(output.as_deref(), block.as_bytes())?;
        }

        Command::ImportPublic {
            input,
            user_id,
            name,
        } => {
            let record = service.import_public_key(&read(&input)?, &user_id, &name)?;
            println!("Imported {}", describe(&record));
        }

        Command::ImportPair {
            input,
            password,
            user_id,
            name,
        } => {
            let record = service.import_key_pair(&read(&input)?, &password, &user_id, &name)?;
            println!("Imported {}", describe(&record));
        }

        Command::Remove { key_id } => {
            let record = service.remove_key(key_id)?;
            println!("Removed {}", describe(&record));
        }

        Command::Call { method, args } => {
            let dispatcher = ApiDispatcher::new(service);
            match dispatcher.dispatch(&method, &args) {
                Ok(json) => println!("{}", json),
                Err((code, json)) => {
                    println!("{}", json);
                    return Err(eyre!("{} failed with code {}", method, code));
                }
            }
        }
    }

    Ok(())
}

fn describe(record: &KeyRecord) -> String {
    format!(
        "{}  {:>4} bits  {} <{}>{}",
        record.key_id,
        record.key_size,
        record.name,
        record.email,
        if record.has_private_key() { "  [pair]" } else { "" }
    )
}

fn read(path: &Path) -> color_eyre::Result<Vec<u8>> {
    std::fs::read(path).wrap_err_with(|| format!("cannot read {}", path.display()))
}

fn write(path: &Path, data: &[u8]) -> color_eyre::Result<()> {
    std::fs::write(path, data).wrap_err_with(|| format!("cannot write {}", path.display()))
}

fn emit(output: Option<&Path>, data: &[u8]) -> color_eyre::Result<()> {
    match output {
        Some(path) => write(path, data),
        None => Ok(std::io::stdout().write_all(data)?),
    }
}
