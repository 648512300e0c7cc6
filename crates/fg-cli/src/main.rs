//! forgeguard: operator CLI for the forgeguard security primitives
//!
//! Keyed commands (need a configured encryption key and token secrets):
//!   encrypt / decrypt            - AES-256-GCM envelopes
//!   sign / verify-signature      - HMAC-SHA256 signatures
//!   hash-data                    - deterministic lookup hash
//!   issue-tokens / verify-token  - access/refresh token pairs
//!
//! Unkeyed commands:
//!   keygen, hash-password, verify-password, decode-token,
//!   compress, decompress, compress-file, decompress-file, sanitize

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};

use fg_core::config::ForgeguardConfig;
use fg_core::sanitize;
use fg_crypto::{PasswordHashing, SecurityContext, TokenPayload};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "forgeguard",
    version,
    about = "forgeguard security toolkit",
    long_about = "forgeguard: encrypt, sign, hash, issue tokens, compress and sanitize from the shell"
)]
struct Cli {
    /// Path to forgeguard.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "FORGEGUARD_CONFIG",
        default_value = "/etc/forgeguard/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [logging].level
    #[arg(long, env = "FORGEGUARD_LOG")]
    log: Option<String>,

    /// Log format; overrides [logging].format
    #[arg(long, env = "FORGEGUARD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a fresh encryption key and token secrets as a config snippet
    Keygen,

    /// Encrypt text into an iv:tag:ciphertext envelope
    Encrypt {
        /// Plaintext (read from stdin when omitted)
        text: Option<String>,
    },

    /// Decrypt an envelope produced by `encrypt`
    Decrypt {
        /// Envelope (read from stdin when omitted)
        envelope: Option<String>,
    },

    /// Hash a password into an Argon2id PHC string
    #[command(name = "hash-password")]
    HashPassword {
        /// Password (read from stdin when omitted)
        password: Option<String>,
    },

    /// Check a password against a stored hash; exits non-zero on mismatch
    #[command(name = "verify-password")]
    VerifyPassword {
        /// Stored PHC hash string
        #[arg(long)]
        hash: String,
        /// Password (read from stdin when omitted)
        password: Option<String>,
    },

    /// HMAC-SHA256 signature of the input, hex encoded
    Sign {
        /// Data (read from stdin when omitted)
        data: Option<String>,
    },

    /// Check a signature; exits non-zero on mismatch
    #[command(name = "verify-signature")]
    VerifySignature {
        /// Hex signature from `sign`
        #[arg(long)]
        signature: String,
        /// Data (read from stdin when omitted)
        data: Option<String>,
    },

    /// Deterministic keyed hash for lookup columns
    #[command(name = "hash-data")]
    HashData {
        /// Data (read from stdin when omitted)
        data: Option<String>,
    },

    /// Issue an access/refresh token pair, printed as JSON
    #[command(name = "issue-tokens")]
    IssueTokens {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        session: Option<String>,
    },

    /// Verify a token and print its claims as JSON
    #[command(name = "verify-token")]
    VerifyToken {
        /// Which secret and type to verify against
        #[arg(long, value_enum, default_value = "access")]
        kind: TokenKind,
        /// Token (read from stdin when omitted)
        token: Option<String>,
    },

    /// Print a token's claims without verifying it
    #[command(name = "decode-token")]
    DecodeToken {
        /// Token (read from stdin when omitted)
        token: Option<String>,
    },

    /// Compress text into a storage-safe string
    Compress {
        /// Text (read from stdin when omitted)
        text: Option<String>,
    },

    /// Decompress a string produced by `compress`
    Decompress {
        /// Encoded text (read from stdin when omitted)
        encoded: Option<String>,
    },

    /// Compress a file and print its record as JSON
    #[command(name = "compress-file")]
    CompressFile {
        path: PathBuf,
        /// MIME type recorded alongside the data
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// Restore a file from a JSON record produced by `compress-file`
    #[command(name = "decompress-file")]
    DecompressFile {
        /// Record JSON file
        record: PathBuf,
        /// Output path (default: the filename stored in the record)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Normalize user input
    Sanitize {
        #[arg(value_enum)]
        kind: SanitizeKind,
        /// Value (read from stdin when omitted)
        value: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SanitizeKind {
    Email,
    Phone,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let level = cli.log.clone().unwrap_or_else(|| config.logging.level.clone());
    let format = match cli.log_format {
        Some(f) => f,
        None if config.logging.format.eq_ignore_ascii_case("json") => LogFormat::Json,
        None => LogFormat::Text,
    };
    init_logging(&level, &format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "forgeguard starting"
    );

    match cli.command {
        Commands::Keygen => cmd_keygen(),
        Commands::Encrypt { text } => {
            let ctx = security_context(&config)?;
            println!("{}", ctx.encrypt(&input_or_stdin(text)?)?);
            Ok(())
        }
        Commands::Decrypt { envelope } => {
            let ctx = security_context(&config)?;
            println!("{}", ctx.decrypt(input_or_stdin(envelope)?.trim())?);
            Ok(())
        }
        Commands::HashPassword { password } => {
            let hasher = PasswordHashing::new(config.crypto.password_cost)?;
            println!("{}", hasher.hash_password(&input_or_stdin(password)?)?);
            Ok(())
        }
        Commands::VerifyPassword { hash, password } => {
            let hasher = PasswordHashing::new(config.crypto.password_cost)?;
            check(hasher.verify_password(&input_or_stdin(password)?, &hash), "password")
        }
        Commands::Sign { data } => {
            let ctx = security_context(&config)?;
            println!("{}", ctx.create_signature(&input_or_stdin(data)?));
            Ok(())
        }
        Commands::VerifySignature { signature, data } => {
            let ctx = security_context(&config)?;
            check(ctx.verify_signature(&input_or_stdin(data)?, &signature), "signature")
        }
        Commands::HashData { data } => {
            let ctx = security_context(&config)?;
            println!("{}", ctx.hash_sensitive_data(&input_or_stdin(data)?));
            Ok(())
        }
        Commands::IssueTokens { subject, email, role, session } => {
            let ctx = security_context(&config)?;
            let payload = TokenPayload {
                subject_id: subject,
                email,
                role,
                session_id: session,
            };
            let pair = ctx.tokens().issue_token_pair(&payload)?;
            println!("{}", serde_json::to_string_pretty(&pair)?);
            Ok(())
        }
        Commands::VerifyToken { kind, token } => {
            let ctx = security_context(&config)?;
            let token = input_or_stdin(token)?;
            let claims = match kind {
                TokenKind::Access => ctx.tokens().verify_access_token(token.trim())?,
                TokenKind::Refresh => ctx.tokens().verify_refresh_token(token.trim())?,
            };
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(())
        }
        Commands::DecodeToken { token } => {
            let token = input_or_stdin(token)?;
            let claims = fg_crypto::decode_token(token.trim())
                .context("not a decodable token")?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(())
        }
        Commands::Compress { text } => {
            println!("{}", fg_codec::compress(&input_or_stdin(text)?));
            Ok(())
        }
        Commands::Decompress { encoded } => {
            print!("{}", fg_codec::decompress(input_or_stdin(encoded)?.trim())?);
            Ok(())
        }
        Commands::CompressFile { path, mime } => cmd_compress_file(&path, &mime),
        Commands::DecompressFile { record, output } => {
            cmd_decompress_file(&record, output.as_deref())
        }
        Commands::Sanitize { kind, value } => {
            let value = input_or_stdin(value)?;
            let clean = match kind {
                SanitizeKind::Email => sanitize::sanitize_email(&value)?,
                SanitizeKind::Phone => sanitize::sanitize_kenyan_phone(&value)?,
                SanitizeKind::Text => sanitize::sanitize_string(&value),
            };
            println!("{clean}");
            Ok(())
        }
    }
}

/// Logs go to stderr so command output on stdout stays pipeable.
fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: &Path) -> Result<ForgeguardConfig> {
    let mut config = ForgeguardConfig::load(path)
        .with_context(|| format!("loading config: {}", path.display()))?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    Ok(config)
}

fn security_context(config: &ForgeguardConfig) -> Result<SecurityContext> {
    SecurityContext::from_config(config).context(
        "invalid security configuration\n\
         Set [crypto].encryption_key and [tokens] secrets in the config file, or\n\
         FORGEGUARD_ENCRYPTION_KEY, FORGEGUARD_ACCESS_SECRET and FORGEGUARD_REFRESH_SECRET.\n\
         `forgeguard keygen` prints suitable values.",
    )
}

// ── Input helpers ─────────────────────────────────────────────────────────────

fn input_or_stdin(arg: Option<String>) -> Result<String> {
    match arg {
        Some(value) => Ok(value),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(strip_line_ending(buf))
        }
    }
}

/// Drop the single trailing newline that `echo` and heredocs append.
fn strip_line_ending(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

fn check(ok: bool, what: &str) -> Result<()> {
    if ok {
        println!("{what} ok");
        Ok(())
    } else {
        anyhow::bail!("{what} does not match")
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_keygen() -> Result<()> {
    let key = fg_crypto::EncryptionKey::generate();
    println!("[crypto]");
    println!("encryption_key = \"{}\"", key.to_hex());
    println!();
    println!("[tokens]");
    println!("access_secret = \"{}\"", fg_crypto::generate_secure_token(32));
    println!("refresh_secret = \"{}\"", fg_crypto::generate_secure_token(32));
    Ok(())
}

fn cmd_compress_file(path: &Path, mime: &str) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let record = fg_codec::compress_file(&bytes, &filename, mime);
    eprintln!(
        "{}: {} -> {} ({:.1}% saved)",
        record.filename,
        fg_codec::format_file_size(record.original_size),
        fg_codec::format_file_size(record.compressed_size),
        record.compression_ratio
    );
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_decompress_file(record_path: &Path, output: Option<&Path>) -> Result<()> {
    let json = std::fs::read_to_string(record_path)
        .with_context(|| format!("reading {}", record_path.display()))?;
    let record: fg_codec::CompressedFile =
        serde_json::from_str(&json).context("parsing compressed file record")?;

    let bytes = fg_codec::decompress_file(&record)?;
    let dest = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let name = Path::new(&record.filename)
                .file_name()
                .context("record has no usable filename; pass --output")?;
            PathBuf::from(name)
        }
    };
    std::fs::write(&dest, &bytes).with_context(|| format!("writing {}", dest.display()))?;
    eprintln!(
        "{} ({})",
        dest.display(),
        fg_codec::format_file_size(bytes.len() as u64)
    );
    Ok(())
}
