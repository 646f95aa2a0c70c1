//! crypt: encrypt and decrypt vault documents from the command line
//!
//! Commands:
//!   algorithms [--json]             - list available algorithms
//!   encrypt [-a ALG] [-i IN] [-o OUT] - encrypt a document into an envelope
//!   decrypt [-a HINT] [-i IN] [-o OUT] - decrypt an envelope
//!   header -a ALG                   - print the envelope prefix and suffix
//!   check [-i IN]                   - report whether input is already encrypted
//!   config show                     - display the effective configuration
//!
//! Input defaults to stdin and output to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crypt_core::{registry, CryptConfig, Cryptor};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "crypt",
    version,
    about = "Password-based encryption for personal-data vaults",
    long_about = "crypt: encrypt and decrypt JSON vault documents into self-describing text envelopes"
)]
struct Cli {
    /// Path to crypt.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "CRYPT_CONFIG",
        default_value = "~/.config/crypt/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "CRYPT_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides the config file
    #[arg(long, env = "CRYPT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available algorithms
    Algorithms {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Encrypt a document into an envelope
    ///
    /// The password is read from CRYPT_PASSWORD or prompted for (twice).
    Encrypt {
        /// Algorithm name (default: from config)
        #[arg(long, short = 'a')]
        algorithm: Option<String>,
        /// Input file (default: stdin)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Password (prefer the environment variable or the prompt)
        #[arg(long, env = "CRYPT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Decrypt an envelope
    ///
    /// The algorithm is read from the envelope; -a is only a hint.
    Decrypt {
        /// Algorithm hint
        #[arg(long, short = 'a')]
        algorithm: Option<String>,
        /// Input file (default: stdin)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Password (prefer the environment variable or the prompt)
        #[arg(long, env = "CRYPT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Require the plaintext to be a JSON document
        #[arg(long)]
        json: bool,
    },

    /// Print the envelope prefix and suffix lines for an algorithm
    Header {
        #[arg(long, short = 'a')]
        algorithm: String,
    },

    /// Report whether the input already looks like an envelope
    Check {
        /// Input file (default: stdin)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = CryptConfig::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "crypt starting"
    );

    match cli.command {
        Commands::Algorithms { json } => cmd_algorithms(json),
        Commands::Encrypt { algorithm, input, output, password } => cmd_encrypt(
            &config,
            algorithm.as_deref(),
            input.as_deref(),
            output.as_deref(),
            password,
        ),
        Commands::Decrypt { algorithm, input, output, password, json } => cmd_decrypt(
            &config,
            algorithm.as_deref(),
            input.as_deref(),
            output.as_deref(),
            password,
            json,
        ),
        Commands::Header { algorithm } => cmd_header(&algorithm),
        Commands::Check { input } => cmd_check(input.as_deref()),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

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

// ── `crypt algorithms` ────────────────────────────────────────────────────────

fn cmd_algorithms(json: bool) -> Result<()> {
    let descriptors: Vec<_> = registry::descriptors().collect();
    if json {
        let rendered =
            serde_json::to_string_pretty(&descriptors).context("serializing algorithm list")?;
        println!("{rendered}");
    } else {
        for d in &descriptors {
            let marker = if d.name == registry::default_algorithm() { " (default)" } else { "" };
            println!("{:>2}  {}{marker}", d.index, d.name);
        }
    }
    Ok(())
}

// ── `crypt encrypt` ───────────────────────────────────────────────────────────

fn cmd_encrypt(
    config: &CryptConfig,
    algorithm: Option<&str>,
    input: Option<&Path>,
    output: Option<&Path>,
    password: Option<String>,
) -> Result<()> {
    let algorithm = algorithm.unwrap_or(&config.crypto.default_algorithm);
    // fail on a bad name before prompting for a password
    registry::resolve(algorithm)?;

    let plaintext = read_input(input)?;
    let password = resolve_password(password, true)?;
    let cryptor = Cryptor::from(&config.crypto);

    let spinner = make_spinner("encrypt");
    spinner.set_message(format!("deriving key ({algorithm})"));
    let result = cryptor.encrypt(algorithm, &password, &plaintext);
    spinner.finish_and_clear();
    let text = result?;

    info!(algorithm, bytes = plaintext.len(), "encrypted");
    write_output(output, &text)
}

// ── `crypt decrypt` ───────────────────────────────────────────────────────────

fn cmd_decrypt(
    config: &CryptConfig,
    hint: Option<&str>,
    input: Option<&Path>,
    output: Option<&Path>,
    password: Option<String>,
    require_json: bool,
) -> Result<()> {
    let text = read_input(input)?;
    let password = resolve_password(password, false)?;
    let cryptor = Cryptor::from(&config.crypto);

    let spinner = make_spinner("decrypt");
    spinner.set_message("deriving key");
    let result = match hint {
        Some(hint) => cryptor.decrypt_with_hint(hint, &password, &text),
        None => cryptor.decrypt(&password, &text),
    };
    spinner.finish_and_clear();
    let plaintext = result?;

    if require_json {
        serde_json::from_str::<serde_json::Value>(&plaintext)
            .context("decrypted plaintext is not a JSON document")?;
    }

    info!(bytes = plaintext.len(), "decrypted");
    write_output(output, &plaintext)
}

// ── `crypt header` / `crypt check` ────────────────────────────────────────────

fn cmd_header(algorithm: &str) -> Result<()> {
    println!("{}", crypt_core::header_prefix(algorithm)?);
    println!("{}", crypt_core::header_suffix(algorithm)?);
    Ok(())
}

fn cmd_check(input: Option<&Path>) -> Result<()> {
    let text = read_input(input)?;
    if crypt_core::looks_encrypted(&text) {
        println!("encrypted");
    } else {
        println!("plaintext");
    }
    Ok(())
}

// ── `crypt config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &CryptConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── I/O helpers ───────────────────────────────────────────────────────────────

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading input: {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory: {}", parent.display()))?;
            }
            std::fs::write(path, text)
                .with_context(|| format!("writing output: {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("writing stdout")?;
            stdout.flush().context("flushing stdout")
        }
    }
}

/// Password from flag/env, else an interactive prompt (confirmed when encrypting).
fn resolve_password(provided: Option<String>, confirm: bool) -> Result<SecretString> {
    if let Some(password) = provided {
        return Ok(SecretString::from(password));
    }
    let first = SecretString::from(
        rpassword::prompt_password("Password: ").context("reading password")?,
    );
    if confirm {
        let second = SecretString::from(
            rpassword::prompt_password("Confirm password: ").context("reading password")?,
        );
        if first.expose_secret() != second.expose_secret() {
            anyhow::bail!("passwords do not match");
        }
    }
    Ok(first)
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_default();
    expand_tilde_in(path, Path::new(&home))
}

fn expand_tilde_in(path: &Path, home: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => path.to_path_buf(),
    }
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let home = Path::new("/home/tester");
        assert_eq!(
            expand_tilde_in(Path::new("~/.config/crypt/config.toml"), home),
            PathBuf::from("/home/tester/.config/crypt/config.toml")
        );
        assert_eq!(
            expand_tilde_in(Path::new("/etc/crypt.toml"), home),
            PathBuf::from("/etc/crypt.toml")
        );
        assert_eq!(expand_tilde(Path::new("relative.toml")), PathBuf::from("relative.toml"));
    }

    #[test]
    fn test_file_io_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/vault.txt");
        write_output(Some(&path), "{\"k\":\"v\"}").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "{\"k\":\"v\"}");
    }

    #[test]
    fn test_provided_password_skips_prompt() {
        let password = resolve_password(Some("hunter2".into()), true).unwrap();
        assert_eq!(password.expose_secret(), "hunter2");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "crypt", "--log", "debug", "encrypt", "-a", "crypt-aes-256-gcm-siv", "-i", "in.json",
        ])
        .unwrap();
        assert_eq!(cli.log.as_deref(), Some("debug"));
        match cli.command {
            Commands::Encrypt { algorithm, input, .. } => {
                assert_eq!(algorithm.as_deref(), Some("crypt-aes-256-gcm-siv"));
                assert_eq!(input, Some(PathBuf::from("in.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
