//! `relink` CLI - rewrite a base URL in plain and serialized payloads.
//!
//! ## Usage
//!
//! ```sh
//! # Rewrite one payload (stdin → stdout)
//! echo 'a:1:{s:3:"url";s:15:"https://a.com/x";}' | relink rewrite --old https://a.com --new https://bb.com
//!
//! # Migrate a JSON Lines table dump ({"id":1,"value":"..."} per line)
//! relink migrate --old https://a.com --new https://bb.com -i postmeta.jsonl -o updates.jsonl
//!
//! # Preview without writing updates
//! relink migrate --old https://a.com --new https://bb.com -i postmeta.jsonl --dry-run
//!
//! # Show how a payload decodes
//! relink inspect -i option_value.txt
//!
//! # Count rows that still mention the old URL
//! relink scan --old https://a.com -i postmeta.jsonl
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relink_core::jsonl::{scan_references, JsonLinesSink, JsonLinesSource};
use relink_core::{CancelToken, RunConfig};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "relink",
    version,
    about = "Rewrite a base URL in plain and serialized database payloads"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a single payload
    Rewrite {
        /// URL to replace (trailing slashes are trimmed)
        #[arg(long)]
        old: String,
        /// Replacement URL (trailing slashes are trimmed)
        #[arg(long)]
        new: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Rewrite every row of a JSON Lines dump, emitting changed rows
    Migrate {
        /// URL to replace (trailing slashes are trimmed)
        #[arg(long)]
        old: String,
        /// Replacement URL (trailing slashes are trimmed)
        #[arg(long)]
        new: String,
        /// Input JSON Lines file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output JSON Lines file for updated rows (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Worker threads (defaults to available parallelism)
        #[arg(long)]
        workers: Option<usize>,
        /// Rows per batch
        #[arg(long, default_value_t = relink_core::migrate::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Report what would change without writing any rows
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify a payload and print its decoded tree as JSON
    Inspect {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Count rows in a JSON Lines dump that still contain a URL
    Scan {
        /// URL to look for (trailing slashes are trimmed)
        #[arg(long)]
        old: String,
        /// Input JSON Lines file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rewrite {
            old,
            new,
            input,
            output,
        } => {
            let config = RunConfig::new(&old, &new).context("Invalid URLs")?;
            let raw = read_input(input.as_deref())?;
            let (payload, ending) = split_line_ending(&raw);
            let rewritten = relink_core::process(
                payload,
                config.old_url.as_bytes(),
                config.new_url.as_bytes(),
            );
            debug!(
                bytes = payload.len(),
                changed = rewritten.is_some(),
                "payload processed"
            );
            let mut out = rewritten.unwrap_or_else(|| payload.to_vec());
            out.extend_from_slice(ending);
            write_output(output.as_deref(), &out)?;
        }
        Commands::Migrate {
            old,
            new,
            input,
            output,
            workers,
            batch_size,
            dry_run,
        } => {
            let mut config = RunConfig::new(&old, &new)
                .context("Invalid URLs")?
                .with_batch_size(batch_size)
                .with_dry_run(dry_run);
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }

            info!(
                input = input.as_deref().unwrap_or("-"),
                output = output.as_deref().unwrap_or("-"),
                "reading JSON Lines dump"
            );
            let mut source = JsonLinesSource::new(open_reader(input.as_deref())?, &config.old_url);
            let mut sink = JsonLinesSink::new(open_writer(output.as_deref())?);
            let report = relink_core::run(&mut source, &mut sink, &config, &CancelToken::new())
                .context("Migration failed")?;
            sink.into_inner().context("Failed to flush output")?;

            eprintln!("Skipped:      {}", source.skipped());
            eprintln!("{}", report);
        }
        Commands::Inspect { input } => {
            let raw = read_input(input.as_deref())?;
            let (payload, _) = split_line_ending(&raw);
            if payload.is_empty() {
                println!("plain text (empty)");
            } else if relink_core::is_encoded(payload) {
                let value = relink_core::decode(payload).context("Failed to decode payload")?;
                println!("serialized {}", value.kind());
                println!("{}", serde_json::to_string_pretty(&value.to_json())?);
            } else {
                match relink_core::decode(payload) {
                    Err(e) => println!("plain text ({})", e),
                    Ok(_) => println!("plain text"),
                }
            }
        }
        Commands::Scan { old, input } => {
            let old = relink_core::normalize_base_url(old.trim());
            if old.is_empty() {
                anyhow::bail!("--old must not be empty");
            }
            debug!(old, "scanning for remaining references");
            let report = scan_references(open_reader(input.as_deref())?, old)
                .context("Failed to scan input")?;
            println!("Rows:         {}", report.rows);
            println!("Referencing:  {}", report.referencing);
        }
    }

    Ok(())
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`, default `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Split off one trailing `\n` or `\r\n`, which shells and editors add but
/// which is not part of a stored payload.
fn split_line_ending(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = raw.strip_suffix(b"\r\n") {
        (body, &raw[body.len()..])
    } else if let Some(body) = raw.strip_suffix(b"\n") {
        (body, &raw[body.len()..])
    } else {
        (raw, &raw[raw.len()..])
    }
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read file: {}", path)),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            io::stdout()
                .write_all(content)
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn open_reader(path: Option<&str>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open file: {}", path))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_writer(path: Option<&str>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create file: {}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}
