//! qqwry - Look up IPv4 locations and owners in QQWry databases
//!
//! This tool loads a QQWry (纯真) database file and resolves addresses
//! against it, dumps every range it contains, or reports its statistics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use qqwry_core::{Database, DatabaseConfig, LookupResult, TextEncoding};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Look up IPv4 locations and owners in QQWry databases
#[derive(Parser, Debug)]
#[command(name = "qqwry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the QQWry database file
    #[arg(
        short,
        long,
        env = "QQWRY_DB",
        default_value = "./data/qqwry.dat",
        global = true
    )]
    database: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Text encoding of the strings stored in the database
    #[arg(long, value_enum, default_value = "gbk", global = true)]
    encoding: EncodingArg,

    /// Strip surrounding whitespace from locations and owners
    #[arg(long, global = true)]
    trim: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up addresses given as arguments, or one per line on stdin
    Lookup {
        /// Dotted-quad IPv4 addresses
        ips: Vec<String>,
    },
    /// Print every range in the database, in ascending order
    Dump {
        /// Stop after this many ranges (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,
    },
    /// Show database size, index bounds and version banner
    Info,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Tab-separated: ip, location, owner
    Text,
    /// One JSON object per line
    Json,
}

/// Encodings selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    /// GBK (also accepts GB18030 sequences), used by published files
    Gbk,
    /// UTF-8, for re-encoded databases
    Utf8,
}

impl From<EncodingArg> for TextEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Gbk => TextEncoding::Gbk,
            EncodingArg::Utf8 => TextEncoding::Utf8,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let db = open_database(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Lookup { ips } => {
            let stdin = io::stdin();
            run_lookup(&db, ips, stdin.lock(), cli.format, &mut out)
        }
        Command::Dump { limit } => run_dump(&db, *limit, cli.format, &mut out),
        Command::Info => run_info(&db, &cli.database, cli.format, &mut out),
    }
}

/// Load the database named on the command line with the requested decoding
fn open_database(cli: &Cli) -> Result<Database> {
    info!("Opening database: {}", cli.database.display());
    let config = DatabaseConfig::new()
        .encoding(cli.encoding.into())
        .trim(cli.trim);
    let db = Database::open(&cli.database)
        .with_context(|| format!("Failed to load database: {}", cli.database.display()))?
        .with_config(config);
    debug!("Database has {} entries", db.entry_count());
    Ok(db)
}

/// Resolve each address from `ips`, or from `input` lines when `ips` is empty
fn run_lookup(
    db: &Database,
    ips: &[String],
    input: impl BufRead,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    if !ips.is_empty() {
        for ip in ips {
            write_result(out, &db.lookup(ip), format)?;
        }
        return Ok(());
    }

    for line in input.lines() {
        let line = line.context("Failed to read address from stdin")?;
        let ip = line.trim();
        if ip.is_empty() {
            continue;
        }
        write_result(out, &db.lookup(ip), format)?;
    }
    Ok(())
}

/// Print every range, stopping the scan early once `limit` is reached
fn run_dump(db: &Database, limit: usize, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let mut scan = db.scan();
    while let Some(result) = scan.next() {
        write_result(out, &result, format)?;
        if limit > 0 && scan.yielded() >= limit {
            scan.stop();
        }
    }
    info!("Dumped {} of {} ranges", scan.yielded(), db.entry_count());
    Ok(())
}

/// Print size, index bounds and the version banner
fn run_info(db: &Database, path: &Path, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let stats = db.stats();
    let version = db.version();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "path": path.display().to_string(),
                "stats": stats,
                "version": version,
            });
            serde_json::to_writer(&mut *out, &value).context("Failed to write JSON")?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(out, "Database: {}", path.display())?;
            writeln!(out, "Size:     {} bytes", stats.size)?;
            writeln!(out, "Entries:  {}", stats.entry_count)?;
            writeln!(out, "Index:    {}..={}", stats.index_start, stats.index_end)?;
            writeln!(out, "Version:  {} {}", version.location, version.owner)?;
        }
    }
    Ok(())
}

fn write_result(out: &mut impl Write, result: &LookupResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", result)?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, result).context("Failed to write JSON")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    /// Two ranges: 0.0.0.0 -> Alpha/One, 10.0.0.0 and up -> Beta/Two
    fn sample_bytes() -> Vec<u8> {
        let mut data = vec![0u8; 8];
        let mut index = Vec::new();
        for (ip, location, owner) in [(0u32, "Alpha", "One"), (0x0A00_0000, "Beta", "Two")] {
            let offset = data.len() as u32;
            data.extend([0xFF; 4]);
            data.extend(location.as_bytes());
            data.push(0);
            data.extend(owner.as_bytes());
            data.push(0);
            index.extend(ip.to_le_bytes());
            index.extend(&offset.to_le_bytes()[..3]);
        }
        let index_start = data.len() as u32;
        let index_end = index_start + 7;
        data.extend(index);
        data[0..4].copy_from_slice(&index_start.to_le_bytes());
        data[4..8].copy_from_slice(&index_end.to_le_bytes());
        data
    }

    fn sample_db() -> Database {
        Database::load(sample_bytes()).unwrap()
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_lookup_arguments() {
        let db = sample_db();
        let ips = vec!["10.1.1.1".to_string(), "bogus".to_string()];
        let text = output(|out| run_lookup(&db, &ips, Cursor::new(""), OutputFormat::Text, out));
        assert_eq!(text, "10.1.1.1\tBeta\tTwo\nbogus\t\t\n");
    }

    #[test]
    fn test_lookup_stdin_lines() {
        let db = sample_db();
        let input = Cursor::new("1.2.3.4\n\n  10.0.0.0  \n");
        let text = output(|out| run_lookup(&db, &[], input, OutputFormat::Text, out));
        assert_eq!(text, "1.2.3.4\tAlpha\tOne\n10.0.0.0\tBeta\tTwo\n");
    }

    #[test]
    fn test_lookup_json() {
        let db = sample_db();
        let ips = vec!["10.1.1.1".to_string()];
        let text = output(|out| run_lookup(&db, &ips, Cursor::new(""), OutputFormat::Json, out));
        assert_eq!(
            text,
            "{\"ip\":\"10.1.1.1\",\"location\":\"Beta\",\"owner\":\"Two\"}\n"
        );
    }

    #[test]
    fn test_dump_with_limit() {
        let db = sample_db();
        let all = output(|out| run_dump(&db, 0, OutputFormat::Text, out));
        assert_eq!(all, "0.0.0.0\tAlpha\tOne\n10.0.0.0\tBeta\tTwo\n");

        let limited = output(|out| run_dump(&db, 1, OutputFormat::Text, out));
        assert_eq!(limited, "0.0.0.0\tAlpha\tOne\n");
    }

    #[test]
    fn test_info_text() {
        let db = sample_db();
        let text = output(|out| run_info(&db, Path::new("test.dat"), OutputFormat::Text, out));
        assert!(text.contains("Database: test.dat"));
        assert!(text.contains("Entries:  2"));
        assert!(text.contains("Version:  Beta Two"));
    }

    #[test]
    fn test_info_json() {
        let db = sample_db();
        let text = output(|out| run_info(&db, Path::new("test.dat"), OutputFormat::Json, out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["stats"]["entry_count"], 2);
        assert_eq!(value["version"]["location"], "Beta");
    }

    #[test]
    fn test_open_database_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qqwry.dat");
        std::fs::write(&path, sample_bytes()).unwrap();

        let cli = Cli::parse_from([
            "qqwry",
            "--database",
            path.to_str().unwrap(),
            "--encoding",
            "utf8",
            "info",
        ]);
        let db = open_database(&cli).unwrap();
        assert_eq!(db.entry_count(), 2);
        assert_eq!(db.config().encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_open_database_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dat");
        let cli = Cli::parse_from(["qqwry", "-d", path.to_str().unwrap(), "info"]);
        let err = open_database(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to load database"));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
