use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use ulf_log::StreamParser;

#[derive(Parser)]
#[command(name = "ulf")]
#[command(about = "Unified Log Format tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a log and emit one JSON object per record
    Parse {
        /// Path to the log file, or `-` for standard input
        #[arg(value_name = "FILE", default_value = "-")]
        path: PathBuf,

        /// Pretty-print each record
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse { path, pretty } => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let count = if path.as_os_str() == "-" {
                emit(io::stdin().lock(), &mut out, *pretty)?
            } else {
                let file = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                emit(BufReader::new(file), &mut out, *pretty)?
            };
            out.flush()?;
            log::info!("emitted {} records", count);
        }
    }
    Ok(())
}

/// Streams records from `input` to `out` as JSON lines, returning how many
/// were written. Stops at the first malformed record.
fn emit<R: BufRead, W: Write>(input: R, out: &mut W, pretty: bool) -> anyhow::Result<usize> {
    let mut parser = StreamParser::new(input);
    let mut count = 0;
    while let Some(record) = parser.parse_next()? {
        if pretty {
            serde_json::to_writer_pretty(&mut *out, &record)?;
        } else {
            serde_json::to_writer(&mut *out, &record)?;
        }
        writeln!(out)?;
        count += 1;
    }
    Ok(count)
}
