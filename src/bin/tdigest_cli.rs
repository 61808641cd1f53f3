// src/bin/tdigest_cli.rs
use clap::{Parser, Subcommand};
use gr_tdigest_small::tdigest::{TDigest, DEFAULT_COMPRESSION};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build a digest from numbers (space/comma/newline separated) and write its small encoding
    Encode {
        /// Compression parameter
        #[arg(short = 'c', long, default_value_t = DEFAULT_COMPRESSION)]
        compression: f64,

        /// Read numbers from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the encoded digest
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Decode a small-encoding blob and print its compression and centroids
    Inspect {
        /// Encoded digest file
        #[arg(short, long)]
        input: PathBuf,

        /// Print a JSON document instead of tab-separated rows
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Inspection<'a> {
    compression: f64,
    total_count: u64,
    centroids: &'a [gr_tdigest_small::tdigest::Centroid],
}

fn parse_numbers(s: &str) -> Result<Vec<f64>, Box<dyn Error>> {
    let mut out = Vec::new();
    for tok in s
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
    {
        out.push(tok.parse::<f64>()?);
    }
    Ok(out)
}

fn read_text(input: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match input {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s)?;
            Ok(s)
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    match args.cmd {
        Cmd::Encode {
            compression,
            input,
            output,
        } => {
            let xs = parse_numbers(&read_text(input.as_deref())?)?;
            let digest = TDigest::from_values(&xs, compression)?;
            fs::write(&output, digest.to_bytes()?)?;
            tracing::info!(
                values = xs.len(),
                centroids = digest.len(),
                output = %output.display(),
                "wrote digest"
            );
        }
        Cmd::Inspect { input, json } => {
            let bytes = fs::read(&input)?;
            let digest = TDigest::from_bytes(&bytes)?;
            if json {
                let doc = Inspection {
                    compression: digest.compression(),
                    total_count: digest.total_count(),
                    centroids: digest.centroids(),
                };
                println!("{}", serde_json::to_string(&doc)?);
            } else {
                println!("compression\t{}", digest.compression());
                println!("centroids\t{}", digest.len());
                for c in digest.ordered_centroids() {
                    println!("{}\t{}", c.mean(), c.count());
                }
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TDIGEST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("tdigest: {e}");
        std::process::exit(1);
    }
}
