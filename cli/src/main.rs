use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use weightdb::persist::{save_snapshot, SnapshotPaths};
use weightdb::{LoadContext, WeightDb, WeightIndex, WeightRecord};

use std::io::{self, BufWriter, Write};

#[derive(Parser)]
#[command(name = "weightdb")]
#[command(about = "Inspect gene-expression prediction weight databases", long_about = None)]
struct Cli {
    /// Weight database (SQLite) path
    #[arg(long, global = true, default_value = "./weights.db")]
    db: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the distinct genes of the summary table
    Genes,
    /// Print gene summary rows
    Summary {
        /// Restrict to one gene
        #[arg(long)]
        gene: Option<String>,
    },
    /// Print weight rows in store order
    Weights {
        /// Restrict to one gene
        #[arg(long)]
        gene: Option<String>,
    },
    /// Show the genes a variant contributes to
    Rsid {
        rsid: String,
    },
    /// Build the index and write a snapshot directory
    Snapshot {
        /// Output snapshot directory
        #[arg(long)]
        output: String,
    },
}

#[derive(Serialize)]
struct RsidReport<'a> {
    rsid: &'a str,
    genes: &'a [String],
    first_entry: Option<&'a WeightRecord>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.command {
        Commands::Genes => {
            let genes = WeightDb::new(&cli.db).load_gene_identifiers()?;
            for gene in genes {
                writeln!(out, "{}", serde_json::to_string(&gene)?)?;
            }
        }
        Commands::Summary { gene } => {
            let rows = WeightDb::new(&cli.db).load_summary_data(gene.as_deref())?;
            for row in &rows {
                writeln!(out, "{}", serde_json::to_string(row)?)?;
            }
        }
        Commands::Weights { gene } => print_weights(&cli.db, gene.as_deref(), &mut out)?,
        Commands::Rsid { rsid } => {
            let index = WeightIndex::build(&cli.db)?;
            let report = RsidReport { rsid: &rsid, genes: index.genes_for_rsid(&rsid), first_entry: index.an_entry_with_rsid(&rsid) };
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        Commands::Snapshot { output } => {
            let index = WeightIndex::build(&cli.db)?;
            let meta = save_snapshot(&SnapshotPaths::new(&output), &index, &cli.db)
                .with_context(|| format!("writing snapshot to {output}"))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&meta)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Streams rows to `out` as they are decoded instead of after the whole load.
///
/// A failed write (e.g. a closed pipe) stops further output, but the load itself runs to the
/// end of the table before the write error is returned; `load_weights` has no early exit.
fn print_weights<W: Write>(db_path: &str, gene: Option<&str>, out: &mut W) -> Result<()> {
    let mut db = WeightDb::new(db_path);
    let mut write_err: Option<anyhow::Error> = None;
    let mut cb = |w: &WeightRecord, _: &LoadContext| {
        if write_err.is_some() { return; }
        let line = serde_json::to_string(w).map_err(anyhow::Error::from);
        if let Err(e) = line.and_then(|l| writeln!(out, "{l}").map_err(anyhow::Error::from)) {
            write_err = Some(e);
        }
    };
    let weights = db.load_weights(Some(&mut cb), gene)?;
    if let Some(e) = write_err {
        return Err(e);
    }
    tracing::info!(rows = weights.len(), "weights printed");
    Ok(())
}
