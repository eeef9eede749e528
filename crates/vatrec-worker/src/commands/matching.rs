//! Match command - match an invoice document against pending receipts.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use vatrec_core::{normalize, MatchEngine, MatchOutcome, Receipt};

/// Arguments for the match command.
#[derive(Args)]
pub struct MatchArgs {
    /// Input file with the recognized invoice text
    #[arg(required = true)]
    document: PathBuf,

    /// JSON file with the pending receipts to match against
    #[arg(short, long)]
    receipts: PathBuf,
}

pub async fn run(args: MatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    if !args.document.exists() {
        anyhow::bail!("Input file not found: {}", args.document.display());
    }

    let text = fs::read_to_string(&args.document)?;
    let receipts: Vec<Receipt> = serde_json::from_str(&fs::read_to_string(&args.receipts)?)?;
    info!("Matching document against {} receipts", receipts.len());

    let engine = MatchEngine::new(config.matching);
    let document = normalize(&text);
    let outcome = engine.find_match(&document.text, &receipts);

    match &outcome {
        MatchOutcome::Matched { receipt_id } => {
            eprintln!("{} Matched receipt {}", style("✓").green(), receipt_id);
        }
        MatchOutcome::NoMatch => {
            eprintln!("{} No receipt matched", style("✗").red());
        }
    }

    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}
