//! Classify registration codes as SAFE or UNSAFE.

use anyhow::Result;
use clap::Parser;
use dronewatch_core::{Category, Classifier, PrefixClassifier};
use serde_json::Value;

/// Classify drone registration codes
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Registration codes to classify
    codes: Vec<String>,

    /// Authorized registration prefix
    #[arg(long, default_value = "B")]
    prefix: String,

    /// Parse each code as a JSON value (e.g. null, 42, "B01")
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let classifier = PrefixClassifier::new(args.prefix);

    for code in &args.codes {
        let value = if args.json {
            // Unparsable input is still classified, as a plain string
            serde_json::from_str(code).unwrap_or_else(|_| Value::String(code.clone()))
        } else {
            Value::String(code.clone())
        };
        let label = match classifier.classify(Some(&value)) {
            Category::Safe => "SAFE",
            Category::Unsafe => "UNSAFE",
        };
        println!("{:<20} {}", code, label);
    }

    Ok(())
}
