use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use fuzzy_rulebase::{Document, Engine, EngineConfig, RuleBaseOutput, TupleNotation};

/// Infers crisp outputs from a document of fuzzy sets, rule bases and measurements
#[derive(Parser, Debug)]
#[command(name = "fuzzy-rulebase", version, about)]
struct Cli {
    /// Input document
    input: PathBuf,

    /// Distance between two samples of a universe
    #[arg(long, default_value_t = 1.)]
    step: f64,

    /// How four value fuzzy sets are read: `spread` for (a, b, α, β) or `breakpoints`
    #[arg(long, default_value_t = TupleNotation::Spread)]
    notation: TupleNotation,

    /// Log every rule strength and derived universe
    #[arg(short, long)]
    verbose: bool,

    /// Print the sampled membership curves of each inferred consequent
    #[arg(long)]
    curves: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let text = fs::read_to_string(&cli.input).with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let engine = Engine::new(EngineConfig {
        step: cli.step,
        notation: cli.notation,
    });

    let report = match Document::parse(&text).and_then(|document| engine.run(&document)) {
        Ok(report) => report,
        Err(err) => {
            error!("{err}");
            return Ok(ExitCode::FAILURE);
        },
    };

    for diagnostic in &report.diagnostics {
        warn!("{diagnostic}");
    }

    for output in &report.outputs {
        print_output(output, cli.curves);
    }

    if report.outputs.iter().all(|output| output.result.is_err()) {
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_output(output: &RuleBaseOutput, curves: bool) {
    match &output.result {
        Ok(outputs) => println!(
            "The defuzzified value of {} for the {} rule base is: {}",
            output.consequent,
            output.name,
            outputs.value()
        ),
        Err(err) => println!(
            "No value of {} for the {} rule base: {err}",
            output.consequent, output.name
        ),
    }

    let Some(vars) = output.variables.as_ref().filter(|_| curves) else {
        return;
    };

    for (status, points) in vars.curves(vars.consequent()) {
        let points: Vec<_> = points.iter().map(|(x, mu)| format!("{x}:{mu:.3}")).collect();

        println!("  {status}: {}", points.join(" "));
    }

    if let Ok(outputs) = &output.result {
        let points: Vec<_> = outputs
            .aggregated()
            .iter()
            .map(|(x, mu)| format!("{x}:{mu:.3}"))
            .collect();

        println!("  aggregated: {}", points.join(" "));
    }
}
