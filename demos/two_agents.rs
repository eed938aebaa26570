//! Risk analysis of a sensor, a controller and an actuator
//!
//! The sensor reports over a bus to the controller, which commands the
//! actuator over a second bus. Inside the controller an estimator and an
//! observer feed each other, the only cyclic sub-structure.
//!
//! Run with `RUST_LOG=rcc5_risk=debug` to trace every scenario, or pass a
//! model file to analyze another architecture.

use rcc5_risk::analysis::{Analyzer, Options};
use rcc5_risk::model::ArchitectureModel;
use rcc5_risk::report::JsonLinesSink;
use std::fs::File;
use std::{env, fs};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rcc5_risk=info")))
        .init();

    let model = match env::args().nth(1) {
        Some(path) => ArchitectureModel::from_json(&fs::read_to_string(path)?)?,
        None => ArchitectureModel::from_json(include_str!("two_agents.json"))?,
    };

    let log_path = env::temp_dir().join("two_agents.scenarios.jsonl");
    let mut sink = JsonLinesSink::new(File::create(&log_path)?);

    let options = Options {
        timeout_ms: Some(5_000),
        ..Options::default()
    };
    let report = Analyzer::new(options).run(&model, &mut sink)?;
    sink.into_inner()?;

    println!("=== Summary ===");
    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    println!("scenario log: {}", log_path.display());

    println!("\n=== Risk table ===");
    let mut rows = report.risk_table();
    rows.sort_by(|a, b| b.weight.cmp(&a.weight));
    for row in &rows {
        println!(
            "{:>5}  {:<12} {:<14} {:<17} {:<24} {}",
            row.weight,
            row.agent,
            row.component,
            row.component_kind.name(),
            row.mitigation,
            row.weakness
        );
    }

    if !report.skipped.is_empty() {
        println!("\n=== Skipped ===");
        println!("{}", serde_json::to_string_pretty(&report.skipped)?);
    }

    println!("\n=== Dependency graph ===");
    print!("{}", report.to_dot());

    Ok(())
}
