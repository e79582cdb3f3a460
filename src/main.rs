use anyhow::{anyhow, bail, Context, Result};
use formula_discovery::config::ConfigManager;
use formula_discovery::data::CsvConnector;
use formula_discovery::engines::metrics::calculate_complexity;
use formula_discovery::{parse_formula, DiscoveryRunner, SecurityType};
use std::collections::HashMap;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_help();
        return Ok(());
    }
    match args[1].as_str() {
        "parse" => cmd_parse(&args[2..]),
        "eval" => cmd_eval(&args[2..]),
        "discover" => cmd_discover(&args[2..]),
        "config" => cmd_config(&args[2..]),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn cmd_parse(args: &[String]) -> Result<()> {
    let text = args.first().ok_or_else(|| anyhow!("parse requires a formula"))?;
    let formula = parse_formula(text)?;
    println!("{}", formula);
    println!("complexity: {}", calculate_complexity(&formula));
    println!("depth: {}", formula.depth());
    let variables: Vec<String> = formula.variables().into_iter().collect();
    println!("variables: {}", variables.join(", "));
    Ok(())
}

fn cmd_eval(args: &[String]) -> Result<()> {
    let text = args.first().ok_or_else(|| anyhow!("eval requires a formula"))?;
    let formula = parse_formula(text)?;

    let mut values = HashMap::new();
    for binding in &args[1..] {
        let (name, value) = binding
            .split_once('=')
            .ok_or_else(|| anyhow!("expected name=value, got '{}'", binding))?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("invalid value for {}", name))?;
        values.insert(name.to_string(), value);
    }

    println!("{}", formula.evaluate(&values));
    Ok(())
}

fn cmd_discover(args: &[String]) -> Result<()> {
    let data = parse_flag(args, "--data").ok_or_else(|| anyhow!("discover requires --data <csv>"))?;
    let config_path = parse_flag(args, "--config");
    let security_type: SecurityType = parse_flag(args, "--security-type")
        .unwrap_or_else(|| "stock".to_string())
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let output = parse_flag(args, "--output");

    let manager = ConfigManager::new();
    manager.load(config_path.as_deref().map(Path::new))?;
    let config = manager.get()?;

    let (examples, metadata) = CsvConnector::load_examples_with_metadata(&data)?;
    if let Some((first, last)) = metadata.date_range {
        eprintln!(
            "{}: {} rows, {} symbols, as-of {} to {}",
            metadata.file_path, metadata.num_rows, metadata.symbols, first, last
        );
    }
    if examples.is_empty() {
        bail!("no usable examples in {}", data);
    }

    let runner = DiscoveryRunner::new(config)?;
    let discovered = runner.discover(security_type, &examples)?;

    for record in &discovered {
        let regime = record
            .regime_range
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("all");
        println!(
            "{:<8} fitness={:.6} validation_mae={:.6} validation_spearman={:.4}  {}",
            regime,
            record.fitness,
            record.validation.mae,
            record.validation.spearman,
            record.formula
        );
    }

    let json = serde_json::to_string_pretty(&discovered)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("failed to write {}", path))?;
            println!("Wrote {} formula(s) to {}", discovered.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> Result<()> {
    let output = parse_flag(args, "--output").unwrap_or_else(|| "formula-discovery.toml".to_string());
    ConfigManager::new().save_to_file(&output)?;
    println!("Wrote default configuration to {}", output);
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            return iter.next().cloned();
        }
    }
    None
}

fn print_help() {
    println!("formula-discovery <command> [options]");
    println!();
    println!("Commands:");
    println!("  parse <formula>                      print canonical form and complexity");
    println!("  eval <formula> [name=value ...]      evaluate with the given variables");
    println!("  discover --data <csv> [--config <toml>] [--security-type stock|etf] [--output <json>]");
    println!("  config [--output <toml>]             write the default configuration");
}
