//! Implementation scanner CLI.
//!
//! **Modes**
//! - Summary (default): `--base BaseEvent` prints how many implementations were generated
//! - JSON: `--json [--compact | --indent N]` prints the populated instances as one array
//! - Catalog: `--list-types` prints every registered type with its kind and supertypes
//!
//! **Guardrails**
//! - `--compact` and `--indent` only apply with `--json`.
//! - An unknown `--base` alone logs a warning and generates nothing (exit 0).
//! - With `--name-suffix` or `--exclude`, an unknown base fails with `InvalidArgument`.
//! - The scan report always goes to stderr so JSON on stdout stays parseable.
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use impl_scanner::args::Args;
use impl_scanner::demo;
use impl_scanner_core::{
    instances_to_json, FilterRule, JsonOptions, ScanConfig, Scanner, TypeCatalog, TypeFilter,
};

fn main() -> Result<()> {
    // Logging is opt-in via IMPL_SCANNER_LOG (env-filter syntax)
    if let Ok(filter) = EnvFilter::try_from_env("IMPL_SCANNER_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(io::stderr)
            .init();
    }

    let args = Args::parse();
    let config = load_config(&args)?;

    demo::install()?;
    let mut scanner = Scanner::from_global(config);

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    if args.list_types {
        write_type_list(&mut out, scanner.catalog())?;
        out.flush()?;
        return Ok(());
    }

    if !scanner.catalog().contains(&args.base) {
        warn!(base = %args.base, "base type is not registered; nothing will be generated");
    }

    if args.has_filter_rules() {
        let filter = TypeFilter::from_rules(&args.base, filter_rules(&args))
            .context("Invalid filter rules")?;
        scanner
            .set_filter(&args.base, filter)
            .with_context(|| format!("Cannot filter base type {}", args.base))?;
    }

    let outcome = scanner.scan(&args.base);
    info!(
        base = %outcome.report.base_type,
        candidates = outcome.report.candidates,
        generated = outcome.report.generated,
        skipped = outcome.report.skipped.len(),
        "scan finished"
    );

    if args.json {
        let json = instances_to_json(&outcome.instances, &scanner.config().json);
        writeln!(out, "{}", json)?;
    } else {
        writeln!(
            out,
            "Generated {} {} implementations.",
            outcome.instances.len(),
            args.base
        )?;
        for instance in &outcome.instances {
            writeln!(out, "  {}", instance.type_name())?;
        }
        if !outcome.report.skipped.is_empty() {
            writeln!(out, "Skipped {} candidates:", outcome.report.skipped.len())?;
            for reason in &outcome.report.skipped {
                writeln!(out, "  {}", reason)?;
            }
        }
    }
    out.flush()?;

    if args.report {
        let report = serde_json::to_string_pretty(&outcome.report)?;
        eprintln!("{}", report);
    }

    Ok(())
}

/// Config file first, then explicit flags on top.
fn load_config(args: &Args) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str::<ScanConfig>(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => ScanConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(locale) = &args.locale {
        config = config.with_locale(locale.clone());
    }
    if args.compact {
        config = config.with_json(JsonOptions::compact());
    } else if let Some(width) = args.indent {
        config = config.with_json(JsonOptions::indented(width));
    }
    Ok(config)
}

fn filter_rules(args: &Args) -> Vec<FilterRule> {
    args.name_suffix
        .iter()
        .cloned()
        .map(FilterRule::NameSuffix)
        .chain(args.exclude.iter().cloned().map(FilterRule::Exclude))
        .collect()
}

fn write_type_list(out: &mut dyn Write, catalog: &TypeCatalog) -> Result<()> {
    for ty in catalog.iter() {
        let descriptor = ty.descriptor();
        let supertypes = descriptor.supertypes().join(", ");
        writeln!(
            out,
            "{:<24} {:<9} {}",
            descriptor.name(),
            format!("{:?}", descriptor.kind()),
            supertypes
        )?;
    }
    Ok(())
}
