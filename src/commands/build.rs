//! Build command implementation.
//!
//! The build command:
//! 1. Reads the capture file
//! 2. Parses request and response events
//! 3. Assembles the request tree
//! 4. Ranks heavy request chains
//! 5. Writes the JSON report

use super::models::BuildArgs;
use crate::aggregator::metrics::{aggregate, summary_line};
use crate::graph::assemble;
use crate::output::{render_tree, to_report, write_report};
use crate::parser::parse_capture;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the build command
///
/// # Errors
/// * Capture file cannot be read or parsed
/// * Reconstruction contract violations (no root, duplicate root)
/// * Report write errors
pub fn execute_build(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Building request tree from: {}", args.input.display());

    // Step 1: Read capture
    info!("Step 1/5: Reading capture...");
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read capture file {}", args.input.display()))?;
    let raw: serde_json::Value =
        serde_json::from_str(&raw).context("Capture file is not valid JSON")?;

    // Step 2: Parse events
    info!("Step 2/5: Parsing events...");
    let capture = parse_capture(&raw).context("Failed to parse capture")?;
    debug!(
        "Parsed {} request events, {} responses",
        capture.requests.len(),
        capture.join.len()
    );
    if capture.skipped > 0 {
        warn!("Skipped {} malformed capture records", capture.skipped);
    }

    // Step 3: Assemble
    info!("Step 3/5: Assembling request tree...");
    let mut assembly = assemble(&capture.requests, &capture.join, &args.assembler)
        .context("Failed to assemble request tree")?;

    // Fold capture-level rejects into the run's diagnostics
    assembly
        .diagnostics
        .absorb_rejected(capture.skipped, capture.malformed);

    let metrics = aggregate(&assembly.tree.root);
    info!("{}", summary_line(&metrics));
    if !assembly.diagnostics.orphans.is_empty() {
        warn!(
            "{} requests could not be attached to the tree",
            assembly.diagnostics.orphans.len()
        );
        for orphan in assembly.diagnostics.orphans.iter().take(5) {
            debug!("  {} ({})", orphan.event.url, orphan.reason);
        }
    }

    let rendered = args
        .print_summary
        .then(|| render_tree(&assembly.tree.root, args.tree_depth));

    // Step 4: Rank chains
    info!("Step 4/5: Ranking top {} request chains...", args.heavy_chains);
    let source = args.input.display().to_string();
    let report = to_report(&source, assembly, args.heavy_chains);

    // Step 5: Write report
    info!("Step 5/5: Writing report...");
    write_report(&report, &args.output_json).context("Failed to write report JSON")?;
    info!("✓ Report written to: {}", args.output_json.display());

    if let Some(rendered) = rendered {
        println!("\n{}", "=".repeat(80));
        println!("REQUEST TREE");
        println!("{}", "=".repeat(80));
        println!("Source:    {}", report.source);
        println!("Requests:  {}", report.tree.total_requests);
        println!("Bytes:     {}", report.tree.total_bytes);
        println!("Frames:    {}", report.tree.frame_ids.len());
        println!("Orphans:   {}", report.orphans.len());
        println!("Skipped:   {}", report.skipped_events);
        println!("\n{}", rendered);
        if !report.heavy_chains.is_empty() {
            println!("Heaviest fetches:");
            for (i, chain) in report.heavy_chains.iter().enumerate() {
                println!(
                    "  {}. {} bytes ({:.1}%): {}",
                    i + 1,
                    chain.encoded_bytes,
                    chain.percentage,
                    chain.to_line()
                );
            }
        }
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Build completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Validate build arguments
///
/// Can be called before `execute_build` for early validation.
pub fn validate_args(args: &BuildArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Capture file not found: {}", args.input.display());
    }

    if args.heavy_chains > 1000 {
        anyhow::bail!("heavy chain count is too large (max 1000)");
    }

    if args.tree_depth == 0 {
        anyhow::bail!("tree depth must be greater than 0");
    }

    Ok(())
}
