use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::Path;

/// Validate a report JSON file
pub fn validate_report_file(file_path: &Path) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path)?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source);
    println!("  Root: {}", report.tree.root.url);
    println!("  Requests: {}", report.tree.total_requests);
    println!("  Bytes: {}", report.tree.total_bytes);
    println!("  Orphans: {}", report.orphans.len());

    if report.version != SCHEMA_VERSION {
        println!(
            "  ! Schema version differs from this build (v{})",
            SCHEMA_VERSION
        );
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Request Tree Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Capture the report was built from");
        println!("  generatedAt: string        - ISO 8601 timestamp");
        println!("  tree: object");
        println!("    root: node               - Initiating navigation");
        println!("      url, method, resourceType, frameId: string");
        println!("      status: number?        - HTTP status (absent if unknown)");
        println!("      encodedBytes: number   - Encoded size (-1 if unknown)");
        println!("      elapsedMs: number?     - Request duration");
        println!("      children: node[]       - Requests this one caused, in arrival order");
        println!("    totalRequests: number    - Attached nodes, root included");
        println!("    totalBytes: number       - Sum of known sizes");
        println!("    frameIds: string[]       - Distinct frames seen");
        println!("  orphans: array             - Requests that could not be attached");
        println!("  skippedEvents: number      - Malformed records skipped");
        println!("  resourceBreakdown: object  - Count and bytes per resource type");
        println!("  heavyChains: array         - Largest fetches with their causal chain");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Request Tree v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Causal request tree reconstruction from browser network telemetry.");
}
