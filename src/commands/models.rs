use crate::graph::AssemblerConfig;
use crate::utils::config::DEFAULT_HEAVY_CHAINS;
use std::path::PathBuf;

/// Arguments for the build command
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Capture file (normalized capture or DevTools network log)
    pub input: PathBuf,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Number of heavy request chains to include in the report
    pub heavy_chains: usize,

    /// Assembler options
    pub assembler: AssemblerConfig,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Depth limit for the printed tree
    pub tree_depth: usize,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("capture.json"),
            output_json: PathBuf::from("report.json"),
            heavy_chains: DEFAULT_HEAVY_CHAINS,
            assembler: AssemblerConfig::default(),
            print_summary: false,
            tree_depth: 6,
        }
    }
}
