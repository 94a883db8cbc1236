use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "yoink")]
#[command(about = "Bulk file retriever for the NRAO science data archive")]
pub struct Cli {
    /// Product locator to resolve via the locations service
    #[arg(
        long,
        value_name = "LOCATOR",
        required_unless_present = "location_file"
    )]
    pub product_locator: Option<String>,
    /// Pre-fetched JSON locations report to resolve from instead
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "product_locator",
        required_unless_present = "product_locator"
    )]
    pub location_file: Option<PathBuf>,
    /// Directory to write retrieved files into
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub output_dir: PathBuf,
    /// Report what would be retrieved without writing any files
    #[arg(long)]
    pub dry_run: bool,
    /// Retrieve only SDM metadata files (.xml and .bin)
    #[arg(long)]
    pub sdm_only: bool,
    /// Overwrite destinations that already exist
    #[arg(long)]
    pub force: bool,
    /// Emit debug-level logging
    #[arg(long)]
    pub verbose: bool,
    /// CAPO profile to resolve settings from (defaults from $CAPO_PROFILE)
    #[arg(long, env = "CAPO_PROFILE")]
    pub profile: Option<String>,
}
