mod cli;
mod env_profile;

use std::process::ExitCode;

use clap::Parser;
use eyre::Result;

use cli::Cli;
use env_profile::EnvProfileLoader;
use yoink_core::orchestrator;
use yoink_core::request::{Locator, Request};

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();

    let locator = match (cli.product_locator, cli.location_file) {
        (Some(locator), None) => Locator::ProductLocator(locator),
        (None, Some(path)) => Locator::LocationFile(path),
        _ => unreachable!("clap enforces exactly one of --product-locator/--location-file"),
    };

    let request = Request {
        locator,
        output_dir: cli.output_dir,
        dry_run: cli.dry_run,
        force_overwrite: cli.force,
        sdm_only: cli.sdm_only,
        verbose: cli.verbose,
        profile_name: cli.profile,
    };

    match orchestrator::run(&request, &EnvProfileLoader) {
        Ok(outcome) => {
            for path in &outcome.retrieved {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(ExitCode::from(err.exit_code())),
    }
}
