//! `cfgtar check`: validate a configuration and print the normalized result.

use tracing::{info, instrument};

use crate::{
    cli::CheckArgs,
    commands::{read_json, system_pipeline, validate_file},
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(schema = %args.schema.display(), config = %args.config.display()))]
pub fn execute(args: CheckArgs, output: OutputManager) -> CliResult<()> {
    let config = read_json(&args.config)?;
    let normalized = validate_file(&system_pipeline(), &args.schema, &config)?;

    info!("Configuration is valid");
    output.json(&normalized)?;
    output.success(&format!("{} is valid", args.config.display()))?;
    Ok(())
}
