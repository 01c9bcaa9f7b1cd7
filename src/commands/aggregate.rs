use std::path::PathBuf;
use std::process::ExitCode;

use tagcompare_lib::output::TAGCOMPARE_OUTPUT_VERSION;
use tagcompare_lib::{
    AggregateOutput, BuildAggregator, DirectoryAggregator, TagCompareError, TagCompareOutput,
};

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::{load_config, log_effective_config};

/// Run the aggregate command.
pub fn run_aggregate(
    config_path: Option<PathBuf>,
    verbose: bool,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let mut config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output.clone()),
    };
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if verbose {
        log_effective_config(&config, config_path.as_deref());
    }

    let report = match DirectoryAggregator::new(config.compare_build.clone())
        .aggregate(&config.output_dir)
    {
        Ok(report) => report,
        Err(err) => return render_error(err, format, output.clone()),
    };

    let body = TagCompareOutput::Aggregate(AggregateOutput {
        version: TAGCOMPARE_OUTPUT_VERSION.to_string(),
        report,
    });
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(TagCompareError::Config(err.to_string()), format, output);
    }
    ExitCode::SUCCESS
}
