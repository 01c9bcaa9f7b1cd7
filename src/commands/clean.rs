use std::path::PathBuf;
use std::process::ExitCode;

use tagcompare_lib::output::TAGCOMPARE_OUTPUT_VERSION;
use tagcompare_lib::{ArtifactKey, CleanOutput, TagCompareError, TagCompareOutput};
use tracing::info;

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::load_config;

/// Run the clean command.
pub fn run_clean(
    config_path: Option<PathBuf>,
    build: String,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output.clone()),
    };
    let output_dir = output_dir.unwrap_or(config.output_dir);

    let key = match ArtifactKey::with_base(build.as_str(), &output_dir) {
        Ok(key) => key,
        Err(err) => return render_error(err.into(), format, output.clone()),
    };
    let removed = match key.remove_build_directory() {
        Ok(removed) => removed,
        Err(err) => return render_error(err.into(), format, output.clone()),
    };
    if removed {
        info!("Removed build {}", key.build_directory().display());
    } else {
        info!("Nothing to remove at {}", key.build_directory().display());
    }

    let body = TagCompareOutput::Clean(CleanOutput {
        version: TAGCOMPARE_OUTPUT_VERSION.to_string(),
        build,
        path: key.build_directory(),
        removed,
    });
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(TagCompareError::Config(err.to_string()), format, output);
    }
    ExitCode::SUCCESS
}
