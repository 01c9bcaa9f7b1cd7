use std::path::PathBuf;
use std::process::ExitCode;

use tagcompare_lib::output::TAGCOMPARE_OUTPUT_VERSION;
use tagcompare_lib::{
    ArtifactKey, CampaignOrchestrator, CompareOutput, TagCompareError, TagCompareOutput,
};
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::{load_config, log_effective_config, resolve_compare_settings, CompareOverrides};

/// Run the compare command.
#[allow(clippy::too_many_arguments)]
pub fn run_compare(
    config_path: Option<PathBuf>,
    verbose: bool,
    overrides: CompareOverrides,
    build: Option<String>,
    skip_aggregate: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path.as_deref())
        .and_then(|cfg| resolve_compare_settings(cfg, overrides))
    {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output.clone()),
    };
    if verbose {
        log_effective_config(&config, config_path.as_deref());
    }

    if config.campaigns.is_empty() && config.publishers.is_empty() {
        return render_error(
            TagCompareError::Config(
                "No campaigns to compare; pass --campaigns/--publishers or set them in the config"
                    .to_string(),
            ),
            format,
            output,
        );
    }

    let root_key = match build {
        Some(build) => match ArtifactKey::with_base(build, &config.output_dir) {
            Ok(key) => Some(key),
            Err(err) => return render_error(err.into(), format, output.clone()),
        },
        None => None,
    };

    let mut orchestrator = CampaignOrchestrator::from_config(&config);
    if skip_aggregate {
        info!("Skipping build aggregation");
        orchestrator = orchestrator.without_aggregation();
    }

    let summary = match orchestrator.run_all(&config.campaigns, &config.publishers, root_key) {
        Ok(summary) => summary,
        Err(err) => return render_error(err, format, output.clone()),
    };
    if summary.totals.total > 0 && summary.totals.skipped == summary.totals.total {
        warn!(
            "Every comparison was skipped; check that {} holds captures",
            config.output_dir.join(&config.compare_build).display()
        );
    }

    let body = TagCompareOutput::Compare(CompareOutput {
        version: TAGCOMPARE_OUTPUT_VERSION.to_string(),
        dry_run: config.dry_run,
        summary,
    });

    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(TagCompareError::Config(err.to_string()), format, output);
    }

    ExitCode::SUCCESS
}
