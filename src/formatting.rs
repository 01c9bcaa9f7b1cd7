use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tagcompare_lib::output::TAGCOMPARE_OUTPUT_VERSION;
use tagcompare_lib::{ComparisonTally, ErrorOutput, TagCompareError, TagCompareOutput};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &TagCompareOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: TagCompareError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = TagCompareOutput::Error(ErrorOutput {
        version: TAGCOMPARE_OUTPUT_VERSION.to_string(),
        message: error_payload.message.clone(),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Comparison errors are reported in the output; only fatal errors exit nonzero.
    ExitCode::from(2)
}

/// Write JSON output to file or stdout.
fn write_json_output(
    body: &TagCompareOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Write pretty output to file or stdout.
fn write_pretty_output(body: &TagCompareOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &TagCompareOutput, colorize: bool) -> String {
    let format_tally = |tally: &ComparisonTally| {
        let errors = format!("{} errors", tally.errors);
        let errors = color(&errors, if tally.errors == 0 { "32" } else { "31" }, colorize);
        let skipped = format!("{} skipped", tally.skipped);
        let skipped = color(&skipped, if tally.skipped == 0 { "32" } else { "33" }, colorize);
        format!(
            "{} compared, {} passed, {}, {}",
            tally.total,
            tally.passed(),
            errors,
            skipped
        )
    };

    match body {
        TagCompareOutput::Compare(out) => {
            let mut buf = String::new();
            let summary = &out.summary;
            let status = if summary.totals.errors == 0 { "PASS" } else { "FAIL" };
            let status_colored = color(
                status,
                if summary.totals.errors == 0 { "32" } else { "31" },
                colorize,
            );
            let dry_run = if out.dry_run { " (dry run)" } else { "" };
            writeln!(buf, "{} Tag comparison, build {}{}", status_colored, summary.build, dry_run)
                .ok();
            writeln!(buf, "Totals: {}", format_tally(&summary.totals)).ok();

            if !summary.sets.is_empty() {
                writeln!(buf, "Sets:").ok();
                for set in &summary.sets {
                    writeln!(
                        buf,
                        "- {:10} {:10} {}",
                        set.campaign_id.as_str(),
                        set.set,
                        format_tally(&set.tally)
                    )
                    .ok();
                }
            } else {
                writeln!(buf, "No campaigns compared").ok();
            }

            if summary.totals.failed > 0 && !out.dry_run {
                writeln!(
                    buf,
                    "Hint: merged diff images are in {}",
                    summary.output_build_dir.display()
                )
                .ok();
            }
            buf
        }
        TagCompareOutput::Aggregate(out) => {
            let mut buf = String::new();
            let header = color("[AGGREGATE]", "36", colorize);
            writeln!(
                buf,
                "{} {} files from {} builds into {}",
                header,
                out.report.files_copied,
                out.report.builds.len(),
                out.report.path.display()
            )
            .ok();
            for build in &out.report.builds {
                writeln!(buf, "- {build}").ok();
            }
            buf
        }
        TagCompareOutput::Clean(out) => {
            let mut buf = String::new();
            let header = color("[CLEAN]", "34", colorize);
            let action = if out.removed { "Removed" } else { "Nothing to remove at" };
            writeln!(buf, "{} {} {}", header, action, out.path.display()).ok();
            buf
        }
        TagCompareOutput::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            writeln!(buf, "{} {}", header, out.message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}
