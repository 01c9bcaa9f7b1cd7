mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_aggregate, run_clean, run_compare};
use settings::CompareOverrides;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let args = cli::parse();

    // stdout carries the JSON/pretty report, so logs go to stderr.
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match args.command {
        Commands::Compare {
            campaigns,
            publishers,
            build,
            output_dir,
            compare_build,
            sizes,
            types,
            threshold,
            dry_run,
            skip_aggregate,
            format,
            output,
        } => run_compare(
            args.config,
            args.verbose,
            CompareOverrides {
                campaigns,
                publishers,
                output_dir,
                compare_build,
                sizes,
                types,
                threshold,
                dry_run,
            },
            build,
            skip_aggregate,
            format,
            output,
        ),
        Commands::Aggregate {
            output_dir,
            format,
            output,
        } => run_aggregate(args.config, args.verbose, output_dir, format, output),
        Commands::Clean {
            build,
            output_dir,
            format,
            output,
        } => run_clean(args.config, build, output_dir, format, output),
    }
}
