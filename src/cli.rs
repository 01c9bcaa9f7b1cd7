use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tagcompare")]
#[command(
    version,
    about = "tagcompare - Visual regression checks for ad tag creatives",
    long_about = "tagcompare\n\nCaptured screenshots live under {output}/{build}/{config}/{campaign}/{size}/{type}/.\n\nModes:\n- compare: aggregate builds, then cross-compare every config pair of each comparison set for each campaign.\n- aggregate: fold every capture build into the comparison build.\n- clean: delete one build directory.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with comparison sets, sizes, types and campaigns; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare captured screenshots across configurations
    Compare {
        #[arg(
            long,
            value_delimiter = ',',
            value_name = "IDS",
            help = "Campaign ids to compare (comma-separated); defaults to `campaigns` from config"
        )]
        campaigns: Option<Vec<String>>,

        #[arg(
            long,
            value_delimiter = ',',
            value_name = "IDS",
            help = "Publisher ids whose campaigns are compared (comma-separated)"
        )]
        publishers: Option<Vec<String>>,

        #[arg(
            long,
            value_name = "NAME",
            help = "Build name for this run (merged diffs land here); timestamp if omitted"
        )]
        build: Option<String>,

        #[arg(long, value_name = "PATH", help = "Root directory of captured builds")]
        output_dir: Option<PathBuf>,

        #[arg(
            long,
            value_name = "NAME",
            help = "Build to read screenshots from (default: aggregated `default` build)"
        )]
        compare_build: Option<String>,

        #[arg(long, value_delimiter = ',', help = "Tag sizes to compare (e.g. 300x250,728x90)")]
        sizes: Option<Vec<String>>,

        #[arg(long, value_delimiter = ',', help = "Tag types to compare (e.g. iframe,script)")]
        types: Option<Vec<String>>,

        #[arg(
            long,
            value_name = "SCORE",
            help = "RMS difference above which a pair counts as a regression"
        )]
        threshold: Option<f64>,

        #[arg(long, help = "Compare without writing merged diff images")]
        dry_run: bool,

        #[arg(long, help = "Skip aggregating builds before comparing")]
        skip_aggregate: bool,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// Aggregate every capture build into the comparison build
    Aggregate {
        #[arg(long, value_name = "PATH", help = "Root directory of captured builds")]
        output_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// Remove one build directory
    Clean {
        #[arg(long, value_name = "NAME", help = "Build to remove")]
        build: String,

        #[arg(long, value_name = "PATH", help = "Root directory of captured builds")]
        output_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
