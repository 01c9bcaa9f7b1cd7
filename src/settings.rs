use std::path::{Path, PathBuf};

use tagcompare_lib::{Config, Dimension, TagCompareError};
use tracing::debug;

/// Compare flags that, when given, replace the matching config values.
#[derive(Debug, Default)]
pub struct CompareOverrides {
    pub campaigns: Option<Vec<String>>,
    pub publishers: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    pub compare_build: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub types: Option<Vec<String>>,
    pub threshold: Option<f64>,
    pub dry_run: bool,
}

/// Merge CLI arguments into the loaded config, preferring CLI values that were
/// given. The merged config is validated again.
pub fn resolve_compare_settings(
    mut config: Config,
    overrides: CompareOverrides,
) -> Result<Config, TagCompareError> {
    if let Some(campaigns) = overrides.campaigns {
        config.campaigns = to_dimensions(campaigns);
    }
    if let Some(publishers) = overrides.publishers {
        config.publishers = to_dimensions(publishers);
    }
    if let Some(output_dir) = overrides.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(compare_build) = overrides.compare_build {
        config.compare_build = compare_build;
    }
    if let Some(sizes) = overrides.sizes {
        config.tag_sizes = to_entries(sizes);
    }
    if let Some(types) = overrides.types {
        config.tag_types = to_entries(types);
    }
    if let Some(threshold) = overrides.threshold {
        config.error_threshold = threshold;
    }
    config.dry_run |= overrides.dry_run;

    config
        .validate()
        .map_err(|e| TagCompareError::Config(format!("Invalid settings: {}", strip_prefix(&e))))?;
    Ok(config)
}

fn to_dimensions(values: Vec<String>) -> Vec<Dimension> {
    to_entries(values).into_iter().map(Dimension::from).collect()
}

/// Trims comma-separated flag values and drops the empty ones.
fn to_entries(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn strip_prefix(err: &TagCompareError) -> String {
    match err {
        TagCompareError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/tagcompare/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, TagCompareError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        TagCompareError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), strip_prefix(&e)))
            .unwrap_or_else(|| format!("Invalid config: {}", strip_prefix(&e)));
        TagCompareError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Log effective config (verbose mode).
pub fn log_effective_config(config: &Config, config_source: Option<&Path>) {
    debug!("{}", format_effective_config(config, config_source));
}

/// Format effective config as a single-line string.
pub fn format_effective_config(config: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let sets = config
        .comparisons
        .iter()
        .map(|(name, configs)| format!("{name}({})", configs.len()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Effective config [{source}]: output_dir={}, compare_build={}, sizes={}, types={}, sets: {}, threshold={:.2}, dry_run={}",
        config.output_dir.display(),
        config.compare_build,
        config.tag_sizes.join(","),
        config.tag_types.join(","),
        sets,
        config.error_threshold,
        config.dry_run
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_compare_settings_prefers_config_when_flags_absent() {
        let cfg = Config {
            output_dir: PathBuf::from("/captures"),
            compare_build: "baseline".to_string(),
            error_threshold: 3.0,
            campaigns: vec![Dimension::from("1")],
            ..Config::default()
        };
        let resolved = resolve_compare_settings(cfg, CompareOverrides::default()).unwrap();

        assert_eq!(resolved.output_dir, PathBuf::from("/captures"));
        assert_eq!(resolved.compare_build, "baseline");
        assert_eq!(resolved.error_threshold, 3.0);
        assert_eq!(resolved.campaigns, vec![Dimension::from("1")]);
        assert!(!resolved.dry_run);
    }

    #[test]
    fn resolve_compare_settings_prefers_cli_when_flags_present() {
        let cfg = Config {
            campaigns: vec![Dimension::from("1")],
            ..Config::default()
        };
        let overrides = CompareOverrides {
            campaigns: Some(vec!["7".into(), " ".into(), "8".into()]),
            publishers: Some(vec!["9000".into()]),
            output_dir: Some(PathBuf::from("elsewhere")),
            compare_build: Some("nightly".into()),
            sizes: Some(vec!["320x50".into()]),
            types: Some(vec!["script".into()]),
            threshold: Some(1.5),
            dry_run: true,
        };
        let resolved = resolve_compare_settings(cfg, overrides).unwrap();

        assert_eq!(
            resolved.campaigns,
            vec![Dimension::from("7"), Dimension::from("8")]
        );
        assert_eq!(resolved.publishers, vec![Dimension::from("9000")]);
        assert_eq!(resolved.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(resolved.compare_build, "nightly");
        assert_eq!(resolved.tag_sizes, vec!["320x50"]);
        assert_eq!(resolved.tag_types, vec!["script"]);
        assert_eq!(resolved.error_threshold, 1.5);
        assert!(resolved.dry_run);
    }

    #[test]
    fn size_and_type_flags_drop_blank_entries() {
        let overrides = CompareOverrides {
            sizes: Some(vec!["300x250".into(), "".into()]),
            types: Some(vec![" iframe ".into(), "  ".into()]),
            ..CompareOverrides::default()
        };
        let resolved = resolve_compare_settings(Config::default(), overrides).unwrap();
        assert_eq!(resolved.tag_sizes, vec!["300x250"]);
        assert_eq!(resolved.tag_types, vec!["iframe"]);

        let overrides = CompareOverrides {
            sizes: Some(vec!["".into()]),
            ..CompareOverrides::default()
        };
        let err = resolve_compare_settings(Config::default(), overrides).unwrap_err();
        assert!(err.to_string().contains("tag_sizes must not be empty"), "got: {err}");
    }

    #[test]
    fn invalid_overrides_are_config_errors() {
        let overrides = CompareOverrides {
            threshold: Some(-2.0),
            ..CompareOverrides::default()
        };
        let err = resolve_compare_settings(Config::default(), overrides).unwrap_err();
        assert!(matches!(err, TagCompareError::Config(ref m) if m.starts_with("Invalid settings")));
    }

    #[test]
    fn load_config_reports_location_on_failure() {
        let err = load_config(Some(Path::new("/no/such/tagcompare.toml"))).unwrap_err();
        assert!(err.to_string().contains("/no/such/tagcompare.toml"));
    }

    #[test]
    fn format_effective_config_includes_all_fields() {
        let summary =
            format_effective_config(&Config::default(), Some(Path::new("tagcompare.toml")));
        assert!(summary.contains("output_dir=output"));
        assert!(summary.contains("compare_build=default"));
        assert!(summary.contains("sizes=300x250,728x90,160x600,320x50"));
        assert!(summary.contains("types=iframe,script"));
        assert!(summary.contains("desktop(4)"));
        assert!(summary.contains("mobile(2)"));
        assert!(summary.contains("threshold=10.00"));
        assert!(summary.contains("tagcompare.toml"));
    }
}
