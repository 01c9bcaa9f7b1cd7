//! Folds every timestamped build into the comparison build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::artifact_key::DEFAULT_BUILD_NAME;
use crate::error::{Result, TagCompareError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    /// The aggregate build directory.
    pub path: PathBuf,
    /// Build names copied in, in copy order.
    pub builds: Vec<String>,
    pub files_copied: usize,
}

/// Refreshes the comparison build from the individual capture builds.
pub trait BuildAggregator {
    fn aggregate(&self, output_root: &Path) -> Result<AggregateReport>;
}

/// Copies `{root}/{build}/**` into `{root}/{target_build}/**` for every build
/// directory except the target itself.
#[derive(Debug, Clone)]
pub struct DirectoryAggregator {
    pub target_build: String,
}

impl Default for DirectoryAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BUILD_NAME)
    }
}

impl DirectoryAggregator {
    pub fn new(target_build: impl Into<String>) -> Self {
        Self {
            target_build: target_build.into(),
        }
    }
}

impl BuildAggregator for DirectoryAggregator {
    fn aggregate(&self, output_root: &Path) -> Result<AggregateReport> {
        aggregate_builds(output_root, &self.target_build)
    }
}

/// Builds are visited in name order, so with timestamped build names the
/// latest capture of an artifact wins. A file is only overwritten when the
/// incoming copy is at least as new as the one already aggregated.
pub fn aggregate_builds(output_root: &Path, target_build: &str) -> Result<AggregateReport> {
    if !output_root.is_dir() {
        return Err(TagCompareError::Config(format!(
            "Output directory does not exist: {}",
            output_root.display()
        )));
    }

    let target = output_root.join(target_build);
    if !target.is_dir() {
        debug!(path = %target.display(), "creating aggregate build directory");
        fs::create_dir_all(&target)?;
    }

    let mut builds: Vec<String> = Vec::new();
    for entry in fs::read_dir(output_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != target_build {
            builds.push(name);
        }
    }
    builds.sort();

    info!("Aggregating {} builds into {}", builds.len(), target.display());
    let mut files_copied = 0;
    for build in &builds {
        let source = output_root.join(build);
        debug!(from = %source.display(), to = %target.display(), "copying build");
        files_copied += copy_tree(&source, &target)?;
    }

    Ok(AggregateReport {
        path: target,
        builds,
        files_copied,
    })
}

fn copy_tree(source: &Path, destination: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() && is_newer(entry.path(), &target)? {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            preserve_modified(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// Copies carry the source mtime so later aggregations compare capture times,
// not copy times.
fn preserve_modified(source: &Path, target: &Path) -> io::Result<()> {
    if let Ok(modified) = fs::metadata(source)?.modified() {
        fs::File::options()
            .write(true)
            .open(target)?
            .set_modified(modified)?;
    }
    Ok(())
}

fn is_newer(source: &Path, target: &Path) -> io::Result<bool> {
    let target_meta = match fs::metadata(target) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err),
    };
    let source_meta = fs::metadata(source)?;
    match (source_meta.modified(), target_meta.modified()) {
        (Ok(src), Ok(dst)) => Ok(src >= dst),
        _ => Ok(true),
    }
}
