//! Manifest aggregation: merge `manifest.xml` fragments into a template.
//!
//! This crate provides:
//! - [`Template`] — the base document and its `layouts`/`portlets`/`roles` containers
//! - [`Fragment`] — a per-directory manifest whose elements are moved into the template
//! - [`discover_manifests`] — deterministic recursive fragment search
//! - [`combine`] — the end-to-end load → discover → merge → write run

mod discover;
mod element;
mod fragment;
mod scan;
mod template;

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use pubtools_shared::{ManifestConfig, PubtoolsError, Result};

pub use discover::discover_manifests;
pub use element::{ElementKind, MovedElement};
pub use fragment::Fragment;
pub use template::{ROOT_TAG, Template, XML_DECLARATION};

/// What to do with a fragment that is not well-formed XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Fail the whole run; no output is written.
    #[default]
    Abort,
    /// Log a warning, skip the fragment, and keep merging.
    Skip,
}

/// Inputs for one aggregation run.
#[derive(Debug, Clone)]
pub struct CombineOptions {
    /// Template document path.
    pub template: PathBuf,
    /// Directory to scan for fragments.
    pub directory: PathBuf,
    /// Explicit output path; defaults to `<directory>/<output_file_name>`.
    pub output: Option<PathBuf>,
    /// Exact fragment file name to collect.
    pub manifest_file_name: String,
    /// Output file name used when `output` is unset.
    pub output_file_name: String,
    pub on_malformed: MalformedPolicy,
}

impl CombineOptions {
    /// Options with the default file names and the abort policy.
    pub fn new(template: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self::from_config(template, directory, &ManifestConfig::default())
    }

    /// Options seeded from the `[manifest]` config section.
    pub fn from_config(
        template: impl Into<PathBuf>,
        directory: impl Into<PathBuf>,
        config: &ManifestConfig,
    ) -> Self {
        Self {
            template: template.into(),
            directory: directory.into(),
            output: None,
            manifest_file_name: config.manifest_file_name.clone(),
            output_file_name: config.output_file_name.clone(),
            on_malformed: if config.skip_malformed {
                MalformedPolicy::Skip
            } else {
                MalformedPolicy::Abort
            },
        }
    }

    /// Resolved absolute output path.
    pub fn output_path(&self) -> Result<PathBuf> {
        let path = match &self.output {
            Some(p) => p.clone(),
            None => self.directory.join(&self.output_file_name),
        };
        absolute(&path)
    }
}

/// Summary of a completed aggregation run.
#[derive(Debug, Clone)]
pub struct CombineReport {
    /// Where the merged document was written.
    pub output: PathBuf,
    /// Fragments merged.
    pub fragments: usize,
    /// Fragments skipped as malformed (only under [`MalformedPolicy::Skip`]).
    pub skipped: Vec<PathBuf>,
    pub layouts: usize,
    pub portlets: usize,
    pub roles: usize,
}

/// Run a full aggregation: load the template, merge every fragment under
/// the directory, and write the result.
///
/// The template is validated before the directory is touched. Nothing is
/// written unless every step succeeds.
#[instrument(skip_all, fields(template = %opts.template.display(), dir = %opts.directory.display()))]
pub fn combine(opts: &CombineOptions) -> Result<CombineReport> {
    let mut template = Template::load(&opts.template)?;

    let directory = absolute(&opts.directory)?;
    let output = opts.output_path()?;

    info!(dir = %directory.display(), "looking for {} files", opts.manifest_file_name);
    let paths = discover_manifests(&directory, &opts.manifest_file_name, Some(&output))?;

    let mut fragments = 0usize;
    let mut skipped = Vec::new();

    for path in paths {
        info!(path = %path.display(), "merging fragment");
        let fragment = match Fragment::load(&path) {
            Ok(f) => f,
            Err(e @ PubtoolsError::MalformedXml { .. }) if opts.on_malformed == MalformedPolicy::Skip => {
                warn!(path = %path.display(), error = %e, "skipping malformed fragment");
                skipped.push(path);
                continue;
            }
            Err(e) => return Err(e),
        };
        template.merge_fragment(fragment);
        fragments += 1;
    }

    template.write_atomic(&output)?;

    let report = CombineReport {
        output,
        fragments,
        skipped,
        layouts: template.appended_count(ElementKind::Layout),
        portlets: template.appended_count(ElementKind::Portlet),
        roles: template.appended_count(ElementKind::Role),
    };

    info!(
        output = %report.output.display(),
        fragments = report.fragments,
        skipped = report.skipped.len(),
        layouts = report.layouts,
        portlets = report.portlets,
        roles = report.roles,
        "merged manifest written"
    );

    Ok(report)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| PubtoolsError::io(path, e))
}
