#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Runtime configuration, from the environment and the command line.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use bon::Builder;

use crate::sink::PublishPolicy;

/// Assignment identifier used for report keys when none is configured.
pub const DEFAULT_BASE_ID: &str = "d805050e-a0d8-49b0-afbd-46a486105170";

/// Submission read when none is configured.
pub const DEFAULT_SUBMISSION: &str = "index.js";

/// Metadata file read when none is configured.
pub const DEFAULT_METADATA: &str = "../custom.ih";

/// Everything a grading run needs to know besides the rubric.
#[derive(Debug, Clone, Builder)]
#[builder(on(PathBuf, into), on(String, into))]
pub struct GraderConfig {
    /// Path to the learner's source file.
    #[builder(default = PathBuf::from(DEFAULT_SUBMISSION))]
    submission:     PathBuf,
    /// File whose contents are attached to the report verbatim.
    #[builder(default = PathBuf::from(DEFAULT_METADATA))]
    metadata_path:  PathBuf,
    /// Directory the text and XML reports are written to.
    #[builder(default = PathBuf::from("."))]
    out_dir:        PathBuf,
    /// Assignment identifier report keys are derived from.
    #[builder(default = DEFAULT_BASE_ID.to_string())]
    base_id:        String,
    /// Results service URL; publishing is skipped when unset.
    publish_url:    Option<String>,
    /// How records are grouped into publish requests.
    #[builder(default)]
    publish_policy: PublishPolicy,
    /// Print the bundle as JSON on stdout.
    #[builder(default)]
    json:           bool,
}

/// Values given on the command line. Each one, when set, wins over the
/// matching `JSGRADE_*` environment variable.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--submission`
    pub submission:     Option<PathBuf>,
    /// `--metadata`
    pub metadata_path:  Option<PathBuf>,
    /// `--out-dir`
    pub out_dir:        Option<PathBuf>,
    /// `--base-id`
    pub base_id:        Option<String>,
    /// `--publish`
    pub publish_url:    Option<String>,
    /// `--batch`
    pub publish_policy: Option<PublishPolicy>,
    /// `--json`
    pub json:           bool,
}

/// Reads a non-empty, trimmed environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parses a publish policy name.
fn parse_policy(value: &str) -> Result<PublishPolicy> {
    match value.to_ascii_lowercase().replace('-', "_").as_str() {
        "per_record" | "record" => Ok(PublishPolicy::PerRecord),
        "batch" => Ok(PublishPolicy::Batch),
        other => bail!("Unknown publish policy `{other}`, expected `per_record` or `batch`"),
    }
}

impl GraderConfig {
    /// Builds a configuration: command line first, then `JSGRADE_*`
    /// environment variables, then defaults.
    pub fn load(cli: Overrides) -> Result<Self> {
        let publish_policy = match cli.publish_policy {
            Some(p) => Some(p),
            None => env_var("JSGRADE_PUBLISH_POLICY")
                .map(|v| parse_policy(&v))
                .transpose()?,
        };
        let json = cli.json || env_var("JSGRADE_JSON").is_some_and(|v| v == "1" || v == "true");

        Ok(GraderConfig::builder()
            .maybe_submission(
                cli.submission
                    .or_else(|| env_var("JSGRADE_SUBMISSION").map(PathBuf::from)),
            )
            .maybe_metadata_path(
                cli.metadata_path
                    .or_else(|| env_var("JSGRADE_METADATA").map(PathBuf::from)),
            )
            .maybe_out_dir(cli.out_dir.or_else(|| env_var("JSGRADE_OUT_DIR").map(PathBuf::from)))
            .maybe_base_id(cli.base_id.or_else(|| env_var("JSGRADE_BASE_ID")))
            .maybe_publish_url(cli.publish_url.or_else(|| env_var("JSGRADE_PUBLISH_URL")))
            .maybe_publish_policy(publish_policy)
            .json(json)
            .build())
    }

    /// Path to the learner's source file.
    pub fn submission(&self) -> &Path {
        &self.submission
    }

    /// File whose contents are attached to the report.
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Directory reports are written to.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Assignment identifier.
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Results service URL, if publishing is enabled.
    pub fn publish_url(&self) -> Option<&str> {
        self.publish_url.as_deref()
    }

    /// Publish request grouping.
    pub fn publish_policy(&self) -> PublishPolicy {
        self.publish_policy
    }

    /// Whether to print JSON on stdout.
    pub fn json(&self) -> bool {
        self.json
    }
}

/// Reads the metadata file. A missing or unreadable file yields an empty
/// string and a warning.
pub fn read_metadata(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Error reading {}: {}", path.display(), e);
            String::new()
        }
    }
}
