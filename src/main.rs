#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # jsgrade
//!
//! Grades a learner's JavaScript file against the reference "functions"
//! rubric and writes the results to the configured reports.

use std::path::PathBuf;

use anyhow::Result;
use bpaf::*;
use dotenvy::dotenv;
use jsgrade::{
    config::{GraderConfig, Overrides},
    sink::PublishPolicy,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade the submission
    Grade(Overrides),
    /// Remove reports from a previous run
    Clean(Option<PathBuf>),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> OptionParser<(bool, Cmd)> {
    /// parses the reports directory
    fn out_dir_arg() -> impl Parser<Option<PathBuf>> {
        long("out-dir")
            .help("Directory the reports are written to")
            .argument::<PathBuf>("DIR")
            .optional()
    }

    let submission = long("submission")
        .short('s')
        .help("Path to the learner's source file")
        .argument::<PathBuf>("FILE")
        .optional();
    let metadata_path = long("metadata")
        .help("File attached verbatim to the report")
        .argument::<PathBuf>("FILE")
        .optional();
    let base_id = long("base-id")
        .help("Assignment identifier report keys are derived from")
        .argument::<String>("ID")
        .optional();
    let publish_url = long("publish")
        .help("URL of the results service")
        .argument::<String>("URL")
        .optional();
    let publish_policy = long("batch")
        .help("Publish all results in one request instead of one per check")
        .switch()
        .map(|batch| batch.then_some(PublishPolicy::Batch));
    let json = long("json").help("Print the report as JSON").switch();
    let out_dir = out_dir_arg();

    let overrides = construct!(Overrides {
        submission,
        metadata_path,
        out_dir,
        base_id,
        publish_url,
        publish_policy,
        json,
    });

    let grade = construct!(Cmd::Grade(overrides))
        .to_options()
        .command("grade")
        .help("Grade the submission");

    let clean = construct!(Cmd::Clean(out_dir_arg()))
        .to_options()
        .command("clean")
        .help("Remove reports left by a previous run");

    let verbose = short('v')
        .long("verbose")
        .help("Log debug output")
        .switch();
    let cmd = construct!([grade, clean]);

    construct!(verbose, cmd)
        .to_options()
        .descr("Static grader for JavaScript submissions")
}

fn main() -> Result<()> {
    dotenv().ok();

    let (verbose, cmd) = options().run();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(if verbose { Level::DEBUG } else { Level::INFO });
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match cmd {
        Cmd::Grade(overrides) => {
            let config = GraderConfig::load(overrides)?;
            let bundle = jsgrade::grade(&config)?;
            tracing::info!(
                "Graded {}: {:.2}/{:.2}",
                config.submission().display(),
                bundle.earned_total(),
                bundle.max_total()
            );
        }
        Cmd::Clean(out_dir) => {
            let config = GraderConfig::load(Overrides {
                out_dir,
                ..Overrides::default()
            })?;
            jsgrade::clean(&config)?;
        }
    };

    Ok(())
}
