//! # jsgrade
//!
//! A rule-based static grader for JavaScript submissions. A submission is
//! parsed once, a fixed rubric of structural checks is run against the
//! parsed tree, and the outcomes are collected into a [`ReportBundle`] that
//! sinks persist or publish.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// The check contract and outcome type
pub mod check;
/// The reference rubric
pub mod checks;
/// Runtime configuration
pub mod config;
/// Runs a rubric against a parsed submission
pub mod engine;
/// Tree-sitter parsing and lowering
pub mod parser;
/// The ordered, validated rubric
pub mod registry;
/// Result records and report bundles
pub mod report;
/// Consumers of finished reports
pub mod sink;
/// The parsed program model checks inspect
pub mod tree;

use anyhow::{Context, Result};

pub use crate::{
    check::{Category, Check, CheckOutcome, FnCheck},
    engine::GradingEngine,
    parser::{ParseError, Parser, parse},
    registry::{CheckRegistry, ConfigurationError},
    report::{ReportBundle, ResultRecord, Status},
    tree::SyntaxTree,
};
use crate::{
    config::{GraderConfig, read_metadata},
    sink::{ConsoleSink, HttpPublisher, Sink, TextReportSink, XmlReportSink},
};

/// Parses `source` and grades it against `registry`.
pub fn grade_source(
    source: &str,
    registry: &CheckRegistry,
    engine: &GradingEngine,
    metadata: &str,
) -> Result<ReportBundle, ParseError> {
    let tree = parse(source)?;
    Ok(engine.run(&tree, registry, metadata))
}

/// Grades the configured submission with the reference rubric and hands the
/// report to every configured sink.
///
/// Sink failures are logged and do not fail the run; the returned bundle is
/// complete either way.
pub fn grade(config: &GraderConfig) -> Result<ReportBundle> {
    let registry = checks::reference_rubric().context("Reference rubric is misconfigured")?;

    clean(config)?;

    let path = config.submission();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading student's file {}", path.display()))?;
    let metadata = read_metadata(config.metadata_path());

    let engine = GradingEngine::new(config.base_id());
    let bundle = grade_source(&source, &registry, &engine, &metadata)
        .with_context(|| format!("Could not parse {}", path.display()))?;

    let text = TextReportSink::new(config.out_dir());
    let xml = XmlReportSink::new(config.out_dir().join(sink::XML_REPORT));
    let publisher = config
        .publish_url()
        .map(|url| HttpPublisher::new(url, config.publish_policy()))
        .transpose()?;

    let mut sinks: Vec<&dyn Sink> = vec![&ConsoleSink];
    if let Some(publisher) = publisher.as_ref() {
        sinks.push(publisher);
    }
    sinks.push(&xml);
    sinks.push(&text);

    let failures = sink::dispatch(&bundle, &sinks);
    if !failures.is_empty() {
        tracing::warn!("{} sink(s) failed; the report is still complete", failures.len());
    }

    if config.json() {
        println!("{}", bundle.to_json()?);
    }

    Ok(bundle)
}

/// Deletes report files left by a previous run.
pub fn clean(config: &GraderConfig) -> Result<()> {
    sink::remove_stale_reports(config.out_dir())
        .with_context(|| format!("Could not clean {}", config.out_dir().display()))?;
    Ok(())
}
