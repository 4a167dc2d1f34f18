//! Result reporting.
//!
//! Turns the engine's raw per-pipeline, per-stage outcomes into a result
//! document: a success/error envelope, per-pipeline stage metadata and a
//! per-pipeline log.

use manifold_core::{BuildResults, Manifest, ObjectId, StageOutcome};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

/// Error type reported when a stage fails.
pub const STAGE_ERROR: &str = "org.osbuild.error.stage";

/// Pipeline name -> stage type -> merged metadata, in manifest order.
pub type Metadata = IndexMap<String, IndexMap<String, Map<String, Value>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Result,
    Error,
}

/// The result of a build.
///
/// `error` is present iff `success` is false; `metadata` only when some
/// stage produced any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    #[serde(rename = "type")]
    pub result_type: ResultType,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BuildError>,
    /// Pipeline name -> one entry per stage that ran, in manifest order.
    pub log: IndexMap<String, Vec<LogEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub details: ErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<FailedStage>,
}

/// The stage a failed build stopped at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedStage {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub stage_type: String,
    pub output: String,
    pub error: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub stage_type: String,
    pub output: String,
    /// Only written for failed stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Build the result document for `results` of running `manifest`.
pub fn output(manifest: &Manifest, results: &BuildResults) -> ResultDocument {
    let (result_type, metadata, error) = if results.success {
        (ResultType::Result, collect_metadata(manifest, results), None)
    } else {
        (ResultType::Error, None, Some(failure(results)))
    };

    ResultDocument {
        result_type,
        success: results.success,
        metadata,
        error,
        log: collect_log(manifest, results),
    }
}

/// The engine stops at the first failing stage, so the failure is the last
/// stage of the last pipeline it ran.
fn failure(results: &BuildResults) -> BuildError {
    let failed = results.pipelines.last().and_then(|p| p.stages.last());
    if failed.is_none() {
        warn!("Build failed without any stage results");
    }

    BuildError {
        error_type: STAGE_ERROR.to_string(),
        details: ErrorDetails {
            stage: failed.map(|stage| FailedStage {
                id: stage.id,
                stage_type: stage.name.clone(),
                output: stage.output.clone(),
                error: stage.error.clone(),
            }),
        },
    }
}

fn collect_metadata(manifest: &Manifest, results: &BuildResults) -> Option<Metadata> {
    let mut metadata = Metadata::new();

    for pipeline in manifest.pipelines() {
        let Some(outcome) = results.pipeline(&pipeline.id) else {
            continue;
        };

        let mut data: IndexMap<String, Map<String, Value>> = IndexMap::new();
        for stage in &outcome.stages {
            let Some(md) = stage.metadata.as_ref().filter(|md| !md.is_empty()) else {
                continue;
            };
            data.entry(stage.name.clone())
                .or_default()
                .extend(md.clone());
        }

        if !data.is_empty() {
            metadata.insert(pipeline.name.clone(), data);
        }
    }

    (!metadata.is_empty()).then_some(metadata)
}

fn collect_log(manifest: &Manifest, results: &BuildResults) -> IndexMap<String, Vec<LogEntry>> {
    let mut log = IndexMap::new();

    for pipeline in manifest.pipelines() {
        let Some(outcome) = results.pipeline(&pipeline.id) else {
            continue;
        };

        let entries: Vec<LogEntry> = outcome.stages.iter().map(log_entry).collect();
        if !entries.is_empty() {
            log.insert(pipeline.name.clone(), entries);
        }
    }

    log
}

fn log_entry(stage: &StageOutcome) -> LogEntry {
    let (success, error) = if stage.success {
        (None, None)
    } else {
        (Some(false), stage.error.clone().filter(|e| !is_empty(e)))
    };

    LogEntry {
        id: stage.id,
        stage_type: stage.name.clone(),
        output: stage.output.clone(),
        success,
        error,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
