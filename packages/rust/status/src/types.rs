//! Search responses and the publishing-process document shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Search envelope
// ---------------------------------------------------------------------------

/// The subset of a `_search` response we read.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub hits: Hits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One search hit. `_version` is only present when requested.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    #[serde(rename = "_source", default)]
    pub source: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Process document (`_source` of the process index)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessDocument {
    pub meta: ProcessMeta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMeta {
    pub state_data: StateData,
    #[serde(default)]
    pub external_tasks: Option<ExternalTasks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateData {
    pub last: String,
}

/// `meta.externalTasks`: task name → entries for that task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalTasks {
    #[serde(default)]
    pub tasks: BTreeMap<String, Vec<TaskEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    #[serde(default)]
    pub task_progress: Option<TaskProgress>,
    #[serde(default)]
    pub date_finished: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    #[serde(default)]
    pub last_stage: Option<String>,
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Placeholder shown for a task without a finish date.
pub const UNFINISHED_DATE: &str = "--:--:--";

/// Placeholder shown for a task without a progress stage.
pub const UNKNOWN_STAGE: &str = "N/A";

/// Latest state of the publishing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationStatus {
    pub sequence_number: u64,
    pub state_last: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskStatus>,
}

/// Status of one external task entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    pub name: String,
    pub status: String,
    pub finished_at: String,
}

impl TaskStatus {
    pub fn from_entry(name: &str, entry: &TaskEntry) -> Self {
        let status = entry
            .task_progress
            .as_ref()
            .and_then(|p| p.last_stage.clone())
            .unwrap_or_else(|| UNKNOWN_STAGE.into());

        let finished_at = match &entry.date_finished {
            None | Some(serde_json::Value::Null) => UNFINISHED_DATE.into(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Self {
            name: name.to_string(),
            status,
            finished_at,
        }
    }
}

impl ProcessDocument {
    /// Flatten `meta.externalTasks.tasks`, names sorted, entries in list order.
    pub fn task_statuses(&self) -> Vec<TaskStatus> {
        let Some(external) = &self.meta.external_tasks else {
            return Vec::new();
        };
        external
            .tasks
            .iter()
            .flat_map(|(name, entries)| entries.iter().map(move |e| TaskStatus::from_entry(name, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn process_document_parses_nested_state() {
        let doc: ProcessDocument = serde_json::from_value(json!({
            "id": { "name": "Production_7" },
            "meta": { "stateData": { "last": "Completed", "history": [] } }
        }))
        .unwrap();
        assert_eq!(doc.meta.state_data.last, "Completed");
        assert!(doc.task_statuses().is_empty());
    }

    #[test]
    fn missing_state_field_is_named() {
        let err = serde_json::from_value::<ProcessDocument>(json!({ "meta": {} })).unwrap_err();
        assert!(err.to_string().contains("stateData"));
    }

    #[test]
    fn task_statuses_apply_defaults() {
        let doc: ProcessDocument = serde_json::from_value(json!({
            "meta": {
                "stateData": { "last": "Running" },
                "externalTasks": { "tasks": {
                    "search": [
                        { "taskProgress": { "lastStage": "Indexed" }, "dateFinished": "2016-01-13T10:00:00" },
                        { "taskProgress": {} }
                    ],
                    "cache": [ {} ]
                }}
            }
        }))
        .unwrap();

        let tasks = doc.task_statuses();
        assert_eq!(
            tasks,
            vec![
                TaskStatus { name: "cache".into(), status: "N/A".into(), finished_at: "--:--:--".into() },
                TaskStatus { name: "search".into(), status: "Indexed".into(), finished_at: "2016-01-13T10:00:00".into() },
                TaskStatus { name: "search".into(), status: "N/A".into(), finished_at: "--:--:--".into() },
            ]
        );
    }

    #[test]
    fn hit_reads_version() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "took": 1,
            "hits": { "total": { "value": 1 }, "hits": [ { "_id": "PublishingPlan-Production", "_version": 7 } ] }
        }))
        .unwrap();
        assert_eq!(resp.hits.hits[0].version, Some(7));
        assert!(resp.hits.hits[0].source.is_none());
    }
}
