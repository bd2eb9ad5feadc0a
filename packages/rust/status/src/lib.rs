//! Publishing pipeline status lookup against a search service.
//!
//! Resolves the current sequence number from the sequence document's
//! `_version`, derives the process document key from it, and reads that
//! process's latest state.

pub mod client;
pub mod types;

use tracing::{debug, info, instrument};

use pubtools_shared::{PublicationConfig, PubtoolsError, Result};

pub use client::SearchClient;
pub use types::{PublicationStatus, TaskStatus, UNFINISHED_DATE, UNKNOWN_STAGE};

use types::ProcessDocument;

/// Process document key for a sequence number (`Production_` + `7` → `Production_7`).
pub fn process_name(prefix: &str, sequence_number: u64) -> String {
    format!("{prefix}{sequence_number}")
}

/// Look up the latest publication status.
///
/// Issues the sequence query first; the process query is only sent once a
/// sequence number is known.
#[instrument(skip_all, fields(sequence_id = %publication.sequence_id))]
pub async fn fetch_status(client: &SearchClient, publication: &PublicationConfig) -> Result<PublicationStatus> {
    let sequence_number = fetch_sequence_number(client, publication).await?;
    info!(sequence_number, "resolved sequence number");

    let name = process_name(&publication.process_prefix, sequence_number);
    let document = fetch_process(client, &publication.process_index, &name).await?;

    Ok(PublicationStatus {
        sequence_number,
        state_last: document.meta.state_data.last.clone(),
        tasks: document.task_statuses(),
    })
}

async fn fetch_sequence_number(client: &SearchClient, publication: &PublicationConfig) -> Result<u64> {
    let index = &publication.sequence_index;
    let hits = client.search_term(index, "_id", &publication.sequence_id).await?;

    let hit = hits.into_iter().next().ok_or_else(|| PubtoolsError::NoResultsFound {
        index: index.clone(),
        query: format!("_id={}", publication.sequence_id),
    })?;

    hit.version.ok_or_else(|| {
        PubtoolsError::parse(format!(
            "sequence document '{}' has no _version",
            publication.sequence_id
        ))
    })
}

async fn fetch_process(client: &SearchClient, index: &str, name: &str) -> Result<ProcessDocument> {
    let hits = client.search_term(index, "id.name", name).await?;

    let hit = hits.into_iter().next().ok_or_else(|| PubtoolsError::NoResultsFound {
        index: index.to_string(),
        query: format!("id.name={name}"),
    })?;
    debug!(id = ?hit.id, "matched process document");

    let source = hit
        .source
        .ok_or_else(|| PubtoolsError::parse(format!("process document '{name}' has no _source")))?;

    serde_json::from_value(source)
        .map_err(|e| PubtoolsError::parse(format!("process document '{name}': {e}")))
}

/// Human-readable report: the two status lines, then one line per task
/// when `with_tasks` is set.
pub fn render_report(status: &PublicationStatus, with_tasks: bool) -> String {
    let mut out = format!(
        "Overall status: {}\nCurrent sequence value: {}\n",
        status.state_last, status.sequence_number
    );
    if with_tasks {
        for task in &status.tasks {
            out.push_str(&format!(
                "Status of {}: {} ->> Publication date: {}\n",
                task.name, task.status, task.finished_at
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubtools_shared::ConnectionConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SearchClient {
        SearchClient::new(&ConnectionConfig {
            host: server.uri(),
            user: None,
            password: None,
            timeout_secs: 5,
        })
        .unwrap()
    }

    async fn mount_sequence(server: &MockServer, hits: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/sequence/_search"))
            .and(body_json(json!({ "query": { "term": { "_id": "PublishingPlan-Production" } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hits": { "hits": hits } })))
            .mount(server)
            .await;
    }

    #[test]
    fn process_name_concatenates() {
        assert_eq!(process_name("Production_", 7), "Production_7");
    }

    #[tokio::test]
    async fn reports_state_for_derived_process() {
        let server = MockServer::start().await;
        mount_sequence(&server, json!([{ "_id": "PublishingPlan-Production", "_version": 7 }])).await;

        Mock::given(method("POST"))
            .and(path("/bss_spublishingprocess_v1/_search"))
            .and(body_json(json!({ "query": { "term": { "id.name": "Production_7" } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": { "hits": [ {
                    "_id": "abc",
                    "_version": 3,
                    "_source": { "id": { "name": "Production_7" }, "meta": { "stateData": { "last": "Completed" } } }
                } ] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = fetch_status(&client_for(&server), &PublicationConfig::default())
            .await
            .unwrap();
        assert_eq!(status.sequence_number, 7);
        assert_eq!(status.state_last, "Completed");

        let report = render_report(&status, false);
        assert_eq!(report, "Overall status: Completed\nCurrent sequence value: 7\n");
    }

    #[tokio::test]
    async fn zero_sequence_hits_stop_before_process_query() {
        let server = MockServer::start().await;
        mount_sequence(&server, json!([])).await;

        Mock::given(method("POST"))
            .and(path("/bss_spublishingprocess_v1/_search"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = fetch_status(&client_for(&server), &PublicationConfig::default())
            .await
            .unwrap_err();
        match err {
            PubtoolsError::NoResultsFound { index, .. } => assert_eq!(index, "sequence"),
            other => panic!("expected NoResultsFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_process_hits_is_no_results() {
        let server = MockServer::start().await;
        mount_sequence(&server, json!([{ "_version": 2 }])).await;

        Mock::given(method("POST"))
            .and(path("/bss_spublishingprocess_v1/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hits": { "hits": [] } })))
            .mount(&server)
            .await;

        let err = fetch_status(&client_for(&server), &PublicationConfig::default())
            .await
            .unwrap_err();
        match err {
            PubtoolsError::NoResultsFound { query, .. } => assert_eq!(query, "id.name=Production_2"),
            other => panic!("expected NoResultsFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_state_is_a_named_parse_error() {
        let server = MockServer::start().await;
        mount_sequence(&server, json!([{ "_version": 4 }])).await;

        Mock::given(method("POST"))
            .and(path("/bss_spublishingprocess_v1/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": { "hits": [ { "_source": { "meta": {} } } ] }
            })))
            .mount(&server)
            .await;

        let err = fetch_status(&client_for(&server), &PublicationConfig::default())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Production_4"));
        assert!(msg.contains("stateData"));
    }

    #[tokio::test]
    async fn sequence_hit_without_version_is_rejected() {
        let server = MockServer::start().await;
        mount_sequence(&server, json!([{ "_id": "PublishingPlan-Production" }])).await;

        let err = fetch_status(&client_for(&server), &PublicationConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("_version"));
    }

    #[test]
    fn report_includes_tasks_when_requested() {
        let status = PublicationStatus {
            sequence_number: 9,
            state_last: "Running".into(),
            tasks: vec![TaskStatus {
                name: "search".into(),
                status: UNKNOWN_STAGE.into(),
                finished_at: UNFINISHED_DATE.into(),
            }],
        };

        let plain = render_report(&status, false);
        assert_eq!(plain.lines().count(), 2);

        let full = render_report(&status, true);
        assert!(full.ends_with("Status of search: N/A ->> Publication date: --:--:--\n"));
    }
}
