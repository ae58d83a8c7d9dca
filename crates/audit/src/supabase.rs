//! Supabase audit sink — reads the `messages` table through PostgREST.
//!
//! Equivalent to
//! `from("messages").select(cols).order("created_time", desc).limit(n)`
//! in the Supabase client libraries, authenticated with the service-role key.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use askrelay_core::audit::{AuditRow, AuditSink};
use askrelay_core::error::AuditError;

const COLUMNS: &str = "session_identifier,role,message_text,created_time";

pub struct SupabaseSink {
    rest_url: String,
    service_key: String,
    table: String,
    client: reqwest::Client,
}

impl SupabaseSink {
    /// Create a sink for a Supabase project URL (e.g. `https://xyz.supabase.co`).
    pub fn new(
        project_url: &str,
        service_key: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AuditError::Connection(format!("HTTP client: {e}")))?;

        Ok(Self {
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            service_key: service_key.into(),
            table: table.into(),
            client,
        })
    }
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
}

#[async_trait]
impl AuditSink for SupabaseSink {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<AuditRow>, AuditError> {
        let url = format!("{}/{}", self.rest_url, self.table);
        debug!(table = %self.table, limit, "Querying audit rows");

        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .query(&[
                ("select", COLUMNS),
                ("order", "created_time.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuditError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Audit query failed");
            let message = serde_json::from_str::<PostgrestError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("HTTP {}: {body}", status.as_u16()));
            return Err(AuditError::QueryFailed(message));
        }

        response
            .json::<Vec<AuditRow>>()
            .await
            .map_err(|e| AuditError::QueryFailed(format!("Failed to parse rows: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::RawQuery,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Option<(HeaderMap, Option<String>)>>>;

    async fn fake_postgrest(status: StatusCode, reply: serde_json::Value) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let app = Router::new().route(
            "/rest/v1/messages",
            get(move |headers: HeaderMap, RawQuery(query): RawQuery| {
                let sink = sink.clone();
                let reply = reply.clone();
                async move {
                    *sink.lock().unwrap() = Some((headers, query));
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn reads_rows_newest_first() {
        let (url, seen) = fake_postgrest(
            StatusCode::OK,
            serde_json::json!([
                {"session_identifier": "s1", "role": "assistant", "message_text": "hi", "created_time": "2024-05-01T12:00:01+00:00"},
                {"session_identifier": "s1", "role": "user", "message_text": "hello", "created_time": "2024-05-01T12:00:00+00:00"}
            ]),
        )
        .await;

        let sink = SupabaseSink::new(&url, "service-key", "messages").unwrap();
        let rows = sink.recent_messages(7).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role.as_deref(), Some("assistant"));

        let (headers, query) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get("apikey").unwrap(), "service-key");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer service-key");
        let query = query.unwrap();
        assert!(query.contains("order=created_time.desc"));
        assert!(query.contains("limit=7"));
        assert!(query.contains("select=session_identifier%2Crole%2Cmessage_text%2Ccreated_time"));
    }

    #[tokio::test]
    async fn postgrest_error_message_is_surfaced() {
        let (url, _) = fake_postgrest(
            StatusCode::NOT_FOUND,
            serde_json::json!({"code": "42P01", "message": "relation \"public.messages\" does not exist"}),
        )
        .await;

        let sink = SupabaseSink::new(&url, "k", "messages").unwrap();
        match sink.recent_messages(5).await {
            Err(AuditError::QueryFailed(msg)) => {
                assert_eq!(msg, "relation \"public.messages\" does not exist");
            }
            other => panic!("Expected QueryFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_project_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = SupabaseSink::new(&format!("http://{addr}/"), "k", "messages").unwrap();
        assert!(matches!(
            sink.recent_messages(5).await,
            Err(AuditError::Connection(_))
        ));
    }
}
