//! HTTP implementations of the analytics clients.
//!
//! Control plane: REST provisioning where `409 Conflict` on create means
//! the resource already exists and counts as success. Data plane: one POST
//! per encoded batch to the table's default write stream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use analytics_schema::{FieldKind, SchemaField};

use crate::config::{EndpointConfig, TableCoordinates};
use crate::error::ClientError;

use super::{ClientFactory, ControlClient, WriteClient};

/// Environment variable consulted when no token is configured.
pub const TOKEN_ENV: &str = "ANALYTICS_WRITE_TOKEN";

/// Builds HTTP clients from endpoint configuration.
pub struct HttpClientFactory {
    endpoints: EndpointConfig,
}

impl HttpClientFactory {
    pub fn new(endpoints: EndpointConfig) -> Self {
        Self { endpoints }
    }

    fn token(&self) -> Result<String, ClientError> {
        if let Some(token) = &self.endpoints.token {
            return Ok(token.clone());
        }
        std::env::var(TOKEN_ENV).map_err(|_| {
            ClientError::Credentials(format!("no token configured and {TOKEN_ENV} unset"))
        })
    }

    fn http_client(&self) -> Result<reqwest::Client, ClientError> {
        Ok(reqwest::Client::builder()
            .timeout(self.endpoints.request_timeout)
            .build()?)
    }
}

#[async_trait]
impl ClientFactory for HttpClientFactory {
    async fn control_client(
        &self,
        table: &TableCoordinates,
    ) -> Result<Arc<dyn ControlClient>, ClientError> {
        Ok(Arc::new(HttpControlClient {
            http: self.http_client()?,
            base_url: self.endpoints.control_base_url.clone(),
            token: self.token()?,
            table: table.clone(),
        }))
    }

    async fn write_client(
        &self,
        table: &TableCoordinates,
    ) -> Result<Arc<dyn WriteClient>, ClientError> {
        Ok(Arc::new(HttpWriteClient {
            http: self.http_client()?,
            base_url: self.endpoints.write_base_url.clone(),
            token: self.token()?,
            table: table.clone(),
        }))
    }
}

// =============================================================================
// Control plane
// =============================================================================

pub struct HttpControlClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    table: TableCoordinates,
}

impl HttpControlClient {
    /// POST a create request, treating `409 Conflict` as already-exists.
    async fn post_idempotent(&self, url: &str, body: Value) -> Result<(), ClientError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Server {
            code: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ControlClient for HttpControlClient {
    async fn ensure_dataset(&self) -> Result<(), ClientError> {
        let url = format!(
            "{}/projects/{}/datasets",
            self.base_url, self.table.project_id
        );
        let body = json!({
            "datasetReference": {
                "projectId": self.table.project_id,
                "datasetId": self.table.dataset_id,
            }
        });
        self.post_idempotent(&url, body).await
    }

    async fn ensure_table(&self, fields: &[SchemaField]) -> Result<(), ClientError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables",
            self.base_url, self.table.project_id, self.table.dataset_id
        );
        let body = json!({
            "tableReference": {
                "projectId": self.table.project_id,
                "datasetId": self.table.dataset_id,
                "tableId": self.table.table_id,
            },
            "schema": {
                "fields": fields.iter().map(field_json).collect::<Vec<_>>(),
            }
        });
        self.post_idempotent(&url, body).await
    }

    async fn close(&self) -> Result<(), ClientError> {
        // reqwest clients drop cleanly; nothing to flush on the control plane.
        Ok(())
    }
}

fn field_json(field: &SchemaField) -> Value {
    let mode = if field.repeated {
        "REPEATED"
    } else if field.required {
        "REQUIRED"
    } else {
        "NULLABLE"
    };
    let mut out = json!({
        "name": field.name,
        "type": type_name(&field.kind),
        "mode": mode,
    });
    match &field.kind {
        FieldKind::Struct(children) => {
            out["fields"] = Value::Array(children.iter().map(field_json).collect());
        }
        FieldKind::Range(element) => {
            out["rangeElementType"] = json!({"type": type_name(element)});
        }
        FieldKind::Numeric { precision, scale } => {
            out["precision"] = json!(precision);
            out["scale"] = json!(scale);
        }
        _ => {}
    }
    out
}

fn type_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Bool => "BOOLEAN",
        FieldKind::Bytes => "BYTES",
        FieldKind::Date => "DATE",
        FieldKind::DateTime => "DATETIME",
        FieldKind::Float64 => "FLOAT",
        FieldKind::Int64 => "INTEGER",
        FieldKind::Geography => "GEOGRAPHY",
        FieldKind::Json => "JSON",
        FieldKind::Numeric { .. } => "NUMERIC",
        FieldKind::String => "STRING",
        FieldKind::Time => "TIME",
        FieldKind::Timestamp => "TIMESTAMP",
        FieldKind::Struct(_) => "RECORD",
        FieldKind::Range(_) => "RANGE",
        FieldKind::List(inner) => type_name(&inner.kind),
    }
}

// =============================================================================
// Data plane
// =============================================================================

pub struct HttpWriteClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    table: TableCoordinates,
}

#[derive(Debug, Deserialize)]
struct AppendStatus {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    error: Option<AppendStatus>,
}

#[async_trait]
impl WriteClient for HttpWriteClient {
    async fn append_rows(&self, payload: Vec<u8>) -> Result<(), ClientError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/streams/_default:appendRows",
            self.base_url, self.table.project_id, self.table.dataset_id, self.table.table_id
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/vnd.apache.arrow.stream",
            )
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                code: status.as_u16(),
                message,
            });
        }

        // The stream can acknowledge the HTTP exchange yet reject the
        // append; surface that as its own error.
        if let Ok(body) = response.json::<AppendResponse>().await {
            if let Some(error) = body.error {
                if error.code != 0 {
                    return Err(ClientError::Append {
                        code: error.code,
                        message: error.message,
                    });
                }
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/streams/_default:finalize",
            self.base_url, self.table.project_id, self.table.dataset_id, self.table.table_id
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "write stream finalize declined");
        }
        Ok(())
    }
}
