//! Parser premium (LlamaParse) para PDFs con imágenes.
//!
//! Flujo contra la API REST:
//!   1. Subida del fichero a `/api/parsing/upload` en modo premium.
//!   2. Sondeo de `/api/parsing/job/{id}` hasta `SUCCESS` o `ERROR`.
//!   3. Descarga de `/api/parsing/job/{id}/result/json`; el markdown de cada
//!      página es un fragmento.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Fragmento de texto devuelto por el parser premium, en orden de documento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFragment {
    pub text: String,
}

#[async_trait]
pub trait PremiumParser: Send + Sync {
    async fn parse(
        &self,
        path: &Path,
        api_key: &str,
    ) -> Result<Vec<ParsedFragment>, PremiumParseError>;
}

#[derive(Debug, Error)]
pub enum PremiumParseError {
    #[error("could not read the staged PDF: {0}")]
    Io(#[from] std::io::Error),
    #[error("LlamaParse request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("LlamaParse returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("LlamaParse job {job_id} ended with status {status}")]
    JobFailed { job_id: String, status: String },
    #[error("LlamaParse job {job_id} did not finish within {secs}s")]
    Timeout { job_id: String, secs: u64 },
}

/// Cliente HTTP de LlamaParse.
pub struct LlamaParseClient {
    client: Client,
    base_url: String,
    poll_interval: Duration,
    max_wait: Duration,
}

impl LlamaParseClient {
    pub fn new(base_url: &str, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
            max_wait,
        }
    }

    async fn upload(&self, path: &Path, api_key: &str) -> Result<String, PremiumParseError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        let file_part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("premium_mode", "true");

        let response = self
            .client
            .post(format!("{}/api/parsing/upload", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let job: JobResponse = ensure_success(response).await?.json().await?;
        Ok(job.id)
    }

    async fn wait_for_job(&self, job_id: &str, api_key: &str) -> Result<(), PremiumParseError> {
        tokio::time::timeout(self.max_wait, self.poll_job(job_id, api_key))
            .await
            .map_err(|_| PremiumParseError::Timeout {
                job_id: job_id.to_string(),
                secs: self.max_wait.as_secs(),
            })?
    }

    async fn poll_job(&self, job_id: &str, api_key: &str) -> Result<(), PremiumParseError> {
        let url = format!("{}/api/parsing/job/{}", self.base_url, job_id);

        loop {
            let response = self.client.get(&url).bearer_auth(api_key).send().await?;
            let job: JobResponse = ensure_success(response).await?.json().await?;

            match job.status.as_str() {
                "SUCCESS" => return Ok(()),
                "PENDING" => {
                    debug!(job_id, "Trabajo de LlamaParse pendiente");
                    tokio::time::sleep(self.poll_interval).await;
                }
                other => {
                    return Err(PremiumParseError::JobFailed {
                        job_id: job_id.to_string(),
                        status: other.to_string(),
                    })
                }
            }
        }
    }

    async fn fetch_pages(
        &self,
        job_id: &str,
        api_key: &str,
    ) -> Result<Vec<ParsedFragment>, PremiumParseError> {
        let response = self
            .client
            .get(format!(
                "{}/api/parsing/job/{}/result/json",
                self.base_url, job_id
            ))
            .bearer_auth(api_key)
            .send()
            .await?;

        let result: JsonResult = ensure_success(response).await?.json().await?;
        Ok(result
            .pages
            .into_iter()
            .map(|page| ParsedFragment { text: page.md })
            .collect())
    }
}

#[async_trait]
impl PremiumParser for LlamaParseClient {
    #[tracing::instrument(skip(self, api_key), fields(path = %path.display()))]
    async fn parse(
        &self,
        path: &Path,
        api_key: &str,
    ) -> Result<Vec<ParsedFragment>, PremiumParseError> {
        let job_id = self.upload(path, api_key).await?;
        info!(%job_id, "PDF enviado a LlamaParse");

        self.wait_for_job(&job_id, api_key).await?;
        let fragments = self.fetch_pages(&job_id, api_key).await?;

        info!(%job_id, fragments = fragments.len(), "LlamaParse completado");
        Ok(fragments)
    }
}

async fn ensure_success(response: Response) -> Result<Response, PremiumParseError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(PremiumParseError::Status { status, body })
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct JsonResult {
    #[serde(default)]
    pages: Vec<JsonPage>,
}

#[derive(Debug, Deserialize)]
struct JsonPage {
    #[serde(default)]
    md: String,
}
