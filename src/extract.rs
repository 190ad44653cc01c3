//! Extracción de texto de un PDF subido.
//!
//! El fichero se vuelca a un temporal porque tanto la detección de
//! complejidad como el parser premium necesitan una ruta en disco. Según el
//! veredicto se usa la vía simple (pdf-extract, página a página) o la premium.

use std::{io::Write, path::Path, sync::Arc};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{error, info, warn};

use crate::{
    complexity,
    models::{ExtractionResult, UploadedDocument},
    premium::{PremiumParseError, PremiumParser},
};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not stage the upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF text extraction failed: {0}")]
    Pdf(#[from] pdf_extract::OutputError),
    #[error(transparent)]
    Premium(#[from] PremiumParseError),
    #[error("extraction task aborted: {0}")]
    Task(#[from] JoinError),
}

pub struct TextExtractor {
    premium: Arc<dyn PremiumParser>,
}

impl TextExtractor {
    pub fn new(premium: Arc<dyn PremiumParser>) -> Self {
        Self { premium }
    }

    /// Extrae el texto del PDF eligiendo la vía según su complejidad.
    ///
    /// La vía premium sólo se usa si el PDF tiene imágenes *y* llega una
    /// clave no vacía. Si la vía premium falla, el error se propaga: no se
    /// reintenta con la vía simple.
    pub async fn extract(
        &self,
        upload: &UploadedDocument,
        premium_api_key: Option<&str>,
    ) -> Result<ExtractionResult, ExtractionError> {
        let bytes = upload.bytes.clone();
        let staged = task::spawn_blocking(move || stage_upload(&bytes)).await??;
        let path = staged.path().to_path_buf();

        let is_complex = {
            let path = path.clone();
            task::spawn_blocking(move || complexity::has_embedded_images(&path)).await?
        };

        let premium_key = premium_api_key.filter(|key| !key.trim().is_empty());
        let text = match premium_key {
            Some(key) if is_complex => {
                info!(filename = %upload.filename, "PDF complejo: usando el parser premium");
                self.extract_premium(&path, key).await?
            }
            _ => {
                info!(
                    filename = %upload.filename,
                    is_complex,
                    "Usando extracción simple"
                );
                task::spawn_blocking(move || extract_simple(&path)).await??
            }
        };

        // Si algo falla antes, el Drop de NamedTempFile borra el fichero igualmente.
        if let Err(e) = staged.close() {
            warn!("No se pudo borrar el temporal del PDF: {}", e);
        }

        Ok(ExtractionResult { text, is_complex })
    }

    async fn extract_premium(&self, path: &Path, api_key: &str) -> Result<String, ExtractionError> {
        let fragments = self.premium.parse(path, api_key).await.map_err(|e| {
            error!("Error en el procesado premium del documento: {}", e);
            e
        })?;

        Ok(fragments
            .into_iter()
            .map(|fragment| fragment.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn stage_upload(bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// Vía simple: texto página a página, unido con saltos de línea.
fn extract_simple(path: &Path) -> Result<String, ExtractionError> {
    let pages = pdf_extract::extract_text_by_pages(path)?;
    Ok(pages.join("\n"))
}
