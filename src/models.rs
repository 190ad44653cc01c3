//! Modelos de dominio (documento subido, resultado de extracción y mapa mental).
//!
//! Todos viven lo que dura una petición; no se persiste nada.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// PDF recibido en la petición, tal cual llegó del formulario multipart.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Sólo se mira el nombre: la validación de contenido la hace el parser.
    pub fn has_pdf_extension(&self) -> bool {
        self.filename.to_lowercase().ends_with(".pdf")
    }
}

/// Texto extraído de un PDF junto con el veredicto de complejidad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    /// `true` si alguna página contiene al menos una imagen incrustada.
    pub is_complex: bool,
}

/// Nodo del mapa mental. La raíz es siempre un único nodo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    /// Profundidad del árbol; una hoja tiene profundidad 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Estadísticas devueltas junto al mapa mental.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadStats {
    pub total_characters: usize,
    pub number_of_chunks: usize,
    pub is_complex: bool,
}
