//! Generación del mapa mental a partir de una muestra de texto.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    llm::{CompletionBackend, CompletionError},
    models::MindMapNode,
};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("model response is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),
    #[error("model response is not a mind map tree: {0}")]
    InvalidTree(serde_json::Error),
}

pub struct MindMapGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl MindMapGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate(&self, sample: &str) -> Result<MindMapNode, GenerationError> {
        let response = self.backend.complete(&build_prompt(sample)).await?;

        let value = recover_json(&response).map_err(|e| {
            warn!("Respuesta del LLM sin JSON válido: '{}'", response);
            GenerationError::InvalidJson(e)
        })?;
        let tree: MindMapNode =
            serde_json::from_value(value).map_err(GenerationError::InvalidTree)?;

        info!(
            root = %tree.name,
            branches = tree.children.len(),
            depth = tree.depth(),
            "Mapa mental generado"
        );
        Ok(tree)
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"
Please output a multilevel hierarchical mind map in JSON format for the text below.
ONLY return valid JSON—no markdown, no explanations.
Structure:
{{"name":"Main Topic","children":[{{"name":"Subtopic","children":[...]}}]}}

Text:
{text}
"#
    )
}

/// Recupera el primer objeto JSON de nivel superior de una respuesta del LLM.
///
/// Recorre la respuesta contando la profundidad de llaves y se queda con la
/// región que va desde la primera `{` abierta a profundidad 0 hasta la `}`
/// que vuelve a 0. Si no hay región equilibrada, intenta parsear la
/// respuesta entera.
pub fn recover_json(response: &str) -> Result<Value, serde_json::Error> {
    let mut depth: i64 = 0;
    let mut start = None;

    for (i, c) in response.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = start {
                        return serde_json::from_str(&response[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    serde_json::from_str(response.trim())
}
