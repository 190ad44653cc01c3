//! Respuesta a preguntas libres sobre un contexto suministrado por el cliente.
//!
//! No hay búsqueda ni memoria de conversación: el contexto llega entero en la
//! petición y la respuesta del LLM se devuelve sin tocar.

use std::sync::Arc;

use tracing::info;

use crate::llm::{CompletionBackend, CompletionError};

pub struct QuestionAnswerer {
    backend: Arc<dyn CompletionBackend>,
}

impl QuestionAnswerer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn answer(&self, context: &str, question: &str) -> Result<String, CompletionError> {
        let answer = self.backend.complete(&build_prompt(context, question)).await?;
        info!(answer_chars = answer.chars().count(), "Pregunta respondida");
        Ok(answer)
    }
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Given the following content, answer the question.\n\nContent:\n{context}\n\nQuestion:\n{question}\n"
    )
}
