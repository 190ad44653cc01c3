//! Abstracción sobre Rig para pedir completados al LLM.
//!
//! El resto de la aplicación sólo ve [`CompletionBackend`]; la implementación
//! real usa OpenAI a través de Rig y los tests usan dobles deterministas.

use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openai;
use thiserror::Error;
use tracing::debug;

use crate::config::AppConfig;

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Envía `prompt` como único mensaje de usuario y devuelve el texto de la respuesta.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(String),
}

/// Backend de completado de OpenAI vía Rig.
#[derive(Clone)]
pub struct OpenAiCompletion {
    client: openai::Client,
    chat_model: String,
    temperature: f64,
}

impl OpenAiCompletion {
    /// Construye el backend a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            client: openai::Client::new(&cfg.openai_api_key),
            chat_model: cfg.llm_chat_model.clone(),
            temperature: cfg.llm_temperature,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        // Sin preámbulo: el prompt completo va como mensaje de usuario.
        let agent = self
            .client
            .agent(&self.chat_model)
            .temperature(self.temperature)
            .build();

        debug!(model = %self.chat_model, prompt_bytes = prompt.len(), "Llamando al LLM");
        agent
            .prompt(prompt)
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))
    }
}
