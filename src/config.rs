//! Carga y gestión de configuración de la aplicación (LLM + parser premium + chunking).

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};

/// Configuración completa de la aplicación.
///
/// Se construye una única vez al arrancar y se comparte por referencia; nada
/// de esto cambia durante la vida del proceso.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,

    pub openai_api_key: String,
    pub llm_chat_model: String,
    pub llm_temperature: f64,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Número de chunks iniciales que forman la muestra enviada al LLM.
    pub sample_chunks: usize,
    pub max_upload_bytes: usize,

    pub llama_cloud_base_url: String,
    pub llama_poll_interval: Duration,
    pub llama_max_wait: Duration,

    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que [`AppConfig::from_env`], pero leyendo de una función arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("Falta OPENAI_API_KEY en el entorno"))?;

        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8000".to_string());
        let llm_chat_model = lookup("LLM_CHAT_MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let llm_temperature = parse_or(&lookup, "LLM_TEMPERATURE", 0.3)?;

        let chunk_size: usize = parse_or(&lookup, "CHUNK_SIZE", 1000)?;
        let chunk_overlap: usize = parse_or(&lookup, "CHUNK_OVERLAP", 100)?;
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(anyhow!(
                "CHUNK_OVERLAP ({chunk_overlap}) debe ser menor que CHUNK_SIZE ({chunk_size})"
            ));
        }
        let sample_chunks = parse_or(&lookup, "SAMPLE_CHUNKS", 3)?;
        let max_upload_mb: usize = parse_or(&lookup, "MAX_UPLOAD_MB", 50)?;

        let llama_cloud_base_url = lookup("LLAMA_CLOUD_BASE_URL")
            .unwrap_or_else(|| "https://api.cloud.llamaindex.ai".to_string())
            .trim_end_matches('/')
            .to_string();
        let llama_poll_interval =
            Duration::from_millis(parse_or(&lookup, "LLAMA_PARSE_POLL_INTERVAL_MS", 1000)?);
        let llama_max_wait =
            Duration::from_secs(parse_or(&lookup, "LLAMA_PARSE_MAX_WAIT_SECS", 2000)?);

        let static_dir = lookup("STATIC_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            server_addr,
            openai_api_key,
            llm_chat_model,
            llm_temperature,
            chunk_size,
            chunk_overlap,
            sample_chunks,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            llama_cloud_base_url,
            llama_poll_interval,
            llama_max_wait,
            static_dir,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido para {key}: '{raw}'")),
        None => Ok(default),
    }
}
