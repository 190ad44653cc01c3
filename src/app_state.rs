use std::sync::Arc;

use crate::{
    chunker::Chunker, config::AppConfig, extract::TextExtractor, llm::CompletionBackend,
    mindmap::MindMapGenerator, premium::PremiumParser, qa::QuestionAnswerer,
};

/// Estado compartido por todos los handlers. Es inmutable: se clona por
/// petición y sólo contiene `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub extractor: Arc<TextExtractor>,
    pub chunker: Arc<Chunker>,
    pub mind_maps: Arc<MindMapGenerator>,
    pub answerer: Arc<QuestionAnswerer>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        completion: Arc<dyn CompletionBackend>,
        premium: Arc<dyn PremiumParser>,
    ) -> Self {
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap);
        Self {
            config: Arc::new(config),
            extractor: Arc::new(TextExtractor::new(premium)),
            chunker: Arc::new(chunker),
            mind_maps: Arc::new(MindMapGenerator::new(completion.clone())),
            answerer: Arc::new(QuestionAnswerer::new(completion)),
        }
    }
}
