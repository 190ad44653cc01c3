//! Servicio que genera mapas mentales a partir de PDFs y responde preguntas
//! sobre un contexto dado, apoyándose en un LLM.
//!
//! Flujo de subida:
//!   1. Detección de complejidad (¿hay imágenes?).
//!   2. Extracción de texto, simple o premium.
//!   3. Troceado con solape.
//!   4. Mapa mental a partir de los primeros chunks.

pub mod api;
pub mod app_state;
pub mod chunker;
pub mod complexity;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mindmap;
pub mod models;
pub mod premium;
pub mod qa;
