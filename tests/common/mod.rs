#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream,
};

use pdf_mindmap::{
    app_state::AppState,
    config::AppConfig,
    llm::{CompletionBackend, CompletionError},
    premium::{ParsedFragment, PremiumParseError, PremiumParser},
};

pub const MIND_MAP_REPLY: &str = r#"Here is your mind map:
```json
{"name":"Hello World","children":[{"name":"Greeting","children":[]}]}
```
Hope that helps!"#;

/// Backend de completado que responde siempre lo mismo y guarda los prompts.
pub struct StubCompletion {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionBackend for StubCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(CompletionError::Request)
    }
}

/// Llamada registrada por [`StubPremium`].
pub struct PremiumCall {
    pub path: PathBuf,
    pub file_existed: bool,
    pub api_key: String,
}

/// Parser premium de pega: devuelve fragmentos fijos o falla.
pub struct StubPremium {
    fragments: Option<Vec<String>>,
    pub calls: Mutex<Vec<PremiumCall>>,
}

impl StubPremium {
    pub fn returning(fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: Some(fragments.iter().map(|s| s.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fragments: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call_path(&self) -> Option<PathBuf> {
        self.calls.lock().unwrap().last().map(|call| call.path.clone())
    }

    /// Si el fichero temporal existía durante todas las llamadas.
    pub fn saw_existing_file(&self) -> bool {
        self.calls.lock().unwrap().iter().all(|call| call.file_existed)
    }
}

#[async_trait]
impl PremiumParser for StubPremium {
    async fn parse(
        &self,
        path: &Path,
        api_key: &str,
    ) -> Result<Vec<ParsedFragment>, PremiumParseError> {
        self.calls.lock().unwrap().push(PremiumCall {
            path: path.to_path_buf(),
            file_existed: path.exists(),
            api_key: api_key.to_string(),
        });
        match &self.fragments {
            Some(fragments) => Ok(fragments
                .iter()
                .map(|text| ParsedFragment { text: text.clone() })
                .collect()),
            None => Err(PremiumParseError::JobFailed {
                job_id: "job-1".to_string(),
                status: "ERROR".to_string(),
            }),
        }
    }
}

pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("OPENAI_API_KEY", "sk-test"),
        ("LLAMA_CLOUD_BASE_URL", "http://127.0.0.1:9"),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub fn test_state(completion: Arc<StubCompletion>, premium: Arc<StubPremium>) -> AppState {
    AppState::new(test_config(), completion, premium)
}

// --- PDFs de prueba construidos en memoria ---

/// PDF de una página por cada texto dado, con la fuente estándar Courier.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    build_pdf(pages, |_| false, TreeImage::None)
}

/// Igual que [`text_pdf`] pero con una imagen 1x1 en los recursos de cada página.
pub fn image_pdf(pages: &[&str]) -> Vec<u8> {
    build_pdf(pages, |_| true, TreeImage::None)
}

/// Dos páginas: la primera sólo con texto, la segunda con una imagen.
pub fn mixed_pdf(text_page: &str, image_page: &str) -> Vec<u8> {
    build_pdf(&[text_page, image_page], |index| index == 1, TreeImage::None)
}

/// La imagen no está en la página sino en los `Resources` del nodo `Pages`.
pub fn inherited_image_pdf(pages: &[&str], tree_image: TreeImage) -> Vec<u8> {
    build_pdf(pages, |_| false, tree_image)
}

/// PDF de una página sin ningún texto.
pub fn blank_pdf() -> Vec<u8> {
    build_pdf(&[""], |_| false, TreeImage::None)
}

/// Dónde colocar una imagen en los recursos del árbol de páginas.
#[derive(Clone, Copy)]
pub enum TreeImage {
    None,
    /// Diccionario `Resources` escrito dentro del nodo `Pages`.
    Inline,
    /// `Resources` del nodo `Pages` como referencia indirecta.
    Referenced,
}

fn build_pdf(
    pages: &[&str],
    image_on_page: impl Fn(usize) -> bool,
    tree_image: TreeImage,
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0u8],
    ));

    let mut kids: Vec<Object> = Vec::new();
    for (index, text) in pages.iter().enumerate() {
        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if image_on_page(index) {
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }

        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let mut tree = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    let tree_resources = dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    };
    match tree_image {
        TreeImage::None => {}
        TreeImage::Inline => tree.set("Resources", tree_resources),
        TreeImage::Referenced => {
            let resources_id = doc.add_object(tree_resources);
            tree.set("Resources", resources_id);
        }
    }
    doc.objects.insert(pages_id, Object::Dictionary(tree));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

// --- Peticiones multipart ---

pub const BOUNDARY: &str = "----mindmap-test-boundary";

pub enum Part<'a> {
    File { name: &'a str, filename: &'a str, bytes: &'a [u8] },
    Text { name: &'a str, value: &'a str },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, filename, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
