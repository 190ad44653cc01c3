//! Detección de PDFs "complejos": los que llevan imágenes incrustadas.

use std::{collections::HashSet, path::Path};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

/// Devuelve `true` en cuanto alguna página tiene al menos una imagen.
///
/// Si el PDF no se puede abrir, se registra el fallo y se devuelve `false`:
/// la detección nunca bloquea la ingesta.
pub fn has_embedded_images(path: &Path) -> bool {
    match scan_for_images(path) {
        Ok(found) => found,
        Err(e) => {
            warn!(
                "No se pudieron detectar imágenes en el PDF {}: {}",
                path.display(),
                e
            );
            false
        }
    }
}

/// Sólo falla si el documento no se puede cargar.
pub fn scan_for_images(path: &Path) -> lopdf::Result<bool> {
    let doc = Document::load(path)?;

    // get_pages() viene ordenado por número de página.
    for (page_number, page_id) in doc.get_pages() {
        if page_has_image(&doc, page_id) {
            debug!(page = page_number, "Imagen incrustada encontrada");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Una página sin `Resources` o sin `XObject` simplemente no tiene imágenes.
fn page_has_image(doc: &Document, page_id: ObjectId) -> bool {
    page_resources(doc, page_id)
        .into_iter()
        .any(|resources| resources_have_image(doc, resources))
}

/// Diccionarios `Resources` de la página y de sus ancestros en el árbol de
/// páginas; los recursos se heredan a través de `Parent`.
fn page_resources(doc: &Document, page_id: ObjectId) -> Vec<&Dictionary> {
    let mut found = Vec::new();
    let mut seen = HashSet::from([page_id]);
    let mut node = doc.get_dictionary(page_id).ok();

    while let Some(dict) = node {
        if let Ok(resources) = doc.get_dict_in_dict(dict, b"Resources") {
            found.push(resources);
        }
        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .ok()
            .filter(|parent_id| seen.insert(*parent_id))
            .and_then(|parent_id| doc.get_dictionary(parent_id).ok());
    }
    found
}

fn resources_have_image(doc: &Document, resources: &Dictionary) -> bool {
    let Ok(xobjects) = doc.get_dict_in_dict(resources, b"XObject") else {
        return false;
    };

    xobjects.iter().any(|(_, value)| {
        doc.dereference(value)
            .and_then(|(_, object)| object.as_stream())
            .and_then(|stream| stream.dict.get(b"Subtype").and_then(Object::as_name))
            .map(|subtype| subtype == b"Image")
            .unwrap_or(false)
    })
}
