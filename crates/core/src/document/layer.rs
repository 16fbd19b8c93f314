//! Optional content groups: layers a viewer can show or hide.

use itertools::Itertools;

use super::{Document, PdfVersion};
use crate::utils::utf8_to_utf16;

/// A layer declared with [`Document::add_layer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    visible: bool,
    object: usize,
}

impl Layer {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial visibility in the viewer.
    pub fn visible(&self) -> bool {
        self.visible
    }
}

impl Document {
    /// Declare a layer and return its handle for [`Document::begin_layer`].
    pub fn add_layer(&mut self, name: &str, visible: bool) -> usize {
        self.layers.push(Layer {
            name: name.to_string(),
            visible,
            object: 0,
        });
        self.layers.len() - 1
    }

    /// Start content belonging to layer `id`. Layers do not nest: an open
    /// layer is ended first. Unknown handles are ignored.
    pub fn begin_layer(&mut self, id: usize) {
        self.end_layer();
        if id < self.layers.len() {
            self.out(&format!("/OC /OC{id} BDC"));
            self.current_layer = Some(id);
        }
    }

    /// End the open layer, if any.
    pub fn end_layer(&mut self) {
        if self.current_layer.take().is_some() {
            self.out("EMC");
        }
    }

    /// Ask the viewer to show the layer panel when the document opens.
    pub fn open_layer_pane(&mut self) {
        self.open_layer_pane = true;
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layer_end_doc(&mut self) {
        if !self.layers.is_empty() {
            self.require_version(PdfVersion::V1_5);
        }
    }

    pub(crate) fn put_layers(&mut self) {
        for j in 0..self.layers.len() {
            let n = self.newobj();
            self.layers[j].object = n;
            let utf16 = utf8_to_utf16(&self.layers[j].name, true);
            let name = self.text_string(&utf16);
            let mut line = b"<</Type /OCG /Name ".to_vec();
            line.extend_from_slice(&name);
            line.extend_from_slice(b">>");
            self.put_bytes(&line);
            self.put("endobj");
        }
    }

    pub(crate) fn put_layer_resources(&mut self) {
        if self.layers.is_empty() {
            return;
        }
        self.put("/Properties <<");
        let entries: Vec<String> = self
            .layers
            .iter()
            .enumerate()
            .map(|(j, layer)| format!("/OC{j} {} 0 R", layer.object))
            .collect();
        for entry in entries {
            self.put(&entry);
        }
        self.put(">>");
    }

    pub(crate) fn put_layer_catalog(&mut self) {
        if self.layers.is_empty() {
            return;
        }
        let on = self.layers.iter().map(|l| format!("{} 0 R", l.object)).join(" ");
        let off = self
            .layers
            .iter()
            .filter(|l| !l.visible)
            .map(|l| format!("{} 0 R", l.object))
            .join(" ");
        self.put(&format!("/OCProperties <</OCGs [{on}] /D <</OFF [{off}] /Order [{on}]>>>>"));
        if self.open_layer_pane {
            self.put("/PageMode /UseOC");
        }
    }
}
