//! Low-level output: page content and the object buffer.

use super::{DocState, Document};
use crate::error::PdfError;
use crate::utils::escape;

impl Document {
    /// Append a content-stream line to the current page.
    pub(crate) fn out(&mut self, s: &str) {
        self.out_bytes(s.as_bytes());
    }

    pub(crate) fn out_bytes(&mut self, b: &[u8]) {
        if self.err.is_some() {
            return;
        }
        match self.state {
            DocState::PageOpen => {
                let page = &mut self.pages[self.page];
                page.extend_from_slice(b);
                page.push(b'\n');
            }
            DocState::Closed => self.set_error(PdfError::Closed),
            _ => self.set_error(PdfError::InvalidArgument(
                "no page has been added to the document".into(),
            )),
        }
    }

    /// Append a line to the file buffer.
    pub(crate) fn put(&mut self, s: &str) {
        self.put_bytes(s.as_bytes());
    }

    pub(crate) fn put_bytes(&mut self, b: &[u8]) {
        self.buffer.extend_from_slice(b);
        self.buffer.push(b'\n');
    }

    /// Begin a new indirect object and return its number.
    pub(crate) fn newobj(&mut self) -> usize {
        self.n += 1;
        if self.offsets.len() <= self.n {
            self.offsets.resize(self.n + 1, 0);
        }
        self.offsets[self.n] = self.buffer.len();
        self.put(&format!("{} 0 obj", self.n));
        self.n
    }

    /// Write a stream body for the current object, encrypted when the
    /// document is protected.
    pub(crate) fn put_stream(&mut self, data: &[u8]) {
        self.put("stream");
        let n = self.n as u32;
        match self.protection.as_mut() {
            Some(protection) => {
                let mut buf = data.to_vec();
                protection.encrypt(n, &mut buf);
                self.put_bytes(&buf);
            }
            None => self.put_bytes(data),
        }
        self.put("endstream");
    }

    /// A literal string for the current object, encrypted when the document
    /// is protected.
    pub(crate) fn text_string(&mut self, s: &[u8]) -> Vec<u8> {
        let mut buf = s.to_vec();
        let n = self.n as u32;
        if let Some(protection) = self.protection.as_mut() {
            protection.encrypt(n, &mut buf);
        }
        let mut out = Vec::with_capacity(buf.len() + 2);
        out.push(b'(');
        out.extend_from_slice(&escape(&buf));
        out.push(b')');
        out
    }

    /// Write `key (value)` with the value as a text string.
    pub(crate) fn put_text_entry(&mut self, key: &str, value: &[u8]) {
        let mut line = key.as_bytes().to_vec();
        line.push(b' ');
        line.extend_from_slice(&self.text_string(value));
        self.put_bytes(&line);
    }
}
