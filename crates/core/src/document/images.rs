//! Image registration, placement and XObject output.

use std::fs::File;
use std::io::Read;
use std::sync::Arc;

use tracing::trace;

use super::Document;
use crate::codec::flate;
use crate::error::Result;
use crate::image::{ColorSpace, ImageInfo, ImageOptions, ImageType, parse_image};

impl Document {
    /// Register the image file at `path`, inferring its type from the
    /// extension. Registering a name again returns the cached image.
    pub fn register_image(&mut self, path: &str) -> Option<Arc<ImageInfo>> {
        self.register_image_options(path, &ImageOptions::default())
    }

    pub fn register_image_options(
        &mut self,
        path: &str,
        opts: &ImageOptions,
    ) -> Option<Arc<ImageInfo>> {
        if self.err.is_some() {
            return None;
        }
        if let Some(info) = self.images.get(path) {
            return Some(info.clone());
        }
        match File::open(path) {
            Ok(file) => self.register_image_options_reader(path, opts, file),
            Err(err) => {
                self.set_error(err.into());
                None
            }
        }
    }

    /// Register an image read from `reader` under `name`. The type must be
    /// given in `opts` unless `name` carries a recognizable extension.
    pub fn register_image_options_reader(
        &mut self,
        name: &str,
        opts: &ImageOptions,
        reader: impl Read,
    ) -> Option<Arc<ImageInfo>> {
        if self.err.is_some() {
            return None;
        }
        if let Some(info) = self.images.get(name) {
            return Some(info.clone());
        }
        let parsed = opts
            .image_type
            .map_or_else(|| ImageType::from_path(name), Ok)
            .and_then(|image_type| parse_image(image_type, reader, opts.read_dpi));
        match parsed {
            Ok(info) => {
                trace!(image = name, id = %info.id, "image registered");
                let info = Arc::new(info);
                self.images.insert(name.to_string(), info.clone());
                Some(info)
            }
            Err(err) => {
                self.set_error(err);
                None
            }
        }
    }

    /// A previously registered image.
    pub fn get_image_info(&self, name: &str) -> Option<Arc<ImageInfo>> {
        self.images.get(name).cloned()
    }

    /// Place an image, registering it first if needed.
    ///
    /// With `w` and `h` both zero the image is sized at 96 dpi; a value of
    /// -1 uses the image's own resolution, any other negative value is taken
    /// as a resolution, and a single zero keeps the aspect ratio. In `flow`
    /// mode the image goes at the current ordinate (breaking the page if it
    /// does not fit) and the cursor moves below it.
    #[allow(clippy::too_many_arguments)]
    pub fn image(&mut self, name: &str, x: f64, y: f64, w: f64, h: f64, flow: bool) {
        self.image_options(name, x, y, w, h, flow, &ImageOptions::default());
    }

    #[allow(clippy::too_many_arguments)]
    pub fn image_options(
        &mut self,
        name: &str,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        flow: bool,
        opts: &ImageOptions,
    ) {
        if self.err.is_some() {
            return;
        }
        let Some(info) = self.register_image_options(name, opts) else {
            return;
        };
        self.image_out(&info, x, y, w, h, opts.allow_negative_position, flow);
    }

    #[allow(clippy::too_many_arguments)]
    fn image_out(
        &mut self,
        info: &ImageInfo,
        mut x: f64,
        mut y: f64,
        mut w: f64,
        mut h: f64,
        allow_negative_x: bool,
        flow: bool,
    ) {
        if w == 0.0 && h == 0.0 {
            w = -96.0;
            h = -96.0;
        }
        if w == -1.0 {
            w = -info.dpi;
        }
        if h == -1.0 {
            h = -info.dpi;
        }
        if w < 0.0 {
            w = -info.width * 72.0 / w / self.k;
        }
        if h < 0.0 {
            h = -info.height * 72.0 / h / self.k;
        }
        if w == 0.0 {
            w = h * info.width / info.height;
        }
        if h == 0.0 {
            h = w * info.height / info.width;
        }
        if flow {
            if self.needs_page_break(h) {
                let x2 = self.x;
                self.add_page_format(self.cur_orientation, self.cur_page_size);
                if self.err.is_some() {
                    return;
                }
                self.x = x2;
            }
            y = self.y;
            self.y += h;
        }
        if x < 0.0 && !allow_negative_x {
            x = self.x;
        }
        let k = self.k;
        self.out(&format!(
            "q {:.5} 0 0 {:.5} {:.5} {:.5} cm /I{} Do Q",
            w * k,
            h * k,
            x * k,
            (self.h - (y + h)) * k,
            info.id
        ));
    }

    pub(crate) fn put_images(&mut self) -> Result<()> {
        let images: Vec<_> = self.images.values().cloned().collect();
        for info in images {
            if self.image_objects.contains_key(&info.id) {
                continue;
            }
            let n = self.put_image(&info)?;
            self.image_objects.insert(info.id.clone(), n);
        }
        Ok(())
    }

    fn put_image(&mut self, info: &ImageInfo) -> Result<usize> {
        let n = self.newobj();
        self.put("<</Type /XObject");
        self.put("/Subtype /Image");
        self.put(&format!("/Width {}", info.width as i64));
        self.put(&format!("/Height {}", info.height as i64));
        if info.color_space == ColorSpace::Indexed {
            self.put(&format!(
                "/ColorSpace [/Indexed /DeviceRGB {} {} 0 R]",
                (info.palette.len() / 3).saturating_sub(1),
                n + 1
            ));
        } else {
            self.put(&format!("/ColorSpace /{}", info.color_space.as_str()));
            if info.color_space == ColorSpace::DeviceCMYK {
                self.put("/Decode [1 0 1 0 1 0 1 0]");
            }
        }
        self.put(&format!("/BitsPerComponent {}", info.bpc));
        if !info.filter.is_empty() {
            self.put(&format!("/Filter /{}", info.filter));
        }
        if !info.decode_parms.is_empty() {
            self.put(&format!("/DecodeParms <<{}>>", info.decode_parms));
        }
        if !info.trns.is_empty() {
            let mask: String = info.trns.iter().map(|v| format!("{v} {v} ")).collect();
            self.put(&format!("/Mask [{mask}]"));
        }
        if !info.smask.is_empty() {
            self.put(&format!("/SMask {} 0 R", n + 1));
        }
        self.put(&format!("/Length {}>>", info.data.len()));
        self.put_stream(&info.data);
        self.put("endobj");

        if !info.smask.is_empty() {
            let smask = ImageInfo {
                data: info.smask.clone(),
                width: info.width,
                height: info.height,
                color_space: ColorSpace::DeviceGray,
                bpc: 8,
                filter: info.filter.clone(),
                decode_parms: format!(
                    "/Predictor 15 /Colors 1 /BitsPerComponent 8 /Columns {}",
                    info.width as i64
                ),
                ..ImageInfo::default()
            };
            self.put_image(&smask)?;
        }
        if info.color_space == ColorSpace::Indexed {
            self.newobj();
            if self.compress {
                let palette = flate::compress(&info.palette)?.to_vec();
                self.put(&format!("<</Filter /FlateDecode /Length {}>>", palette.len()));
                self.put_stream(&palette);
            } else {
                self.put(&format!("<</Length {}>>", info.palette.len()));
                self.put_stream(&info.palette);
            }
            self.put("endobj");
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DocumentOptions, Unit};
    use super::*;
    use crate::error::PdfError;

    fn gray_png() -> Vec<u8> {
        crate::image::png::tests::encode_gray_png(4, 2)
    }

    fn doc() -> Document {
        let mut doc = Document::with_options(DocumentOptions {
            unit: Unit::Point,
            ..DocumentOptions::default()
        });
        doc.add_page();
        doc.pages[1].clear();
        doc
    }

    #[test]
    fn register_requires_known_type() {
        let mut doc = doc();
        let opts = ImageOptions::default();
        assert!(doc.register_image_options_reader("logo", &opts, &gray_png()[..]).is_none());
        assert!(doc.error().is_some());
    }

    #[test]
    fn registration_is_idempotent() {
        let mut doc = doc();
        let opts = ImageOptions {
            image_type: Some(ImageType::Png),
            ..ImageOptions::default()
        };
        let first = doc.register_image_options_reader("logo", &opts, &gray_png()[..]).unwrap();
        let second = doc
            .register_image_options_reader("logo", &opts, &b"garbage"[..])
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(doc.ok());
    }

    #[test]
    fn default_size_is_96_dpi() {
        let mut doc = doc();
        let opts = ImageOptions {
            image_type: Some(ImageType::Png),
            ..ImageOptions::default()
        };
        let info = doc.register_image_options_reader("logo", &opts, &gray_png()[..]).unwrap();
        doc.image_options("logo", 10.0, 10.0, 0.0, 0.0, false, &opts);
        let content = String::from_utf8(doc.pages[1].clone()).unwrap();
        assert_eq!(
            content,
            format!("q 3.00000 0 0 1.50000 10.00000 830.39000 cm /I{} Do Q\n", info.id())
        );
    }

    #[test]
    fn flow_moves_cursor_below() {
        let mut doc = doc();
        let opts = ImageOptions {
            image_type: Some(ImageType::Png),
            ..ImageOptions::default()
        };
        doc.register_image_options_reader("logo", &opts, &gray_png()[..]);
        let y = doc.get_y();
        doc.image_options("logo", -1.0, 0.0, 40.0, 0.0, true, &opts);
        assert_eq!(doc.get_y(), y + 20.0);
    }

    #[test]
    fn missing_file_latches_io_error() {
        let mut doc = doc();
        doc.image("/nonexistent/picture.png", 0.0, 0.0, 10.0, 10.0, false);
        assert!(matches!(doc.error(), Some(PdfError::Io(_))));
    }

    #[test]
    fn identical_images_written_once() {
        let mut doc = doc();
        let opts = ImageOptions {
            image_type: Some(ImageType::Png),
            ..ImageOptions::default()
        };
        doc.register_image_options_reader("a", &opts, &gray_png()[..]);
        doc.register_image_options_reader("b", &opts, &gray_png()[..]);
        doc.put_images().unwrap();
        assert_eq!(doc.image_objects.len(), 1);
    }
}
