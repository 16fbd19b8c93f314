//! Font definitions, the embedded core fonts and font program loading.
//!
//! A font is described by a JSON definition (`Tp`, `Name`, `Desc`, `Up`,
//! `Ut`, `Cw`, ...) as produced by the makefont tool. The fourteen standard
//! PDF fonts ship inside the crate; other fonts are read from the font
//! directory (or any [`FontLoader`]) together with their `.z` program.

pub mod encoding;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PdfError, Result};
use crate::utils::sha1_hex;

/// Font program flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontType {
    #[default]
    Core,
    TrueType,
    Type1,
}

impl FontType {
    pub fn as_str(self) -> &'static str {
        match self {
            FontType::Core => "Core",
            FontType::TrueType => "TrueType",
            FontType::Type1 => "Type1",
        }
    }
}

/// Glyph bounding box in font units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FontBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

/// Font descriptor values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FontDesc {
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub flags: i32,
    #[serde(rename = "FontBBox")]
    pub font_bbox: FontBox,
    pub italic_angle: i32,
    pub stem_v: i32,
    pub missing_width: i32,
}

/// A font definition: metrics plus the name of its embedded program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FontDef {
    pub tp: FontType,
    pub name: String,
    pub desc: FontDesc,
    pub up: i32,
    pub ut: i32,
    pub cw: Vec<i32>,
    pub enc: String,
    pub diff: String,
    pub file: String,
    pub size1: i64,
    pub size2: i64,
    pub original_size: i64,
}

impl FontDef {
    /// Parse a JSON font definition.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let def: FontDef = serde_json::from_slice(data)
            .map_err(|e| PdfError::FontDefinition(format!("malformed font definition: {e}")))?;
        if def.name.is_empty() {
            return Err(PdfError::FontDefinition("font definition has no name".into()));
        }
        if def.cw.len() < 256 {
            return Err(PdfError::FontDefinition(format!(
                "width table of {} has {} entries, expected 256",
                def.name,
                def.cw.len()
            )));
        }
        Ok(def)
    }

    /// Fonts with a built-in encoding take bytes as is.
    pub fn is_symbolic(&self) -> bool {
        self.name == "Symbol" || self.name == "ZapfDingbats"
    }

    /// Width of a character for glyphs the font does not encode.
    pub fn missing_width(&self) -> i32 {
        if self.desc.missing_width > 0 {
            self.desc.missing_width
        } else {
            1000
        }
    }

    /// Width of an encoded byte in font units.
    pub fn width(&self, b: u8) -> i32 {
        self.cw[b as usize]
    }

    /// Width of a Unicode character in font units.
    pub fn char_width(&self, c: char) -> i32 {
        match self.code_for(c) {
            Some(b) => self.width(b),
            None => self.missing_width(),
        }
    }

    /// Sum of byte widths in font units.
    pub fn bytes_width(&self, s: &[u8]) -> i64 {
        s.iter().map(|&b| i64::from(self.width(b))).sum()
    }

    /// Encode text for this font's single-byte encoding.
    pub fn encode(&self, s: &str) -> Vec<u8> {
        if self.is_symbolic() {
            encoding::encode_latin1(s)
        } else {
            encoding::encode_cp1252(s)
        }
    }

    fn code_for(&self, c: char) -> Option<u8> {
        if self.is_symbolic() {
            u8::try_from(c as u32).ok()
        } else {
            encoding::cp1252_byte(c)
        }
    }
}

/// Families with embedded metric files.
pub const CORE_FAMILIES: [&str; 5] = ["courier", "helvetica", "times", "symbol", "zapfdingbats"];

const CORE_FONT_FILES: [(&str, &str); 14] = [
    ("courier", include_str!("core/courier.json")),
    ("courierb", include_str!("core/courierb.json")),
    ("courieri", include_str!("core/courieri.json")),
    ("courierbi", include_str!("core/courierbi.json")),
    ("helvetica", include_str!("core/helvetica.json")),
    ("helveticab", include_str!("core/helveticab.json")),
    ("helveticai", include_str!("core/helveticai.json")),
    ("helveticabi", include_str!("core/helveticabi.json")),
    ("times", include_str!("core/times.json")),
    ("timesb", include_str!("core/timesb.json")),
    ("timesi", include_str!("core/timesi.json")),
    ("timesbi", include_str!("core/timesbi.json")),
    ("symbol", include_str!("core/symbol.json")),
    ("zapfdingbats", include_str!("core/zapfdingbats.json")),
];

/// A parsed core font with its resource identifier.
#[derive(Debug)]
pub struct CoreFont {
    pub def: Arc<FontDef>,
    pub id: String,
}

static CORE_FONTS: LazyLock<HashMap<&'static str, CoreFont>> = LazyLock::new(|| {
    CORE_FONT_FILES
        .iter()
        .filter_map(|(key, src)| {
            let def = FontDef::from_json(src.as_bytes()).ok()?;
            Some((
                *key,
                CoreFont {
                    def: Arc::new(def),
                    id: sha1_hex(src.as_bytes()),
                },
            ))
        })
        .collect()
});

/// Look up an embedded core font by its lower-cased family+style key,
/// e.g. `helveticabi`.
pub fn core_font(key: &str) -> Option<&'static CoreFont> {
    CORE_FONTS.get(key.to_lowercase().as_str())
}

/// Whether `family` (lower case) names a core font family.
pub fn is_core_family(family: &str) -> bool {
    CORE_FAMILIES.contains(&family)
}

/// Registry key for a family / style pair.
pub fn font_key(family: &str, style: &str) -> String {
    let mut style = style.to_uppercase();
    if style == "IB" {
        style = "BI".into();
    }
    format!("{}{}", family.to_lowercase(), style)
}

/// Source of font definition files and font programs.
pub trait FontLoader: Send + Sync {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>>;
}

/// Loads font files from a directory.
#[derive(Debug, Clone, Default)]
pub struct DirFontLoader {
    dir: PathBuf,
}

impl DirFontLoader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FontLoader for DirFontLoader {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(self.dir.join(name))?))
    }
}

/// A font registered with a document.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub def: Arc<FontDef>,
    /// Resource name suffix, `/F{id}`.
    pub id: String,
    /// 1-based index into the encoding differences, 0 when none.
    pub diff_n: usize,
}

/// An embedded font program referenced by one or more fonts.
#[derive(Debug, Clone, Default)]
pub struct FontFile {
    pub length1: i64,
    pub length2: i64,
    /// Program bytes supplied up front; otherwise read through the loader.
    pub content: Option<Arc<Vec<u8>>>,
}

/// Fonts, font programs and encoding differences used by a document.
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    fonts: IndexMap<String, LoadedFont>,
    files: IndexMap<String, FontFile>,
    diffs: Vec<String>,
}

impl FontCatalog {
    pub fn get(&self, key: &str) -> Option<&LoadedFont> {
        self.fonts.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fonts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn fonts(&self) -> impl Iterator<Item = (&str, &LoadedFont)> {
        self.fonts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &FontFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn diffs(&self) -> &[String] {
        &self.diffs
    }

    /// Register a font under `key`, recording its encoding differences and
    /// font program.
    pub fn insert(
        &mut self,
        key: String,
        def: Arc<FontDef>,
        id: String,
        program: Option<Vec<u8>>,
    ) -> LoadedFont {
        let mut diff_n = 0;
        if !def.diff.is_empty() {
            diff_n = match self.diffs.iter().position(|d| *d == def.diff) {
                Some(pos) => pos + 1,
                None => {
                    self.diffs.push(def.diff.clone());
                    self.diffs.len()
                }
            };
        }
        if !def.file.is_empty() {
            let (length1, length2) = match def.tp {
                FontType::TrueType => (def.original_size, 0),
                _ => (def.size1, def.size2),
            };
            self.files.insert(
                def.file.clone(),
                FontFile {
                    length1,
                    length2,
                    content: program.map(Arc::new),
                },
            );
        }
        let font = LoadedFont { def, id, diff_n };
        self.fonts.insert(key, font.clone());
        font
    }
}
