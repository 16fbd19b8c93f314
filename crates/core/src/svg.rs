//! Basic SVG path import.
//!
//! Only the `d` attribute of `<path>` elements is read, and only the move,
//! line, cubic and quadratic curve, horizontal, vertical and close
//! commands. Relative commands are converted to absolute ones while
//! parsing, so every segment carries page-independent coordinates.

use std::fs;
use std::path::Path;

use tracing::trace;

use crate::document::Document;
use crate::error::{PdfError, Result};

/// One path command with its absolute arguments. Unused argument slots are
/// zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgSegment {
    pub cmd: char,
    pub args: [f64; 6],
}

/// The paths of an SVG image together with its extent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgBasic {
    pub width: f64,
    pub height: f64,
    pub segments: Vec<Vec<SvgSegment>>,
}

impl SvgBasic {
    /// Parse an SVG document. The root element needs a non-zero `width`
    /// and `height`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|e| PdfError::Svg(e.to_string()))?;
        let tree = roxmltree::Document::parse(text).map_err(|e| PdfError::Svg(e.to_string()))?;
        let root = tree.root_element();
        let width = dimension(root.attribute("width"));
        let height = dimension(root.attribute("height"));
        if width <= 0.0 || height <= 0.0 {
            return Err(PdfError::Svg("unacceptable values for basic SVG extent".into()));
        }
        let mut segments = Vec::new();
        for node in tree.descendants().filter(|n| n.is_element() && n.tag_name().name() == "path") {
            if let Some(d) = node.attribute("d") {
                segments.push(parse_path(d)?);
            }
        }
        trace!(width, height, paths = segments.len(), "parsed svg");
        Ok(Self {
            width,
            height,
            segments,
        })
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&fs::read(path)?)
    }
}

/// Numeric value of a length attribute, ignoring a trailing unit.
fn dimension(attr: Option<&str>) -> f64 {
    let Some(attr) = attr else {
        return 0.0;
    };
    let number = attr.trim().trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
    number.parse().unwrap_or(0.0)
}

#[derive(Debug, PartialEq)]
enum Token {
    Cmd(char),
    Num(f64),
}

fn tokenize(d: &str) -> Result<Vec<Token>> {
    let bytes = d.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() || c == b',' {
            i += 1;
        } else if c.is_ascii_alphabetic() && c != b'e' && c != b'E' {
            tokens.push(Token::Cmd(char::from(c)));
            i += 1;
        } else if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.' {
            let start = i;
            let mut seen_dot = false;
            let mut seen_exp = false;
            if c == b'-' || c == b'+' {
                i += 1;
            }
            while i < bytes.len() {
                let b = bytes[i];
                if b.is_ascii_digit() {
                    i += 1;
                } else if b == b'.' && !seen_dot && !seen_exp {
                    seen_dot = true;
                    i += 1;
                } else if (b == b'e' || b == b'E') && !seen_exp {
                    seen_exp = true;
                    i += 1;
                    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
            let value = d[start..i]
                .parse()
                .map_err(|_| PdfError::Svg(format!("bad number \"{}\" in path", &d[start..i])))?;
            tokens.push(Token::Num(value));
        } else {
            return Err(PdfError::Svg(format!(
                "unexpected character '{}' in path",
                char::from(c)
            )));
        }
    }
    Ok(tokens)
}

fn arity(cmd: char) -> Option<usize> {
    match cmd.to_ascii_uppercase() {
        'M' | 'L' => Some(2),
        'C' => Some(6),
        'Q' => Some(4),
        'H' | 'V' => Some(1),
        'Z' => Some(0),
        _ => None,
    }
}

/// Parse a path `d` attribute into absolute segments. Extra argument groups
/// repeat the previous command, a repeated move becoming a line.
pub fn parse_path(d: &str) -> Result<Vec<SvgSegment>> {
    let mut segments = Vec::new();
    let mut cursor = Cursor::default();
    let mut tokens = tokenize(d)?.into_iter().peekable();
    let mut current: Option<char> = None;
    while let Some(token) = tokens.next() {
        let cmd = match token {
            Token::Cmd(c) => {
                if arity(c).is_none() {
                    return Err(PdfError::Svg(format!("unsupported path command '{c}'")));
                }
                c
            }
            Token::Num(v) => match current {
                Some('M') => {
                    segments.push(cursor.absolute('L', first_args(v, &mut tokens, 2)?));
                    current = Some('L');
                    continue;
                }
                Some('m') => {
                    segments.push(cursor.absolute('l', first_args(v, &mut tokens, 2)?));
                    current = Some('l');
                    continue;
                }
                Some(c) if arity(c).unwrap_or(0) > 0 => {
                    let n = arity(c).unwrap_or(0);
                    segments.push(cursor.absolute(c, first_args(v, &mut tokens, n)?));
                    continue;
                }
                _ => {
                    return Err(PdfError::Svg("expecting path command".into()));
                }
            },
        };
        let n = arity(cmd).unwrap_or(0);
        let mut args = [0.0; 6];
        for slot in args.iter_mut().take(n) {
            match tokens.next() {
                Some(Token::Num(v)) => *slot = v,
                _ => {
                    return Err(PdfError::Svg(format!(
                        "path command '{cmd}' expects {n} arguments"
                    )));
                }
            }
        }
        segments.push(cursor.absolute(cmd, args));
        current = Some(cmd);
    }
    Ok(segments)
}

fn first_args(
    first: f64,
    tokens: &mut std::iter::Peekable<impl Iterator<Item = Token>>,
    n: usize,
) -> Result<[f64; 6]> {
    let mut args = [0.0; 6];
    args[0] = first;
    for slot in args.iter_mut().take(n).skip(1) {
        match tokens.next() {
            Some(Token::Num(v)) => *slot = v,
            _ => return Err(PdfError::Svg(format!("expected {n} path arguments"))),
        }
    }
    Ok(args)
}

/// Current point and subpath start while absolutizing.
#[derive(Default)]
struct Cursor {
    x: f64,
    y: f64,
    start_x: f64,
    start_y: f64,
}

impl Cursor {
    fn absolute(&mut self, cmd: char, mut args: [f64; 6]) -> SvgSegment {
        if cmd.is_ascii_lowercase() {
            match cmd {
                'h' => args[0] += self.x,
                'v' => args[0] += self.y,
                'z' => {}
                _ => {
                    let n = arity(cmd).unwrap_or(0);
                    for pair in args[..n].chunks_exact_mut(2) {
                        pair[0] += self.x;
                        pair[1] += self.y;
                    }
                }
            }
        }
        let cmd = cmd.to_ascii_uppercase();
        match cmd {
            'M' => {
                (self.x, self.y) = (args[0], args[1]);
                (self.start_x, self.start_y) = (self.x, self.y);
            }
            'L' => (self.x, self.y) = (args[0], args[1]),
            'C' => (self.x, self.y) = (args[4], args[5]),
            'Q' => (self.x, self.y) = (args[2], args[3]),
            'H' => self.x = args[0],
            'V' => self.y = args[0],
            'Z' => (self.x, self.y) = (self.start_x, self.start_y),
            _ => {}
        }
        SvgSegment { cmd, args }
    }
}

impl Document {
    /// Draw the paths of `svg` with the current line settings. The current
    /// position is the upper left corner of the image; `scale` converts
    /// SVG units to document units. A command this renderer does not know
    /// latches [`PdfError::UnsupportedPathCommand`].
    pub fn svg_basic_write(&mut self, svg: &SvgBasic, scale: f64) {
        let (origin_x, origin_y) = self.get_xy();
        let pt = |v: f64, origin: f64| v * scale + origin;
        for path in &svg.segments {
            let (mut x, mut y) = (0.0, 0.0);
            let (mut start_x, mut start_y) = (0.0, 0.0);
            for seg in path {
                if !self.ok() {
                    return;
                }
                let a = seg.args;
                match seg.cmd {
                    'M' => {
                        (x, y) = (pt(a[0], origin_x), pt(a[1], origin_y));
                        (start_x, start_y) = (x, y);
                        self.set_xy(x, y);
                    }
                    'L' => {
                        let (nx, ny) = (pt(a[0], origin_x), pt(a[1], origin_y));
                        self.line(x, y, nx, ny);
                        (x, y) = (nx, ny);
                    }
                    'C' => {
                        let (cx0, cy0) = (pt(a[0], origin_x), pt(a[1], origin_y));
                        let (cx1, cy1) = (pt(a[2], origin_x), pt(a[3], origin_y));
                        let (nx, ny) = (pt(a[4], origin_x), pt(a[5], origin_y));
                        self.curve_cubic(x, y, cx0, cy0, nx, ny, cx1, cy1, "D");
                        (x, y) = (nx, ny);
                    }
                    'Q' => {
                        let (cx, cy) = (pt(a[0], origin_x), pt(a[1], origin_y));
                        let (nx, ny) = (pt(a[2], origin_x), pt(a[3], origin_y));
                        self.curve(x, y, cx, cy, nx, ny, "D");
                        (x, y) = (nx, ny);
                    }
                    'H' => {
                        let nx = pt(a[0], origin_x);
                        self.line(x, y, nx, y);
                        x = nx;
                    }
                    'V' => {
                        let ny = pt(a[0], origin_y);
                        self.line(x, y, x, ny);
                        y = ny;
                    }
                    'Z' => {
                        self.line(x, y, start_x, start_y);
                        (x, y) = (start_x, start_y);
                    }
                    other => self.set_error(PdfError::UnsupportedPathCommand(other)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_commands_become_absolute() {
        let segs = parse_path("m10,20 l5-5 h3 v-2 z").unwrap();
        let cmds: Vec<char> = segs.iter().map(|s| s.cmd).collect();
        assert_eq!(cmds, vec!['M', 'L', 'H', 'V', 'Z']);
        assert_eq!(&segs[1].args[..2], &[15.0, 15.0]);
        assert_eq!(segs[2].args[0], 18.0);
        assert_eq!(segs[3].args[0], 13.0);
    }

    #[test]
    fn repeated_move_is_a_line() {
        let segs = parse_path("M0 0 10 10 20 0").unwrap();
        let cmds: Vec<char> = segs.iter().map(|s| s.cmd).collect();
        assert_eq!(cmds, vec!['M', 'L', 'L']);
    }

    #[test]
    fn compact_numbers() {
        let segs = parse_path("M1.5.5L-2e1-3").unwrap();
        assert_eq!(&segs[0].args[..2], &[1.5, 0.5]);
        assert_eq!(&segs[1].args[..2], &[-20.0, -3.0]);
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(matches!(parse_path("M0 0 A1 1 0 0 1 5 5"), Err(PdfError::Svg(_))));
        assert!(matches!(parse_path("10 10"), Err(PdfError::Svg(_))));
    }

    #[test]
    fn extent_is_required() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L1 1"/></svg>"#;
        assert!(matches!(SvgBasic::parse(svg), Err(PdfError::Svg(_))));
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="20px" height="10">
            <g><path d="M0 0 L1 1"/></g></svg>"#;
        let parsed = SvgBasic::parse(svg).unwrap();
        assert_eq!((parsed.width, parsed.height), (20.0, 10.0));
        assert_eq!(parsed.segments.len(), 1);
    }
}
