//! Line breaking for wrapped text.
//!
//! One breaker serves `split_lines`, `split_text` and `multi_cell`, so the
//! number of lines a caller measures is the number of lines painted.
//!
//! Widths are in font units (1/1000 of the font size). A line ends at an
//! explicit newline or when the running width exceeds the limit. On
//! overflow the line breaks at the last break opportunity: a space is
//! consumed, a CJK ideograph starts the next line. With no opportunity the
//! break is forced at the overflowing character, taking at least one
//! character so no line is ever empty.

/// Why a line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    /// An explicit newline, which is consumed.
    Newline,
    /// Overflow resolved at a break opportunity.
    Word,
    /// Overflow with no break opportunity in the line.
    Forced,
    /// The remainder of the text.
    End,
}

/// A line as a half-open range into the broken sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub start: usize,
    pub end: usize,
    /// Width of `start..end` in font units.
    pub width: i64,
    pub kind: BreakKind,
}

impl Line {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Maximum line width in font units for a cell of width `w`.
pub fn max_width(w: f64, cell_margin: f64, font_size: f64) -> i64 {
    ((w - 2.0 * cell_margin) * 1000.0 / font_size).ceil() as i64
}

/// How a character lets a line end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opportunity {
    None,
    /// Break here and drop the character (spaces, newlines).
    Consumed,
    /// Break before the character and keep it for the next line.
    Before,
}

#[derive(Clone, Copy)]
struct Sep {
    at: usize,
    width: i64,
    resume: usize,
}

/// Break `items` into lines no wider than `wmax`.
///
/// Trailing newlines are ignored. Every newline must be classified as
/// [`Opportunity::Consumed`].
pub fn break_lines<T, W, O, N>(
    items: &[T],
    wmax: i64,
    width: W,
    opportunity: O,
    is_newline: N,
) -> Vec<Line>
where
    T: Copy,
    W: Fn(T) -> i64,
    O: Fn(T) -> Opportunity,
    N: Fn(T) -> bool,
{
    let mut nb = items.len();
    while nb > 0 && is_newline(items[nb - 1]) {
        nb -= 1;
    }

    let mut lines = Vec::new();
    let mut sep: Option<Sep> = None;
    let (mut i, mut j, mut l) = (0usize, 0usize, 0i64);
    while i < nb {
        let c = items[i];
        match opportunity(c) {
            Opportunity::Consumed => {
                sep = Some(Sep {
                    at: i,
                    width: l,
                    resume: i + 1,
                })
            }
            Opportunity::Before if i > j => {
                sep = Some(Sep {
                    at: i,
                    width: l,
                    resume: i,
                })
            }
            _ => {}
        }
        l += width(c);
        if is_newline(c) || l > wmax {
            match sep {
                None => {
                    if i == j {
                        i += 1;
                    }
                    let w = items[j..i].iter().map(|&c| width(c)).sum();
                    lines.push(Line {
                        start: j,
                        end: i,
                        width: w,
                        kind: BreakKind::Forced,
                    });
                }
                Some(sep) => {
                    let kind = if is_newline(items[sep.at]) {
                        BreakKind::Newline
                    } else {
                        BreakKind::Word
                    };
                    lines.push(Line {
                        start: j,
                        end: sep.at,
                        width: sep.width,
                        kind,
                    });
                    i = sep.resume;
                }
            }
            sep = None;
            j = i;
            l = 0;
        } else {
            i += 1;
        }
    }
    if i != j {
        lines.push(Line {
            start: j,
            end: i,
            width: l,
            kind: BreakKind::End,
        });
    }
    lines
}

/// Break single-byte text with a 256-entry width table. Spaces, tabs and
/// newlines are break opportunities; carriage returns must already be gone.
pub fn break_bytes(text: &[u8], wmax: i64, cw: &[i32]) -> Vec<Line> {
    break_lines(
        text,
        wmax,
        |b| i64::from(cw[b as usize]),
        |b| match b {
            b' ' | b'\t' | b'\n' => Opportunity::Consumed,
            _ => Opportunity::None,
        },
        |b| b == b'\n',
    )
}

/// Break characters. Whitespace is a consumed break opportunity; a CJK
/// ideograph may start a new line.
pub fn break_chars<W>(text: &[char], wmax: i64, width: W) -> Vec<Line>
where
    W: Fn(char) -> i64,
{
    break_lines(
        text,
        wmax,
        width,
        |c| {
            if c.is_whitespace() {
                Opportunity::Consumed
            } else if is_chinese(c) {
                Opportunity::Before
            } else {
                Opportunity::None
            }
        },
        |c| c == '\n',
    )
}

/// CJK unified ideographs (U+4E00 to U+9FA5).
pub fn is_chinese(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(text: &str, wmax: i64) -> Vec<String> {
        let bytes = text.as_bytes();
        let cw = [1i32; 256];
        break_bytes(bytes, wmax, &cw)
            .iter()
            .map(|l| String::from_utf8_lossy(&bytes[l.range()]).into_owned())
            .collect()
    }

    #[test]
    fn breaks_at_last_space() {
        assert_eq!(unit("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn forced_break_never_empty() {
        assert_eq!(unit("abcdef", 2), vec!["ab", "cd", "ef"]);
        assert_eq!(unit("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn newlines_and_trailing_newlines() {
        assert_eq!(unit("ab\n\ncd\n\n", 100), vec!["ab", "", "cd"]);
        assert!(unit("\n\n", 10).is_empty());
        assert!(unit("", 10).is_empty());
    }

    #[test]
    fn line_kinds_and_widths() {
        let cw = [10i32; 256];
        let lines = break_bytes(b"ab cd\nefghij", 50, &cw);
        let kinds: Vec<_> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![BreakKind::Newline, BreakKind::Forced, BreakKind::End]
        );
        assert_eq!(lines[0].width, 50);
        assert_eq!(lines[1].width, 50);
        assert_eq!(lines[2].width, 10);

        let lines = break_bytes(b"ab cd", 40, &cw);
        assert_eq!(lines[0].kind, BreakKind::Word);
        assert_eq!(lines[0].width, 20);
    }

    #[test]
    fn cjk_breaks_before_ideograph_and_keeps_it() {
        let text: Vec<char> = "\u{4e2d}\u{6587}\u{5b57}".chars().collect();
        let lines = break_chars(&text, 2000, |_| 1000);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].range(), 0..2);
        assert_eq!(lines[1].range(), 2..3);
        assert_eq!(lines[0].kind, BreakKind::Word);
    }
}
