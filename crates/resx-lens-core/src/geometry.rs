//! On-screen geometry for annotation placement
//!
//! The host view knows where characters land on screen and how wide the
//! annotation font renders. The scanner only asks two questions through
//! [`LineGeometry`]: where does a token start, and how wide is a string.

use crate::error::GeometryError;
use std::borrow::Cow;
use unicode_width::UnicodeWidthChar;

/// Appended to annotation text trimmed to fit its available width
pub const ELLIPSIS: char = '…';

/// Geometry provided by the host view for one laid-out line
pub trait LineGeometry {
    /// Left edge of the character range `start..start + len` (char offsets)
    fn token_left(
        &self,
        line_number: usize,
        line: &str,
        start: usize,
        len: usize,
    ) -> Result<f64, GeometryError>;

    /// Rendered width of annotation text
    fn measure(&self, text: &str) -> f64;
}

/// Fixed-pitch layout: every display cell is `column_width` wide, tabs
/// advance to the next multiple of `tab_size` cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceGeometry {
    column_width: f64,
    annotation_cell_width: f64,
    tab_size: usize,
}

impl MonospaceGeometry {
    pub fn new(column_width: f64) -> Self {
        Self {
            column_width,
            annotation_cell_width: column_width,
            tab_size: 4,
        }
    }

    /// Width of one cell of annotation text, when it differs from the editor font
    pub fn with_annotation_cell_width(mut self, width: f64) -> Self {
        self.annotation_cell_width = width;
        self
    }

    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size.max(1);
        self
    }

    /// Display cells occupied by the first `chars` characters of `line`
    pub fn cells_before(&self, line: &str, chars: usize) -> usize {
        line.chars().take(chars).fold(0, |cells, c| {
            if c == '\t' {
                cells + self.tab_size - cells % self.tab_size
            } else {
                cells + c.width().unwrap_or(0)
            }
        })
    }
}

impl LineGeometry for MonospaceGeometry {
    fn token_left(
        &self,
        _line_number: usize,
        line: &str,
        start: usize,
        len: usize,
    ) -> Result<f64, GeometryError> {
        let line_len = line.chars().count();
        let end = start + len;
        if end > line_len {
            return Err(GeometryError::OutOfRange {
                start,
                end,
                len: line_len,
            });
        }
        Ok(self.cells_before(line, start) as f64 * self.column_width)
    }

    fn measure(&self, text: &str) -> f64 {
        let cells: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
        cells as f64 * self.annotation_cell_width
    }
}

/// Trim `text` so it renders within `max_width`, ending it with [`ELLIPSIS`]
/// when anything was cut. Returns an empty string when not even the
/// ellipsis fits.
pub fn trim_to_width<'a, G: LineGeometry + ?Sized>(
    text: &'a str,
    max_width: f64,
    geometry: &G,
) -> Cow<'a, str> {
    if geometry.measure(text) <= max_width {
        return Cow::Borrowed(text);
    }

    let mut ellipsis_buf = [0u8; 4];
    let ellipsis_width = geometry.measure(ELLIPSIS.encode_utf8(&mut ellipsis_buf));
    if ellipsis_width > max_width {
        return Cow::Borrowed("");
    }

    let mut kept = 0;
    for (idx, c) in text.char_indices() {
        let end = idx + c.len_utf8();
        if geometry.measure(&text[..end]) + ellipsis_width > max_width {
            break;
        }
        kept = end;
    }

    let mut trimmed = String::with_capacity(kept + ELLIPSIS.len_utf8());
    trimmed.push_str(text[..kept].trim_end());
    trimmed.push(ELLIPSIS);
    Cow::Owned(trimmed)
}
