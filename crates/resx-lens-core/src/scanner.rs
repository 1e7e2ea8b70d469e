//! Finding resource references on a line and laying out their annotations
//!
//! A reference is any occurrence of a search prefix (`Strings.`) extended to
//! the end of its key: `Strings.Greeting` in `var s = Strings.Greeting;`.
//! Annotations are produced right to left. Each one starts at the left edge
//! of its token; when another annotation already sits further right, the new
//! one may only use the gap up to it (minus padding) and is trimmed with an
//! ellipsis when it does not fit.

use crate::error::GeometryError;
use crate::geometry::{LineGeometry, trim_to_width};
use crate::resolver;
use crate::store::ResourceStore;
use std::collections::BTreeSet;

/// Characters that end a reference token
pub const TOKEN_DELIMITERS: [char; 8] = [' ', '.', ',', '"', '(', ')', '}', ';'];

/// Default gap kept between two annotations on the same line
pub const DEFAULT_PADDING: f64 = 5.0;

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// How annotations are drawn, as configured by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    /// Font size of annotation text; `0` (or less) turns annotations off
    pub text_size: f64,
    pub color: Rgb,
    /// Gap kept before the next annotation to the right
    pub padding: f64,
}

impl AnnotationStyle {
    pub fn is_enabled(&self) -> bool {
        self.text_size > 0.0
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            text_size: 11.0,
            color: Rgb::new(0x80, 0x80, 0x80),
            padding: DEFAULT_PADDING,
        }
    }
}

/// A prefix occurrence on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMatch {
    /// Byte offset of the match in the line
    pub byte_offset: usize,
    /// Character offset of the match in the line
    pub column: usize,
    /// The full `BaseName.Key` token
    pub token: String,
}

impl ReferenceMatch {
    /// Split the token at its first `.`
    pub fn base_and_key(&self) -> Option<(&str, &str)> {
        self.token
            .split_once('.')
            .filter(|(base, key)| !base.is_empty() && !key.is_empty())
    }
}

/// A resolved reference waiting to be placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRequest {
    pub line: usize,
    /// Character offset of the token start
    pub column: usize,
    /// Resolved display text
    pub text: String,
    /// The matched `BaseName.Key` token
    pub token: String,
}

/// Where and how to draw one annotation
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPlacement {
    pub request: AnnotationRequest,
    /// Left edge of the token on screen
    pub left: f64,
    /// Width limit imposed by the next annotation to the right
    pub max_width: Option<f64>,
    /// Text after trimming to `max_width`
    pub display: String,
}

/// The part of a line that is actually shown: everything up to the first
/// line break.
pub fn visible_segment(line: &str) -> &str {
    match line.find(['\r', '\n']) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Extend a match at `start` to its full token.
///
/// The token runs from `start` to the first delimiter after the first `.`
/// at or after `start`, or to the end of the line.
pub fn extract_token(line: &str, start: usize) -> &str {
    let rest = &line[start..];
    let Some(dot) = rest.find('.') else {
        return rest;
    };
    let key_start = dot + 1;
    match rest[key_start..].find(TOKEN_DELIMITERS) {
        Some(end) => &rest[..key_start + end],
        None => rest,
    }
}

/// Every prefix occurrence in `line`, left to right.
///
/// All prefixes are searched; an offset matched by several prefixes yields
/// a single reference.
pub fn find_references(line: &str, prefixes: &[String]) -> Vec<ReferenceMatch> {
    let mut offsets = BTreeSet::new();
    for prefix in prefixes.iter().filter(|p| !p.is_empty()) {
        offsets.extend(line.match_indices(prefix.as_str()).map(|(offset, _)| offset));
    }

    offsets
        .into_iter()
        .map(|byte_offset| ReferenceMatch {
            byte_offset,
            column: line[..byte_offset].chars().count(),
            token: extract_token(line, byte_offset).to_string(),
        })
        .collect()
}

/// Resolve every reference on a line.
///
/// Requests come back rightmost first. References that do not resolve, or
/// resolve to blank text, produce nothing.
pub fn scan_line(store: &ResourceStore, line_number: usize, line: &str) -> Vec<AnnotationRequest> {
    let line = visible_segment(line);
    let culture = store.preferred_culture();

    let mut requests: Vec<_> = find_references(line, store.prefixes())
        .into_iter()
        .filter_map(|found| {
            let (base, key) = found.base_and_key()?;
            let text = resolver::resolve(store, base, key, culture)?;
            if text.trim().is_empty() {
                return None;
            }
            Some(AnnotationRequest {
                line: line_number,
                column: found.column,
                text,
                token: found.token,
            })
        })
        .collect();

    requests.reverse();
    requests
}

/// Place requests (rightmost first) so that no annotation runs into the
/// one to its right.
pub fn layout<G: LineGeometry + ?Sized>(
    requests: Vec<AnnotationRequest>,
    line: &str,
    geometry: &G,
    style: &AnnotationStyle,
) -> Result<Vec<AnnotationPlacement>, GeometryError> {
    let line = visible_segment(line);
    let mut placements = Vec::with_capacity(requests.len());
    let mut previous_left: Option<f64> = None;

    for request in requests {
        let left = geometry.token_left(
            request.line,
            line,
            request.column,
            request.token.chars().count(),
        )?;
        let max_width = previous_left.map(|prev| (prev - left - style.padding).max(0.0));
        let display = match max_width {
            Some(width) => trim_to_width(&request.text, width, geometry).into_owned(),
            None => request.text.clone(),
        };
        if display.is_empty() {
            continue;
        }

        previous_left = Some(left);
        placements.push(AnnotationPlacement {
            request,
            left,
            max_width,
            display,
        });
    }

    Ok(placements)
}

/// Scan and lay out one line in a single step.
pub fn annotate_line<G: LineGeometry + ?Sized>(
    store: &ResourceStore,
    line_number: usize,
    line: &str,
    geometry: &G,
    style: &AnnotationStyle,
) -> Result<Vec<AnnotationPlacement>, GeometryError> {
    if !style.is_enabled() || store.is_empty() {
        return Ok(Vec::new());
    }
    layout(scan_line(store, line_number, line), line, geometry, style)
}
