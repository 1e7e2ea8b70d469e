//! Terminal rendering of annotated source and store listings

use owo_colors::OwoColorize;
use resx_lens_core::{
    AnnotationPlacement, AnnotationSurface, AnnotationSynchronizer, MonospaceGeometry,
    ResourceStore, Rgb,
};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use unicode_width::UnicodeWidthStr;

/// Tab width used both for layout and for printing source lines
pub const TAB_SIZE: usize = 4;

/// Geometry of a terminal: one unit per display cell
pub fn terminal_geometry() -> MonospaceGeometry {
    MonospaceGeometry::new(1.0).with_tab_size(TAB_SIZE)
}

/// Annotation surface that keeps placements so lines can be printed later
#[derive(Debug, Default)]
pub struct TerminalSurface {
    next_handle: u64,
    drawn: BTreeMap<u64, (usize, AnnotationPlacement)>,
}

impl AnnotationSurface for TerminalSurface {
    type Handle = u64;

    fn add(&mut self, line_number: usize, placement: &AnnotationPlacement) -> u64 {
        self.next_handle += 1;
        self.drawn
            .insert(self.next_handle, (line_number, placement.clone()));
        self.next_handle
    }

    fn remove(&mut self, handle: u64) {
        self.drawn.remove(&handle);
    }
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placements on a line, leftmost first
    pub fn annotations_on(&self, line_number: usize) -> Vec<&AnnotationPlacement> {
        let mut placements: Vec<_> = self
            .drawn
            .values()
            .filter(|(line, _)| *line == line_number)
            .map(|(_, placement)| placement)
            .collect();
        placements.sort_by(|a, b| a.left.total_cmp(&b.left));
        placements
    }

    /// Number of visuals currently drawn
    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }

    /// The row printed under a source line: each annotation starts below
    /// its token. Empty when the line has no annotations.
    pub fn annotation_row(&self, line_number: usize, color: Option<Rgb>) -> String {
        let mut row = String::new();
        let mut width = 0;
        for placement in self.annotations_on(line_number) {
            let column = placement.left.max(0.0).round() as usize;
            let gap = if width == 0 {
                column
            } else {
                column.saturating_sub(width).max(1)
            };
            row.extend(std::iter::repeat_n(' ', gap));
            width += gap + placement.display.width();
            match color {
                Some(c) => {
                    let _ = write!(row, "{}", placement.display.truecolor(c.r, c.g, c.b));
                }
                None => row.push_str(&placement.display),
            }
        }
        row
    }
}

/// Expand tabs to the next multiple of [`TAB_SIZE`] cells
pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut cells = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_SIZE - cells % TAB_SIZE;
            out.extend(std::iter::repeat_n(' ', pad));
            cells += pad;
        } else {
            out.push(c);
            cells += unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        }
    }
    out
}

/// Sync every line of `text` through `view` and print the result.
///
/// Each source line is followed by its annotation row when it has one.
pub fn render_annotated(
    view: &mut AnnotationSynchronizer<TerminalSurface>,
    text: &str,
    color: bool,
) -> String {
    let geometry = terminal_geometry();
    let lines: Vec<&str> = text.lines().collect();
    view.sync_lines(lines.iter().copied().enumerate(), &geometry);

    let gutter = lines.len().max(1).to_string().len();
    let tint = color.then(|| AnnotationSynchronizer::style(view).color);
    let mut output = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let number = format!("{:>gutter$}", idx + 1);
        if color {
            let _ = writeln!(output, "{} │ {}", number.dimmed(), expand_tabs(line));
        } else {
            let _ = writeln!(output, "{} │ {}", number, expand_tabs(line));
        }

        let row = view.surface().annotation_row(idx, tint);
        if !row.is_empty() {
            let _ = writeln!(output, "{:gutter$} │ {}", "", row);
        }
    }
    output
}

/// Summary of loaded files and prefixes for `resx-lens list`
pub fn render_store(store: &ResourceStore, root: &Path, color: bool) -> String {
    let mut output = String::new();
    let count = store.len().to_string();
    let count = if color {
        count.green().to_string()
    } else {
        count
    };
    let _ = writeln!(output, "{} resource files under {}", count, root.display());
    for file in store.files() {
        let relative = file.path().strip_prefix(root).unwrap_or(file.path());
        let culture = file.culture().unwrap_or("neutral");
        if color {
            let _ = writeln!(
                output,
                "  {} [{}] {} entries {}",
                file.base_name().cyan(),
                culture,
                file.len(),
                relative.display().to_string().dimmed()
            );
        } else {
            let _ = writeln!(
                output,
                "  {} [{}] {} entries {}",
                file.base_name(),
                culture,
                file.len(),
                relative.display()
            );
        }
    }
    let _ = writeln!(output, "Prefixes: {}", store.prefixes().join(", "));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use resx_lens_core::{AnnotationStyle, ResourceFile, SharedStore};

    fn view(entries: &[(&str, &str)]) -> AnnotationSynchronizer<TerminalSurface> {
        let file =
            ResourceFile::from_entries("/p/Resources.resx", entries.iter().copied()).unwrap();
        let shared = SharedStore::new(ResourceStore::from_files([file], None));
        AnnotationSynchronizer::new(shared, TerminalSurface::new(), AnnotationStyle::default())
    }

    #[test]
    fn test_annotation_row_aligns_under_token() {
        let mut view = view(&[("Title", "Inventory")]);
        let output = render_annotated(&mut view, "x = Resources.Title;", false);

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "1 │ x = Resources.Title;");
        assert_eq!(lines[1], "  │     Inventory");
    }

    #[test]
    fn test_lines_without_annotations_have_no_row() {
        let mut view = view(&[("Title", "Inventory")]);
        let output = render_annotated(&mut view, "let a = 1;\nlet b = 2;", false);
        assert_eq!(output.lines().count(), 2);
        assert!(view.surface().is_empty());
    }

    #[test]
    fn test_rerender_does_not_accumulate() {
        let mut view = view(&[("Title", "Inventory")]);
        render_annotated(&mut view, "Resources.Title", false);
        render_annotated(&mut view, "Resources.Title", false);
        assert_eq!(view.surface().len(), 1);
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx"), "    x");
        assert_eq!(expand_tabs("ab\tx"), "ab  x");
    }

    #[test]
    fn test_tabbed_line_stays_aligned() {
        let mut view = view(&[("Title", "Inventory")]);
        let output = render_annotated(&mut view, "\tResources.Title", false);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[1], "  │     Inventory");
    }

    #[test]
    fn test_render_store_lists_files() {
        let file = ResourceFile::from_entries(
            "/p/Properties/Resources.fr.resx",
            [("A", "a"), ("B", "b")],
        )
        .unwrap();
        let store = ResourceStore::from_files([file], Some("fr".to_string()));
        let output = render_store(&store, Path::new("/p"), false);
        assert!(output.contains("  Resources [fr] 2 entries Properties/Resources.fr.resx"));
        assert!(output.contains("Prefixes: Resources."));
        assert!(!output.contains('\x1b'), "plain output must not carry escapes");
    }

    #[test]
    fn test_render_store_colored() {
        let file = ResourceFile::from_entries("/p/Resources.resx", [("A", "a")]).unwrap();
        let store = ResourceStore::from_files([file], None);
        let output = render_store(&store, Path::new("/p"), true);
        assert!(output.contains('\x1b'));
        assert!(output.contains("[neutral] 1 entries"));
    }

    #[test]
    fn test_colored_annotation_uses_style_color() {
        let mut view = view(&[("Title", "Inventory")]);
        let output = render_annotated(&mut view, "x = Resources.Title;", true);

        let lines: Vec<_> = output.lines().collect();
        // Default text color #808080
        assert!(lines[1].contains("\x1b[38;2;128;128;128m"), "{output:?}");
        assert!(lines[1].contains("Inventory"));
    }
}
