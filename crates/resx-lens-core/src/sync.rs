//! Per-view annotation state
//!
//! Each open editor view owns one [`AnnotationSynchronizer`]. Whenever the
//! host lays a line out again, the synchronizer drops everything it drew on
//! that line and draws the freshly computed annotations. Removing
//! unconditionally means a changed value and a vanished reference go
//! through the same path.

use crate::geometry::LineGeometry;
use crate::scanner::{AnnotationPlacement, AnnotationStyle, annotate_line};
use crate::shared::SharedStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The presentation side of a view: draws and erases annotation visuals
pub trait AnnotationSurface {
    /// Identifies a drawn visual so it can be removed later
    type Handle;

    fn add(&mut self, line_number: usize, placement: &AnnotationPlacement) -> Self::Handle;

    fn remove(&mut self, handle: Self::Handle);
}

/// An annotation currently drawn on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedAnnotation<H> {
    pub handle: H,
    /// The `BaseName.Key` token it annotates
    pub token: String,
}

/// What happened to a line during [`AnnotationSynchronizer::sync_line`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSync {
    /// The line now shows this many annotations
    Annotated(usize),
    /// The store is being (re)loaded; the line was cleared and not scanned
    NotReady,
    /// Geometry for the line could not be computed; the line was cleared
    Failed,
}

pub struct AnnotationSynchronizer<S: AnnotationSurface> {
    shared: Arc<SharedStore>,
    surface: S,
    style: AnnotationStyle,
    displayed: BTreeMap<usize, Vec<DisplayedAnnotation<S::Handle>>>,
}

impl<S: AnnotationSurface> AnnotationSynchronizer<S> {
    pub fn new(shared: Arc<SharedStore>, surface: S, style: AnnotationStyle) -> Self {
        Self {
            shared,
            surface,
            style,
            displayed: BTreeMap::new(),
        }
    }

    /// Re-render one line: remove what was there, then add what applies now.
    pub fn sync_line<G: LineGeometry + ?Sized>(
        &mut self,
        line_number: usize,
        text: &str,
        geometry: &G,
    ) -> LineSync {
        self.clear_line(line_number);

        if !self.shared.is_ready() {
            debug!("Resources are reloading, skipping line {line_number}");
            return LineSync::NotReady;
        }

        let store = self.shared.snapshot();
        let placements = match annotate_line(&store, line_number, text, geometry, &self.style) {
            Ok(placements) => placements,
            Err(e) => {
                warn!("Could not lay out annotations for line {line_number}: {e}");
                return LineSync::Failed;
            }
        };

        if placements.is_empty() {
            return LineSync::Annotated(0);
        }

        let drawn: Vec<_> = placements
            .iter()
            .map(|placement| DisplayedAnnotation {
                handle: self.surface.add(line_number, placement),
                token: placement.request.token.clone(),
            })
            .collect();
        let count = drawn.len();
        self.displayed.insert(line_number, drawn);
        LineSync::Annotated(count)
    }

    /// Re-render several lines; a failure on one line does not stop the rest.
    pub fn sync_lines<'a, G: LineGeometry + ?Sized>(
        &mut self,
        lines: impl IntoIterator<Item = (usize, &'a str)>,
        geometry: &G,
    ) -> Vec<(usize, LineSync)> {
        lines
            .into_iter()
            .map(|(line_number, text)| (line_number, self.sync_line(line_number, text, geometry)))
            .collect()
    }

    /// Remove every annotation drawn on a line
    pub fn clear_line(&mut self, line_number: usize) {
        if let Some(stale) = self.displayed.remove(&line_number) {
            for annotation in stale {
                self.surface.remove(annotation.handle);
            }
        }
    }

    /// The view is going away: erase everything it shows.
    ///
    /// The shared store is untouched; other views keep using it.
    pub fn on_view_closed(&mut self) {
        let lines: Vec<_> = self.displayed.keys().copied().collect();
        for line_number in lines {
            self.clear_line(line_number);
        }
    }

    /// Annotations currently drawn on a line, rightmost first
    pub fn displayed(&self, line_number: usize) -> &[DisplayedAnnotation<S::Handle>] {
        self.displayed
            .get(&line_number)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Lines that currently show at least one annotation
    pub fn annotated_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.displayed.keys().copied()
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    /// Change the style; takes effect on the next sync of each line
    pub fn set_style(&mut self, style: AnnotationStyle) {
        self.style = style;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn shared(&self) -> &Arc<SharedStore> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::geometry::MonospaceGeometry;
    use crate::resource::ResourceFile;
    use crate::store::ResourceStore;
    use std::collections::HashMap;

    /// Records visuals by id
    #[derive(Default)]
    struct RecordingSurface {
        next_id: u32,
        live: HashMap<u32, (usize, String)>,
        removed: Vec<u32>,
    }

    impl AnnotationSurface for RecordingSurface {
        type Handle = u32;

        fn add(&mut self, line_number: usize, placement: &AnnotationPlacement) -> u32 {
            self.next_id += 1;
            self.live
                .insert(self.next_id, (line_number, placement.display.clone()));
            self.next_id
        }

        fn remove(&mut self, handle: u32) {
            assert!(self.live.remove(&handle).is_some(), "removed twice: {handle}");
            self.removed.push(handle);
        }
    }

    impl RecordingSurface {
        fn texts_on(&self, line_number: usize) -> Vec<String> {
            let mut texts: Vec<_> = self
                .live
                .values()
                .filter(|(line, _)| *line == line_number)
                .map(|(_, text)| text.clone())
                .collect();
            texts.sort();
            texts
        }
    }

    struct BrokenGeometry;

    impl LineGeometry for BrokenGeometry {
        fn token_left(
            &self,
            line_number: usize,
            _line: &str,
            _start: usize,
            _len: usize,
        ) -> Result<f64, GeometryError> {
            Err(GeometryError::LineNotLaidOut(line_number))
        }

        fn measure(&self, text: &str) -> f64 {
            text.len() as f64
        }
    }

    fn shared(entries: &[(&str, &str)]) -> Arc<SharedStore> {
        let file = ResourceFile::from_entries("/p/Strings.resx", entries.iter().copied()).unwrap();
        SharedStore::new(ResourceStore::from_files([file], None))
    }

    fn synchronizer(shared: &Arc<SharedStore>) -> AnnotationSynchronizer<RecordingSurface> {
        AnnotationSynchronizer::new(
            Arc::clone(shared),
            RecordingSurface::default(),
            AnnotationStyle::default(),
        )
    }

    #[test]
    fn test_sync_line_draws_annotations() {
        let shared = shared(&[("Greeting", "Hi")]);
        let mut sync = synchronizer(&shared);
        let geometry = MonospaceGeometry::new(1.0);

        assert_eq!(
            sync.sync_line(1, "var s = Strings.Greeting;", &geometry),
            LineSync::Annotated(1)
        );
        assert_eq!(sync.surface().texts_on(1), vec!["Hi"]);
        assert_eq!(sync.displayed(1)[0].token, "Strings.Greeting");
    }

    #[test]
    fn test_resync_replaces_stale_visuals() {
        let shared = shared(&[("Greeting", "Hi"), ("Farewell", "Bye")]);
        let mut sync = synchronizer(&shared);
        let geometry = MonospaceGeometry::new(1.0);

        sync.sync_line(1, "Strings.Greeting", &geometry);
        sync.sync_line(1, "Strings.Farewell", &geometry);

        assert_eq!(sync.surface().texts_on(1), vec!["Bye"]);
        assert_eq!(sync.surface().removed.len(), 1);
        assert_eq!(sync.displayed(1).len(), 1);
    }

    #[test]
    fn test_line_without_references_leaves_no_state() {
        let shared = shared(&[("Greeting", "Hi")]);
        let mut sync = synchronizer(&shared);
        let geometry = MonospaceGeometry::new(1.0);

        sync.sync_line(4, "Strings.Greeting", &geometry);
        assert_eq!(sync.sync_line(4, "let x = 1;", &geometry), LineSync::Annotated(0));

        assert!(sync.displayed(4).is_empty());
        assert_eq!(sync.annotated_lines().count(), 0);
        assert!(sync.surface().live.is_empty());
    }

    #[test]
    fn test_store_change_is_picked_up_on_resync() {
        let shared = shared(&[("Greeting", "Hi")]);
        let mut sync = synchronizer(&shared);
        let geometry = MonospaceGeometry::new(1.0);

        sync.sync_line(0, "Strings.Greeting", &geometry);
        shared.update(|store| {
            store.replace(
                ResourceFile::from_entries("/p/Strings.resx", [("Greeting", "Hello")]).unwrap(),
            );
        });
        sync.sync_line(0, "Strings.Greeting", &geometry);

        assert_eq!(sync.surface().texts_on(0), vec!["Hello"]);
    }

    #[test]
    fn test_not_ready_clears_and_skips() {
        let shared = shared(&[("Greeting", "Hi")]);
        let mut sync = synchronizer(&shared);
        let geometry = MonospaceGeometry::new(1.0);

        sync.sync_line(0, "Strings.Greeting", &geometry);
        let guard = shared.begin_update();
        assert_eq!(sync.sync_line(0, "Strings.Greeting", &geometry), LineSync::NotReady);
        assert!(sync.surface().live.is_empty());

        drop(guard);
        assert_eq!(
            sync.sync_line(0, "Strings.Greeting", &geometry),
            LineSync::Annotated(1)
        );
    }

    #[test]
    fn test_geometry_failure_is_per_line() {
        let shared = shared(&[("Greeting", "Hi")]);
        let mut sync = synchronizer(&shared);

        let results = sync.sync_lines([(0, "Strings.Greeting"), (1, "plain")], &BrokenGeometry);
        assert_eq!(results, vec![(0, LineSync::Failed), (1, LineSync::Annotated(0))]);

        let geometry = MonospaceGeometry::new(1.0);
        let results = sync.sync_lines([(0, "Strings.Greeting"), (1, "Strings.Greeting")], &geometry);
        assert_eq!(results, vec![(0, LineSync::Annotated(1)), (1, LineSync::Annotated(1))]);
    }

    #[test]
    fn test_view_close_removes_everything() {
        let shared = shared(&[("Greeting", "Hi")]);
        let mut sync = synchronizer(&shared);
        let geometry = MonospaceGeometry::new(1.0);

        sync.sync_lines([(0, "Strings.Greeting"), (5, "Strings.Greeting")], &geometry);
        sync.on_view_closed();

        assert!(sync.surface().live.is_empty());
        assert_eq!(sync.surface().removed.len(), 2);
        assert_eq!(sync.annotated_lines().count(), 0);
        // The shared store outlives the view
        assert_eq!(shared.snapshot().len(), 1);
    }

    #[test]
    fn test_views_do_not_share_state() {
        let shared = shared(&[("Greeting", "Hi")]);
        let mut first = synchronizer(&shared);
        let mut second = synchronizer(&shared);
        let geometry = MonospaceGeometry::new(1.0);

        first.sync_line(0, "Strings.Greeting", &geometry);
        second.sync_line(0, "nothing here", &geometry);
        first.on_view_closed();

        assert_eq!(second.annotated_lines().count(), 0);
        second.sync_line(0, "Strings.Greeting", &geometry);
        assert_eq!(second.surface().texts_on(0), vec!["Hi"]);
    }
}
