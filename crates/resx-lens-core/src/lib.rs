//! resx-lens-core - Resource lookup and inline annotation layout
//!
//! This crate provides the building blocks for showing the resolved text of
//! localized string resources next to the code that references them:
//! - Parsing XML resource dictionaries (`.resx`) into [`ResourceFile`]s
//! - Keeping them in a [`ResourceStore`] with culture-aware resolution
//! - Scanning a line of code for `BaseName.Key` references and laying out
//!   non-overlapping annotations for them
//! - Keeping a view's drawn annotations in sync as lines change
//!
//! # Features
//!
//! - `walk` - Enable [`WalkResources`] for gitignore-aware discovery (brings in `ignore`)
//! - `parallel` - Enable parallel parsing in [`ResourceStore::load_all`] (brings in `rayon`)
//!
//! # Resolving references
//!
//! ```
//! use resx_lens_core::{MemoryLoader, ResourceStore, scan_line};
//! use std::path::Path;
//!
//! let loader = MemoryLoader::new().add(
//!     "/app/Strings.resx",
//!     r#"<root><data name="Greeting"><value>Hi</value></data></root>"#,
//! );
//!
//! let mut store = ResourceStore::default();
//! let report = store.load_all(&loader.paths(), Path::new("/app"), None, &loader);
//! assert_eq!(report.loaded, 1);
//!
//! let requests = scan_line(&store, 0, "var s = Strings.Greeting;");
//! assert_eq!(requests.len(), 1);
//! assert_eq!(requests[0].column, 8);
//! assert_eq!(requests[0].text, "Hi");
//! ```
//!
//! # Keeping a view in sync
//!
//! A host implements [`AnnotationSurface`] to draw visuals and
//! [`LineGeometry`] to report where text lands on screen, then feeds lines
//! to an [`AnnotationSynchronizer`] whenever they are laid out:
//!
//! ```
//! use resx_lens_core::*;
//!
//! struct Printer(Vec<String>);
//!
//! impl AnnotationSurface for Printer {
//!     type Handle = usize;
//!
//!     fn add(&mut self, _line: usize, placement: &AnnotationPlacement) -> usize {
//!         self.0.push(placement.display.clone());
//!         self.0.len() - 1
//!     }
//!
//!     fn remove(&mut self, _handle: usize) {}
//! }
//!
//! let file = ResourceFile::from_entries("/app/Strings.resx", [("Greeting", "Hi")]).unwrap();
//! let shared = SharedStore::new(ResourceStore::from_files([file], None));
//!
//! let mut view = AnnotationSynchronizer::new(shared, Printer(Vec::new()), AnnotationStyle::default());
//! let outcome = view.sync_line(0, "Strings.Greeting", &MonospaceGeometry::new(7.0));
//!
//! assert_eq!(outcome, LineSync::Annotated(1));
//! assert_eq!(view.surface().0, vec!["Hi"]);
//! ```

mod error;
mod geometry;
mod resolver;
mod resource;
mod scanner;
mod shared;
mod sources;
mod store;
mod sync;

pub use error::{GeometryError, ResourceError};
pub use geometry::{ELLIPSIS, LineGeometry, MonospaceGeometry, trim_to_width};
pub use resolver::{TRUNCATION_MARKER, dictionaries_for, display_text, lookup, resolve};
pub use resource::{ResourceEntry, ResourceFile, looks_like_culture, split_culture};
pub use scanner::{
    AnnotationPlacement, AnnotationRequest, AnnotationStyle, DEFAULT_PADDING, ReferenceMatch,
    Rgb, TOKEN_DELIMITERS, annotate_line, extract_token, find_references, layout, scan_line,
    visible_segment,
};
pub use shared::{SharedStore, UpdateGuard};
pub use sources::{
    FsLoader, MemoryLoader, RESOURCE_EXTENSION, ResourceLoader, has_resource_extension,
};
pub use store::{LoadReport, Replaced, ResourceStore, search_prefix};
pub use sync::{AnnotationSurface, AnnotationSynchronizer, DisplayedAnnotation, LineSync};

#[cfg(feature = "walk")]
pub use sources::WalkResources;
