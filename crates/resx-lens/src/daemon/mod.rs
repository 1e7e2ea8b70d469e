//! Watch mode: a long-running session over one project root.
//!
//! The engine loads every resource file and arms the watcher. Each watcher
//! event is handled on its own task by the reload coordinator, so a file
//! stuck in its retry waits does not hold up events for other files. Once a
//! reload changed the store and no other reload is in flight, the watched
//! source file (if any) is annotated again.
//!
//! ## Lifecycle
//!
//! - Zero resource files: the watcher stays disarmed and the session ends
//! - Ctrl-C ends the session; reloads still in flight are dropped

pub mod engine;
pub mod reload;
pub mod watcher;

use eyre::{Result, WrapErr};
use resx_lens_core::{AnnotationSynchronizer, ResourceLoader};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use engine::Engine;
pub use reload::{Delay, ReloadCoordinator, ReloadOutcome, ReloadState, RetryPolicy, TokioDelay};
pub use watcher::{WatcherEvent, WatcherManager, WatcherState};

use crate::output::{TerminalSurface, render_annotated};

/// Run watch mode until Ctrl-C.
///
/// `file` is a source file to annotate at startup and after every reload.
pub async fn run_watch<L: ResourceLoader + 'static>(
    engine: Engine<L>,
    mut events: mpsc::UnboundedReceiver<WatcherEvent>,
    file: Option<PathBuf>,
    color: bool,
) -> Result<()> {
    let report = engine.load_all().await?;
    eprintln!(
        "Loaded {} resource files ({} failed)",
        report.loaded,
        report.failures.len()
    );

    if !engine.watcher_state().is_armed() {
        match engine.watcher_state().error() {
            Some(error) => warn!("Not watching: {}", error),
            None => warn!("No resource files under {}, nothing to watch", engine.root().display()),
        }
        return Ok(());
    }

    let mut view = AnnotationSynchronizer::new(
        std::sync::Arc::clone(engine.shared()),
        TerminalSurface::new(),
        engine.config().style(),
    );
    if let Some(file) = &file {
        print_annotated(&mut view, file, color)?;
    }

    let coordinator = engine.coordinator(TokioDelay);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<ReloadOutcome>();
    let mut repaint = Repaint::default();

    info!("Watching {} for resource changes", engine.root().display());
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    debug!("Watcher channel closed");
                    break;
                };
                debug!("Watcher event: {:?}", event);
                let coordinator = coordinator.clone();
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let outcome = coordinator.handle(event).await;
                    let _ = done_tx.send(outcome);
                });
            }
            Some(outcome) = done_rx.recv() => {
                if !repaint.observe(outcome, engine.shared().is_ready()) {
                    continue;
                }
                if let Some(file) = &file
                    && let Err(e) = print_annotated(&mut view, file, color)
                {
                    warn!("Could not annotate {}: {:#}", file.display(), e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    view.on_view_closed();
    Ok(())
}

/// Decides when the watched file is printed again.
///
/// A change is remembered until the store is ready, so a reload that ends
/// while another one is still retrying does not lose the repaint.
#[derive(Debug, Default)]
struct Repaint {
    pending: bool,
}

impl Repaint {
    /// Record a finished reload; true when the file should be printed now
    fn observe(&mut self, outcome: ReloadOutcome, ready: bool) -> bool {
        self.pending |= outcome.changed_store();
        if self.pending && ready {
            self.pending = false;
            return true;
        }
        false
    }
}

fn print_annotated(
    view: &mut AnnotationSynchronizer<TerminalSurface>,
    file: &Path,
    color: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    println!("{}", render_annotated(view, &text, color));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repaint_after_change() {
        let mut repaint = Repaint::default();
        assert!(repaint.observe(ReloadOutcome::Replaced { attempts: 1 }, true));
        assert!(!repaint.observe(ReloadOutcome::Ignored, true));
    }

    #[test]
    fn test_repaint_waits_for_overlapping_reload() {
        let mut repaint = Repaint::default();
        // First reload commits while a second one is still retrying
        assert!(!repaint.observe(ReloadOutcome::Added { attempts: 1 }, false));
        // The second one gives up; the earlier change is still shown
        assert!(repaint.observe(ReloadOutcome::Retained { attempts: 5 }, true));
        assert!(!repaint.observe(ReloadOutcome::Retained { attempts: 5 }, true));
    }

    #[test]
    fn test_no_repaint_without_change() {
        let mut repaint = Repaint::default();
        assert!(!repaint.observe(ReloadOutcome::Retained { attempts: 5 }, true));
        assert!(!repaint.observe(ReloadOutcome::Ignored, false));
    }
}
