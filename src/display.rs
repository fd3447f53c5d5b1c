//! Live terminal view of a running session.
//!
//! Reads [`SessionState`] snapshots from a watch channel and renders
//! them: a progress bar for analysis progress, the status as its
//! message, and each contradiction printed once as it arrives. It never
//! writes back.

use crate::models::ContradictionRecord;
use crate::session::SessionState;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Rendering options.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    /// Render nothing.
    pub quiet: bool,
    /// Print both sentences under each contradiction.
    pub show_sentences: bool,
}

/// Handle to the background render task.
pub struct LiveView {
    handle: JoinHandle<()>,
}

impl LiveView {
    /// Start rendering. The task ends when the state sender is dropped.
    pub fn spawn(mut rx: watch::Receiver<SessionState>, options: ViewOptions) -> Self {
        let handle = tokio::spawn(async move {
            let mut renderer = Renderer::new(options);
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                renderer.render(&state);
            }
            // Pick up anything coalesced into the last update.
            let state = rx.borrow().clone();
            renderer.render(&state);
            renderer.finish(&state);
        });

        Self { handle }
    }

    /// Wait for the final render.
    pub async fn finish(self) {
        let _ = self.handle.await;
    }
}

struct Renderer {
    options: ViewOptions,
    bar: Option<ProgressBar>,
    printed: usize,
}

impl Renderer {
    fn new(options: ViewOptions) -> Self {
        let bar = if options.quiet {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(bar_style());
            Some(pb)
        };

        Self {
            options,
            bar,
            printed: 0,
        }
    }

    fn render(&mut self, state: &SessionState) {
        let Some(bar) = &self.bar else {
            return;
        };

        bar.set_message(state.status.to_string());
        if let Some(progress) = state.progress {
            bar.set_length(progress.total);
            bar.set_position(progress.processed);
        }
        bar.tick();

        // A new session starts with an empty list.
        if state.results.len() < self.printed {
            self.printed = 0;
        }

        let fresh = state.results.len() - self.printed;
        for record in state.results.iter().take(fresh).rev() {
            bar.println(format_record(record, self.options.show_sentences));
        }
        self.printed = state.results.len();
    }

    fn finish(&self, state: &SessionState) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(state.status.to_string());
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// One contradiction as printed in the live view.
pub fn format_record(record: &ContradictionRecord, show_sentences: bool) -> String {
    let mut out = format!(
        "{} {} ({:.1}% confidence, similarity {:.3}) {}",
        record.severity.emoji(),
        record.severity,
        record.confidence,
        record.similarity,
        record.pair_key()
    );

    if show_sentences {
        out.push_str(&format!("\n   {}: \"{}\"", record.doc1, record.sentence1));
        out.push_str(&format!("\n   {}: \"{}\"", record.doc2, record.sentence2));
    }

    out
}
