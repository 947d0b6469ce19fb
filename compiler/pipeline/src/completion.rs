//! Completion notification.

use std::path::Path;

/// Told once when a run finishes successfully
pub trait CompletionObserver: Send + Sync {
    /// Called with the absolute output directory of the finished run
    fn on_complete(&self, output: &Path);
}

/// Prints `Done.` to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl CompletionObserver for ConsoleObserver {
    fn on_complete(&self, output: &Path) {
        tracing::info!(output = %output.display(), "generation finished");
        println!("Done.");
    }
}
