//! Progress bars for multi-folder steps.
//!
//! Bars draw to stderr alongside the tracing output and are hidden entirely
//! when progress display is switched off.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

#[derive(Debug, Clone, Copy)]
pub struct Progress {
    enabled: bool,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self { enabled: false }
    }

    /// Creates a bar of `total` steps labelled with `label`.
    pub fn bar(&self, total: usize, label: &str) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        if !self.enabled {
            bar.set_draw_target(ProgressDrawTarget::hidden());
            return bar;
        }

        let style = ProgressStyle::with_template(
            "{prefix} [{bar:30.cyan/blue}] {pos}/{len} ({percent}%) eta {eta} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar
    }
}
