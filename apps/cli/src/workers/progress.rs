use std::sync::Arc;

use console::style;
use dubdeck_core::{
    AlignedCaptions, Envelope, Notice, NoticeWorker, TrimWindow, format::format_timestamp,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Draws the playhead inside the trim window and prints each caption as the
/// playhead enters it.
pub struct ProgressWorker {
    bar: ProgressBar,
    captions: AlignedCaptions,
    trim: TrimWindow,
    active: Option<usize>,
}

impl ProgressWorker {
    pub fn new(captions: AlignedCaptions, trim: TrimWindow) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.cyan} [{bar:40.cyan/blue}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        let mut worker = Self {
            bar,
            captions,
            trim,
            active: None,
        };
        worker.apply_trim(trim);
        worker
    }

    fn apply_trim(&mut self, trim: TrimWindow) {
        self.trim = trim;
        self.bar.set_length(millis(trim.length()));
        self.bar.set_message(format!(
            "{} / {}",
            format_timestamp(trim.start()),
            format_timestamp(trim.end())
        ));
    }

    fn on_position(&mut self, position: f64) {
        let offset = (position - self.trim.start()).max(0.0);
        self.bar.set_position(millis(offset));
        self.bar.set_prefix(format_timestamp(position));

        let active = self.captions.active_index(&self.trim, position);
        if active == self.active {
            return;
        }
        self.active = active;
        if let Some(caption) = active.and_then(|i| self.captions.get(i)) {
            self.bar.println(format!(
                "{} {}",
                style(format!("[{}]", format_timestamp(caption.start))).dim(),
                caption.source_text
            ));
            if !caption.target_text.is_empty() {
                self.bar
                    .println(format!("        {}", style(&caption.target_text).yellow()));
            }
        }
    }
}

fn millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

impl NoticeWorker for ProgressWorker {
    const SUBSCRIBER_ID: &'static str = "cli.progress";

    async fn handle(&mut self, envelope: Arc<Envelope>) -> anyhow::Result<()> {
        match &envelope.notice {
            Notice::PositionChanged { position } => self.on_position(*position),
            Notice::TrimChanged { start, end } => {
                let mut trim = TrimWindow::new(self.trim.duration().max(*end));
                trim.set(*start, *end);
                self.apply_trim(trim);
            }
            Notice::ChunkAdvanced { index } => {
                self.bar
                    .println(format!("{} chunk {}", style("♪").magenta(), index + 1));
            }
            Notice::ChunkLoadFailed { index, reason } => {
                self.bar.println(format!(
                    "{} chunk {} failed: {}",
                    style("✗").red().bold(),
                    index + 1,
                    reason
                ));
            }
            Notice::PlayRejected { reason } | Notice::MediaLoadFailed { reason } => {
                self.bar
                    .println(format!("{} {}", style("!").yellow().bold(), reason));
            }
            Notice::PlaybackFinished { reason } => {
                self.bar.finish_with_message(format!(
                    "{} finished ({})",
                    style("✓").green().bold(),
                    serde_json::to_value(reason)?
                        .as_str()
                        .unwrap_or("done")
                ));
            }
            Notice::PlaybackStarted | Notice::PlaybackPaused => {}
        }
        Ok(())
    }
}
