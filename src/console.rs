//! Console progress bars for running downloads.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use media_downloader::{ProgressEvent, ProgressSink};

const PERCENT_TEMPLATE: &str = "{bar:30} {pos:>3}% {msg}";
const BYTES_TEMPLATE: &str = "{spinner} {msg}";

/// One progress bar per running link.
pub(crate) struct ConsoleProgress {
    bars: MultiProgress,
    jobs: Mutex<HashMap<String, ProgressBar>>,
}

impl ConsoleProgress {
    fn new() -> Self {
        Self {
            bars: MultiProgress::new(),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn bar_for(&self, jobs: &mut HashMap<String, ProgressBar>, link: &str) -> ProgressBar {
        jobs.entry(link.to_string())
            .or_insert_with(|| {
                let bar = self.bars.add(ProgressBar::new(100));
                bar.set_message(link.to_string());
                bar
            })
            .clone()
    }
}

impl ProgressSink for ConsoleProgress {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn report(&self, link: &str, event: ProgressEvent) {
        let Ok(mut jobs) = self.jobs.lock() else {
            return;
        };

        if event.is_finished() {
            if let Some(bar) = jobs.remove(link) {
                bar.finish_and_clear();
            }
            return;
        }

        let bar = self.bar_for(&mut jobs, link);
        match event.total {
            Some(_) => {
                bar.set_style(
                    ProgressStyle::with_template(PERCENT_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar.set_position(event.progress.clamp(0.0, 100.0) as u64);
            }
            None => {
                bar.set_style(
                    ProgressStyle::with_template(BYTES_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.set_message(format!("{link} ({} bytes)", event.progress as u64));
                bar.tick();
            }
        }
    }
}

/// Progress sink for the console, or `None` when bars would only add noise.
pub(crate) fn console_sink(quiet: bool) -> Option<Arc<dyn ProgressSink>> {
    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    Some(Arc::new(ConsoleProgress::new()))
}
