//! Progress events and the sinks that receive them.
//!
//! Sinks are called synchronously from extractor output readers, so
//! [`ProgressSink::report`] must never block.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::trace;

use crate::extractor::{ProgressHook, ProgressHookEvent};

/// One progress notification.
///
/// With `total == Some(t)` the job is `progress / t` done. With `total ==
/// None` the size is unknown and `progress` is a raw byte count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    /// Amount done.
    pub progress: f64,
    /// Amount expected, or `None` when indeterminate.
    pub total: Option<f64>,
}

impl ProgressEvent {
    /// `(0, 100)`.
    #[must_use]
    pub fn started() -> Self {
        Self {
            progress: 0.0,
            total: Some(100.0),
        }
    }

    /// `(100, 100)`.
    #[must_use]
    pub fn finished() -> Self {
        Self {
            progress: 100.0,
            total: Some(100.0),
        }
    }

    /// Converts an extractor notification.
    ///
    /// Returns `None` for events that carry no byte counts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_hook(event: &ProgressHookEvent) -> Option<Self> {
        match *event {
            ProgressHookEvent::Downloading {
                downloaded_bytes: Some(downloaded),
                total_bytes: Some(total),
            } if total > 0 => Some(Self {
                progress: downloaded as f64 / total as f64 * 100.0,
                total: Some(100.0),
            }),
            ProgressHookEvent::Downloading {
                downloaded_bytes: Some(downloaded),
                ..
            } => Some(Self {
                progress: downloaded as f64,
                total: None,
            }),
            ProgressHookEvent::Downloading { .. } | ProgressHookEvent::Finished => None,
        }
    }

    /// True for the completion event.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_finished(&self) -> bool {
        self.total == Some(100.0) && self.progress == 100.0
    }
}

/// Receives progress for running jobs.
pub trait ProgressSink: Send + Sync {
    /// Records `event` for the job downloading `link`.
    fn report(&self, link: &str, event: ProgressEvent);
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&str, ProgressEvent) + Send + Sync,
{
    fn report(&self, link: &str, event: ProgressEvent) {
        (self.0)(link, event);
    }
}

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

/// A progress event tagged with its link, as sent by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Link the event belongs to.
    pub link: String,
    /// The event.
    pub event: ProgressEvent,
}

/// Forwards events over an unbounded channel so an async consumer can relay them.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, link: &str, event: ProgressEvent) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(ProgressUpdate {
            link: link.to_string(),
            event,
        });
    }
}

/// Progress state of one job: forwards extractor events and emits the
/// completion event at most once.
pub(crate) struct JobProgress {
    link: String,
    sink: Option<Arc<dyn ProgressSink>>,
    finished: AtomicBool,
}

impl JobProgress {
    pub(crate) fn new(link: impl Into<String>, sink: Option<Arc<dyn ProgressSink>>) -> Arc<Self> {
        Arc::new(Self {
            link: link.into(),
            sink,
            finished: AtomicBool::new(false),
        })
    }

    /// Hook to register on the extractor options.
    pub(crate) fn hook(self: &Arc<Self>) -> ProgressHook {
        let progress = Arc::clone(self);
        Arc::new(move |event: &ProgressHookEvent| progress.on_extractor_event(event))
    }

    fn on_extractor_event(&self, event: &ProgressHookEvent) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        match ProgressEvent::from_hook(event) {
            Some(converted) => self.emit(converted),
            None => trace!(link = %self.link, ?event, "progress event without byte counts"),
        }
    }

    /// Emits `(100, 100)` unless it was already emitted.
    pub(crate) fn finish(&self) {
        if !self.finished.swap(true, Ordering::SeqCst) {
            self.emit(ProgressEvent::finished());
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.sink {
            sink.report(&self.link, event);
        }
    }
}
