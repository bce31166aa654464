//! The options bundle handed to an extractor for one invocation.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::OutputTemplate;

/// Which stream the extractor should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatSelector {
    /// Best single file with both audio and video.
    #[default]
    Best,
    /// Best audio-only stream, falling back to best combined.
    BestAudio,
}

impl FormatSelector {
    /// Selector for the audio-only flag.
    #[must_use]
    pub fn for_audio_only(audio_only: bool) -> Self {
        if audio_only { Self::BestAudio } else { Self::Best }
    }

    /// The extractor's selector expression.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::BestAudio => "bestaudio/best",
        }
    }
}

impl fmt::Display for FormatSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio codec for extracted audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// MPEG-1 Layer III.
    Mp3,
}

impl AudioCodec {
    /// Codec name as the extractor expects it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
        }
    }
}

/// Post-extraction processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessor {
    /// Transcode the downloaded stream to audio.
    ExtractAudio {
        /// Target codec.
        codec: AudioCodec,
        /// Target bitrate in kbps.
        quality_kbps: u32,
    },
}

impl PostProcessor {
    /// mp3 at 320 kbps.
    #[must_use]
    pub fn mp3_320() -> Self {
        Self::ExtractAudio {
            codec: AudioCodec::Mp3,
            quality_kbps: 320,
        }
    }
}

/// A structured progress notification from the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressHookEvent {
    /// Transfer in progress.
    Downloading {
        /// Bytes received so far, if reported.
        downloaded_bytes: Option<u64>,
        /// Total size, if known up front.
        total_bytes: Option<u64>,
    },
    /// Transfer finished (post-processing may follow).
    Finished,
}

/// Callback receiving extractor progress notifications.
pub type ProgressHook = Arc<dyn Fn(&ProgressHookEvent) + Send + Sync>;

/// Sink for extractor diagnostics.
pub trait ExtractorLogger: Send + Sync {
    /// Verbose diagnostic line.
    fn debug(&self, message: &str);
    /// Recoverable problem.
    fn warning(&self, message: &str);
    /// Failure reported by the extractor.
    fn error(&self, message: &str);
}

/// Forwards extractor diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ExtractorLogger for TracingLogger {
    fn debug(&self, message: &str) {
        debug!(target: "media_downloader::extractor", "{message}");
    }

    fn warning(&self, message: &str) {
        warn!(target: "media_downloader::extractor", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "media_downloader::extractor", "{message}");
    }
}

/// Everything an extractor needs for one invocation.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Stream selection.
    pub format: FormatSelector,
    /// Where and how to name the output file.
    pub output: OutputTemplate,
    /// Progress callbacks, invoked in registration order.
    pub progress_hooks: Vec<ProgressHook>,
    /// Diagnostics sink.
    pub logger: Arc<dyn ExtractorLogger>,
    /// Optional post-processing step.
    pub postprocessor: Option<PostProcessor>,
}

impl ExtractOptions {
    /// Creates options with no hooks, the tracing logger and no post-processor.
    #[must_use]
    pub fn new(format: FormatSelector, output: OutputTemplate) -> Self {
        Self {
            format,
            output,
            progress_hooks: Vec::new(),
            logger: Arc::new(TracingLogger),
            postprocessor: None,
        }
    }

    /// Options for the audio-only flag: best audio plus mp3 transcoding, or best combined.
    #[must_use]
    pub fn for_download(audio_only: bool, output: OutputTemplate) -> Self {
        let mut options = Self::new(FormatSelector::for_audio_only(audio_only), output);
        if audio_only {
            options.postprocessor = Some(PostProcessor::mp3_320());
        }
        options
    }

    /// Registers a progress hook.
    #[must_use]
    pub fn with_progress_hook(mut self, hook: ProgressHook) -> Self {
        self.progress_hooks.push(hook);
        self
    }

    /// Replaces the diagnostics sink.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ExtractorLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Invokes every registered hook with `event`.
    pub fn notify(&self, event: &ProgressHookEvent) {
        for hook in &self.progress_hooks {
            hook(event);
        }
    }
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("format", &self.format)
            .field("output", &self.output)
            .field("progress_hooks", &self.progress_hooks.len())
            .field("postprocessor", &self.postprocessor)
            .finish_non_exhaustive()
    }
}
