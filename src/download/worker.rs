//! Single-link download worker.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::embed::EmbedRewriter;
use super::error::{AttemptStage, DownloadError};
use super::progress::{JobProgress, ProgressSink};
use crate::extractor::{
    ExtractOptions, Extractor, ExtractorError, ExtractorLogger, OutputTemplate, TracingLogger,
};

/// One unit of work: a link, where to put it and whether to keep only audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Link to download.
    pub link: String,
    /// Directory the file is written to.
    pub output_dir: PathBuf,
    /// Download best audio and transcode to mp3.
    pub audio_only: bool,
}

impl DownloadJob {
    /// Creates a job.
    pub fn new(link: impl Into<String>, output_dir: impl Into<PathBuf>, audio_only: bool) -> Self {
        Self {
            link: link.into(),
            output_dir: output_dir.into(),
            audio_only,
        }
    }
}

/// Downloads one link through the extractor, with embed rewriting and a
/// single fallback attempt.
///
/// The worker is shared between concurrent jobs; every job gets its own
/// options bundle and progress state.
pub struct DownloadWorker {
    extractor: Arc<dyn Extractor>,
    embed: EmbedRewriter,
    sink: Option<Arc<dyn ProgressSink>>,
    logger: Arc<dyn ExtractorLogger>,
}

impl fmt::Debug for DownloadWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadWorker")
            .field("extractor", &self.extractor.name())
            .field("embed", &self.embed)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl DownloadWorker {
    /// Creates a worker with no progress sink.
    pub fn new(extractor: Arc<dyn Extractor>, embed: EmbedRewriter) -> Self {
        Self {
            extractor,
            embed,
            sink: None,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Registers the sink that receives progress for every job.
    #[must_use]
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replaces the sink for extractor diagnostics.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ExtractorLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Downloads `job`, returning the final file path or the last error.
    ///
    /// The primary attempt names the file `<uploader> - <title>`, or just
    /// `<title>` when the link was rewritten from an embed page. Any primary
    /// failure is retried exactly once with the `<id>` template. `(100, 100)`
    /// is reported once when the job ends, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::CreateDir`] if the output directory cannot be created
    /// - [`DownloadError::Extraction`] with stage `Fallback` if both attempts fail
    /// - [`DownloadError::MissingFile`] if the reported file is not on disk
    #[instrument(skip(self, job), fields(link = %job.link, audio_only = job.audio_only))]
    pub async fn try_download(&self, job: &DownloadJob) -> Result<PathBuf, DownloadError> {
        let progress = JobProgress::new(job.link.as_str(), self.sink.clone());
        let result = self.run_attempts(job, &progress).await;
        progress.finish();
        result
    }

    /// Downloads `job`, logging any failure and returning `None`.
    pub async fn download(&self, job: &DownloadJob) -> Option<PathBuf> {
        match self.try_download(job).await {
            Ok(path) => {
                info!(link = %job.link, path = %path.display(), "download completed");
                Some(path)
            }
            Err(e) => {
                error!(link = %job.link, stage = ?e.stage(), error = %e, "download failed");
                None
            }
        }
    }

    async fn run_attempts(
        &self,
        job: &DownloadJob,
        progress: &Arc<JobProgress>,
    ) -> Result<PathBuf, DownloadError> {
        tokio::fs::create_dir_all(&job.output_dir)
            .await
            .map_err(|e| DownloadError::create_dir(&job.output_dir, e))?;

        let (link, primary) = self.resolve_link(job).await;

        let path = match self.attempt(&link, job.audio_only, primary, progress).await {
            Ok(path) => path,
            Err(primary_err) => {
                warn!(
                    link = %link,
                    stage = %AttemptStage::Primary,
                    error = %primary_err,
                    "download failed, retrying with id template"
                );
                let fallback = OutputTemplate::id(&job.output_dir);
                self.attempt(&link, job.audio_only, fallback, progress)
                    .await
                    .map_err(|e| DownloadError::extraction(&link, AttemptStage::Fallback, e))?
            }
        };

        if path.exists() {
            Ok(path)
        } else {
            Err(DownloadError::MissingFile { link, path })
        }
    }

    /// Applies the embed rewrite and picks the primary template.
    async fn resolve_link(&self, job: &DownloadJob) -> (String, OutputTemplate) {
        match self.embed.rewrite(&job.link).await {
            Ok(Some(embed)) => (embed, OutputTemplate::title(&job.output_dir)),
            Ok(None) => (job.link.clone(), OutputTemplate::uploader_title(&job.output_dir)),
            Err(e) => {
                warn!(error = %e, "embed page fetch failed, using the original link");
                (job.link.clone(), OutputTemplate::uploader_title(&job.output_dir))
            }
        }
    }

    async fn attempt(
        &self,
        link: &str,
        audio_only: bool,
        output: OutputTemplate,
        progress: &Arc<JobProgress>,
    ) -> Result<PathBuf, ExtractorError> {
        let options = ExtractOptions::for_download(audio_only, output)
            .with_progress_hook(progress.hook())
            .with_logger(Arc::clone(&self.logger));
        debug!(
            extractor = self.extractor.name(),
            template = %template_display(&options.output),
            format = %options.format,
            "starting extraction"
        );
        let media = self.extractor.extract(link, &options).await?;
        Ok(media.filepath)
    }
}

fn template_display(template: &OutputTemplate) -> String {
    template
        .directory()
        .join(template.pattern())
        .display()
        .to_string()
}
