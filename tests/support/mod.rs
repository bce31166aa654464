//! Shared helpers for integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use media_downloader::extractor::{
    ExtractOptions, ExtractedMedia, Extractor, ExtractorError, MediaInfo, ProgressHookEvent,
};
use media_downloader::{ProgressEvent, ProgressSink};

/// One recorded `extract` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub link: String,
    pub pattern: String,
}

/// In-process stand-in for yt-dlp.
///
/// Metadata comes from the link's last path segment: `id` is the segment,
/// `title` is `Title <id>`, `uploader` is `Uploader` unless the segment
/// contains `no-uploader`. Links containing `fail` always fail. Successful
/// calls render the real output template and write a small `.mp4` there.
#[derive(Default)]
pub struct FakeExtractor {
    calls: Mutex<Vec<Call>>,
}

impl FakeExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn info_for(link: &str) -> MediaInfo {
        let id = link.trim_end_matches('/').rsplit('/').next().unwrap_or(link).to_string();
        MediaInfo {
            title: Some(format!("Title {id}")),
            uploader: (!id.contains("no-uploader")).then(|| "Uploader".to_string()),
            ext: Some("mp4".to_string()),
            id,
        }
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn extract(
        &self,
        link: &str,
        options: &ExtractOptions,
    ) -> Result<ExtractedMedia, ExtractorError> {
        self.calls.lock().unwrap().push(Call {
            link: link.to_string(),
            pattern: options.output.pattern().to_string(),
        });

        options.notify(&ProgressHookEvent::Downloading {
            downloaded_bytes: Some(256),
            total_bytes: None,
        });
        options.notify(&ProgressHookEvent::Downloading {
            downloaded_bytes: Some(512),
            total_bytes: Some(1024),
        });
        tokio::task::yield_now().await;

        if link.contains("fail") {
            return Err(ExtractorError::failed(link, Some(1), "ERROR: Video unavailable"));
        }

        let info = Self::info_for(link);
        let rendered = options.output.render(&info)?;
        let filepath: PathBuf = rendered.to_string_lossy().replace("%(ext)s", "mp4").replace("%%", "%").into();
        std::fs::write(&filepath, b"media").unwrap();
        options.notify(&ProgressHookEvent::Finished);

        Ok(ExtractedMedia { info, filepath })
    }
}

/// Records every progress event with its link.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, ProgressEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(String, ProgressEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn finished_count(&self, link: &str) -> usize {
        self.events()
            .iter()
            .filter(|(l, e)| l == link && e.is_finished())
            .count()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, link: &str, event: ProgressEvent) {
        self.events.lock().unwrap().push((link.to_string(), event));
    }
}
