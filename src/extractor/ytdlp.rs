//! `yt-dlp` backed extractor.
//!
//! Each extraction is two runs of the executable:
//! 1. a metadata probe (`--dump-single-json --skip-download`), used to
//!    render the output template so missing fields fail before any transfer;
//! 2. the download itself, with machine-readable progress lines and the final
//!    post-processed path printed on stdout.
//!
//! Every run is a separate OS process, so concurrent extractions are truly
//! parallel. Processes are killed if the future driving them is dropped.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::{
    ExtractOptions, ExtractedMedia, Extractor, ExtractorError, ExtractorLogger, MediaInfo,
    PostProcessor, ProgressHookEvent,
};

const PROGRESS_MARKER: &str = "[md-progress]";
const FILEPATH_MARKER: &str = "[md-filepath]";
const PROGRESS_TEMPLATE: &str = "download:[md-progress] %(progress.status)s %(progress.downloaded_bytes)s %(progress.total_bytes)s";
const FILEPATH_PRINT: &str = "after_move:[md-filepath]%(filepath)s";

/// Extractor that shells out to `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    program: PathBuf,
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlpExtractor {
    /// Creates an extractor running `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this extractor runs.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn probe_args(link: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            link.to_string(),
        ]
    }

    fn download_args(link: &str, output: &Path, options: &ExtractOptions) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            "--progress".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--print".to_string(),
            FILEPATH_PRINT.to_string(),
            "-f".to_string(),
            options.format.as_str().to_string(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
        ];

        if let Some(PostProcessor::ExtractAudio {
            codec,
            quality_kbps,
        }) = options.postprocessor
        {
            args.extend([
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                codec.as_str().to_string(),
                "--audio-quality".to_string(),
                format!("{quality_kbps}K"),
            ]);
        }

        args.push("--".to_string());
        args.push(link.to_string());
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    #[instrument(skip(self, options), fields(program = %self.program.display()))]
    async fn probe(&self, link: &str, options: &ExtractOptions) -> Result<MediaInfo, ExtractorError> {
        let output = self
            .command(&Self::probe_args(link))
            .output()
            .await
            .map_err(|source| ExtractorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut last_error = None;
        for line in stderr.lines() {
            log_diagnostic(options.logger.as_ref(), line, &mut last_error);
        }

        if !output.status.success() {
            return Err(ExtractorError::failed(
                link,
                output.status.code(),
                last_error.unwrap_or_else(|| "metadata probe failed".to_string()),
            ));
        }

        let info: MediaInfo = serde_json::from_slice(&output.stdout)
            .map_err(|e| ExtractorError::metadata(link, e.to_string()))?;
        if info.id.trim().is_empty() {
            return Err(ExtractorError::metadata(link, "empty id"));
        }
        debug!(id = %info.id, "probed metadata");
        Ok(info)
    }

    #[instrument(skip(self, options), fields(program = %self.program.display(), output = %output.display()))]
    async fn download(
        &self,
        link: &str,
        output: &Path,
        options: &ExtractOptions,
    ) -> Result<PathBuf, ExtractorError> {
        let mut child = self
            .command(&Self::download_args(link, output, options))
            .spawn()
            .map_err(|source| ExtractorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractorError::io(link, std::io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractorError::io(link, std::io::Error::other("stderr not captured")))?;

        let mut filepath = None;
        let mut last_error = None;

        let read_stdout = for_each_line(stdout, |line| {
            if let Some(path) = line.strip_prefix(FILEPATH_MARKER) {
                filepath = Some(PathBuf::from(path.trim_end()));
            } else if let Some(event) = parse_progress_line(line) {
                options.notify(&event);
            } else if !line.trim().is_empty() {
                options.logger.debug(line);
            }
        });
        let read_stderr = for_each_line(stderr, |line| {
            if let Some(event) = parse_progress_line(line) {
                options.notify(&event);
            } else {
                log_diagnostic(options.logger.as_ref(), line, &mut last_error);
            }
        });

        tokio::join!(read_stdout, read_stderr);

        let status = child.wait().await.map_err(|e| ExtractorError::io(link, e))?;
        if !status.success() {
            return Err(ExtractorError::failed(
                link,
                status.code(),
                last_error.unwrap_or_else(|| "download failed".to_string()),
            ));
        }

        filepath.ok_or_else(|| ExtractorError::MissingOutput {
            link: link.to_string(),
        })
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract(
        &self,
        link: &str,
        options: &ExtractOptions,
    ) -> Result<ExtractedMedia, ExtractorError> {
        let info = self.probe(link, options).await?;
        let output = options.output.render(&info)?;
        let filepath = self.download(link, &output, options).await?;
        Ok(ExtractedMedia { info, filepath })
    }
}

/// Parses one progress line emitted through the progress template.
///
/// Returns `None` for anything that is not a progress line or whose status
/// is neither `downloading` nor `finished`.
#[must_use]
pub fn parse_progress_line(line: &str) -> Option<ProgressHookEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut parts = rest.split_whitespace();
    match parts.next()? {
        "downloading" => Some(ProgressHookEvent::Downloading {
            downloaded_bytes: parts.next().and_then(parse_byte_count),
            total_bytes: parts.next().and_then(parse_byte_count),
        }),
        "finished" => Some(ProgressHookEvent::Finished),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_byte_count(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    })
}

fn log_diagnostic(logger: &dyn ExtractorLogger, line: &str, last_error: &mut Option<String>) {
    let line = line.trim_end();
    if line.is_empty() {
        return;
    }
    if line.starts_with("ERROR:") {
        logger.error(line);
        *last_error = Some(line.to_string());
    } else if line.starts_with("WARNING:") {
        logger.warning(line);
    } else {
        logger.debug(line);
    }
}

/// Feeds each output line to `on_line` until end of stream.
///
/// Lines are decoded lossily. A read error ends the stream; the exit status
/// still decides the outcome.
async fn for_each_line<R, F>(reader: R, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                warn!(error = %e, "stopped reading extractor output");
                break;
            }
        }
    }
}
