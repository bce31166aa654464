//! Output filename templates.
//!
//! A template is a pattern with `%(field)s` placeholders resolved from
//! extracted metadata, placed under an output directory. `%(ext)s` is left
//! for the extractor because the final extension is only known after
//! post-processing.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{ExtractorError, MediaInfo};

/// `<uploader> - <title>.<ext>`, the default naming scheme.
pub const UPLOADER_TITLE_PATTERN: &str = "%(uploader)s - %(title)s.%(ext)s";

/// `<title>.<ext>`, used when the source omits the uploader.
pub const TITLE_PATTERN: &str = "%(title)s.%(ext)s";

/// `<id>.<ext>`, the fallback keyed only by the stable identifier.
pub const ID_PATTERN: &str = "%(id)s.%(ext)s";

const EXT_PLACEHOLDER: &str = "%(ext)s";

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%\(([A-Za-z_][A-Za-z0-9_]*)\)s").expect("placeholder regex is valid") // Static pattern, safe to panic
});

/// A filename pattern rooted in an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    directory: PathBuf,
    pattern: String,
}

impl OutputTemplate {
    /// Creates a template from a directory and a pattern.
    pub fn new(directory: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            pattern: pattern.into(),
        }
    }

    /// `<dir>/<uploader> - <title>.<ext>`.
    pub fn uploader_title(directory: impl Into<PathBuf>) -> Self {
        Self::new(directory, UPLOADER_TITLE_PATTERN)
    }

    /// `<dir>/<title>.<ext>`.
    pub fn title(directory: impl Into<PathBuf>) -> Self {
        Self::new(directory, TITLE_PATTERN)
    }

    /// `<dir>/<id>.<ext>`.
    pub fn id(directory: impl Into<PathBuf>) -> Self {
        Self::new(directory, ID_PATTERN)
    }

    /// Output directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Filename pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Resolves every placeholder except `%(ext)s` from `info`.
    ///
    /// The result is a path pattern still containing `%(ext)s`. Literal `%`
    /// in the directory and in substituted values is escaped as `%%` so the
    /// extractor does not interpret it.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::TemplateField`] when a referenced field is
    /// missing from `info` or unknown.
    pub fn render(&self, info: &MediaInfo) -> Result<PathBuf, ExtractorError> {
        let mut rendered = String::with_capacity(self.pattern.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&self.pattern) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            rendered.push_str(&self.pattern[last..whole.start()]);
            last = whole.end();

            if name.as_str() == "ext" {
                rendered.push_str(EXT_PLACEHOLDER);
                continue;
            }
            let value = info
                .field(name.as_str())
                .ok_or_else(|| ExtractorError::template_field(&self.pattern, name.as_str()))?;
            rendered.push_str(&sanitize_component(value));
        }
        rendered.push_str(&self.pattern[last..]);
        let directory = self.directory.to_string_lossy().replace('%', "%%");
        Ok(Path::new(&directory).join(rendered))
    }
}

/// Makes a metadata value safe as a single path component inside a template.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .replace('%', "%%")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info() -> MediaInfo {
        MediaInfo {
            id: "abc123".to_string(),
            title: Some("A Title".to_string()),
            uploader: Some("Someone".to_string()),
            ext: Some("mp4".to_string()),
        }
    }

    #[test]
    fn test_render_uploader_title_keeps_ext_placeholder() {
        let path = OutputTemplate::uploader_title("/out").render(&info()).unwrap();
        assert_eq!(path, PathBuf::from("/out/Someone - A Title.%(ext)s"));
    }

    #[test]
    fn test_render_id_template() {
        let path = OutputTemplate::id("/out").render(&info()).unwrap();
        assert_eq!(path, PathBuf::from("/out/abc123.%(ext)s"));
    }

    #[test]
    fn test_render_missing_uploader_fails() {
        let mut info = info();
        info.uploader = None;
        let err = OutputTemplate::uploader_title("/out").render(&info).unwrap_err();
        assert!(matches!(err, ExtractorError::TemplateField { ref field, .. } if field == "uploader"));
    }

    #[test]
    fn test_render_title_template_ignores_missing_uploader() {
        let mut info = info();
        info.uploader = None;
        let path = OutputTemplate::title("/out").render(&info).unwrap();
        assert_eq!(path, PathBuf::from("/out/A Title.%(ext)s"));
    }

    #[test]
    fn test_render_unknown_field_fails() {
        let err = OutputTemplate::new("/out", "%(channel_follower_count)s.%(ext)s")
            .render(&info())
            .unwrap_err();
        assert!(matches!(err, ExtractorError::TemplateField { .. }));
    }

    #[test]
    fn test_render_sanitizes_separators_and_escapes_percent() {
        let mut info = info();
        info.title = Some("50% off / today".to_string());
        let path = OutputTemplate::title("/out").render(&info).unwrap();
        assert_eq!(path, PathBuf::from("/out/50%% off _ today.%(ext)s"));
    }

    #[test]
    fn test_render_escapes_percent_in_directory() {
        let path = OutputTemplate::id("/media/100% pure").render(&info()).unwrap();
        assert_eq!(path, PathBuf::from("/media/100%% pure/abc123.%(ext)s"));
    }
}
