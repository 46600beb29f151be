//! Attachments and descriptive test metadata.
//!
//! [`ReportSink`] is the extension point failure hooks write diagnostics
//! to. [`MemorySink`] keeps them in memory for the runner to copy into the
//! scenario's [`TestResultEntry`](crate::TestResultEntry).

use crate::result::PageCheckResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// PNG image
    Png,
    /// Plain UTF-8 text
    Text,
    /// HTML markup
    Html,
}

impl AttachmentKind {
    /// MIME type
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Text => "text/plain",
            Self::Html => "text/html",
        }
    }

    /// File extension without the dot
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Text => "txt",
            Self::Html => "html",
        }
    }
}

/// A named diagnostic artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name
    pub name: String,
    /// Content type
    pub kind: AttachmentKind,
    /// Raw content
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl Attachment {
    /// Create an attachment
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>, kind: AttachmentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            body: body.into(),
        }
    }

    /// Body as text, lossy for non-UTF-8 content
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Severity label; descriptive only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks further testing
    Blocker,
    /// Core functionality broken
    Critical,
    /// Regular defect
    #[default]
    Normal,
    /// Minor defect
    Minor,
    /// Cosmetic
    Trivial,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Blocker => "blocker",
            Self::Critical => "critical",
            Self::Normal => "normal",
            Self::Minor => "minor",
            Self::Trivial => "trivial",
        };
        f.write_str(label)
    }
}

/// Descriptive metadata attached to a scenario result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestMetadata {
    /// Top-level grouping
    pub epic: String,
    /// Feature under test
    pub feature: String,
    /// User story
    pub story: String,
    /// Human-readable title
    pub title: String,
    /// Severity label
    pub severity: Severity,
}

impl TestMetadata {
    /// Metadata with only a title
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set epic, feature and story
    #[must_use]
    pub fn in_story(
        mut self,
        epic: impl Into<String>,
        feature: impl Into<String>,
        story: impl Into<String>,
    ) -> Self {
        self.epic = epic.into();
        self.feature = feature.into();
        self.story = story.into();
        self
    }

    /// Set severity
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Non-empty labels as `(name, value)` pairs
    #[must_use]
    pub fn labels(&self) -> Vec<(&'static str, String)> {
        let mut labels: Vec<(&'static str, String)> = [
            ("epic", &self.epic),
            ("feature", &self.feature),
            ("story", &self.story),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name, value.clone()))
        .collect();
        labels.push(("severity", self.severity.to_string()));
        labels
    }
}

/// Receiver of diagnostic attachments
pub trait ReportSink {
    /// Attach `body` under `name`
    ///
    /// # Errors
    ///
    /// Returns error if the sink cannot store the attachment
    fn attach(&mut self, name: &str, body: &[u8], kind: AttachmentKind) -> PageCheckResult<()>;
}

/// Sink that keeps attachments in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    attachments: Vec<Attachment>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attachments received so far
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Attachment by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }

    /// Take every attachment, leaving the sink empty
    pub fn take(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.attachments)
    }

    /// Number of attachments
    #[must_use]
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    /// Whether nothing was attached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

impl ReportSink for MemorySink {
    fn attach(&mut self, name: &str, body: &[u8], kind: AttachmentKind) -> PageCheckResult<()> {
        self.attachments.push(Attachment::new(name, body, kind));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mime_and_extension() {
        assert_eq!(AttachmentKind::Png.mime_type(), "image/png");
        assert_eq!(AttachmentKind::Text.extension(), "txt");
        assert_eq!(AttachmentKind::Html.extension(), "html");
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&AttachmentKind::Html).unwrap();
        assert_eq!(json, "\"html\"");
    }

    #[test]
    fn test_metadata_labels_skip_empty() {
        let meta = TestMetadata::titled("Login")
            .in_story("Auth", "", "Valid login")
            .with_severity(Severity::Critical);
        let labels = meta.labels();
        assert_eq!(
            labels,
            vec![
                ("epic", "Auth".to_string()),
                ("story", "Valid login".to_string()),
                ("severity", "critical".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_severity_is_normal() {
        assert_eq!(TestMetadata::default().severity, Severity::Normal);
        assert_eq!(Severity::Blocker.to_string(), "blocker");
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let mut sink = MemorySink::new();
        sink.attach("url", b"https://a.test/", AttachmentKind::Text).unwrap();
        sink.attach("source", b"<html></html>", AttachmentKind::Html).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.get("url").unwrap().text(), "https://a.test/");
        let taken = sink.take();
        assert_eq!(taken[1].kind, AttachmentKind::Html);
        assert!(sink.is_empty());
    }
}
