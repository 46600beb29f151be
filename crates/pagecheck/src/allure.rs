//! Allure-compatible results directory.
//!
//! Each scenario becomes one `<uuid>-result.json`; each of its attachments
//! one `<uuid>-attachment.<ext>` next to it. Any Allure report generator
//! can render the directory.

use crate::reporter::TestResultEntry;
use crate::result::PageCheckResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct Label {
    name: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct AttachmentRef {
    name: String,
    source: String,
    #[serde(rename = "type")]
    mime_type: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusDetails {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllureResult {
    uuid: String,
    history_id: String,
    name: String,
    full_name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_details: Option<StatusDetails>,
    stage: &'static str,
    start: u64,
    stop: u64,
    labels: Vec<Label>,
    attachments: Vec<AttachmentRef>,
}

/// Directory receiving result and attachment files
#[derive(Debug, Clone)]
pub struct ResultsDirectory {
    root: PathBuf,
}

impl ResultsDirectory {
    /// Create the directory if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn create(root: impl Into<PathBuf>) -> PageCheckResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write one scenario and its attachments; returns the result file
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be written
    pub fn write(&self, entry: &TestResultEntry) -> PageCheckResult<PathBuf> {
        let mut attachments = Vec::with_capacity(entry.attachments.len());
        for attachment in &entry.attachments {
            let source = format!("{}-attachment.{}", Uuid::new_v4(), attachment.kind.extension());
            std::fs::write(self.root.join(&source), &attachment.body)?;
            attachments.push(AttachmentRef {
                name: attachment.name.clone(),
                source,
                mime_type: attachment.kind.mime_type(),
            });
        }

        let mut labels: Vec<Label> = entry
            .metadata
            .labels()
            .into_iter()
            .map(|(name, value)| Label { name, value })
            .collect();
        labels.push(Label {
            name: "framework",
            value: "pagecheck".to_string(),
        });

        let uuid = Uuid::new_v4().to_string();
        let result = AllureResult {
            uuid: uuid.clone(),
            history_id: entry.name.clone(),
            name: entry.display_name().to_string(),
            full_name: entry.name.clone(),
            status: entry.status.label(),
            status_details: entry.error.clone().map(|message| StatusDetails { message }),
            stage: "finished",
            start: entry.start_millis(),
            stop: entry.stop_millis(),
            labels,
            attachments,
        };

        let path = self.root.join(format!("{uuid}-result.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(&result)?)?;
        tracing::debug!(path = %path.display(), scenario = %entry.name, "wrote result");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{Attachment, AttachmentKind, Severity, TestMetadata};
    use std::time::Duration;

    fn failed_entry() -> TestResultEntry {
        TestResultEntry::failed("invalid_credentials", Duration::from_millis(40), "expected error")
            .with_metadata(
                TestMetadata::titled("Invalid credentials")
                    .in_story("Authentication", "Login", "Invalid login")
                    .with_severity(Severity::Normal),
            )
            .with_attachments(vec![
                Attachment::new("screenshot", vec![0x89, b'P'], AttachmentKind::Png),
                Attachment::new("current url", "https://a.test/", AttachmentKind::Text),
            ])
    }

    #[test]
    fn test_write_result_and_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultsDirectory::create(dir.path().join("allure")).unwrap();
        let path = results.write(&failed_entry()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["name"], "Invalid credentials");
        assert_eq!(json["fullName"], "invalid_credentials");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["statusDetails"]["message"], "expected error");
        assert_eq!(json["labels"][0]["name"], "epic");
        assert_eq!(json["attachments"][1]["type"], "text/plain");

        let source = json["attachments"][0]["source"].as_str().unwrap();
        assert!(source.ends_with("-attachment.png"));
        let body = std::fs::read(results.path().join(source)).unwrap();
        assert_eq!(body, vec![0x89, b'P']);

        let files = std::fs::read_dir(results.path()).unwrap().count();
        assert_eq!(files, 3);
    }

    #[test]
    fn test_passed_has_no_status_details() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultsDirectory::create(dir.path()).unwrap();
        let path = results
            .write(&TestResultEntry::passed("ok", Duration::from_millis(1)))
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert!(json.get("statusDetails").is_none());
        assert_eq!(json["stage"], "finished");
    }
}
