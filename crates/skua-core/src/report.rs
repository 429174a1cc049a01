use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Destination for artifacts attached to the run report. Receives raw
/// bytes plus a display name and a MIME-type tag.
pub trait AttachmentSink: Send + Sync {
    fn attach(&self, name: &str, mime: &str, bytes: &[u8]) -> Result<()>;
}

/// One recorded attachment in the report manifest.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentEntry {
    pub file: String,
    pub name: String,
    pub mime: String,
}

/// Directory-backed report: attachment files plus a `manifest.json`
/// rewritten on every attach, so a crashed run still leaves a manifest
/// consistent with the files on disk.
pub struct ReportDir {
    attachments_dir: PathBuf,
    manifest_path: PathBuf,
    entries: Mutex<Vec<AttachmentEntry>>,
}

impl ReportDir {
    pub fn create(report_dir: impl Into<PathBuf>) -> Result<Self> {
        let report_dir = report_dir.into();
        let attachments_dir = report_dir.join("attachments");
        fs::create_dir_all(&attachments_dir)?;

        Ok(Self {
            attachments_dir,
            manifest_path: report_dir.join("manifest.json"),
            entries: Mutex::new(Vec::new()),
        })
    }
}

impl AttachmentSink for ReportDir {
    fn attach(&self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().expect("manifest mutex poisoned");

        let file_name = format!(
            "{:03}-{}.{}",
            entries.len(),
            sanitize(name),
            extension_for(mime)
        );
        fs::write(self.attachments_dir.join(&file_name), bytes)?;

        entries.push(AttachmentEntry {
            file: file_name,
            name: name.to_string(),
            mime: mime.to_string(),
        });

        let manifest = serde_json::to_string_pretty(&*entries)?;
        fs::write(&self.manifest_path, manifest)?;
        Ok(())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "text/plain" => "txt",
        "application/json" => "json",
        _ => "bin",
    }
}
