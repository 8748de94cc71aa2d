use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::document::BlockKey;
use crate::media::ImageInsert;

/// A file handed over by the picker or a drop event: a name, the declared
/// media type, and where to read the bytes from.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub media_type: String,
    pub path: PathBuf,
}

impl FileInput {
    /// Build an input from a filesystem path, deriving name and media type
    /// from the file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = media_type_for(&path).to_string();
        Self {
            name,
            media_type,
            path,
        }
    }

    /// Only files declaring an image kind are converted; everything else is
    /// silently skipped.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

fn media_type_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
        .and_then(|e| e.to_str())
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as a `data:` URI carrying the declared media type.
pub fn to_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", STANDARD.encode(bytes))
}

/// Owns the asynchronous file reads of the media adapter.
///
/// Each file becomes one scoped task; all tasks of a batch share a
/// cancellation token, so teardown (drop) or a superseding batch cancels
/// everything still in flight. Completions are delivered through a bounded
/// channel as [`ImageInsert`] values; the consumer re-resolves the target
/// against its latest snapshot, so no task ever holds a reference into a
/// document. Completion order across files of one batch is unspecified.
pub struct MediaReader {
    tx: mpsc::Sender<ImageInsert>,
    cancel: CancellationToken,
}

impl MediaReader {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ImageInsert>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                cancel: CancellationToken::new(),
            },
            rx,
        )
    }

    /// Cancel reads still in flight; a newer drop supersedes older ones.
    pub fn supersede(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
    }

    /// Cancel everything; used at editor teardown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Start one read task per image file in the batch. Non-image files are
    /// skipped. Must be called from within a tokio runtime.
    pub fn read_files(&self, files: Vec<FileInput>, target: Option<BlockKey>) {
        for file in files {
            if !file.is_image() {
                debug!("skipping non-image file: {}", file.name);
                continue;
            }
            let tx = self.tx.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                if cancel.is_cancelled() {
                    debug!("image read cancelled before start: {}", file.name);
                    return;
                }
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("image read cancelled: {}", file.name);
                    }
                    result = tokio::fs::read(&file.path) => match result {
                        Ok(bytes) => {
                            let insert = ImageInsert {
                                src: to_data_uri(&file.media_type, &bytes),
                                target,
                            };
                            if tx.send(insert).await.is_err() {
                                debug!("image insert dropped: receiver closed");
                            }
                        }
                        Err(err) => warn!("failed to read {}: {err}", file.name),
                    }
                }
            });
        }
    }
}

impl Drop for MediaReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
