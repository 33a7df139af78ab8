//! Verified HTML writes into the working directory.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of a write, shaped for an agent to read back. Failures are
/// reported inside the value rather than raised through the agent loop.
#[derive(Debug, Serialize)]
pub struct WriteReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    pub message: String,
}

/// Writes `content` to `filename` under `work_dir`, forcing a `.html`
/// extension and verifying the file afterwards.
pub async fn write_html_file(work_dir: &Path, filename: &str, content: &str) -> WriteReport {
    match try_write(work_dir, filename, content).await {
        Ok((path, size)) => WriteReport {
            success: true,
            filepath: Some(path.display().to_string()),
            filesize: Some(size),
            message: format!("File successfully written to {}", path.display()),
        },
        Err(error) => WriteReport {
            success: false,
            filepath: None,
            filesize: None,
            message: format!("Error creating file {filename}: {error}"),
        },
    }
}

async fn try_write(
    work_dir: &Path,
    filename: &str,
    content: &str,
) -> std::io::Result<(PathBuf, u64)> {
    let filename = if filename.ends_with(".html") {
        filename.to_string()
    } else {
        format!("{filename}.html")
    };

    let path = work_dir.join(filename);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, content).await?;

    let size = fs::metadata(&path).await?.len();
    Ok((path, size))
}
