use std::path::Path;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{info, warn};

/// Result of delegating a segment to the external upload helper.
#[derive(Debug)]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
}

/// Hand a segment to the S3 upload helper and relay its verdict. The helper
/// owns credentials and retry policy; on failure its combined output is the
/// message, verbatim.
pub async fn upload_to_s3(helper: &Path, file_path: &str, file_name: &str) -> Result<UploadOutcome> {
    let output = Command::new("python3")
        .arg(helper)
        .arg(file_path)
        .arg(file_name)
        .output()
        .await
        .with_context(|| format!("failed to run upload helper {}", helper.display()))?;

    if output.status.success() {
        info!("uploaded {} to S3 as {}", file_path, file_name);
        return Ok(UploadOutcome {
            success: true,
            message: format!("uploaded {file_name} to S3"),
        });
    }

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let message = combined.trim_end().to_string();
    warn!("upload helper failed for {}: {}", file_path, message);

    Ok(UploadOutcome {
        success: false,
        message: if message.is_empty() {
            "upload failed with no output".to_string()
        } else {
            message
        },
    })
}
