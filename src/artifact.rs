//! Screenshot artifact written at the end of a run

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::browser::ChromeDriver;
use crate::error::Result;

/// Fixed output name; each run overwrites the previous file.
pub const END_RESULT_SCREENSHOT: &str = "end_result.png";

/// Screenshot information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotInfo {
    /// Relative or absolute path to screenshot file
    pub path: String,

    /// Image format
    pub format: String,

    /// File size in bytes
    pub size_bytes: usize,

    /// SHA-256 of the file contents, hex encoded
    pub hash: String,

    /// ISO 8601 timestamp when the screenshot was taken
    pub captured_at: String,
}

/// Capture the current viewport as PNG and write it to `path`.
pub async fn capture_screenshot(driver: &ChromeDriver, path: &Path) -> Result<ScreenshotInfo> {
    log::info!("Capturing screenshot to {}", path.display());

    let data = driver.screenshot_to_file(path).await?;

    Ok(ScreenshotInfo {
        path: path.to_string_lossy().to_string(),
        format: "png".to_string(),
        size_bytes: data.len(),
        hash: sha256_hex(&data),
        captured_at: chrono::Utc::now().to_rfc3339(),
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
