//! Scoped staging of decoded meter images
//!
//! The raw bytes are written to a named temp file so the file-hosting upload
//! can read a real path; the file is removed when the guard drops, on every
//! exit path of the upload workflow.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// RAII guard around a staged image file
pub struct StagedImage {
    file: NamedTempFile,
}

impl StagedImage {
    /// Write `bytes` to a temp file under `staging_dir`, named from the
    /// customer code and detected image format
    pub fn write(
        staging_dir: &Path,
        customer_code: &str,
        format: &str,
        bytes: &[u8],
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(staging_dir)?;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize_for_filename(customer_code)))
            .suffix(&format!(".{}", format))
            .tempfile_in(staging_dir)?;

        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(path = %file.path().display(), "Image staged");

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Customer codes are free text; keep only filename-safe characters
fn sanitize_for_filename(code: &str) -> String {
    code.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
