use std::path::Path;

use axum::body::Bytes;
use axum::extract::multipart::Field;
use chrono::Utc;
use rand::Rng;

use crate::error::ApiError;

pub const DIARY_CATEGORY: &str = "diary";
pub const REPORTS_CATEGORY: &str = "reports";
pub const AI_REPORTS_CATEGORY: &str = "ai-reports";

/// One file pulled out of a multipart request, fully buffered.
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

pub async fn ensure_dirs(root: &Path) -> std::io::Result<()> {
    for category in [DIARY_CATEGORY, REPORTS_CATEGORY, AI_REPORTS_CATEGORY] {
        tokio::fs::create_dir_all(root.join(category)).await?;
    }
    Ok(())
}

/// Splits an uploaded filename into a sanitized base (whitespace runs
/// collapsed to `_`, any client-sent directory part dropped) and its
/// extension including the dot.
pub fn sanitize_original(name: &str) -> (String, String) {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (base, ext) = match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    };

    let mut sanitized = String::with_capacity(base.len());
    let mut in_ws = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_ws {
                sanitized.push('_');
            }
            in_ws = true;
        } else {
            sanitized.push(c);
            in_ws = false;
        }
    }
    (sanitized, ext.to_string())
}

pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Random 0..1e9 collision-avoidance suffix.
pub fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(0..1_000_000_000)
}

pub async fn read_file_field(field: Field<'_>) -> Result<UploadedFile, ApiError> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read uploaded file: {e}")))?;
    Ok(UploadedFile {
        original_name,
        mime_type,
        bytes,
    })
}

/// Writes the file under `<root>/<category>/<filename>` and returns the
/// relative URL it will be served from.
pub async fn save_file(
    root: &Path,
    category: &str,
    filename: &str,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let dir = root.join(category);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(filename), bytes).await?;
    Ok(format!("/uploads/{category}/{filename}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapses_to_single_underscore() {
        let (base, ext) = sanitize_original("blood  test   jan.pdf");
        assert_eq!(base, "blood_test_jan");
        assert_eq!(ext, ".pdf");
    }

    #[test]
    fn extension_survives_and_dotfiles_have_none() {
        assert_eq!(sanitize_original("scan.PDF").1, ".PDF");
        assert_eq!(sanitize_original(".env"), (".env".to_string(), String::new()));
        assert_eq!(sanitize_original("noext"), ("noext".to_string(), String::new()));
    }

    #[test]
    fn client_directory_parts_are_dropped() {
        let (base, ext) = sanitize_original("../secret/na me.png");
        assert_eq!(base, "na_me");
        assert_eq!(ext, ".png");
    }
}
