use std::path::Path;

use crate::TransferError;

/// Checks that `path` names an existing regular file with a usable file name.
pub fn validate_upload_source(path: &Path) -> Result<(), TransferError> {
    if path.as_os_str().is_empty() {
        return Err(TransferError::InvalidSource("no file selected".into()));
    }

    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TransferError::InvalidSource(format!(
                "file not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        return Err(TransferError::InvalidSource(format!(
            "not a regular file: {}",
            path.display()
        )));
    }

    if file_name(path).is_none() {
        return Err(TransferError::InvalidSource(format!(
            "path has no file name: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Final path component as UTF-8, if any.
pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str()).filter(|n| !n.is_empty())
}

/// MIME type for common video and image extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "webm" => "video/webm",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rejects_empty_path() {
        let err = validate_upload_source(Path::new("")).unwrap_err();
        assert!(err.to_string().contains("no file selected"));
    }

    #[test]
    fn rejects_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = validate_upload_source(&dir.path().join("gone.webm")).unwrap_err();
        assert!(matches!(err, TransferError::InvalidSource(ref m) if m.contains("not found")));
    }

    #[test]
    fn rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = validate_upload_source(dir.path()).unwrap_err();
        assert!(matches!(err, TransferError::InvalidSource(ref m) if m.contains("regular file")));
    }

    #[test]
    fn accepts_regular_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.webm");
        std::fs::write(&path, b"x").unwrap();
        assert!(validate_upload_source(&path).is_ok());
        assert_eq!(file_name(&path), Some("clip.webm"));
    }

    #[test]
    fn content_types() {
        assert_eq!(guess_content_type(Path::new("a.webm")), "video/webm");
        assert_eq!(guess_content_type(Path::new("a.MP4")), "video/mp4");
        assert_eq!(guess_content_type(Path::new("a.mov")), "video/quicktime");
        assert_eq!(guess_content_type(Path::new("thumb.jpeg")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }
}
