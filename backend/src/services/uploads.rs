use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{de, official::OfficialForm, upload::UploadedFile},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Signature,
    Picture,
}

impl UploadKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            UploadKind::Signature => "signatures",
            UploadKind::Picture => "pictures",
        }
    }
}

/// Creates the per-kind directories under `uploads_dir`.
pub async fn ensure_dirs(uploads_dir: &str) -> std::io::Result<()> {
    for kind in [UploadKind::Signature, UploadKind::Picture] {
        tokio::fs::create_dir_all(Path::new(uploads_dir).join(kind.dir_name())).await?;
    }
    Ok(())
}

/// Keeps ASCII alphanumerics, `-`, `_` and `.`; anything else becomes `_`.
pub fn sanitize_file_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<unix millis>-<sanitized base><ext>`
pub fn stored_name(original: &str, millis: i64) -> String {
    // Browsers may send a full client path.
    let base_name = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    let path = Path::new(base_name);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", sanitize_file_name(e)))
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    format!("{millis}-{}{ext}", sanitize_file_name(stem))
}

/// Writes the file and returns the public path recorded on the official.
pub async fn save(uploads_dir: &str, kind: UploadKind, file: &UploadedFile) -> AppResult<String> {
    let name = stored_name(&file.file_name, Utc::now().timestamp_millis());
    let dir: PathBuf = Path::new(uploads_dir).join(kind.dir_name());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(anyhow::Error::from)?;
    tokio::fs::write(dir.join(&name), &file.bytes)
        .await
        .map_err(anyhow::Error::from)?;
    tracing::info!(kind = kind.dir_name(), file = %name, bytes = file.bytes.len(), "stored upload");
    Ok(format!("/uploads/{}/{name}", kind.dir_name()))
}

/// Removes files written by [`save`] whose record was never stored.
/// Failures are logged; the caller is already returning an error.
pub async fn discard(uploads_dir: &str, public_paths: &[Option<String>]) {
    for public_path in public_paths.iter().flatten() {
        let Some(relative) = public_path.strip_prefix("/uploads/") else {
            continue;
        };
        let path = Path::new(uploads_dir).join(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(file = %path.display(), "discarded orphan upload"),
            Err(e) => tracing::warn!(file = %path.display(), "failed to discard upload: {e}"),
        }
    }
}

/// Reads the officials form. Unknown fields are skipped; empty file parts count as absent.
pub async fn parse_official_form(mut multipart: Multipart) -> AppResult<OfficialForm> {
    let mut form = OfficialForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "signature" | "picture" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await?.to_vec();
                if bytes.is_empty() {
                    continue;
                }
                let file = Some(UploadedFile { file_name, bytes });
                if name == "signature" {
                    form.signature = file;
                } else {
                    form.picture = file;
                }
            }
            "full_name" => form.full_name = Some(field.text().await?),
            "position" => form.position = Some(field.text().await?),
            "order_no" => {
                let raw = field.text().await?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    form.order_no = Some(raw.parse().map_err(|_| {
                        AppError::validation("order_no must be a whole number.")
                    })?);
                }
            }
            "is_captain" => form.is_captain = de::truthy(&field.text().await?).unwrap_or(false),
            "is_secretary" => {
                form.is_secretary = de::truthy(&field.text().await?).unwrap_or(false)
            }
            _ => {}
        }
    }

    Ok(form)
}
