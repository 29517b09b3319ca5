//! Naming rules for uploaded image files and their derived variants.

use crate::types::ExperimentNumber;

/// Uploader name recorded when the form leaves it blank.
pub const DEFAULT_UPLOADER: &str = "Anonymous";

/// Extension used when the original file name has none (or an odd one).
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Public URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Longest edge of the `optimized` display variant, in pixels.
pub const OPTIMIZED_MAX_EDGE: u32 = 1600;

/// Longest edge of the gallery `thumbnail` variant, in pixels.
pub const THUMBNAIL_MAX_EDGE: u32 = 400;

/// Longest accepted extension, dot excluded.
const MAX_EXTENSION_LENGTH: usize = 8;

/// Derived display variants written next to an original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Optimized,
    Thumbnail,
}

impl Variant {
    pub fn max_edge(self) -> u32 {
        match self {
            Self::Optimized => OPTIMIZED_MAX_EDGE,
            Self::Thumbnail => THUMBNAIL_MAX_EDGE,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Optimized => "opt",
            Self::Thumbnail => "thumb",
        }
    }
}

/// Whether a multipart part's content type denotes an image.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Lowercased extension (with leading dot) to store a file under.
///
/// Falls back to [`DEFAULT_EXTENSION`] when the name has no extension or the
/// extension is not short and alphanumeric.
pub fn stored_extension(original_name: &str) -> String {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LENGTH
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// File name of a derived variant for a stored file stem.
pub fn variant_file_name(stem: &str, variant: Variant) -> String {
    format!("{stem}_{}.jpg", variant.suffix())
}

/// Public path of a stored file, e.g. `/uploads/3/abc.png`.
pub fn public_path(experiment: ExperimentNumber, file_name: &str) -> String {
    format!("{PUBLIC_PREFIX}/{experiment}/{file_name}")
}

/// Link a phone opens (usually via QR code) to upload into an experiment.
pub fn upload_link(base_url: &str, experiment: ExperimentNumber) -> String {
    format!("{}/upload/{experiment}", base_url.trim_end_matches('/'))
}

/// Resolve an uploader name, defaulting blanks to [`DEFAULT_UPLOADER`].
pub fn uploader_or_default(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_UPLOADER.to_string(),
    }
}
