//! On-disk storage for uploaded images.
//!
//! Originals are written to `{root}/{experiment}/{uuid}{ext}` and served
//! under [`PUBLIC_PREFIX`]. Each original gets an `optimized` and a
//! `thumbnail` JPEG variant next to it when its bytes decode as an image.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use image::{DynamicImage, ImageFormat};
use labfolio_core::types::ExperimentNumber;
use labfolio_core::upload::{
    public_path, stored_extension, variant_file_name, Variant, PUBLIC_PREFIX,
};
use labfolio_db::models::image::ExperimentImage;
use uuid::Uuid;

/// Public paths of a freshly stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub filename: String,
    pub optimized: Option<String>,
    pub thumbnail: Option<String>,
}

impl StoredUpload {
    pub fn paths(&self) -> Vec<&str> {
        std::iter::once(self.filename.as_str())
            .chain(self.optimized.as_deref())
            .chain(self.thumbnail.as_deref())
            .collect()
    }
}

/// Owns the upload root directory.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn experiment_dir(&self, number: ExperimentNumber) -> PathBuf {
        self.root.join(number.to_string())
    }

    /// Map a public path (`/uploads/3/abc.png`) to its file under the root.
    ///
    /// Returns `None` for paths outside [`PUBLIC_PREFIX`] or containing
    /// anything other than plain name segments.
    pub fn disk_path(&self, public: &str) -> Option<PathBuf> {
        let relative = public.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let mut path = self.root.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }

    /// Write an original and derive its variants.
    ///
    /// Only failing to write the original is an error; variant derivation
    /// failures are logged and leave the variant paths empty.
    pub async fn store(
        &self,
        number: ExperimentNumber,
        original_name: &str,
        data: Bytes,
    ) -> std::io::Result<StoredUpload> {
        let dir = self.experiment_dir(number);
        tokio::fs::create_dir_all(&dir).await?;

        let stem = Uuid::new_v4().to_string();
        let file_name = format!("{stem}{}", stored_extension(original_name));
        tokio::fs::write(dir.join(&file_name), &data).await?;

        let mut stored = StoredUpload {
            filename: public_path(number, &file_name),
            optimized: None,
            thumbnail: None,
        };

        let rendered = tokio::task::spawn_blocking(move || render_variants(&data)).await;
        let variants = match rendered {
            Ok(Ok(variants)) => variants,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, original_name, "Could not decode upload, skipping variants");
                return Ok(stored);
            }
            Err(e) => {
                tracing::warn!(error = %e, original_name, "Variant rendering task failed");
                return Ok(stored);
            }
        };

        for (variant, bytes) in variants {
            let variant_name = variant_file_name(&stem, variant);
            if let Err(e) = tokio::fs::write(dir.join(&variant_name), bytes).await {
                tracing::warn!(error = %e, variant = ?variant, "Failed to write image variant");
                continue;
            }
            let public = Some(public_path(number, &variant_name));
            match variant {
                Variant::Optimized => stored.optimized = public,
                Variant::Thumbnail => stored.thumbnail = public,
            }
        }
        Ok(stored)
    }

    /// Remove every file backing an image record. Best-effort.
    pub async fn remove_files(&self, image: &ExperimentImage) {
        self.remove_public_paths(image.stored_paths()).await;
    }

    /// Remove the files of an upload that never got a record. Best-effort.
    pub async fn remove_stored(&self, stored: &StoredUpload) {
        self.remove_public_paths(stored.paths()).await;
    }

    async fn remove_public_paths(&self, paths: Vec<&str>) {
        for public in paths {
            let Some(path) = self.disk_path(public) else {
                tracing::warn!(path = public, "Refusing to delete file outside upload root");
                continue;
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to delete stored file");
                }
            }
        }
    }

    /// Remove the files of a deleted experiment and then its directory.
    pub async fn remove_experiment(&self, number: ExperimentNumber, images: &[ExperimentImage]) {
        for image in images {
            self.remove_files(image).await;
        }
        let dir = self.experiment_dir(number);
        match tokio::fs::remove_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, dir = %dir.display(), "Failed to remove experiment directory");
            }
        }
    }
}

/// Decode an original and encode its display variants as JPEG.
fn render_variants(data: &[u8]) -> Result<Vec<(Variant, Vec<u8>)>, image::ImageError> {
    let original = image::load_from_memory(data)?;
    let mut rendered = Vec::with_capacity(2);
    for variant in [Variant::Optimized, Variant::Thumbnail] {
        let fitted = fit_within(&original, variant.max_edge());
        rendered.push((variant, encode_jpeg(&fitted)?));
    }
    Ok(rendered)
}

/// Downscale so the longest edge is at most `max_edge`. Never upscales.
fn fit_within(original: &DynamicImage, max_edge: u32) -> DynamicImage {
    if original.width().max(original.height()) <= max_edge {
        original.clone()
    } else {
        original.thumbnail(max_edge, max_edge)
    }
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}
