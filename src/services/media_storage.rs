// src/services/media_storage.rs
use base64::{engine::general_purpose, Engine as _};
use file_format::FileFormat;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::{BlogError, BlogResult};

const POSTS_DIR: &str = "posts";
const NOT_AN_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Extension for the formats posts may carry, judged by the file content.
fn sniffed_extension(format: FileFormat) -> Option<&'static str> {
    match format {
        FileFormat::JointPhotographicExpertsGroup => Some("jpg"),
        FileFormat::PortableNetworkGraphics | FileFormat::AnimatedPortableNetworkGraphics => Some("png"),
        FileFormat::GraphicsInterchangeFormat => Some("gif"),
        FileFormat::Webp => Some("webp"),
        _ => None,
    }
}

/// An image submitted with a post form, still base64 encoded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: String,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// Decoded and validated image, ready to be written.
#[derive(Debug)]
pub struct CheckedImage {
    bytes: Vec<u8>,
    extension: &'static str,
}

impl ImageUpload {
    /// Reject anything that is not a supported image or not valid base64.
    pub fn check(&self) -> Result<CheckedImage, String> {
        debug!("checking upload {:?} ({})", self.file_name, self.content_type);
        let mime: mime::Mime = self
            .content_type
            .trim()
            .parse()
            .map_err(|_| "Upload a valid image.".to_string())?;
        if mime.type_() != mime::IMAGE {
            return Err(NOT_AN_IMAGE.to_string());
        }
        let extension = match mime.subtype().as_str() {
            "jpeg" | "jpg" => "jpg",
            "png" => "png",
            "gif" => "gif",
            "webp" => "webp",
            _ => return Err("Unsupported image type. Only JPEG, PNG, GIF and WEBP are allowed.".to_string()),
        };

        // Remove data URL prefix if present (data:image/gif;base64,)
        let payload = match self.data.split_once(',') {
            Some((_, rest)) => rest,
            None => self.data.as_str(),
        };
        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| "Invalid base64 image data.".to_string())?;
        if bytes.is_empty() {
            return Err("The submitted file is empty.".to_string());
        }

        let detected = FileFormat::from_bytes(&bytes);
        if sniffed_extension(detected) != Some(extension) {
            debug!("declared {} but content looks like {:?}", self.content_type, detected);
            return Err(NOT_AN_IMAGE.to_string());
        }

        Ok(CheckedImage { bytes, extension })
    }
}

/// Stores post images below `MEDIA_ROOT/posts/`.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write the image and return its media-relative name, e.g. `posts/<uuid>.gif`.
    pub async fn save(&self, image: CheckedImage) -> BlogResult<String> {
        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
        tokio::fs::write(dir.join(&file_name), &image.bytes).await?;

        let relative = format!("{}/{}", POSTS_DIR, file_name);
        info!("stored image {} ({} bytes)", relative, image.bytes.len());
        Ok(relative)
    }

    /// Best-effort cleanup after a failed write.
    pub async fn discard(&self, relative: &str) {
        let Some(name) = Path::new(relative).file_name() else {
            return;
        };
        let path = self.root.join(POSTS_DIR).join(name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("could not remove orphaned image {}: {}", path.display(), e);
        }
    }

    pub fn path_of(&self, relative: &str) -> BlogResult<PathBuf> {
        let name = Path::new(relative)
            .file_name()
            .ok_or_else(|| BlogError::Validation(format!("bad media path {}", relative)))?;
        Ok(self.root.join(POSTS_DIR).join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SMALL_GIF;

    fn upload(data: &str, content_type: &str) -> ImageUpload {
        ImageUpload {
            data: data.to_string(),
            content_type: content_type.to_string(),
            file_name: Some("small.gif".into()),
        }
    }

    #[test]
    fn accepts_gif_with_data_url_prefix() {
        let checked = upload(&format!("data:image/gif;base64,{}", SMALL_GIF), "image/gif")
            .check()
            .unwrap();
        assert_eq!(checked.extension, "gif");
        assert_eq!(&checked.bytes[..6], b"GIF89a");
    }

    #[test]
    fn rejects_non_images_and_bad_payloads() {
        assert!(upload(SMALL_GIF, "text/plain").check().is_err());
        assert!(upload(SMALL_GIF, "image/tiff").check().is_err());
        assert!(upload("%%%not base64", "image/png").check().is_err());
        assert!(upload("", "image/png").check().is_err());
    }

    #[test]
    fn content_must_match_declared_type() {
        let text = general_purpose::STANDARD.encode("this is not an image at all");
        assert!(upload(&text, "image/png").check().is_err());
        // a real GIF declared as PNG is refused too
        assert!(upload(SMALL_GIF, "image/png").check().is_err());

        let png = general_purpose::STANDARD.encode(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR");
        assert_eq!(upload(&png, "image/png").check().unwrap().extension, "png");
    }

    #[tokio::test]
    async fn saves_and_discards() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(dir.path());
        let checked = upload(SMALL_GIF, "image/gif").check().unwrap();

        let name = media.save(checked).await.unwrap();
        assert!(name.starts_with("posts/") && name.ends_with(".gif"));
        let path = media.path_of(&name).unwrap();
        assert!(path.exists());

        media.discard(&name).await;
        assert!(!path.exists());
    }
}
