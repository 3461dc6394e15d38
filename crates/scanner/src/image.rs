use std::path::Path;

/// Largest image accepted for analysis.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageRejection {
    #[error("Please select an image file (got {content_type}).")]
    NotAnImage { content_type: String },
    #[error("The selected file is empty.")]
    Empty,
    #[error("Image is {size} bytes; the limit is 5MB.")]
    TooLarge { size: u64 },
}

/// Checks an upload before anything is sent over the network.
pub fn validate_image(content_type: &str, size: u64) -> Result<(), ImageRejection> {
    let normalized = content_type.trim().to_ascii_lowercase();
    if !normalized.starts_with("image/") || normalized.len() == "image/".len() {
        return Err(ImageRejection::NotAnImage {
            content_type: content_type.to_string(),
        });
    }
    if size == 0 {
        return Err(ImageRejection::Empty);
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ImageRejection::TooLarge { size });
    }
    Ok(())
}

/// Image content type implied by the file extension.
pub fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(content_type)
}
