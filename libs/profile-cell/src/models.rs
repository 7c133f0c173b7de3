use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::{AppError, CurrentUser};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// `/auth/me` plus the fields only the settings screen needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: CurrentUser,
    #[serde(default, alias = "phone_number", alias = "phoneNumber")]
    pub phone: Option<String>,
    #[serde(
        default,
        alias = "profile_photo_url",
        alias = "photoUrl",
        alias = "avatarUrl",
        alias = "avatar_url"
    )]
    pub profile_photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    /// Detects the format from the leading bytes of the file.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUpload {
    pub profile_photo: String,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid profile: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Nothing to update")]
    EmptyUpdate,

    #[error("Only JPEG and PNG images are supported ({0})")]
    UnsupportedImage(String),

    #[error("Image is {size} bytes, the limit is {max}")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Image file is empty")]
    EmptyImage,

    #[error("Could not read image: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] AppError),
}

impl ProfileError {
    pub fn user_message(&self) -> String {
        match self {
            ProfileError::Validation(errors) => errors.join("\n"),
            ProfileError::ImageTooLarge { .. } => "Please choose an image under 5 MB.".to_string(),
            ProfileError::UnsupportedImage(_) => "Please choose a JPEG or PNG image.".to_string(),
            ProfileError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
