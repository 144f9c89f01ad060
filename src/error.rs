//! Error type shared by the decode, extraction and export paths.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrepError>;

#[derive(Debug, Error)]
pub enum PrepError {
    /// Input bytes could not be decoded into a bitmap.
    #[error("Unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// A string that should have been a `data:<mime>;base64,` URL was not.
    #[error("Invalid data URL: {reason}")]
    InvalidDataUrl { reason: String },

    #[error("Image encode error: {message}")]
    Encode { message: String },

    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },
}

impl PrepError {
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    pub fn invalid_data_url(reason: impl Into<String>) -> Self {
        Self::InvalidDataUrl {
            reason: reason.into(),
        }
    }

    /// Short text suitable for an alert shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            PrepError::Decode(_) | PrepError::InvalidDataUrl { .. } => {
                "Could not read the image. Please upload a JPEG or PNG file.".to_string()
            }
            PrepError::Encode { .. } => "Could not save the edited image.".to_string(),
            PrepError::InvalidParameter { parameter, .. } => {
                format!("Invalid setting: {parameter}.")
            }
        }
    }
}
