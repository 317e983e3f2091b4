//! Photo attachment
//!
//! Photos are persisted inline as `data:image/<type>;base64,<payload>` URIs.
//! Transient object references (`blob:` URLs) are not supported and are
//! dropped when read back.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};

use super::entity::{DomainError, DomainResult};

const DATA_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// An image encoded as a base64 data URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Photo(String);

impl Photo {
    /// Encode raw image bytes
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> DomainResult<Self> {
        let mime = image_mime(mime)?;
        if bytes.is_empty() {
            return Err(DomainError::InvalidInput("photo is empty".to_string()));
        }
        Ok(Self(format!("{DATA_SCHEME}{mime}{BASE64_MARKER}{}", STANDARD.encode(bytes))))
    }

    /// Encode a user-selected file.
    ///
    /// `declared_type` is the MIME type reported by the file picker; when it is
    /// empty the type is guessed from the file name.
    pub fn from_file(file_name: &str, declared_type: &str, bytes: &[u8]) -> DomainResult<Self> {
        if !declared_type.trim().is_empty() {
            return Self::from_bytes(declared_type, bytes);
        }
        let guessed = mime_guess::from_path(file_name)
            .first_raw()
            .ok_or_else(|| DomainError::InvalidInput(format!("cannot tell the type of `{}`", file_name)))?;
        Self::from_bytes(guessed, bytes)
    }

    /// Validate an existing data URI
    pub fn parse(uri: &str) -> DomainResult<Self> {
        let rest = uri
            .strip_prefix(DATA_SCHEME)
            .ok_or_else(|| DomainError::InvalidInput("photo is not a data URI".to_string()))?;
        let (media, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| DomainError::InvalidInput("photo data URI is not base64".to_string()))?;
        image_mime(media)?;
        STANDARD
            .decode(payload)
            .map_err(|e| DomainError::InvalidInput(format!("photo payload: {}", e)))?;
        Ok(Self(uri.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type, e.g. `image/png`
    pub fn mime_type(&self) -> &str {
        let media = &self.0[DATA_SCHEME.len()..];
        media.split(';').next().unwrap_or(media)
    }

    /// Decoded image bytes
    pub fn decode(&self) -> DomainResult<Vec<u8>> {
        let payload = self
            .0
            .split_once(BASE64_MARKER)
            .map(|(_, payload)| payload)
            .unwrap_or_default();
        STANDARD
            .decode(payload)
            .map_err(|e| DomainError::Decode(format!("photo payload: {}", e)))
    }
}

impl TryFrom<String> for Photo {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Photo> for String {
    fn from(photo: Photo) -> Self {
        photo.0
    }
}

/// Media type part before any parameters, required to be `image/*`
fn image_mime(media: &str) -> DomainResult<&str> {
    let mime = media.split(';').next().unwrap_or(media).trim();
    match mime.split_once('/') {
        Some(("image", subtype)) if !subtype.is_empty() => Ok(mime),
        _ => Err(DomainError::InvalidInput(format!("`{}` is not an image type", mime))),
    }
}

/// Reads a stored photo, turning empty strings and unsupported encodings into `None`.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Photo>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.is_empty()).and_then(|value| match Photo::parse(&value) {
        Ok(photo) => Some(photo),
        Err(e) => {
            tracing::warn!("Dropping unsupported photo value: {}", e);
            None
        }
    }))
}
