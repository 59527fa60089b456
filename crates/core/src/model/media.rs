use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

use super::item::ItemError;

/// Location of an audio clip, image, or video attached to a learning item.
///
/// Absolute URLs are parsed; anything else is kept as a path relative to the
/// content host (e.g. `/media/audio/apple.mp3`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MediaRef {
    Url(Url),
    Path(PathBuf),
}

impl MediaRef {
    /// # Errors
    ///
    /// Returns `ItemError::EmptyMediaRef` for blank input.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ItemError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(ItemError::EmptyMediaRef);
        }
        Ok(match Url::parse(s) {
            Ok(url) => MediaRef::Url(url),
            Err(_) => MediaRef::Path(PathBuf::from(s)),
        })
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRef::Url(u) => write!(f, "{u}"),
            MediaRef::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

impl TryFrom<String> for MediaRef {
    type Error = ItemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MediaRef::parse(value)
    }
}

impl From<MediaRef> for String {
    fn from(value: MediaRef) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_parse_as_url() {
        let media = MediaRef::parse("https://cdn.example.com/a/apple.mp3").unwrap();
        assert!(matches!(media, MediaRef::Url(_)));
        assert_eq!(media.to_string(), "https://cdn.example.com/a/apple.mp3");
    }

    #[test]
    fn relative_paths_are_kept() {
        let media = MediaRef::parse(" /media/apple.mp3 ").unwrap();
        assert_eq!(media, MediaRef::Path(PathBuf::from("/media/apple.mp3")));
    }

    #[test]
    fn blank_is_rejected() {
        assert_eq!(MediaRef::parse("   "), Err(ItemError::EmptyMediaRef));
    }
}
