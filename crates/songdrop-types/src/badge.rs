use chrono::NaiveDate;

use crate::error::{BadgeError, BadgeResult};

/// An opaque byte blob with its declared mime type.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Everything needed to produce one badge: the track identification fields
/// and the user-supplied background artwork.
#[derive(Debug, Clone)]
pub struct BadgeRequest {
    pub artist: String,
    pub track: String,
    /// Collection date as an ISO 8601 calendar date (YYYY-MM-DD)
    pub date: String,
    pub background: ImageBlob,
}

impl BadgeRequest {
    /// Check that all mandatory fields are present and well formed. This is
    /// a request-level check and runs before any pipeline work, so a bad
    /// request never leaves partial side effects behind.
    pub fn validate(&self) -> BadgeResult<()> {
        if self.artist.trim().is_empty() {
            return Err(BadgeError::Validation("artist is required".to_string()));
        }
        if self.track.trim().is_empty() {
            return Err(BadgeError::Validation("track is required".to_string()));
        }
        if self.date.trim().is_empty() {
            return Err(BadgeError::Validation("date is required".to_string()));
        }
        if NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err() {
            return Err(BadgeError::Validation(format!(
                "date must be an ISO 8601 calendar date, got {:?}",
                self.date
            )));
        }
        if self.background.bytes.is_empty() {
            return Err(BadgeError::Validation(
                "background image is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A finished badge render. Immutable once produced; the caller decides
/// whether and where to persist the bytes.
#[derive(Debug, Clone)]
pub struct RenderedBadge {
    pub image_bytes: Vec<u8>,
    /// Time-based suggestion, best-effort unique across concurrent requests
    pub suggested_file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BadgeRequest {
        BadgeRequest {
            artist: "65daysofstatic".to_string(),
            track: "Radio Protector".to_string(),
            date: "2024-01-01".to_string(),
            background: ImageBlob::new(vec![1, 2, 3], "image/png"),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut r = request();
        r.artist = "  ".to_string();
        assert!(matches!(r.validate(), Err(BadgeError::Validation(_))));

        let mut r = request();
        r.track = String::new();
        assert!(matches!(r.validate(), Err(BadgeError::Validation(_))));

        let mut r = request();
        r.background.bytes.clear();
        assert!(matches!(r.validate(), Err(BadgeError::Validation(_))));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut r = request();
        r.date = "January 1st".to_string();
        assert!(matches!(r.validate(), Err(BadgeError::Validation(_))));
    }
}
