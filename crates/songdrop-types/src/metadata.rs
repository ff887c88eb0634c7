use serde::{Deserialize, Serialize};

use crate::error::{BadgeError, BadgeResult};

/// License recorded in every badge's provenance block
pub const BADGE_LICENSE: &str = "CC BY-NC-SA 4.0";

/// Project URL recorded in every badge's provenance block
pub const BADGE_EXTERNAL_URL: &str = "https://songdrop.xyz/";

/// Public gateway used for the browser-resolvable image reference
pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs";

/// A single typed trait on the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

/// Provenance fields carried alongside the attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub creator: String,
    pub license: String,
    pub external_url: String,
}

/// The metadata document pinned for each badge. The ledger only stores a
/// pointer to this document, never the document itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    /// Gateway-resolvable image URI
    pub image: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub attributes: Vec<Attribute>,
    pub properties: Provenance,
}

impl TokenMetadata {
    /// Build the metadata document for a badge. Pure: the same inputs always
    /// produce the same document. Fails only when a required field is empty.
    pub fn for_badge(
        artist: &str,
        track: &str,
        date: &str,
        image_cid: &str,
        mime_type: &str,
    ) -> BadgeResult<Self> {
        for (name, value) in [
            ("artist", artist),
            ("track", track),
            ("date", date),
            ("image cid", image_cid),
        ] {
            if value.trim().is_empty() {
                return Err(BadgeError::Validation(format!(
                    "{} is required to build token metadata",
                    name
                )));
            }
        }

        Ok(Self {
            name: format!("{} - {}", artist, track),
            description: format!(
                "A unique SongDrop badge for {} by {} minted on {}.",
                track, artist, date
            ),
            image: image_gateway_url(image_cid),
            mime_type: mime_type.to_string(),
            attributes: vec![
                Attribute {
                    trait_type: "Artist".to_string(),
                    value: artist.to_string(),
                },
                Attribute {
                    trait_type: "Track".to_string(),
                    value: track.to_string(),
                },
                Attribute {
                    trait_type: "Date".to_string(),
                    value: date.to_string(),
                },
            ],
            properties: Provenance {
                creator: artist.to_string(),
                license: BADGE_LICENSE.to_string(),
                external_url: BADGE_EXTERNAL_URL.to_string(),
            },
        })
    }

    /// Serialize the document as the exact bytes that get pinned. Field
    /// order is the struct order, so identical documents serialize to
    /// identical bytes.
    pub fn to_json_bytes(&self) -> BadgeResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| BadgeError::Serialization(format!("token metadata: {}", e)))
    }
}

/// Browser-resolvable URL for a pinned blob
pub fn image_gateway_url(cid: &str) -> String {
    format!("{}/{}", IPFS_GATEWAY, cid)
}

/// The on-chain reference string pointing at the pinned metadata document
pub fn token_uri(metadata_cid: &str) -> String {
    format!("ipfs://{}", metadata_cid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_is_pure() {
        let a = TokenMetadata::for_badge(
            "65daysofstatic",
            "Radio Protector",
            "2024-01-01",
            "QmTestCid",
            "image/png",
        )
        .unwrap();
        let b = TokenMetadata::for_badge(
            "65daysofstatic",
            "Radio Protector",
            "2024-01-01",
            "QmTestCid",
            "image/png",
        )
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.to_json_bytes().unwrap(), b.to_json_bytes().unwrap());
    }

    #[test]
    fn document_fields_are_mapped() {
        let m = TokenMetadata::for_badge("Artist", "Track", "2024-01-01", "QmCid", "image/jpeg")
            .unwrap();

        assert_eq!(m.name, "Artist - Track");
        assert_eq!(m.image, "https://ipfs.io/ipfs/QmCid");
        assert_eq!(m.mime_type, "image/jpeg");
        assert_eq!(m.attributes.len(), 3);
        assert_eq!(m.attributes[0].trait_type, "Artist");
        assert_eq!(m.properties.creator, "Artist");
        assert_eq!(m.properties.license, BADGE_LICENSE);

        let json: serde_json::Value =
            serde_json::from_slice(&m.to_json_bytes().unwrap()).unwrap();
        assert_eq!(json["type"], "image/jpeg");
        assert_eq!(json["properties"]["external_url"], BADGE_EXTERNAL_URL);
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let result = TokenMetadata::for_badge("", "Track", "2024-01-01", "QmCid", "image/png");
        assert!(matches!(result, Err(BadgeError::Validation(_))));

        let result = TokenMetadata::for_badge("Artist", "Track", "2024-01-01", "", "image/png");
        assert!(matches!(result, Err(BadgeError::Validation(_))));
    }

    #[test]
    fn token_uri_uses_content_reference_scheme() {
        assert_eq!(token_uri("QmMeta"), "ipfs://QmMeta");
    }
}
