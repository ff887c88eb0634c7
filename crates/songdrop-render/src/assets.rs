use std::fs;
use std::path::Path;

use ab_glyph::FontVec;
use image::DynamicImage;
use tracing::warn;

/// Optional overlay assets used by the compositor. Every asset is a
/// capability that may be absent: compositing branches on presence and a
/// missing asset is skipped, never an error.
pub struct BadgeAssets {
    /// Bold face for the artist/track line
    pub title_font: Option<FontVec>,
    /// Regular face for the collection date line
    pub body_font: Option<FontVec>,
    /// Small logo composited at the bottom-right corner
    pub logo: Option<DynamicImage>,
}

impl BadgeAssets {
    /// No assets at all. Renders still succeed with background and
    /// gradient only.
    pub fn empty() -> Self {
        Self {
            title_font: None,
            body_font: None,
            logo: None,
        }
    }

    /// Load assets from a directory laid out as `logo.png`,
    /// `fonts/title.ttf` and `fonts/body.ttf`. Each missing or unreadable
    /// asset is logged and skipped.
    pub fn load_from_dir(dir: &Path) -> Self {
        let logo = match fs::read(dir.join("logo.png")) {
            Ok(bytes) => match image::load_from_memory(&bytes) {
                Ok(img) => Some(img),
                Err(e) => {
                    warn!("Logo at {}/logo.png is not a readable image ({}), skipping overlay", dir.display(), e);
                    None
                }
            },
            Err(_) => {
                warn!("Logo not found at {}/logo.png, skipping overlay", dir.display());
                None
            }
        };

        Self {
            title_font: load_font(&dir.join("fonts/title.ttf")),
            body_font: load_font(&dir.join("fonts/body.ttf")),
            logo,
        }
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    match fs::read(path) {
        Ok(bytes) => match FontVec::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(_) => {
                warn!("Font at {} is not a valid font file, skipping text layer", path.display());
                None
            }
        },
        Err(_) => {
            warn!("Font not found at {}, skipping text layer", path.display());
            None
        }
    }
}
