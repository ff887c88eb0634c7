//! Badge compositing: background artwork, legibility gradient, caption
//! text, and an optional logo overlay on a fixed-size canvas.

mod assets;
mod compose;

pub use assets::BadgeAssets;
pub use compose::{render_badge, CANVAS_SIZE};
