use std::io::Cursor;

use ab_glyph::PxScale;
use chrono::Utc;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::debug;

use songdrop_types::{BadgeError, BadgeRequest, BadgeResult, RenderedBadge};

use crate::assets::BadgeAssets;

/// Square output canvas, in pixels
pub const CANVAS_SIZE: u32 = 1000;

/// Height of the legibility gradient at the bottom of the canvas
const GRADIENT_HEIGHT: u32 = 200;

/// Peak opacity of the gradient at the bottom edge
const GRADIENT_MAX_ALPHA: f32 = 0.7;

const TITLE_SCALE: f32 = 40.0;
const BODY_SCALE: f32 = 28.0;
const TEXT_LEFT: i32 = 40;

const LOGO_SIZE: u32 = 100;
const LOGO_INSET: i64 = 20;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Composite one badge. Pixel content is a pure function of the request
/// fields and the available assets; the current time only appears in the
/// suggested file name.
pub fn render_badge(request: &BadgeRequest, assets: &BadgeAssets) -> BadgeResult<RenderedBadge> {
    let background = image::load_from_memory(&request.background.bytes)
        .map_err(|e| BadgeError::Decode(format!("background image: {}", e)))?;

    // Stretch to fill the whole canvas, matching the preview behaviour
    let mut canvas = background
        .resize_exact(CANVAS_SIZE, CANVAS_SIZE, FilterType::Triangle)
        .to_rgba8();

    apply_bottom_gradient(&mut canvas);
    draw_captions(&mut canvas, request, assets);

    if let Some(logo) = &assets.logo {
        let logo = logo
            .resize_exact(LOGO_SIZE, LOGO_SIZE, FilterType::Triangle)
            .to_rgba8();
        let corner = (CANVAS_SIZE - LOGO_SIZE) as i64 - LOGO_INSET;
        imageops::overlay(&mut canvas, &logo, corner, corner);
    } else {
        debug!("No logo asset available, rendering without overlay");
    }

    let mut buffer = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| BadgeError::Render(format!("png encode: {}", e)))?;

    Ok(RenderedBadge {
        image_bytes: buffer.into_inner(),
        suggested_file_name: format!("badge-{}.png", Utc::now().timestamp_millis()),
    })
}

/// Darken the bottom of the canvas, transparent at the top of the band and
/// GRADIENT_MAX_ALPHA black at the bottom edge, so the captions stay
/// legible on bright artwork.
fn apply_bottom_gradient(canvas: &mut RgbaImage) {
    let start = CANVAS_SIZE - GRADIENT_HEIGHT;
    for y in start..CANVAS_SIZE {
        let alpha = GRADIENT_MAX_ALPHA * (y - start) as f32 / (GRADIENT_HEIGHT - 1) as f32;
        let keep = 1.0 - alpha;
        for x in 0..CANVAS_SIZE {
            let pixel = canvas.get_pixel_mut(x, y);
            for channel in &mut pixel.0[..3] {
                *channel = (*channel as f32 * keep) as u8;
            }
        }
    }
}

fn draw_captions(canvas: &mut RgbaImage, request: &BadgeRequest, assets: &BadgeAssets) {
    let height = CANVAS_SIZE as i32;

    if let Some(font) = &assets.title_font {
        draw_text_mut(
            canvas,
            WHITE,
            TEXT_LEFT,
            height - 80 - TITLE_SCALE as i32,
            PxScale::from(TITLE_SCALE),
            font,
            &format!("{} – {}", request.artist, request.track),
        );
    } else {
        debug!("No title font available, skipping title line");
    }

    if let Some(font) = &assets.body_font {
        draw_text_mut(
            canvas,
            WHITE,
            TEXT_LEFT,
            height - 40 - BODY_SCALE as i32,
            PxScale::from(BODY_SCALE),
            font,
            &format!("Collected on {}", request.date),
        );
    } else {
        debug!("No body font available, skipping date line");
    }
}
