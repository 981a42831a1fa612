use crate::{Detection, Frame};
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 2;

/// Gap between the bottom of a label and the top edge of its box.
const LABEL_OFFSET: i32 = 10;
const LABEL_SCALE: f32 = 16.0;

const LABEL_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Copy of `frame` with a hollow box drawn around every detection and its
/// label written just above the box.
pub fn annotate(frame: &Frame, detections: &[Detection]) -> RgbImage {
    let mut image = frame.image.clone();
    let (width, height) = image.dimensions();

    let font = match FontRef::try_from_slice(LABEL_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::warn!(error = %e, "label font unreadable, drawing boxes only");
            None
        }
    };

    for detection in detections {
        let bbox = detection.bbox.clamp_to(width as f32, height as f32);
        if bbox.width() < 1.0 || bbox.height() < 1.0 {
            continue;
        }

        for inset in 0..BOX_THICKNESS {
            let x = bbox.x1 as i32 + inset as i32;
            let y = bbox.y1 as i32 + inset as i32;
            let w = (bbox.width() as u32).saturating_sub(2 * inset);
            let h = (bbox.height() as u32).saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            draw_hollow_rect_mut(&mut image, Rect::at(x, y).of_size(w, h), BOX_COLOR);
        }

        if let Some(font) = &font {
            let (x, y) = label_origin(&image, font, &detection.label, bbox.x1, bbox.y1);
            draw_text_mut(&mut image, BOX_COLOR, x, y, LABEL_SCALE, font, &detection.label);
        }
    }

    image
}

/// Top-left corner for a label whose bottom sits `LABEL_OFFSET` above
/// `(x1, y1)`, kept inside the image.
fn label_origin(image: &RgbImage, font: &FontRef<'_>, label: &str, x1: f32, y1: f32) -> (i32, i32) {
    let (text_w, text_h) = text_size(PxScale::from(LABEL_SCALE), font, label);
    let max_x = (image.width() as i32 - text_w as i32).max(0);
    let max_y = (image.height() as i32 - text_h as i32).max(0);

    let x = (x1 as i32).clamp(0, max_x);
    let y = (y1 as i32 - LABEL_OFFSET - text_h as i32).clamp(0, max_y);
    (x, y)
}
