//! System clipboard access
//!
//! Reads are blocking and run off the event loop. An image on the clipboard
//! wins over text; any failure degrades to an empty payload.

use std::io::Cursor;

use libchirp::Media;

use crate::app::ClipboardPayload;

pub trait ClipboardSource: Send {
    /// PNG-encoded image, if the clipboard holds one
    fn read_image(&mut self) -> Option<Vec<u8>>;

    fn read_text(&mut self) -> Option<String>;
}

/// Read the clipboard, preferring an image over text
pub fn read_payload(source: &mut dyn ClipboardSource) -> ClipboardPayload {
    if let Some(png) = source.read_image() {
        return ClipboardPayload::Image(Media::png(png));
    }

    match source.read_text() {
        Some(text) if !text.is_empty() => ClipboardPayload::Text(text),
        _ => ClipboardPayload::Empty,
    }
}

/// Clipboard backed by `arboard`
#[derive(Default)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    fn open() -> Option<arboard::Clipboard> {
        match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                tracing::warn!("Clipboard unavailable: {}", e);
                None
            }
        }
    }
}

impl ClipboardSource for ArboardClipboard {
    fn read_image(&mut self) -> Option<Vec<u8>> {
        let image = Self::open()?.get_image().ok()?;
        match image_to_png(&image) {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::warn!("Failed to convert clipboard image: {}", e);
                None
            }
        }
    }

    fn read_text(&mut self) -> Option<String> {
        Self::open()?.get_text().ok()
    }
}

fn image_to_png(image: &arboard::ImageData) -> Result<Vec<u8>, png::EncodingError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(
            Cursor::new(&mut png_data),
            image.width as u32,
            image.height as u32,
        );
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.bytes)?;
    }
    Ok(png_data)
}
