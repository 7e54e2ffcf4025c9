//! Image shape for embedding raster images.

use super::{
    ConnectPoint, DiagramId, SelectionState, ShapeStyle, TextAttributes, frame_connect_points,
};
use crate::geometry::Frame;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// A raster image placed in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: DiagramId,
    pub frame: Frame,
    #[serde(default)]
    pub selection: SelectionState,
    #[serde(default)]
    pub connect_points: Vec<ConnectPoint>,
    #[serde(default)]
    pub show_connect_points: bool,
    #[serde(default)]
    pub text: TextAttributes,
    #[serde(default)]
    pub style: ShapeStyle,
    /// Original image width in pixels.
    #[serde(default)]
    pub source_width: u32,
    /// Original image height in pixels.
    #[serde(default)]
    pub source_height: u32,
    pub format: Option<ImageFormat>,
    /// Image bytes, base64-encoded so the document stays plain JSON.
    #[serde(default)]
    pub data_base64: String,
}

impl Image {
    /// Create an image without pixel data; the frame is a placeholder box.
    pub fn new(frame: Frame) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            selection: SelectionState::default(),
            connect_points: frame_connect_points(&frame, &[]),
            show_connect_points: false,
            text: TextAttributes::default(),
            style: ShapeStyle::default(),
            source_width: 0,
            source_height: 0,
            format: None,
            data_base64: String::new(),
        }
    }

    /// Get the raw image data (decoded from base64).
    pub fn data(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data_base64).ok()
    }

    /// `data:` URL for the stored bytes, or `None` without usable data.
    ///
    /// A missing format is sniffed from the decoded bytes.
    pub fn data_url(&self) -> Option<String> {
        if self.data_base64.is_empty() {
            return None;
        }
        let format = match self.format {
            Some(format) => format,
            None => ImageFormat::from_magic_bytes(&self.data()?)?,
        };
        Some(format!("data:{};base64,{}", format.mime_type(), self.data_base64))
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.frame.contains(point, tolerance)
    }
}

super::connectable_shape!(Image, super::DiagramType::Image);
