//! Shared test utilities for the lighttable test suite.
//!
//! Provides asset builders, encoded-image fixtures and a recording
//! [`ViewerEvents`] host.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let asset = asset_with("a", &[(Format::Baseline, SizeBucket::Regular, "r.jpg")]);
//! let mut shell = ViewerShell::new(ViewerConfig::default(), WarmCache::new(8), MockEvents::new());
//! shell.focus(&asset);
//! assert!(shell.events().recorded().is_empty());
//! ```

use std::io::Cursor;

use crate::loader::{DecodedImage, LoadError};
use crate::types::{AssetId, Format, ImageAsset, SizeBucket};
use crate::viewer::ViewerEvents;

// =========================================================================
// Asset builders
// =========================================================================

/// Build an asset from `(format, bucket, url)` cells.
pub fn asset_with(id: &str, cells: &[(Format, SizeBucket, &str)]) -> ImageAsset {
    cells
        .iter()
        .fold(ImageAsset::new(id), |asset, &(format, bucket, url)| {
            asset.with_variant(format, bucket, url)
        })
}

/// Baseline thumbnail `{id}-t.jpg` plus baseline regular `{id}-r.jpg`: the
/// smallest asset that exercises the full blur-up path.
pub fn blur_up_asset(id: &str) -> ImageAsset {
    ImageAsset::new(id)
        .with_variant(Format::Baseline, SizeBucket::Thumbnail, format!("{id}-t.jpg"))
        .with_variant(Format::Baseline, SizeBucket::Regular, format!("{id}-r.jpg"))
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// A solid grey PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([128, 128, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =========================================================================
// Recording host
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    /// Asset id plus decoded width and height.
    Load(String, u32, u32),
    Error(String, LoadError),
}

/// [`ViewerEvents`] host that records every call in order.
#[derive(Debug, Default)]
pub struct MockEvents {
    events: Vec<RecordedEvent>,
}

impl MockEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.clone()
    }

    pub fn load_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Load(..)))
            .count()
    }
}

impl ViewerEvents for MockEvents {
    fn on_load(&mut self, id: &AssetId, image: &DecodedImage) {
        self.events.push(RecordedEvent::Load(
            id.to_string(),
            image.dimensions.width,
            image.dimensions.height,
        ));
    }

    fn on_error(&mut self, id: &AssetId, error: &LoadError) {
        self.events
            .push(RecordedEvent::Error(id.to_string(), error.clone()));
    }
}
