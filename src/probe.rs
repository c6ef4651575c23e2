//! Dimension probing for local image files.
//!
//! In the viewer the host runtime decodes images and reports dimensions
//! through [`DecodedImage`]. Offline tools (the `classify` command, tests)
//! need the same handle without a browser, so this module reads dimensions
//! straight from the encoded bytes.
//!
//! | Format | Crate / function |
//! |---|---|
//! | JPEG, PNG, TIFF, WebP | `image::ImageReader::into_dimensions` (header only) |
//! | AVIF | `avif-parse` container metadata (no AV1 decode) |

use crate::loader::{DecodeError, DecodedImage};
use crate::types::Dimensions;
use image::{ImageError, ImageReader};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// File extensions [`probe_file`] understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp", "avif"];

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Whether `path` has an extension listed in [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Read pixel dimensions from encoded image bytes.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    if is_avif(bytes) {
        return probe_avif(bytes);
    }
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let (width, height) = reader.into_dimensions().map_err(decode_error)?;
    Ok(Dimensions::new(width, height))
}

/// Read a file and produce the handle the loader would get from a host decode.
pub fn probe_file(path: &Path) -> Result<DecodedImage, ProbeError> {
    let bytes = std::fs::read(path)?;
    let dimensions = probe_dimensions(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        width = dimensions.width,
        height = dimensions.height,
        "Probed image"
    );
    Ok(DecodedImage {
        src: path.display().to_string(),
        dimensions,
    })
}

/// ISO-BMFF `ftyp` box with an AVIF image or sequence brand.
fn is_avif(bytes: &[u8]) -> bool {
    matches!(bytes.get(4..12), Some(b"ftypavif") | Some(b"ftypavis"))
}

fn probe_avif(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| DecodeError::Corrupt(format!("AVIF container: {e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| DecodeError::Corrupt(format!("AVIF metadata: {e:?}")))?;
    Ok(Dimensions::new(
        meta.max_frame_width.get(),
        meta.max_frame_height.get(),
    ))
}

fn decode_error(error: ImageError) -> ProbeError {
    let error = match error {
        ImageError::Unsupported(e) => DecodeError::Unsupported(e.to_string()),
        ImageError::IoError(e) => DecodeError::Corrupt(e.to_string()),
        other => DecodeError::Corrupt(other.to_string()),
    };
    ProbeError::Decode(error)
}
