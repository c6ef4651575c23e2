//! Shared types consumed by every stage of the delivery pipeline.
//!
//! [`ImageAsset`] is owned by the upstream image catalog and is read-only
//! here. Its variant matrix is deliberately sparse: any of the eight cells
//! may be missing, and an empty string is treated the same as a missing cell.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque asset identity, as issued by the image catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Encoding family of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Universally decodable format (JPEG).
    Baseline,
    /// Smaller, newer format (WebP) that the rendering surface may prefer.
    NextGen,
}

impl Format {
    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Baseline => "image/jpeg",
            Format::NextGen => "image/webp",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Baseline => f.write_str("baseline"),
            Format::NextGen => f.write_str("next-gen"),
        }
    }
}

/// Size rendition of a variant, ordered smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Thumbnail,
    Small,
    Regular,
    Original,
}

impl SizeBucket {
    /// Every bucket, smallest first.
    pub const ALL: [SizeBucket; 4] = [
        SizeBucket::Thumbnail,
        SizeBucket::Small,
        SizeBucket::Regular,
        SizeBucket::Original,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SizeBucket::Thumbnail => "thumbnail",
            SizeBucket::Small => "small",
            SizeBucket::Regular => "regular",
            SizeBucket::Original => "original",
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SizeBucket::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown size bucket '{s}' (expected thumbnail, small, regular or original)")
            })
    }
}

/// One format row of the variant matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

impl VariantRow {
    pub fn get(&self, bucket: SizeBucket) -> Option<&str> {
        let cell = match bucket {
            SizeBucket::Thumbnail => &self.thumbnail,
            SizeBucket::Small => &self.small,
            SizeBucket::Regular => &self.regular,
            SizeBucket::Original => &self.original,
        };
        cell.as_deref().filter(|url| !url.is_empty())
    }

    pub fn set(&mut self, bucket: SizeBucket, url: impl Into<String>) {
        let cell = match bucket {
            SizeBucket::Thumbnail => &mut self.thumbnail,
            SizeBucket::Small => &mut self.small,
            SizeBucket::Regular => &mut self.regular,
            SizeBucket::Original => &mut self.original,
        };
        *cell = Some(url.into());
    }
}

/// An image record with a partial {format} × {size} matrix of variant URLs.
///
/// Deserializes from either the nested shape this crate serializes to:
///
/// ```json
/// { "id": "a1", "baseline": { "thumbnail": "t.jpg" }, "next_gen": { "regular": "r.webp" } }
/// ```
///
/// or the flat catalog shape (`thumbnailUrl`, `regularWebpUrl`, ...). Both may
/// be mixed; flat fields fill cells the nested rows leave empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAsset")]
pub struct ImageAsset {
    pub id: AssetId,
    pub baseline: VariantRow,
    pub next_gen: VariantRow,
}

impl ImageAsset {
    pub fn new(id: impl Into<AssetId>) -> Self {
        Self {
            id: id.into(),
            baseline: VariantRow::default(),
            next_gen: VariantRow::default(),
        }
    }

    /// Builder-style setter for a single matrix cell.
    pub fn with_variant(mut self, format: Format, bucket: SizeBucket, url: impl Into<String>) -> Self {
        self.row_mut(format).set(bucket, url);
        self
    }

    pub fn row(&self, format: Format) -> &VariantRow {
        match format {
            Format::Baseline => &self.baseline,
            Format::NextGen => &self.next_gen,
        }
    }

    fn row_mut(&mut self, format: Format) -> &mut VariantRow {
        match format {
            Format::Baseline => &mut self.baseline,
            Format::NextGen => &mut self.next_gen,
        }
    }

    /// URL of one cell, `None` if absent or empty.
    pub fn variant(&self, format: Format, bucket: SizeBucket) -> Option<&str> {
        self.row(format).get(bucket)
    }

    /// Number of populated cells.
    pub fn variant_count(&self) -> usize {
        [Format::Baseline, Format::NextGen]
            .into_iter()
            .flat_map(|f| SizeBucket::ALL.into_iter().map(move |b| (f, b)))
            .filter(|&(f, b)| self.variant(f, b).is_some())
            .count()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAsset {
    id: AssetId,
    #[serde(default)]
    baseline: VariantRow,
    #[serde(default, alias = "next_gen")]
    next_gen: VariantRow,
    thumbnail_url: Option<String>,
    small_url: Option<String>,
    regular_url: Option<String>,
    original_url: Option<String>,
    thumbnail_webp_url: Option<String>,
    small_webp_url: Option<String>,
    regular_webp_url: Option<String>,
    original_webp_url: Option<String>,
}

impl From<RawAsset> for ImageAsset {
    fn from(raw: RawAsset) -> Self {
        fn fill(cell: &mut Option<String>, flat: Option<String>) {
            if cell.as_deref().is_none_or(str::is_empty) {
                if let Some(url) = flat {
                    *cell = Some(url);
                }
            }
        }

        let RawAsset {
            id,
            mut baseline,
            mut next_gen,
            ..
        } = raw;
        fill(&mut baseline.thumbnail, raw.thumbnail_url);
        fill(&mut baseline.small, raw.small_url);
        fill(&mut baseline.regular, raw.regular_url);
        fill(&mut baseline.original, raw.original_url);
        fill(&mut next_gen.thumbnail, raw.thumbnail_webp_url);
        fill(&mut next_gen.small, raw.small_webp_url);
        fill(&mut next_gen.regular, raw.regular_webp_url);
        fill(&mut next_gen.original, raw.original_webp_url);

        Self {
            id,
            baseline,
            next_gen,
        }
    }
}

/// Decoded pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, `None` for degenerate images.
    pub fn aspect_ratio(self) -> Option<f64> {
        (self.width > 0 && self.height > 0).then(|| self.width as f64 / self.height as f64)
    }
}
