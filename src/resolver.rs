//! Image source negotiation.
//!
//! Maps an asset's sparse variant matrix plus a requested [`SizeBucket`] to
//! the sources a rendering surface needs:
//!
//! - a **primary** source (what the loader decodes),
//! - a **placeholder** (the smallest variant, for blur-up),
//! - a **fallback** for `<img src>` (baseline format preferred),
//! - one responsive **source set** per format, next-gen first.
//!
//! The negotiation is table-driven: [`FORMAT_PREFERENCE`] and
//! [`SizeBucket::ALL`] define the search space, and bucket widths come from
//! [`ResolverConfig`].
//!
//! Everything here is pure and total: an asset with no usable variant
//! resolves to an empty primary source, which callers treat as "nothing to
//! display".

use crate::config::{BucketWidths, ResolverConfig};
use crate::types::{Format, ImageAsset, SizeBucket};

/// Formats in the order the rendering surface should try them.
pub const FORMAT_PREFERENCE: [Format; 2] = [Format::NextGen, Format::Baseline];

/// Formats in the order to try for a universally decodable `<img src>`.
const FALLBACK_PREFERENCE: [Format; 2] = [Format::Baseline, Format::NextGen];

/// A single responsive candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub bucket: SizeBucket,
    pub url: String,
    /// Nominal width, emitted as the `w` descriptor.
    pub width: u32,
}

/// All candidates of one format, smallest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub format: Format,
    pub candidates: Vec<Candidate>,
}

impl SourceSet {
    /// Render as a `srcset` attribute value, e.g. `"s.webp 400w, r.webp 1080w"`.
    pub fn srcset(&self) -> String {
        self.candidates
            .iter()
            .map(|c| format!("{} {}w", c.url, c.width))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSources {
    /// Bucket the caller asked for.
    pub requested: SizeBucket,
    /// Bucket the primary source actually came from.
    pub primary_bucket: Option<SizeBucket>,
    /// Target-resolution source. Empty if the asset has no usable variant.
    pub primary: String,
    /// Smallest variant below the primary bucket, for blur-up.
    pub placeholder: Option<String>,
    /// Baseline-preferred source for surfaces without format negotiation.
    pub fallback: String,
    /// Responsive candidates per format, in [`FORMAT_PREFERENCE`] order.
    /// Formats with no candidates are omitted.
    pub source_sets: Vec<SourceSet>,
}

impl ResolvedSources {
    /// `false` when there is nothing to display at all.
    pub fn is_displayable(&self) -> bool {
        !self.primary.is_empty()
    }
}

/// Resolve sources with the stock resolver settings.
pub fn resolve(asset: &ImageAsset, bucket: SizeBucket) -> ResolvedSources {
    resolve_with(asset, bucket, &ResolverConfig::default())
}

/// Resolve sources for `asset` at the requested `bucket`.
///
/// The primary source is searched at the requested bucket first, then at
/// smaller buckets (closest first), then at larger ones. Within a bucket,
/// formats are tried in [`FORMAT_PREFERENCE`] order. Any asset with at least
/// one non-empty variant therefore gets a non-empty primary.
pub fn resolve_with(
    asset: &ImageAsset,
    bucket: SizeBucket,
    config: &ResolverConfig,
) -> ResolvedSources {
    let order = bucket_search_order(bucket);

    let primary_hit = first_variant(asset, &order, &FORMAT_PREFERENCE);
    let fallback = first_variant(asset, &order, &FALLBACK_PREFERENCE)
        .map(|(_, url)| url.to_string())
        .unwrap_or_default();

    let Some((primary_bucket, primary)) = primary_hit else {
        return ResolvedSources {
            requested: bucket,
            primary_bucket: None,
            primary: String::new(),
            placeholder: None,
            fallback,
            source_sets: Vec::new(),
        };
    };

    let placeholder = SizeBucket::ALL
        .into_iter()
        .take_while(|&b| b < primary_bucket)
        .find_map(|b| {
            FORMAT_PREFERENCE
                .into_iter()
                .find_map(|f| asset.variant(f, b))
        })
        .map(str::to_string);

    // When the search had to go up, the srcset ceiling follows it so the
    // primary is always among the candidates.
    let ceiling = bucket.max(primary_bucket);
    let floor = config.srcset_floor.min(ceiling);
    let source_sets = FORMAT_PREFERENCE
        .into_iter()
        .map(|format| SourceSet {
            format,
            candidates: candidates(asset, format, floor, ceiling, &config.widths),
        })
        .filter(|set| !set.candidates.is_empty())
        .collect();

    ResolvedSources {
        requested: bucket,
        primary_bucket: Some(primary_bucket),
        primary: primary.to_string(),
        placeholder,
        fallback,
        source_sets,
    }
}

/// Pick the smallest bucket whose nominal width covers a display slot.
///
/// `css_width` is the slot width in CSS pixels and `device_pixel_ratio` the
/// physical-to-CSS ratio. Non-positive or non-finite ratios count as 1.
/// Slots wider than every bucket get [`SizeBucket::Original`].
pub fn bucket_for_width(css_width: f64, device_pixel_ratio: f64, widths: &BucketWidths) -> SizeBucket {
    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let needed = (css_width.max(0.0) * dpr).ceil();
    SizeBucket::ALL
        .into_iter()
        .find(|&b| widths.get(b) as f64 >= needed)
        .unwrap_or(SizeBucket::Original)
}

/// Requested bucket, then smaller ones descending, then larger ones ascending.
fn bucket_search_order(requested: SizeBucket) -> Vec<SizeBucket> {
    let smaller = SizeBucket::ALL.into_iter().rev().filter(|&b| b < requested);
    let larger = SizeBucket::ALL.into_iter().filter(|&b| b > requested);
    std::iter::once(requested).chain(smaller).chain(larger).collect()
}

fn first_variant<'a>(
    asset: &'a ImageAsset,
    buckets: &[SizeBucket],
    formats: &[Format],
) -> Option<(SizeBucket, &'a str)> {
    buckets.iter().find_map(|&b| {
        formats
            .iter()
            .find_map(|&f| asset.variant(f, b))
            .map(|url| (b, url))
    })
}

fn candidates(
    asset: &ImageAsset,
    format: Format,
    floor: SizeBucket,
    ceiling: SizeBucket,
    widths: &BucketWidths,
) -> Vec<Candidate> {
    SizeBucket::ALL
        .into_iter()
        .filter(|&b| b >= floor && b <= ceiling)
        .filter_map(|bucket| {
            asset.variant(format, bucket).map(|url| Candidate {
                bucket,
                url: url.to_string(),
                width: widths.get(bucket),
            })
        })
        .collect()
}
