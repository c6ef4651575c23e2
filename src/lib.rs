//! # Lighttable
//!
//! Responsive image delivery for a photo-heavy client: source negotiation,
//! blur-up loading, orientation bookkeeping and a zoomable full-screen viewer.
//! Every image in the catalog comes with a sparse matrix of pre-rendered
//! variants (two formats by four size buckets); this crate decides which one
//! to show, how to get there without layout jank, and how to let the user
//! inspect it.
//!
//! # Architecture: One Pipeline per Focused Image
//!
//! ```text
//! ImageAsset ──resolve──▶ ResolvedSources ──show──▶ ProgressiveLoader ──▶ LoadState
//!                                                         │ complete(token)
//!                                      host decode ◀──────┘
//!                                            │ DecodedImage
//!                                            ├──▶ ZoomPanEngine (image size)
//!                                            └──▶ ViewerEvents::on_load ──▶ OrientationStore
//! ```
//!
//! The crate never performs I/O in the viewer path. The host runtime does the
//! fetching and decoding and feeds completions back in, tagged with the
//! generation token it was handed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | The variant matrix (`ImageAsset`), formats, size buckets, dimensions |
//! | [`resolver`] | Pure source negotiation: primary, placeholder, fallback and srcset lists |
//! | [`loader`] | Blur-up state machine with generation tokens and a shared warm cache |
//! | [`orientation`] | Portrait/landscape/square classification and the first-write-wins store |
//! | [`zoom`] | Zoom/pan transform math plus pointer, wheel and pinch gesture sessions |
//! | [`viewer`] | Full-screen shell composing the above for one focused asset |
//! | [`render`] | Maud markup for `<picture>` elements and the blur-up stack |
//! | [`probe`] | Header-only dimension probing for offline tooling |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting for the inspection commands |
//!
//! # Design Decisions
//!
//! ## Generation Tokens Instead of Cancellation
//!
//! A native image decode can't be aborted. Each load request carries the
//! [`loader::Generation`] current when it was issued, and a completion is
//! applied only if that generation is still live. Switching assets bumps the
//! generation, which is all "cancellation" amounts to. The state shown after
//! any interleaving of completions always belongs to the last asset shown.
//!
//! ## Explicit Shared Handles, No Globals
//!
//! [`orientation::OrientationStore`] and [`loader::WarmCache`] are cloneable
//! handles over `Arc`-wrapped maps. Whoever builds a session passes them down,
//! so tests and independent sessions never see each other's entries.
//!
//! ## First Write Wins
//!
//! Several surfaces may classify the same asset at once (a grid cell and the
//! viewer, say). The orientation store keeps whichever answer lands first and
//! discards the rest, so every layout consumer agrees for the whole session.
//!
//! ## Transform Invariants Live in One Place
//!
//! Every [`zoom::ZoomPanEngine`] mutation funnels through the same clamp: zoom
//! stays within its configured range, pan stays inside the overflow of the
//! fitted image, and pan is zero whenever zoom is at its configured minimum.

pub mod config;
pub mod loader;
pub mod orientation;
pub mod output;
pub mod probe;
pub mod render;
pub mod resolver;
pub mod types;
pub mod viewer;
pub mod zoom;

pub use config::ViewerConfig;
pub use loader::{DecodeError, DecodedImage, LoadError, LoadPhase, ProgressiveLoader, WarmCache};
pub use orientation::{Orientation, OrientationStore};
pub use resolver::{ResolvedSources, resolve};
pub use types::{AssetId, Dimensions, Format, ImageAsset, SizeBucket};
pub use viewer::{ViewerEvents, ViewerShell};
pub use zoom::{Size, Vec2, ZoomPanEngine};

#[cfg(test)]
pub(crate) mod test_helpers;
