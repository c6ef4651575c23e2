//! Progressive (blur-up) loading state machine.
//!
//! One [`ProgressiveLoader`] exists per rendered image instance:
//!
//! ```text
//!             show()                request_primary()          complete(Ok)
//!   ──────▶ Placeholder ───────────────▶ Upgrading ────────────────▶ Loaded
//!     │                                      │
//!     │ warm cache hit                       │ complete(Err)
//!     └──────────────▶ Loaded                └───────────────────────▶ Errored
//!     │ no source
//!     └──────────────▶ Errored(SourceUnavailable)
//! ```
//!
//! ## Stale completions
//!
//! Decode completions arrive in any order, and a native decode can't be
//! aborted. Every request therefore carries the [`Generation`] current when
//! it was issued. [`ProgressiveLoader::complete`] applies a completion only
//! if that token is still the live one; otherwise it is dropped. Navigating
//! away "cancels" by bumping the generation.
//!
//! ## Warm cache
//!
//! [`WarmCache`] remembers recently decoded sources across instances. When a
//! newly shown asset's primary source is already warm, the loader goes
//! straight to `Loaded`, so re-opening an image never flashes its blur-up.
//!
//! There is no automatic retry: a resource that failed to decode will not
//! become valid by requesting it again.

use crate::config::LoaderConfig;
use crate::resolver::ResolvedSources;
use crate::types::Dimensions;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Why the hosting runtime failed to decode a source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("corrupt image data: {0}")]
    Corrupt(String),
    #[error("cross-origin request rejected")]
    CrossOrigin,
    #[error("unsupported image format: {0}")]
    Unsupported(String),
}

/// Terminal failure of a loader instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("no displayable image source")]
    SourceUnavailable,
    #[error("failed to load image: {0}")]
    Decode(#[from] DecodeError),
}

/// Handle to a successfully decoded image, as reported by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub src: String,
    pub dimensions: Dimensions,
}

impl DecodedImage {
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            dimensions: Dimensions::new(width, height),
        }
    }
}

/// Monotonic identity token. Captured when a request is issued and compared
/// when its completion arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    /// Showing the placeholder (or a skeleton if there is none).
    Placeholder,
    /// Primary requested; placeholder still visible underneath.
    Upgrading,
    /// Primary decoded and shown.
    Loaded,
    /// Nothing to show; an inline error affordance is rendered.
    Errored(LoadError),
}

/// Observable state of one loader instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadState {
    pub phase: LoadPhase,
    /// Target-resolution source. Empty when unavailable.
    pub resolved_src: String,
    pub placeholder_src: Option<String>,
    /// Decoded size of the primary, known once it is loaded.
    pub dimensions: Option<Dimensions>,
    pub identity: Generation,
}

impl LoadState {
    fn unmounted(identity: Generation) -> Self {
        Self {
            phase: LoadPhase::Placeholder,
            resolved_src: String::new(),
            placeholder_src: None,
            dimensions: None,
            identity,
        }
    }

    /// The source currently visible to the user, `None` for a skeleton or an
    /// error affordance.
    pub fn displayed_src(&self) -> Option<&str> {
        match self.phase {
            LoadPhase::Placeholder | LoadPhase::Upgrading => self.placeholder_src.as_deref(),
            LoadPhase::Loaded => Some(&self.resolved_src),
            LoadPhase::Errored(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.phase == LoadPhase::Loaded
    }

    pub fn error(&self) -> Option<&LoadError> {
        match &self.phase {
            LoadPhase::Errored(e) => Some(e),
            _ => None,
        }
    }
}

/// A decode the host should begin. Echo `token` back in [`ProgressiveLoader::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub token: Generation,
    pub src: String,
}

/// Result of feeding a completion to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The completion matched the live identity and changed the state.
    Applied,
    /// The completion belonged to an identity that is no longer shown.
    Stale,
}

/// Shared, bounded map of recently decoded source URLs to their dimensions.
///
/// Cloning yields another handle to the same cache. The least recently
/// inserted entry is evicted once `capacity` is exceeded; inserting an
/// existing entry refreshes it. Lookups don't touch recency.
#[derive(Debug, Clone)]
pub struct WarmCache {
    inner: Arc<Mutex<LruCache<String, Dimensions>>>,
}

impl WarmCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
        }
    }

    /// Cache sized by `loader.warm_cache_capacity`.
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.warm_cache_capacity)
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Dimensions>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, src: &str) -> bool {
        self.entries().contains(src)
    }

    /// Decoded size of a warm source.
    pub fn dimensions(&self, src: &str) -> Option<Dimensions> {
        self.entries().peek(src).copied()
    }

    pub fn insert(&self, src: &str, dimensions: Dimensions) {
        self.entries().put(src.to_string(), dimensions);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Forget everything (e.g. on sign-out).
    pub fn clear(&self) {
        self.entries().clear();
    }
}

/// Per-instance blur-up loader. See the [module docs](self).
#[derive(Debug)]
pub struct ProgressiveLoader {
    state: LoadState,
    warm: WarmCache,
}

impl ProgressiveLoader {
    pub fn new(warm: WarmCache) -> Self {
        Self {
            state: LoadState::unmounted(Generation::default()),
            warm,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.state.phase
    }

    pub fn generation(&self) -> Generation {
        self.state.identity
    }

    /// Show a new identity. Always starts a new generation, so anything still
    /// in flight for the previous identity becomes stale.
    pub fn show(&mut self, sources: &ResolvedSources) -> &LoadState {
        let identity = self.state.identity.next();

        let warm = if sources.is_displayable() {
            self.warm.dimensions(&sources.primary)
        } else {
            None
        };
        let phase = if !sources.is_displayable() {
            tracing::debug!(generation = identity.value(), "No displayable source");
            LoadPhase::Errored(LoadError::SourceUnavailable)
        } else if warm.is_some() {
            tracing::debug!(src = %sources.primary, "Warm cache hit, skipping placeholder");
            LoadPhase::Loaded
        } else {
            LoadPhase::Placeholder
        };

        self.state = LoadState {
            phase,
            resolved_src: sources.primary.clone(),
            placeholder_src: sources.placeholder.clone(),
            dimensions: warm,
            identity,
        };
        &self.state
    }

    /// Ask the host to start decoding the primary source.
    ///
    /// Only valid from `Placeholder`; returns `None` otherwise (already
    /// requested, already loaded, or errored).
    pub fn request_primary(&mut self) -> Option<LoadRequest> {
        if self.state.phase != LoadPhase::Placeholder || self.state.resolved_src.is_empty() {
            return None;
        }
        self.state.phase = LoadPhase::Upgrading;
        Some(LoadRequest {
            token: self.state.identity,
            src: self.state.resolved_src.clone(),
        })
    }

    /// Feed a decode completion back in.
    pub fn complete(
        &mut self,
        token: Generation,
        outcome: Result<&DecodedImage, DecodeError>,
    ) -> Completion {
        if token != self.state.identity || self.state.phase != LoadPhase::Upgrading {
            tracing::debug!(
                token = token.value(),
                current = self.state.identity.value(),
                "Discarding stale decode completion"
            );
            return Completion::Stale;
        }

        match outcome {
            Ok(image) => {
                self.warm.insert(&self.state.resolved_src, image.dimensions);
                self.state.dimensions = Some(image.dimensions);
                self.state.phase = LoadPhase::Loaded;
            }
            Err(error) => {
                tracing::warn!(src = %self.state.resolved_src, %error, "Image decode failed");
                self.state.phase = LoadPhase::Errored(LoadError::Decode(error));
            }
        }
        Completion::Applied
    }

    /// Drop the current identity. Pending completions become stale.
    pub fn unmount(&mut self) {
        self.state = LoadState::unmounted(self.state.identity.next());
    }
}
