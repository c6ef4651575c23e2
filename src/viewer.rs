//! Full-screen viewer shell.
//!
//! Composes the pipeline for one focused asset:
//!
//! 1. [`resolver`](crate::resolver) picks sources for the focused asset,
//! 2. a [`ProgressiveLoader`] drives blur-up (skipping it for warm assets),
//! 3. decode completions are forwarded to the host through [`ViewerEvents`],
//! 4. a [`ZoomPanEngine`] is reset on every identity change.
//!
//! The shell knows nothing about grids or profile pages. Hosts that want
//! orientation data plug in an [`OrientationRecorder`] (or their own
//! [`ViewerEvents`] implementation) and record it themselves.

use crate::config::ViewerConfig;
use crate::loader::{
    Completion, DecodeError, DecodedImage, Generation, LoadError, LoadPhase, LoadRequest,
    LoadState, ProgressiveLoader, WarmCache,
};
use crate::orientation::OrientationStore;
use crate::resolver::{ResolvedSources, bucket_for_width, resolve_with};
use crate::types::{AssetId, ImageAsset, SizeBucket};
use crate::zoom::{Size, ZoomPanEngine};
use std::collections::HashSet;

/// Notifications the shell sends to its host. Both default to no-ops.
pub trait ViewerEvents {
    /// First successful decode of `id` in this shell session.
    fn on_load(&mut self, id: &AssetId, image: &DecodedImage) {
        let _ = (id, image);
    }

    /// Best-effort failure notice; hosts may log or ignore it.
    fn on_error(&mut self, id: &AssetId, error: &LoadError) {
        let _ = (id, error);
    }
}

/// Host that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl ViewerEvents for NoEvents {}

/// Host that records orientation for every loaded asset.
#[derive(Debug, Clone)]
pub struct OrientationRecorder {
    store: OrientationStore,
}

impl OrientationRecorder {
    pub fn new(store: OrientationStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &OrientationStore {
        &self.store
    }
}

impl ViewerEvents for OrientationRecorder {
    fn on_load(&mut self, id: &AssetId, image: &DecodedImage) {
        self.store.record(id, image.dimensions);
    }
}

/// How the shell chooses a size bucket for the focused asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeHint {
    /// Always request this bucket.
    Bucket(SizeBucket),
    /// Derive the bucket from the container width and device pixel ratio.
    Container { device_pixel_ratio: f64 },
}

#[derive(Debug)]
struct Focused {
    id: AssetId,
    sources: ResolvedSources,
}

/// Viewer for a single focused asset. See the [module docs](self).
pub struct ViewerShell<E: ViewerEvents> {
    config: ViewerConfig,
    size_hint: SizeHint,
    loader: ProgressiveLoader,
    engine: ZoomPanEngine,
    events: E,
    focused: Option<Focused>,
    notified: HashSet<AssetId>,
}

impl<E: ViewerEvents> ViewerShell<E> {
    pub fn new(config: ViewerConfig, warm: WarmCache, events: E) -> Self {
        let engine = ZoomPanEngine::new(config.zoom.clone());
        let size_hint = SizeHint::Bucket(config.resolver.bucket);
        Self {
            config,
            size_hint,
            loader: ProgressiveLoader::new(warm),
            engine,
            events,
            focused: None,
            notified: HashSet::new(),
        }
    }

    pub fn with_size_hint(mut self, hint: SizeHint) -> Self {
        self.size_hint = hint;
        self
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    pub fn focused_id(&self) -> Option<&AssetId> {
        self.focused.as_ref().map(|f| &f.id)
    }

    pub fn sources(&self) -> Option<&ResolvedSources> {
        self.focused.as_ref().map(|f| &f.sources)
    }

    /// Focus `asset`. Returns the decode the host should start, if any.
    ///
    /// The zoom engine is reset (ending any gesture in progress) and the
    /// loader starts a new generation, so completions still in flight for the
    /// previous asset will be discarded.
    pub fn focus(&mut self, asset: &ImageAsset) -> Option<LoadRequest> {
        let bucket = self.bucket();
        let sources = resolve_with(asset, bucket, &self.config.resolver);
        tracing::debug!(asset = %asset.id, %bucket, primary = %sources.primary, "Focus");

        self.engine.reset_for_identity();
        let state = self.loader.show(&sources);
        let phase = state.phase.clone();
        // Warm hits skip the decode; their size comes from the cache
        if let Some(dimensions) = state.dimensions {
            self.engine.set_image_size(Some(dimensions.into()));
        }
        self.focused = Some(Focused {
            id: asset.id.clone(),
            sources,
        });

        if let LoadPhase::Errored(error) = &phase {
            self.events.on_error(&asset.id, error);
        }
        self.loader.request_primary()
    }

    /// Host callback: the decode for `token` succeeded.
    pub fn on_decoded(&mut self, token: Generation, image: &DecodedImage) -> Completion {
        let completion = self.loader.complete(token, Ok(image));
        if completion == Completion::Applied {
            self.engine.set_image_size(Some(image.dimensions.into()));
            if let Some(focused) = &self.focused {
                if self.notified.insert(focused.id.clone()) {
                    self.events.on_load(&focused.id, image);
                }
            }
        }
        completion
    }

    /// Host callback: the decode for `token` failed.
    pub fn on_decode_failed(&mut self, token: Generation, error: DecodeError) -> Completion {
        let completion = self.loader.complete(token, Err(error));
        if completion == Completion::Applied {
            if let (Some(focused), Some(error)) = (&self.focused, self.loader.state().error()) {
                self.events.on_error(&focused.id, error);
            }
        }
        completion
    }

    /// Unmount the focused asset. Pending decodes become stale.
    pub fn close(&mut self) {
        self.loader.unmount();
        self.engine.reset_for_identity();
        self.focused = None;
    }

    pub fn load_state(&self) -> &LoadState {
        self.loader.state()
    }

    pub fn phase(&self) -> &LoadPhase {
        self.loader.phase()
    }

    pub fn displayed_src(&self) -> Option<&str> {
        self.loader.state().displayed_src()
    }

    // =========================================================================
    // Zoom surface
    // =========================================================================

    pub fn zoom(&self) -> f64 {
        self.engine.zoom()
    }

    pub fn is_zoomed(&self) -> bool {
        self.engine.is_zoomed()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.engine.zoom_percent()
    }

    pub fn zoom_in(&mut self) {
        self.engine.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.engine.zoom_out();
    }

    pub fn reset_zoom(&mut self) {
        self.engine.reset_zoom();
    }

    pub fn engine(&self) -> &ZoomPanEngine {
        &self.engine
    }

    /// Gesture input goes straight to the engine.
    pub fn engine_mut(&mut self) -> &mut ZoomPanEngine {
        &mut self.engine
    }

    pub fn set_container(&mut self, container: Size) {
        self.engine.set_container(container);
    }

    fn bucket(&self) -> SizeBucket {
        match self.size_hint {
            SizeHint::Bucket(bucket) => bucket,
            SizeHint::Container { device_pixel_ratio } => bucket_for_width(
                self.engine.container().width,
                device_pixel_ratio,
                &self.config.resolver.widths,
            ),
        }
    }
}
