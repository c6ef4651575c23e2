//! HTML rendering of resolved sources and loader state, using Maud.
//!
//! - [`render_picture`] turns [`ResolvedSources`] into a `<picture>` element:
//!   one `<source>` per format in preference order, with an `<img>` pointing
//!   at the baseline fallback.
//! - [`render_load_state`] renders the blur-up stack for one loader instance:
//!   the placeholder (or a skeleton) under the primary while upgrading, just
//!   the primary once loaded, and an inline error affordance on failure.

use crate::loader::{LoadPhase, LoadState};
use crate::resolver::ResolvedSources;
use maud::{Markup, html};

/// Default `sizes` attribute: full width on small screens, 80% otherwise.
pub const DEFAULT_SIZES: &str = "(max-width: 800px) 100vw, 80vw";

/// Render a responsive `<picture>`. Renders nothing for an undisplayable asset.
pub fn render_picture(sources: &ResolvedSources, alt: &str, sizes: &str) -> Markup {
    if !sources.is_displayable() {
        return html! {};
    }
    let src = if sources.fallback.is_empty() {
        &sources.primary
    } else {
        &sources.fallback
    };
    html! {
        picture {
            @for set in &sources.source_sets {
                source type=(set.format.mime_type()) srcset=(set.srcset()) sizes=(sizes);
            }
            img src=(src) alt=(alt) decoding="async";
        }
    }
}

/// Render the blur-up stack for one loader instance.
pub fn render_load_state(state: &LoadState, alt: &str) -> Markup {
    html! {
        div.progressive-image data-phase=(phase_name(&state.phase)) {
            @match &state.phase {
                LoadPhase::Placeholder | LoadPhase::Upgrading => {
                    @if let Some(placeholder) = &state.placeholder_src {
                        img.placeholder src=(placeholder) alt="" aria-hidden="true";
                    } @else {
                        div.skeleton {}
                    }
                    @if state.phase == LoadPhase::Upgrading {
                        img.primary.loading src=(state.resolved_src) alt=(alt);
                    }
                }
                LoadPhase::Loaded => {
                    img.primary src=(state.resolved_src) alt=(alt);
                }
                LoadPhase::Errored(error) => {
                    div.image-error role="img" aria-label=(alt) title=(error.to_string()) {
                        "Failed to load image"
                    }
                }
            }
        }
    }
}

fn phase_name(phase: &LoadPhase) -> &'static str {
    match phase {
        LoadPhase::Placeholder => "placeholder",
        LoadPhase::Upgrading => "upgrading",
        LoadPhase::Loaded => "loaded",
        LoadPhase::Errored(_) => "errored",
    }
}
