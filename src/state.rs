use crate::config::CarouselConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Next, // Moving towards higher indices (or wrapping forward)
    Prev, // Moving towards lower indices (or wrapping backward)
}

/// Mutable navigation state, owned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CarouselState {
    pub current_index: usize,
    pub is_animating: bool,
    /// Slides whose full-resolution load has been dispatched. Only grows
    /// until the slide list is replaced.
    pub loaded_indices: BTreeSet<usize>,
    pub direction: Direction,
    pub autoplay_active: bool,
}

/// Serializable summary of a running carousel.
#[derive(Debug, Clone, Serialize)]
pub struct CarouselSnapshot {
    pub current_slide: usize,
    pub total_slides: usize,
    pub is_playing: bool,
    pub is_animating: bool,
    pub direction: Direction,
    /// Slides whose image arrived.
    pub loaded_images: Vec<usize>,
    /// Slides whose load was dispatched, whatever the outcome.
    pub requested_images: Vec<usize>,
    pub options: CarouselConfig,
}
