use serde::{Deserialize, Serialize};

/// One carousel entry. Immutable once the engine is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideDescriptor {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl SlideDescriptor {
    pub fn new(url: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Full-resolution asset state of a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Pending,     // Not yet eligible
    Requested,   // Load dispatched, waiting for completion
    Loaded,
    Unavailable, // Load failed, placeholder shown
}

pub struct Slide {
    pub descriptor: SlideDescriptor,
    pub load: LoadState,
}

impl Slide {
    pub fn new(descriptor: SlideDescriptor) -> Self {
        Self {
            descriptor,
            load: LoadState::Pending,
        }
    }

    /// Returns false if a load was already dispatched for this slide.
    pub fn mark_requested(&mut self) -> bool {
        if self.load == LoadState::Pending {
            self.load = LoadState::Requested;
            true
        } else {
            false
        }
    }

    pub fn mark_loaded(&mut self) {
        self.load = LoadState::Loaded;
    }

    pub fn mark_unavailable(&mut self) {
        // A slide that already loaded keeps its image.
        if self.load != LoadState::Loaded {
            self.load = LoadState::Unavailable;
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.load == LoadState::Loaded
    }
}
