//! # Carousel
//!
//! Navigation and lazy-loading engine for an image carousel.
//!
//! The engine owns a fixed list of slides and an active index. The index
//! moves on an autoplay timer, on swipe, on keyboard input, or when an
//! indicator is selected; full-resolution images are fetched only for slides
//! near the active one or reported visible by the page.
//!
//! ```text
//! Page ──events──▶ Subscription ──▶ Carousel::update ──▶ View (mount point)
//!                                      │      ▲
//!                              LoadRequest   LoadCompletion
//!                                      ▼      │
//!                                     AssetLoader
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`Carousel`]: navigation, autoplay, lazy load, gestures, teardown |
//! | [`config`] | [`CarouselConfig`] with TOML loading and validation |
//! | [`page`] | Host page model: mount points, input events, subscriptions |
//! | [`view`] | Visual nodes the engine renders |
//! | [`timer`] | Cooperative single-threaded scheduler |
//! | [`gesture`] | Touch swipe/scroll classification |
//! | [`loader`] | Asset loading on a worker thread, EXIF orientation |
//! | [`retry`] | Bounded retry with backoff |
//! | [`source`] | Slides from a directory or a TOML manifest |
//! | [`sink`] | Logging and analytics collaborators |

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod loader;
pub mod page;
pub mod retry;
pub mod sink;
pub mod slide;
pub mod source;
pub mod state;
pub mod timer;
pub mod view;

pub use config::{CarouselConfig, TransitionEffect};
pub use engine::{Carousel, Collaborators};
pub use error::{AssetLoadError, CarouselError, ConfigError, NavigationRejected, SourceError};
pub use page::{InputEvent, Key, MountPoint, Page};
pub use slide::{LoadState, SlideDescriptor};
pub use state::{CarouselSnapshot, CarouselState, Direction};
