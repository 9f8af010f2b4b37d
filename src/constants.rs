pub const RENDER_WIDTH: i32 = 1280;           // Width of the viewer window
pub const RENDER_HEIGHT: i32 = 720;           // Height of the viewer window
pub const FPS: u32 = 60;                      // Frames per second
pub const FRAME_TIME: f32 = 1.0 / FPS as f32; // Time per frame (seconds)

pub const TRANSITION_MS: u64 = 500;           // Animation lock window after each slide change
pub const AUTOPLAY_INTERVAL_MS: u64 = 5000;   // Delay between autoplay advances
pub const PRELOAD_COUNT: usize = 2;           // Slides eagerly loaded on each side of the active one
pub const SWIPE_THRESHOLD_PX: f32 = 50.0;     // Net horizontal travel needed for a swipe

pub const RETRY_ATTEMPTS: u32 = 3;            // Loader attempts per asset
pub const RETRY_DELAY_MS: u64 = 1000;         // Base backoff, multiplied by the attempt number
pub const ANALYTICS_BUFFER: usize = 50;       // Events kept by the in-memory analytics sink
