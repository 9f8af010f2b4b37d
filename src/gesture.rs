//! Touch session interpretation.
//!
//! A session runs from touch start to touch end. Only the net displacement
//! between those two points decides a swipe; intermediate moves are used to
//! detect vertical scrolling, which cancels the session's navigation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Next, // Finger travelled left
    Prev, // Finger travelled right
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Swipe(Swipe),
    Scroll,
    /// Horizontal travel did not exceed the threshold.
    Tap,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    start_x: f32,
    start_y: f32,
    scrolling: bool,
}

impl Session {
    fn observe(&mut self, x: f32, y: f32) {
        let dx = (self.start_x - x).abs();
        let dy = (self.start_y - y).abs();
        if dy > dx {
            self.scrolling = true;
        }
    }
}

#[derive(Debug)]
pub struct TouchTracker {
    threshold: f32,
    session: Option<Session>,
}

impl TouchTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a new session, discarding any unfinished one.
    pub fn begin(&mut self, x: f32, y: f32) {
        self.session = Some(Session {
            start_x: x,
            start_y: y,
            scrolling: false,
        });
    }

    pub fn moved(&mut self, x: f32, y: f32) {
        if let Some(session) = self.session.as_mut() {
            session.observe(x, y);
        }
    }

    /// Ends the session. `None` when no session was open.
    pub fn end(&mut self, x: f32, y: f32) -> Option<GestureOutcome> {
        let mut session = self.session.take()?;
        session.observe(x, y);
        if session.scrolling {
            return Some(GestureOutcome::Scroll);
        }

        let diff_x = session.start_x - x;
        if diff_x.abs() > self.threshold {
            if diff_x > 0.0 {
                Some(GestureOutcome::Swipe(Swipe::Next))
            } else {
                Some(GestureOutcome::Swipe(Swipe::Prev))
            }
        } else {
            Some(GestureOutcome::Tap)
        }
    }

    pub fn cancel(&mut self) {
        self.session = None;
    }
}
