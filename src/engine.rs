//! The carousel engine.
//!
//! [`Carousel`] is single-threaded and cooperative: nothing happens between
//! calls except on [`Carousel::update`], which drains page events and image
//! load completions, then fires due timers. Navigation is serialized by the
//! animation lock: while a transition is running every navigation command is
//! dropped, whatever its source (autoplay timer, swipe, key, indicator).

use crate::config::CarouselConfig;
use crate::error::{AssetLoadError, CarouselError, ConfigError, NavigationRejected};
use crate::gesture::{GestureOutcome, Swipe, TouchTracker};
use crate::loader::{AssetLoader, LoadCompletion, LoadRequest};
use crate::page::{InputEvent, Key, MountPoint, Page, Subscription};
use crate::sink::{AnalyticsEvent, AnalyticsSink, LogSink, Severity};
use crate::slide::{LoadState, Slide, SlideDescriptor};
use crate::state::{CarouselSnapshot, CarouselState, Direction};
use crate::timer::{Scheduler, TimerId};
use crate::view::{Transition, View};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// External collaborators handed to the engine at construction.
pub struct Collaborators {
    pub loader: Box<dyn AssetLoader>,
    pub log: Option<Box<dyn LogSink>>,
    pub analytics: Option<Box<dyn AnalyticsSink>>,
}

impl Collaborators {
    pub fn new(loader: impl AssetLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            log: None,
            analytics: None,
        }
    }

    pub fn with_log(mut self, sink: impl LogSink + 'static) -> Self {
        self.log = Some(Box::new(sink));
        self
    }

    pub fn with_analytics(mut self, sink: impl AnalyticsSink + 'static) -> Self {
        self.analytics = Some(Box::new(sink));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Autoplay,
    TransitionEnd,
}

pub struct Carousel {
    mount: MountPoint,
    slides: Vec<Slide>,
    config: CarouselConfig,
    state: CarouselState,

    scheduler: Scheduler<TimerKind>,
    autoplay_timer: Option<TimerId>,
    transition_timer: Option<TimerId>,
    transition_started: Duration,
    /// Autoplay was started and not explicitly stopped.
    autoplay_wanted: bool,
    paused: bool,

    gesture: TouchTracker,
    subscription: Option<Subscription>,

    loader: Box<dyn AssetLoader>,
    completions: Option<(Sender<LoadCompletion>, Receiver<LoadCompletion>)>,

    log: Option<Box<dyn LogSink>>,
    analytics: Option<Box<dyn AnalyticsSink>>,

    alive: bool,
}

impl Carousel {
    /// Builds the carousel inside the container `container_id` of `page`.
    ///
    /// Fails if the container does not exist or `config` is invalid. After
    /// this returns, no operation on the carousel reports an error to the
    /// caller.
    pub fn mount(
        page: &Page,
        container_id: &str,
        slides: Vec<SlideDescriptor>,
        config: CarouselConfig,
        collaborators: Collaborators,
    ) -> Result<Self, CarouselError> {
        config.validate()?;
        let mount = page
            .mount_point(container_id)
            .ok_or_else(|| CarouselError::MountPointNotFound(container_id.to_string()))?;

        let slides: Vec<Slide> = slides.into_iter().map(Slide::new).collect();
        let mut carousel = Self {
            mount,
            gesture: TouchTracker::new(config.swipe_threshold_px),
            subscription: Some(page.subscribe(container_id)),
            slides,
            config,
            state: CarouselState::default(),
            scheduler: Scheduler::new(),
            autoplay_timer: None,
            transition_timer: None,
            transition_started: Duration::ZERO,
            autoplay_wanted: false,
            paused: false,
            loader: collaborators.loader,
            completions: Some(mpsc::channel()),
            log: collaborators.log,
            analytics: collaborators.analytics,
            alive: true,
        };

        carousel.mount.view_mut().clear();
        carousel.render();
        if carousel.config.auto_play {
            carousel.start_autoplay();
        }
        carousel.preload_around(0);

        carousel.report(
            Severity::Info,
            &format!("Carousel initialised with {} slides", carousel.slides.len()),
        );
        carousel.track("carousel", "initialized", container_id.to_string());
        Ok(carousel)
    }

    /// Rebuilds the view from the slides. Assets already delivered and a
    /// running transition survive when the slide count is unchanged.
    fn render(&mut self) {
        let mut view = View::build(&self.slides, &self.config);
        if !self.slides.is_empty() {
            view.set_active(self.state.current_index, &self.config);
        }
        let mut current = self.mount.view_mut();
        if current.slides.len() == view.slides.len() {
            for (node, old) in view.slides.iter_mut().zip(current.slides.drain(..)) {
                node.asset = old.asset;
            }
            view.transition = current.transition;
        }
        *current = view;
    }

    // --- Options ---

    /// Replaces the options of a running carousel.
    ///
    /// An invalid config is rejected and the current one kept. Autoplay
    /// starts or stops when `auto_play` changes, and restarts on the new
    /// period when only `interval_ms` changes.
    pub fn set_config(&mut self, config: CarouselConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if !self.alive {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.config, config);

        // A touch in progress paused autoplay; the new tracker never sees its end
        if self.gesture.is_active() {
            self.gesture.cancel();
            self.resume();
        }
        self.gesture = TouchTracker::new(self.config.swipe_threshold_px);
        self.render();

        if self.config.auto_play != previous.auto_play {
            if self.config.auto_play {
                self.start_autoplay();
            } else {
                self.stop_autoplay();
            }
        } else if self.config.interval_ms != previous.interval_ms && self.autoplay_timer.is_some() {
            self.start_autoplay();
        }

        self.preload_around(self.state.current_index);
        self.report(Severity::Debug, "Options updated");
        Ok(())
    }

    /// Replaces the slide list.
    ///
    /// A running transition is cut short and loads still in flight for the
    /// old slides are discarded. The active index is kept when it is still
    /// valid, otherwise it goes back to 0.
    pub fn set_slides(&mut self, slides: Vec<SlideDescriptor>) {
        if !self.alive {
            return;
        }
        self.slides = slides.into_iter().map(Slide::new).collect();
        if let Some(id) = self.transition_timer.take() {
            self.scheduler.cancel(id);
        }
        self.state.is_animating = false;
        if self.state.current_index >= self.slides.len() {
            self.state.current_index = 0;
        }
        self.state.loaded_indices.clear();
        // Replies for the old slides land on the dropped receiver
        self.completions = Some(mpsc::channel());

        self.mount.view_mut().clear();
        self.render();
        if self.autoplay_wanted
            && !self.paused
            && (self.slides.is_empty() || self.autoplay_timer.is_none())
        {
            self.start_autoplay();
        }
        self.preload_around(self.state.current_index);
        self.report(
            Severity::Info,
            &format!("Slides replaced, now {} slides", self.slides.len()),
        );
    }

    // --- Navigation ---

    pub fn next(&mut self) {
        let result = self.step(Direction::Next);
        self.note_rejection(result);
    }

    pub fn prev(&mut self) {
        let result = self.step(Direction::Prev);
        self.note_rejection(result);
    }

    pub fn go_to(&mut self, index: usize) {
        let result = self.transition_to(index, None);
        self.note_rejection(result);
    }

    fn step(&mut self, direction: Direction) -> Result<(), NavigationRejected> {
        self.check_navigable()?;
        let len = self.slides.len();
        let current = self.state.current_index;
        let target = match direction {
            Direction::Next if current + 1 < len => current + 1,
            Direction::Next if self.config.infinite => 0,
            Direction::Next => return Err(NavigationRejected::AtBoundary("last")),
            Direction::Prev if current > 0 => current - 1,
            Direction::Prev if self.config.infinite => len - 1,
            Direction::Prev => return Err(NavigationRejected::AtBoundary("first")),
        };
        self.transition_to(target, Some(direction))
    }

    fn check_navigable(&self) -> Result<(), NavigationRejected> {
        if !self.alive {
            return Err(NavigationRejected::Destroyed);
        }
        if self.slides.is_empty() {
            return Err(NavigationRejected::Empty);
        }
        if self.state.is_animating {
            return Err(NavigationRejected::Animating);
        }
        Ok(())
    }

    fn transition_to(
        &mut self,
        index: usize,
        direction: Option<Direction>,
    ) -> Result<(), NavigationRejected> {
        self.check_navigable()?;
        let from = self.state.current_index;
        if index == from {
            return Ok(());
        }
        if index >= self.slides.len() {
            return Err(NavigationRejected::OutOfRange {
                index,
                len: self.slides.len(),
            });
        }

        let direction = direction.unwrap_or(if index > from {
            Direction::Next
        } else {
            Direction::Prev
        });
        self.state.direction = direction;
        self.state.is_animating = true;
        self.state.current_index = index;
        self.transition_started = self.scheduler.now();
        self.transition_timer = Some(
            self.scheduler
                .schedule_once(self.config.transition(), TimerKind::TransitionEnd),
        );

        {
            let mut view = self.mount.view_mut();
            view.set_active(index, &self.config);
            view.transition = Some(Transition {
                from,
                to: index,
                direction,
                effect: self.config.effect,
                progress: 0.0,
            });
        }

        self.preload_around(index);
        self.report(Severity::Debug, &format!("Slide {from} -> {index}"));
        self.track("carousel", "slide_changed", format!("from_{from}_to_{index}"));
        Ok(())
    }

    fn finish_transition(&mut self) {
        self.state.is_animating = false;
        self.transition_timer = None;
        self.mount.view_mut().transition = None;
    }

    fn note_rejection(&self, result: Result<(), NavigationRejected>) {
        let Err(reason) = result else { return };
        let severity = match reason {
            NavigationRejected::OutOfRange { .. } => Severity::Error,
            _ => Severity::Debug,
        };
        self.report(severity, &format!("Navigation rejected: {reason}"));
    }

    // --- Autoplay ---

    pub fn start_autoplay(&mut self) {
        self.cancel_autoplay_timer();
        if !self.alive {
            return;
        }
        self.autoplay_wanted = true;
        self.paused = false;
        if self.slides.is_empty() {
            return;
        }
        self.autoplay_timer = Some(
            self.scheduler
                .schedule_repeating(self.config.interval(), TimerKind::Autoplay),
        );
        self.state.autoplay_active = true;
    }

    pub fn stop_autoplay(&mut self) {
        self.cancel_autoplay_timer();
        self.autoplay_wanted = false;
        self.paused = false;
    }

    /// Suspends autoplay without forgetting that it was running.
    pub fn pause(&mut self) {
        if self.autoplay_wanted {
            self.cancel_autoplay_timer();
            self.paused = true;
        }
    }

    /// Restarts autoplay if it was running when [`pause`](Self::pause) was
    /// called.
    pub fn resume(&mut self) {
        if self.paused && self.autoplay_wanted && self.autoplay_timer.is_none() {
            self.start_autoplay();
        }
        self.paused = false;
    }

    fn cancel_autoplay_timer(&mut self) {
        if let Some(id) = self.autoplay_timer.take() {
            self.scheduler.cancel(id);
        }
        self.state.autoplay_active = false;
    }

    // --- Lazy loading ---

    /// Indices within `preload_count` of `center`. Distance wraps around
    /// when the carousel is infinite. Every index when lazy loading is off.
    fn preload_window(&self, center: usize) -> BTreeSet<usize> {
        let len = self.slides.len();
        let mut window = BTreeSet::new();
        if len == 0 {
            return window;
        }
        if !self.config.lazy_load {
            window.extend(0..len);
            return window;
        }
        let reach = self.config.preload_count.min(len);
        if self.config.infinite {
            for offset in 0..=reach {
                let offset = offset % len;
                window.insert((center + offset) % len);
                window.insert((center + len - offset) % len);
            }
        } else {
            let last = (center + reach).min(len - 1);
            window.extend(center.saturating_sub(reach)..=last);
        }
        window
    }

    fn preload_around(&mut self, center: usize) {
        for index in self.preload_window(center) {
            self.request_load(index);
        }
    }

    /// Reports that the slide at `index` entered the viewport.
    pub fn notify_visible(&mut self, index: usize) {
        if self.alive && index < self.slides.len() {
            self.request_load(index);
        }
    }

    fn request_load(&mut self, index: usize) {
        let Some((reply, _)) = &self.completions else { return };
        let Some(slide) = self.slides.get_mut(index) else { return };
        if !slide.mark_requested() {
            return;
        }
        self.state.loaded_indices.insert(index);
        let request = LoadRequest {
            index,
            url: slide.descriptor.url.clone(),
            reply: reply.clone(),
        };
        if let Some(node) = self.mount.view_mut().slides.get_mut(index) {
            node.load = LoadState::Requested;
        }
        self.loader.load(request);
    }

    fn drain_completions(&mut self) {
        let Some((_, rx)) = &self.completions else { return };
        let done: Vec<LoadCompletion> = rx.try_iter().collect();
        for completion in done {
            self.apply_completion(completion);
        }
    }

    fn apply_completion(&mut self, completion: LoadCompletion) {
        let index = completion.index;
        let Some(slide) = self.slides.get_mut(index) else {
            self.report(
                Severity::Warning,
                &format!("Load completion for unknown slide {index}"),
            );
            return;
        };
        match completion.result {
            Ok(asset) => {
                slide.mark_loaded();
                if let Some(node) = self.mount.view_mut().slides.get_mut(index) {
                    node.load = LoadState::Loaded;
                    node.asset = Some(Rc::new(asset));
                }
                self.track("image", "loaded", format!("slide_{index}"));
            }
            Err(e) => {
                slide.mark_unavailable();
                let state = slide.load;
                if let Some(node) = self.mount.view_mut().slides.get_mut(index) {
                    node.load = state;
                }
                self.note_load_failure(index, &e);
            }
        }
    }

    /// Reports that a delivered asset cannot be shown, typically because its
    /// bytes do not decode. The slide falls back to the unavailable
    /// placeholder and is not requested again.
    pub fn reject_asset(&mut self, index: usize, error: AssetLoadError) {
        if !self.alive {
            return;
        }
        let Some(slide) = self.slides.get_mut(index) else { return };
        slide.load = LoadState::Unavailable;
        if let Some(node) = self.mount.view_mut().slides.get_mut(index) {
            node.load = LoadState::Unavailable;
            node.asset = None;
        }
        self.note_load_failure(index, &error);
    }

    fn note_load_failure(&self, index: usize, error: &AssetLoadError) {
        self.report(
            Severity::Warning,
            &format!("Image {index} unavailable: {error}"),
        );
        self.track("error", "image_load_failed", format!("slide_{index}"));
    }

    // --- Events ---

    /// Applies one page event. Events delivered through the page
    /// subscription are handled by [`update`](Self::update).
    pub fn handle_event(&mut self, event: InputEvent) {
        if !self.alive {
            return;
        }
        match event {
            InputEvent::Key(key) if self.config.keyboard_enabled => match key {
                Key::ArrowLeft => self.prev(),
                Key::ArrowRight => self.next(),
                Key::Home => self.go_to(0),
                Key::End => {
                    if let Some(last) = self.slides.len().checked_sub(1) {
                        self.go_to(last);
                    }
                }
            },
            InputEvent::Key(_) => {}
            InputEvent::TouchStart { x, y } if self.config.touch_enabled => {
                self.gesture.begin(x, y);
                self.pause();
            }
            InputEvent::TouchMove { x, y } if self.config.touch_enabled => {
                self.gesture.moved(x, y);
            }
            InputEvent::TouchEnd { x, y } if self.config.touch_enabled => {
                if let Some(outcome) = self.gesture.end(x, y) {
                    match outcome {
                        GestureOutcome::Swipe(Swipe::Next) => self.next(),
                        GestureOutcome::Swipe(Swipe::Prev) => self.prev(),
                        GestureOutcome::Scroll | GestureOutcome::Tap => {}
                    }
                    self.resume();
                }
            }
            InputEvent::TouchStart { .. } | InputEvent::TouchMove { .. } | InputEvent::TouchEnd { .. } => {}
            InputEvent::Visibility { visible: false } => self.pause(),
            InputEvent::Visibility { visible: true } => self.resume(),
            InputEvent::IndicatorClick(index) => self.go_to(index),
            InputEvent::PrevClick => self.prev(),
            InputEvent::NextClick => self.next(),
            InputEvent::SlideVisible(index) => self.notify_visible(index),
        }
    }

    /// Advances the engine clock by `dt`: handles queued page events and
    /// finished loads, then fires every timer that falls due.
    pub fn update(&mut self, dt: Duration) {
        if !self.alive {
            return;
        }
        let events = self
            .subscription
            .as_ref()
            .map(Subscription::drain)
            .unwrap_or_default();
        for event in events {
            self.handle_event(event);
        }
        self.drain_completions();

        let target = self.scheduler.now() + dt;
        while let Some((id, kind)) = self.scheduler.pop_due(target) {
            match kind {
                TimerKind::Autoplay => self.next(),
                TimerKind::TransitionEnd if self.transition_timer == Some(id) => {
                    self.finish_transition()
                }
                TimerKind::TransitionEnd => {}
            }
        }
        self.scheduler.advance_to(target);
        self.refresh_progress();
    }

    fn refresh_progress(&mut self) {
        if self.transition_timer.is_none() {
            return;
        }
        let elapsed = self.scheduler.now().saturating_sub(self.transition_started);
        let progress = (elapsed.as_secs_f32() / self.config.transition().as_secs_f32()).min(1.0);
        if let Some(transition) = self.mount.view_mut().transition.as_mut() {
            transition.progress = progress;
        }
    }

    // --- Teardown ---

    /// Cancels timers, unsubscribes from the page, discards pending load
    /// results and empties the container. Idempotent.
    pub fn destroy(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.scheduler.clear();
        self.autoplay_timer = None;
        self.transition_timer = None;
        self.autoplay_wanted = false;
        self.paused = false;
        self.state.autoplay_active = false;
        self.state.is_animating = false;
        self.gesture.cancel();
        self.subscription = None;
        self.completions = None;
        self.mount.view_mut().clear();
        self.report(Severity::Info, "Carousel destroyed");
    }

    // --- Queries ---

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.autoplay_timer.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    pub fn loaded_indices(&self) -> &BTreeSet<usize> {
        &self.state.loaded_indices
    }

    pub fn load_state(&self, index: usize) -> Option<LoadState> {
        self.slides.get(index).map(|s| s.load)
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.slides.get(index).is_some_and(Slide::is_loaded)
    }

    pub fn slide(&self, index: usize) -> Option<&SlideDescriptor> {
        self.slides.get(index).map(|s| &s.descriptor)
    }

    pub fn state(&self) -> &CarouselState {
        &self.state
    }

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    pub fn mount_point(&self) -> &MountPoint {
        &self.mount
    }

    /// Number of live timers (autoplay plus a running transition).
    pub fn pending_timers(&self) -> usize {
        self.scheduler.active()
    }

    pub fn snapshot(&self) -> CarouselSnapshot {
        CarouselSnapshot {
            current_slide: self.state.current_index,
            total_slides: self.slides.len(),
            is_playing: self.is_playing(),
            is_animating: self.state.is_animating,
            direction: self.state.direction,
            loaded_images: (0..self.slides.len()).filter(|&i| self.is_loaded(i)).collect(),
            requested_images: self.state.loaded_indices.iter().copied().collect(),
            options: self.config.clone(),
        }
    }

    // --- Collaborators ---

    fn report(&self, severity: Severity, message: &str) {
        log::log!(target: "carousel", log::Level::from(severity), "{message}");
        if let Some(sink) = &self.log {
            sink.log(severity, message);
        }
    }

    fn track(&self, category: &str, action: &str, label: String) {
        let Some(sink) = &self.analytics else { return };
        let event = AnalyticsEvent::new(category, action, label);
        if let Err(e) = sink.track(&event) {
            log::debug!(target: "carousel", "Analytics event dropped: {e}");
        }
    }
}

impl Drop for Carousel {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadRequest;

    struct NullLoader;

    impl AssetLoader for NullLoader {
        fn load(&mut self, _request: LoadRequest) {}
    }

    fn carousel(n: usize, infinite: bool, preload_count: usize) -> (Page, Carousel) {
        let page = Page::new();
        page.add_container("c");
        let slides = (0..n)
            .map(|i| SlideDescriptor::new(format!("{i}.png"), "", ""))
            .collect();
        let config = CarouselConfig {
            auto_play: false,
            infinite,
            preload_count,
            ..CarouselConfig::default()
        };
        let c = Carousel::mount(&page, "c", slides, config, Collaborators::new(NullLoader)).unwrap();
        (page, c)
    }

    fn window(c: &Carousel, center: usize) -> Vec<usize> {
        c.preload_window(center).into_iter().collect()
    }

    #[test]
    fn finite_window_is_clamped() {
        let (_page, c) = carousel(6, false, 2);
        assert_eq!(window(&c, 0), vec![0, 1, 2]);
        assert_eq!(window(&c, 3), vec![1, 2, 3, 4, 5]);
        assert_eq!(window(&c, 5), vec![3, 4, 5]);
    }

    #[test]
    fn infinite_window_wraps() {
        let (_page, c) = carousel(6, true, 2);
        assert_eq!(window(&c, 0), vec![0, 1, 2, 4, 5]);
        assert_eq!(window(&c, 5), vec![0, 1, 3, 4, 5]);
    }

    #[test]
    fn window_larger_than_carousel_covers_everything() {
        let (_page, c) = carousel(3, true, 10);
        assert_eq!(window(&c, 1), vec![0, 1, 2]);
        let (_page, c) = carousel(3, false, 10);
        assert_eq!(window(&c, 1), vec![0, 1, 2]);
    }

    #[test]
    fn eager_window_covers_everything() {
        let (_page, mut c) = carousel(5, false, 1);
        c.config.lazy_load = false;
        assert_eq!(window(&c, 2), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn stale_transition_timer_is_ignored() {
        let (_page, mut c) = carousel(4, true, 0);
        c.next();
        let current = c.transition_timer;
        c.transition_timer = None;
        c.update(Duration::from_millis(500));
        assert!(c.is_animating());
        assert_eq!(c.pending_timers(), 0);
        assert!(current.is_some());
    }

    #[test]
    fn autoplay_sets_state_flag() {
        let (_page, mut c) = carousel(3, true, 0);
        c.start_autoplay();
        assert!(c.state().autoplay_active);
        c.pause();
        assert!(!c.state().autoplay_active);
        c.resume();
        assert!(c.state().autoplay_active);
        c.destroy();
        assert!(!c.state().autoplay_active);
    }
}
