//! The host page: named containers and the events delivered to them.
//!
//! A component looks its container up with [`Page::mount_point`] and listens
//! with [`Page::subscribe`]. The returned [`Subscription`] unregisters itself
//! when dropped, so tearing a component down can never leave a listener
//! behind.

use crate::view::View;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd { x: f32, y: f32 },
    /// Page visibility changed (tab hidden, window minimised).
    Visibility { visible: bool },
    IndicatorClick(usize),
    PrevClick,
    NextClick,
    /// The slide at this index entered the viewport.
    SlideVisible(usize),
}

/// Handle to a container a component renders into.
#[derive(Debug, Clone)]
pub struct MountPoint {
    id: String,
    view: Rc<RefCell<View>>,
}

impl MountPoint {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn view(&self) -> Ref<'_, View> {
        self.view.borrow()
    }

    pub(crate) fn view_mut(&self) -> RefMut<'_, View> {
        self.view.borrow_mut()
    }
}

type Queue = Rc<RefCell<VecDeque<InputEvent>>>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, String, Queue)>,
}

/// Listener registration. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    queue: Queue,
    registry: Weak<RefCell<Listeners>>,
}

impl Subscription {
    /// Takes every event delivered since the last call.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().entries.retain(|(id, _, _)| *id != self.id);
        }
    }
}

#[derive(Default)]
pub struct Page {
    containers: RefCell<HashMap<String, MountPoint>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or returns the existing) container with this id.
    pub fn add_container(&self, id: &str) -> MountPoint {
        self.containers
            .borrow_mut()
            .entry(id.to_string())
            .or_insert_with(|| MountPoint {
                id: id.to_string(),
                view: Rc::new(RefCell::new(View::default())),
            })
            .clone()
    }

    pub fn mount_point(&self, id: &str) -> Option<MountPoint> {
        self.containers.borrow().get(id).cloned()
    }

    pub fn subscribe(&self, target: &str) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        let queue: Queue = Rc::default();
        listeners.entries.push((id, target.to_string(), queue.clone()));
        Subscription {
            id,
            queue,
            registry: Rc::downgrade(&self.listeners),
        }
    }

    /// Queues `event` for every listener on `target`. Returns how many
    /// listeners received it.
    pub fn dispatch(&self, target: &str, event: InputEvent) -> usize {
        let listeners = self.listeners.borrow();
        let mut delivered = 0;
        for (_, t, queue) in listeners.entries.iter() {
            if t == target {
                queue.borrow_mut().push_back(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_container_is_none() {
        let page = Page::new();
        page.add_container("hero");
        assert!(page.mount_point("hero").is_some());
        assert!(page.mount_point("about").is_none());
    }

    #[test]
    fn mount_points_share_the_view() {
        let page = Page::new();
        let a = page.add_container("hero");
        let b = page.mount_point("hero").unwrap();
        a.view_mut().live_region = "hello".into();
        assert_eq!(b.view().live_region, "hello");
        assert_eq!(b.id(), "hero");
    }

    #[test]
    fn dispatch_reaches_only_target_listeners() {
        let page = Page::new();
        let hero = page.subscribe("hero");
        let about = page.subscribe("about");
        assert_eq!(page.dispatch("hero", InputEvent::NextClick), 1);
        assert_eq!(hero.drain(), vec![InputEvent::NextClick]);
        assert!(about.drain().is_empty());
        assert!(hero.drain().is_empty());
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let page = Page::new();
        for _ in 0..5 {
            let sub = page.subscribe("hero");
            assert_eq!(page.listener_count(), 1);
            drop(sub);
        }
        assert_eq!(page.listener_count(), 0);
        assert_eq!(page.dispatch("hero", InputEvent::PrevClick), 0);
    }

    #[test]
    fn subscription_outliving_page_drops_cleanly() {
        let page = Page::new();
        let sub = page.subscribe("hero");
        drop(page);
        assert!(sub.drain().is_empty());
        drop(sub);
    }
}
