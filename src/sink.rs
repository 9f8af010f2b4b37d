//! Optional logging and analytics collaborators.
//!
//! Both sinks take `&self` so a caller can keep an `Rc` to the sink it hands
//! to the engine and inspect it later.

use crate::constants::ANALYTICS_BUFFER;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl From<Severity> for log::Level {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

pub trait LogSink {
    fn log(&self, severity: Severity, message: &str);
}

impl<T: LogSink + ?Sized> LogSink for Rc<T> {
    fn log(&self, severity: Severity, message: &str) {
        (**self).log(severity, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEvent {
    pub category: String,
    pub action: String,
    pub label: String,
}

impl AnalyticsEvent {
    pub fn new(category: &str, action: &str, label: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            action: action.to_string(),
            label: label.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("analytics sink unavailable")]
    Unavailable,
    #[error("analytics sink rejected event: {0}")]
    Rejected(String),
}

pub trait AnalyticsSink {
    fn track(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError>;
}

impl<T: AnalyticsSink + ?Sized> AnalyticsSink for Rc<T> {
    fn track(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        (**self).track(event)
    }
}

/// In-memory analytics sink keeping the most recent events.
#[derive(Debug)]
pub struct EventBuffer {
    capacity: usize,
    events: RefCell<VecDeque<AnalyticsEvent>>,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::with_capacity(ANALYTICS_BUFFER)
    }
}

impl EventBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            events: RefCell::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.borrow().iter().cloned().collect()
    }
}

impl AnalyticsSink for EventBuffer {
    fn track(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        if self.capacity == 0 {
            return Err(AnalyticsError::Unavailable);
        }
        let mut events = self.events.borrow_mut();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_maps_to_log_level() {
        assert_eq!(log::Level::from(Severity::Warning), log::Level::Warn);
        assert_eq!(log::Level::from(Severity::Debug), log::Level::Debug);
    }

    #[test]
    fn buffer_keeps_latest_events() {
        let buffer = EventBuffer::with_capacity(2);
        for i in 0..5 {
            buffer
                .track(&AnalyticsEvent::new("carousel", "slide_changed", format!("{i}")))
                .unwrap();
        }
        let labels: Vec<_> = buffer.events().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["3", "4"]);
    }

    #[test]
    fn zero_capacity_buffer_is_unavailable() {
        let buffer = EventBuffer::with_capacity(0);
        let err = buffer
            .track(&AnalyticsEvent::new("carousel", "initialized", "hero"))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Unavailable));
        assert!(buffer.is_empty());
    }

    #[test]
    fn rc_sink_forwards() {
        let buffer = Rc::new(EventBuffer::default());
        let sink: Box<dyn AnalyticsSink> = Box::new(buffer.clone());
        sink.track(&AnalyticsEvent::new("image", "loaded", "slide_0")).unwrap();
        assert_eq!(buffer.len(), 1);
    }
}
