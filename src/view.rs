//! Visual nodes the engine renders into its mount point.
//!
//! The view is a plain model: the engine writes it, and whatever displays the
//! carousel (the raylib viewer, a test) reads it back through
//! [`MountPoint::view`](crate::page::MountPoint::view).

use crate::config::{CarouselConfig, TransitionEffect};
use crate::loader::Asset;
use crate::slide::{LoadState, Slide};
use crate::state::Direction;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct SlideNode {
    pub title: String,
    pub description: String,
    pub active: bool,
    pub hidden: bool,
    pub load: LoadState,
    pub asset: Option<Rc<Asset>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
    pub effect: TransitionEffect,
    /// 0.0 at the start of the transition, 1.0 at the end.
    pub progress: f32,
}

#[derive(Debug, Clone, Default)]
pub struct View {
    pub slides: Vec<SlideNode>,
    /// One flag per indicator, true for the active slide. Empty when
    /// indicators are hidden.
    pub indicators: Vec<bool>,
    pub show_controls: bool,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    /// Text announced to assistive technology after each change.
    pub live_region: String,
    /// Horizontal track offset in percent of the slide width.
    pub track_offset: f32,
    pub transition: Option<Transition>,
}

impl View {
    pub fn build(slides: &[Slide], config: &CarouselConfig) -> Self {
        let nodes = slides
            .iter()
            .map(|s| SlideNode {
                title: s.descriptor.title.clone(),
                description: s.descriptor.description.clone(),
                active: false,
                hidden: true,
                load: s.load,
                asset: None,
            })
            .collect();
        let indicators = if config.show_indicators {
            vec![false; slides.len()]
        } else {
            Vec::new()
        };
        Self {
            slides: nodes,
            indicators,
            show_controls: config.show_controls,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.slides.iter().position(|s| s.active)
    }

    /// Marks `index` active and refreshes indicators, controls, track offset
    /// and the live region.
    pub fn set_active(&mut self, index: usize, config: &CarouselConfig) {
        let total = self.slides.len();
        for (i, node) in self.slides.iter_mut().enumerate() {
            node.active = i == index;
            node.hidden = i != index;
        }
        for (i, flag) in self.indicators.iter_mut().enumerate() {
            *flag = i == index;
        }
        if config.show_controls && !config.infinite {
            self.prev_disabled = index == 0;
            self.next_disabled = index + 1 >= total;
        } else {
            self.prev_disabled = false;
            self.next_disabled = false;
        }
        if config.effect == TransitionEffect::Slide {
            self.track_offset = -(index as f32 * 100.0);
        }
        if let Some(node) = self.slides.get(index) {
            self.live_region = format!("Slide {} of {}: {}", index + 1, total, node.title);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::SlideDescriptor;

    fn slides(n: usize) -> Vec<Slide> {
        (0..n)
            .map(|i| Slide::new(SlideDescriptor::new(format!("{i}.jpg"), format!("Slide {i}"), "")))
            .collect()
    }

    #[test]
    fn build_without_indicators() {
        let config = CarouselConfig {
            show_indicators: false,
            ..CarouselConfig::default()
        };
        let view = View::build(&slides(3), &config);
        assert_eq!(view.slides.len(), 3);
        assert!(view.indicators.is_empty());
        assert_eq!(view.active_index(), None);
    }

    #[test]
    fn set_active_updates_everything() {
        let config = CarouselConfig::default();
        let mut view = View::build(&slides(4), &config);
        view.set_active(2, &config);
        assert_eq!(view.active_index(), Some(2));
        assert_eq!(view.indicators, vec![false, false, true, false]);
        assert!(view.slides[0].hidden);
        assert!(!view.slides[2].hidden);
        assert_eq!(view.track_offset, -200.0);
        assert_eq!(view.live_region, "Slide 3 of 4: Slide 2");
    }

    #[test]
    fn finite_carousel_disables_controls_at_edges() {
        let config = CarouselConfig {
            infinite: false,
            ..CarouselConfig::default()
        };
        let mut view = View::build(&slides(3), &config);
        view.set_active(0, &config);
        assert!(view.prev_disabled);
        assert!(!view.next_disabled);
        view.set_active(2, &config);
        assert!(!view.prev_disabled);
        assert!(view.next_disabled);
    }

    #[test]
    fn fade_effect_keeps_track_still() {
        let config = CarouselConfig {
            effect: TransitionEffect::Fade,
            ..CarouselConfig::default()
        };
        let mut view = View::build(&slides(3), &config);
        view.set_active(2, &config);
        assert_eq!(view.track_offset, 0.0);
    }

    #[test]
    fn clear_empties_the_container() {
        let config = CarouselConfig::default();
        let mut view = View::build(&slides(2), &config);
        view.set_active(1, &config);
        view.clear();
        assert!(view.is_empty());
        assert!(view.live_region.is_empty());
    }
}
