use std::collections::HashMap;
use std::time::Duration;
use anyhow::{anyhow, Result};
use raylib::prelude::*;
use carousel::constants::*;
use carousel::loader::Asset;
use carousel::slide::LoadState;
use carousel::view::{Transition, View};
use carousel::{AssetLoadError, Carousel, Direction, InputEvent, Key, Page, TransitionEffect};

const INDICATOR_RADIUS: f32 = 6.0;
const INDICATOR_SPACING: i32 = 24;

// --- Decode Asset Bytes, Apply EXIF Rotation, Create Texture ---
fn load_texture(rl: &mut RaylibHandle, thread: &RaylibThread, asset: &Asset) -> Result<Texture2D> {
    let mut image = Image::load_image_from_mem(&(".".to_string() + &asset.extension), &asset.bytes)
        .map_err(|e| anyhow!("Failed to decode image: {}", e))?;

    // 3 = 180 deg, 6 = 90 deg CW, 8 = 90 deg CCW; flips are ignored
    match asset.orientation {
        3 => {
            image.rotate_cw();
            image.rotate_cw();
        }
        6 => image.rotate_cw(),
        8 => image.rotate_ccw(),
        _ => {}
    }

    rl.load_texture_from_image(thread, &image)
        .map_err(|e| anyhow!("Failed to create texture: {}", e))
}

fn indicator_center(index: usize, count: usize, screen_w: i32, screen_h: i32) -> (i32, i32) {
    let total = (count as i32 - 1) * INDICATOR_SPACING;
    let x = screen_w / 2 - total / 2 + index as i32 * INDICATOR_SPACING;
    (x, screen_h - 24)
}

fn hit_indicator(view: &View, x: f32, y: f32, screen_w: i32, screen_h: i32) -> Option<usize> {
    (0..view.indicators.len()).find(|&i| {
        let (cx, cy) = indicator_center(i, view.indicators.len(), screen_w, screen_h);
        let dx = x - cx as f32;
        let dy = y - cy as f32;
        dx * dx + dy * dy <= (INDICATOR_RADIUS * 2.0).powi(2)
    })
}

/// Translates window input into page events for the carousel container.
fn dispatch_input(rl: &RaylibHandle, page: &Page, container: &str, view: &View, focused: &mut bool) {
    let keys = [
        (KeyboardKey::KEY_LEFT, Key::ArrowLeft),
        (KeyboardKey::KEY_RIGHT, Key::ArrowRight),
        (KeyboardKey::KEY_HOME, Key::Home),
        (KeyboardKey::KEY_END, Key::End),
    ];
    for (raylib_key, key) in keys {
        if rl.is_key_pressed(raylib_key) {
            page.dispatch(container, InputEvent::Key(key));
        }
    }

    // The mouse stands in for a touch screen
    let pos = rl.get_mouse_position();
    if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
        page.dispatch(container, InputEvent::TouchStart { x: pos.x, y: pos.y });
    } else if rl.is_mouse_button_down(MouseButton::MOUSE_BUTTON_LEFT) {
        page.dispatch(container, InputEvent::TouchMove { x: pos.x, y: pos.y });
    } else if rl.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT) {
        page.dispatch(container, InputEvent::TouchEnd { x: pos.x, y: pos.y });
        if let Some(i) = hit_indicator(view, pos.x, pos.y, rl.get_screen_width(), rl.get_screen_height()) {
            page.dispatch(container, InputEvent::IndicatorClick(i));
        }
    }

    let now_focused = rl.is_window_focused();
    if now_focused != *focused {
        *focused = now_focused;
        page.dispatch(container, InputEvent::Visibility { visible: now_focused });
    }
}

fn draw_slide(
    d: &mut RaylibDrawHandle,
    view: &View,
    textures: &HashMap<usize, Texture2D>,
    index: usize,
    offset_x: f32,
    alpha: f32,
) {
    let Some(node) = view.slides.get(index) else { return };
    let screen_w = d.get_screen_width() as f32;
    let screen_h = d.get_screen_height() as f32;
    let tint = Color::new(255, 255, 255, (alpha.clamp(0.0, 1.0) * 255.0) as u8);

    match (node.load, textures.get(&index)) {
        (LoadState::Loaded, Some(texture)) => {
            let tex_w = texture.width() as f32;
            let tex_h = texture.height() as f32;
            // Fit inside 90% of the window, never upscale
            let scale = (screen_w * 0.9 / tex_w).min(screen_h * 0.9 / tex_h).min(1.0);
            let w = tex_w * scale;
            let h = tex_h * scale;
            d.draw_texture_pro(
                texture,
                Rectangle::new(0.0, 0.0, tex_w, tex_h),
                Rectangle::new((screen_w - w) * 0.5 + offset_x, (screen_h - h) * 0.5, w, h),
                Vector2::new(0.0, 0.0),
                0.0,
                tint,
            );
        }
        (LoadState::Unavailable, _) => {
            d.draw_text("Image unavailable", (screen_w * 0.5 + offset_x) as i32 - 90, (screen_h * 0.5) as i32, 20, Color::GRAY);
        }
        _ => {
            d.draw_text("Loading...", (screen_w * 0.5 + offset_x) as i32 - 50, (screen_h * 0.5) as i32, 20, Color::DARKGRAY);
        }
    }

    if alpha > 0.5 {
        let text_x = (40.0 + offset_x) as i32;
        d.draw_text(&node.title, text_x, screen_h as i32 - 110, 28, Color::WHITE);
        d.draw_text(&node.description, text_x, screen_h as i32 - 74, 18, Color::LIGHTGRAY);
    }
}

fn draw_view(d: &mut RaylibDrawHandle, view: &View, textures: &HashMap<usize, Texture2D>) {
    d.clear_background(Color::BLACK);
    let screen_w = d.get_screen_width();
    let screen_h = d.get_screen_height();

    match view.transition {
        Some(Transition { from, to, direction, effect, progress }) => {
            let t = 1.0 - (1.0 - progress).powi(3); // easeOutCubic
            match effect {
                TransitionEffect::Slide => {
                    let sign = if direction == Direction::Next { 1.0 } else { -1.0 };
                    let w = screen_w as f32;
                    draw_slide(d, view, textures, from, -sign * t * w, 1.0);
                    draw_slide(d, view, textures, to, sign * (1.0 - t) * w, 1.0);
                }
                TransitionEffect::Fade => {
                    draw_slide(d, view, textures, from, 0.0, 1.0 - t);
                    draw_slide(d, view, textures, to, 0.0, t);
                }
            }
        }
        None => {
            if let Some(active) = view.active_index() {
                draw_slide(d, view, textures, active, 0.0, 1.0);
            }
        }
    }

    if view.show_controls {
        let prev = if view.prev_disabled { Color::DARKGRAY } else { Color::WHITE };
        let next = if view.next_disabled { Color::DARKGRAY } else { Color::WHITE };
        d.draw_text("<", 16, screen_h / 2 - 20, 40, prev);
        d.draw_text(">", screen_w - 40, screen_h / 2 - 20, 40, next);
    }

    for (i, active) in view.indicators.iter().enumerate() {
        let (x, y) = indicator_center(i, view.indicators.len(), screen_w, screen_h);
        let color = if *active { Color::WHITE } else { Color::GRAY };
        d.draw_circle(x, y, INDICATOR_RADIUS, color);
    }

    d.draw_text(&view.live_region, 10, 10, 16, Color::LIGHTGRAY);
}

pub fn run(page: &Page, container: &str, carousel: &mut Carousel) -> Result<()> {
    let (mut rl, thread) = raylib::init()
        .size(RENDER_WIDTH, RENDER_HEIGHT)
        .title("Carousel")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    let mut textures: HashMap<usize, Texture2D> = HashMap::new();
    let mut focused = true;

    // --- Main Loop ---
    while !rl.window_should_close() {
        {
            let view = carousel.mount_point().view();
            dispatch_input(&rl, page, container, &view, &mut focused);
        }

        let dt = rl.get_frame_time();
        carousel.update(Duration::from_secs_f32(dt));

        // Upload newly loaded images
        let pending: Vec<(usize, std::rc::Rc<Asset>)> = carousel
            .mount_point()
            .view()
            .slides
            .iter()
            .enumerate()
            .filter(|(i, _)| !textures.contains_key(i))
            .filter_map(|(i, node)| node.asset.clone().map(|a| (i, a)))
            .collect();
        for (i, asset) in pending {
            match load_texture(&mut rl, &thread, &asset) {
                Ok(texture) => {
                    textures.insert(i, texture);
                }
                // The engine drops the asset, so the upload is not retried
                Err(e) => carousel.reject_asset(i, AssetLoadError::Decode(e.to_string())),
            }
        }

        let view = carousel.mount_point().view();
        let mut d = rl.begin_drawing(&thread);
        draw_view(&mut d, &view, &textures);
    }

    Ok(())
}
