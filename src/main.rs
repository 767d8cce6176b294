//! TERRAVIEW: a tile-world viewer
//!
//! Renders a simulated world (terrain cells plus wandering entities) to
//! a raster display at a fixed frame rate:
//! - Two cached software layers (terrain, entities), composited per tick
//! - Terrain shaded by normalized elevation over a material palette
//! - World regeneration on a background thread with staged progress,
//!   so the display never freezes mid-regen

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod config;
mod palette;
mod raster;
mod regen;
mod render;
mod world;

use app::App;
use config::AppConfig;
use macroquad::prelude::*;
use regen::OverlayState;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("TERRAVIEW v{}", VERSION),
        window_width: 900,
        window_height: 900,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    #[cfg(not(target_arch = "wasm32"))]
    let config = AppConfig::load_or_default(config::CONFIG_PATH);
    // WASM has no working directory to read a config from
    #[cfg(target_arch = "wasm32")]
    let config = AppConfig::default();

    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            // Bad palette or a broken snapshot contract - nothing sane to show
            eprintln!("Could not render the initial world: {}", e);
            return;
        }
    };

    println!("=== TERRAVIEW ===");
    println!("Space step | A run/pause | R respawn entities | Shift+R new world | F fps cap | F12 screenshot | Esc quit");

    loop {
        // Track frame start time for FPS limiting
        let frame_start = get_time();

        // 1. Input
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        if is_key_pressed(KeyCode::Space) && app.overlay.is_idle() {
            app.advance();
        }
        if is_key_pressed(KeyCode::A) {
            app.auto_run = !app.auto_run;
            let label = if app.auto_run { "Running" } else { "Paused" };
            app.set_status(label, get_time(), 2.0);
        }
        if is_key_pressed(KeyCode::R) {
            // Plain R keeps the terrain; shift regenerates it too
            let preserve = !(is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift));
            app.request_regen(preserve);
        }
        if is_key_pressed(KeyCode::F) {
            app.fps_limit = app.fps_limit.next();
            app.set_status(&format!("FPS cap: {}", app.fps_limit.label()), get_time(), 2.0);
        }
        #[cfg(not(target_arch = "wasm32"))]
        if is_key_pressed(KeyCode::F12) {
            save_screenshot(&mut app);
        }
        if app.auto_run && app.overlay.is_idle() {
            app.advance();
        }

        // 2. Rebuild the entity layer if the snapshot changed
        app.refresh_entity_layer();

        // 3. Pump the regeneration coordinator (never blocks)
        app.pump_regen(get_time());

        // 4. Composite and present
        app.refresh_frame();
        present(&app);

        // FPS limiting
        if let Some(target_frame_time) = app.fps_limit.frame_time() {
            let elapsed = get_time() - frame_start;
            let remaining = target_frame_time - elapsed;

            if remaining > 0.0 {
                // Native: use sleep for bulk, then spin-wait for precision
                #[cfg(not(target_arch = "wasm32"))]
                {
                    let spin_margin = 0.002; // 2ms
                    while get_time() - frame_start + spin_margin < target_frame_time {
                        std::thread::sleep(std::time::Duration::from_millis(1));
                    }
                    // Spin-wait for precise timing
                    while get_time() - frame_start < target_frame_time {
                        std::hint::spin_loop();
                    }
                }
                // WASM: just spin-wait (no thread::sleep available)
                #[cfg(target_arch = "wasm32")]
                {
                    while get_time() - frame_start < target_frame_time {
                        // Busy wait - browser will handle frame pacing
                    }
                }
            }
        }

        next_frame().await;
    }
}

/// Draw the retained frame scaled to the window, plus the regeneration
/// overlay and the HUD. The frame itself is world-sized; all
/// magnification happens here, as a nearest-neighbor upscale.
fn present(app: &App) {
    clear_background(Color::from_rgba(10, 10, 12, 255));

    let texture = Texture2D::from_rgba8(
        app.frame.width() as u16,
        app.frame.height() as u16,
        app.frame.pixels(),
    );
    texture.set_filter(FilterMode::Nearest);

    // Calculate draw area maintaining the world's aspect ratio
    let fb_aspect = app.frame.width() as f32 / app.frame.height() as f32;
    let screen_aspect = screen_width() / screen_height();
    let (draw_w, draw_h, draw_x, draw_y) = if fb_aspect > screen_aspect {
        let w = screen_width();
        let h = w / fb_aspect;
        (w, h, 0.0, (screen_height() - h) * 0.5)
    } else {
        let h = screen_height();
        let w = h * fb_aspect;
        (w, h, (screen_width() - w) * 0.5, 0.0)
    };

    draw_texture_ex(
        &texture,
        draw_x,
        draw_y,
        WHITE,
        DrawTextureParams {
            dest_size: Some(vec2(draw_w, draw_h)),
            ..Default::default()
        },
    );

    // Regeneration overlay: dim the retained frame, show the stage
    if let OverlayState::Regenerating(stage) = app.overlay {
        draw_rectangle(draw_x, draw_y, draw_w, draw_h, Color::from_rgba(0, 0, 0, 160));
        let label = stage.label();
        let dims = measure_text(label, None, 32, 1.0);
        draw_text(
            label,
            draw_x + (draw_w - dims.width) * 0.5,
            draw_y + draw_h * 0.5,
            32.0,
            WHITE,
        );
    }

    let hud = format!(
        "tick {}   entities {}/{}   cap {}{}",
        app.world.tick(),
        app.world.alive_count(),
        app.world.entity_count(),
        app.fps_limit.label(),
        if app.auto_run { "   running" } else { "" },
    );
    draw_text(&hud, 8.0, 20.0, 20.0, WHITE);

    if let Some(message) = app.status(get_time()) {
        draw_text(message, 8.0, screen_height() - 12.0, 20.0, YELLOW);
    }
}

/// Dump the current composed frame as a PNG under screenshots/.
#[cfg(not(target_arch = "wasm32"))]
fn save_screenshot(app: &mut App) {
    let dir = std::path::Path::new("screenshots");
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Could not create {}: {}", dir.display(), e);
        return;
    }

    let path = dir.join(format!("terraview-{:06}.png", app.world.tick()));
    let result = image::save_buffer(
        &path,
        app.frame.pixels(),
        app.frame.width() as u32,
        app.frame.height() as u32,
        image::ExtendedColorType::Rgba8,
    );
    match result {
        Ok(()) => {
            println!("Saved {}", path.display());
            app.set_status(&format!("Saved {}", path.display()), get_time(), 3.0);
        }
        Err(e) => {
            eprintln!("Screenshot failed: {}", e);
            app.set_status(&format!("Screenshot failed: {}", e), get_time(), 5.0);
        }
    }
}
