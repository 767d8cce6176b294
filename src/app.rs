//! Application state
//!
//! One explicitly-owned struct holds everything mutable: the engine,
//! the two cached raster layers, the composed frame, the overlay state
//! machine and the regeneration coordinator. No ambient statics - the
//! main loop owns this and passes it around.

use crate::config::AppConfig;
use crate::palette::Palette;
use crate::raster::RasterLayer;
use crate::regen::{OverlayState, RegenCoordinator, RegenOutcome, RegenStage, RegenStatus};
use crate::render::{compose, render_entities, render_terrain, RenderError};
use crate::world::WorldState;
use std::time::Duration;

/// FPS limit setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FpsLimit {
    /// Slow-motion stepping
    Fps10,
    /// Easy on laptop fans
    Fps30,
    /// Matches the original's 60 Hz clock
    #[default]
    Fps60,
    /// Unlocked (as fast as possible)
    Unlocked,
}

impl FpsLimit {
    /// Target frame time in seconds (None = unlocked)
    pub fn frame_time(&self) -> Option<f64> {
        match self {
            FpsLimit::Fps10 => Some(1.0 / 10.0),
            FpsLimit::Fps30 => Some(1.0 / 30.0),
            FpsLimit::Fps60 => Some(1.0 / 60.0),
            FpsLimit::Unlocked => None,
        }
    }

    /// Cycle to the next value
    pub fn next(self) -> Self {
        match self {
            FpsLimit::Fps10 => FpsLimit::Fps30,
            FpsLimit::Fps30 => FpsLimit::Fps60,
            FpsLimit::Fps60 => FpsLimit::Unlocked,
            FpsLimit::Unlocked => FpsLimit::Fps10,
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            FpsLimit::Fps10 => "10",
            FpsLimit::Fps30 => "30",
            FpsLimit::Fps60 => "60",
            FpsLimit::Unlocked => "MAX",
        }
    }
}

/// All mutable application state, owned by the main loop.
pub struct App {
    /// The live simulation engine
    pub world: WorldState,
    /// Material colors, immutable after startup
    pub palette: Palette,
    /// Cached terrain layer; rebuilt only when the terrain changes
    pub terrain_layer: RasterLayer,
    /// Cached entity layer; rebuilt whenever the entity snapshot changes
    pub entity_layer: RasterLayer,
    /// Last composed frame, retained so the overlay has something to
    /// draw over while a regeneration runs
    pub frame: RasterLayer,
    /// The entity snapshot changed since the layer was last built
    pub entity_stale: bool,
    /// A layer changed since the frame was last composed
    pub frame_stale: bool,
    /// Overlay state machine driven by the coordinator
    pub overlay: OverlayState,
    pub regen: RegenCoordinator,
    pub fps_limit: FpsLimit,
    /// Advance the simulation every tick instead of per keypress
    pub auto_run: bool,
    status_message: Option<(String, f64)>,
}

impl App {
    /// Build the initial state: generate a world and render both layers
    /// once. A palette that cannot cover the generated materials is a
    /// fatal configuration error.
    pub fn new(config: &AppConfig) -> Result<App, RenderError> {
        let palette = Palette::from_entries(&config.palette);
        let world = WorldState::generate(&config.world);

        let terrain_layer = render_terrain(&world.terrain_snapshot(), &palette)?;
        let (width, height) = world.dimensions();
        let entity_layer = render_entities(&world.entity_snapshot(), width, height);
        let frame = compose(&terrain_layer, &entity_layer);

        Ok(App {
            world,
            palette,
            terrain_layer,
            entity_layer,
            frame,
            entity_stale: false,
            frame_stale: false,
            overlay: OverlayState::Idle,
            regen: RegenCoordinator::new(Duration::from_secs_f64(config.regen_timeout_secs)),
            fps_limit: FpsLimit::default(),
            auto_run: false,
            status_message: None,
        })
    }

    /// Step the simulation once and mark the entity layer stale.
    pub fn advance(&mut self) {
        self.world.advance_one_tick();
        self.entity_stale = true;
    }

    /// Ask the coordinator for a regeneration. A request while one is
    /// already in flight is ignored, not an error the user sees.
    pub fn request_regen(&mut self, preserve_terrain: bool) {
        if !self.overlay.is_idle() {
            return;
        }
        if self.regen.start(&self.world, preserve_terrain).is_ok() {
            self.overlay = OverlayState::Regenerating(if preserve_terrain {
                RegenStage::AwaitingEntities
            } else {
                RegenStage::AwaitingTerrain
            });
        }
    }

    /// Rebuild the entity layer if its snapshot changed. Skipped while
    /// regenerating: the layers are about to be replaced wholesale.
    pub fn refresh_entity_layer(&mut self) {
        if !self.entity_stale || !self.overlay.is_idle() {
            return;
        }
        let (width, height) = self.world.dimensions();
        self.entity_layer = render_entities(&self.world.entity_snapshot(), width, height);
        self.entity_stale = false;
        self.frame_stale = true;
    }

    /// Drain the coordinator without blocking; apply whatever arrived.
    pub fn pump_regen(&mut self, now: f64) {
        match self.regen.poll() {
            RegenStatus::Idle => {}
            RegenStatus::Pending(stage) => self.overlay = OverlayState::Regenerating(stage),
            RegenStatus::Ready(outcome) => self.apply_regen(outcome, now),
            RegenStatus::Error(error) => {
                self.overlay = OverlayState::Idle;
                eprintln!("Regeneration failed: {}", error);
                self.set_status(&format!("Regeneration failed: {}", error), now, 5.0);
            }
        }
    }

    /// Swap in a finished regeneration: layers, engine, overlay, in one
    /// step. If the new terrain does not render, the whole swap aborts
    /// and the last valid world stays on screen.
    fn apply_regen(&mut self, outcome: RegenOutcome, now: f64) {
        if let Some(snapshot) = &outcome.terrain {
            match render_terrain(snapshot, &self.palette) {
                Ok(layer) => self.terrain_layer = layer,
                Err(error) => {
                    self.overlay = OverlayState::Idle;
                    eprintln!("Regenerated terrain unusable: {}", error);
                    self.set_status(&format!("Regeneration failed: {}", error), now, 5.0);
                    return;
                }
            }
        }

        let (width, height) = outcome.world.dimensions();
        self.entity_layer = render_entities(&outcome.entities, width, height);
        self.world = *outcome.world;
        self.entity_stale = false;
        self.frame_stale = true;
        self.overlay = OverlayState::Idle;
        self.set_status("World regenerated", now, 3.0);
    }

    /// Recompose the frame if a layer changed. The previous frame is
    /// kept as-is while a regeneration is in flight.
    pub fn refresh_frame(&mut self) {
        if self.frame_stale && self.overlay.is_idle() {
            self.frame = compose(&self.terrain_layer, &self.entity_layer);
            self.frame_stale = false;
        }
    }

    pub fn set_status(&mut self, message: &str, now: f64, duration_secs: f64) {
        self.status_message = Some((message.to_string(), now + duration_secs));
    }

    /// Current status message if not expired
    pub fn status(&self, now: f64) -> Option<&str> {
        match &self.status_message {
            Some((message, expiry)) if now < *expiry => Some(message),
            _ => None,
        }
    }
}
