//! Engine facade
//!
//! `WorldState` is the single handle the rest of the app holds on the
//! simulation. It is a plain owned value - `Clone + Send` - so the
//! regeneration coordinator can hand an independent copy to a worker
//! thread instead of sharing anything by reference.

use crate::config::WorldConfig;
use crate::world::entities::Population;
use crate::world::snapshot::{EntitySnapshot, TerrainSnapshot};
use crate::world::terrain::Terrain;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The complete simulation state: terrain, entities, tick counter.
#[derive(Debug, Clone)]
pub struct WorldState {
    terrain: Terrain,
    population: Population,
    tick: u32,
    config: WorldConfig,
    rng: StdRng,
}

impl WorldState {
    /// Generate a fresh world from config. A fixed config seed gives a
    /// reproducible world; otherwise each generation is independent.
    pub fn generate(config: &WorldConfig) -> WorldState {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let terrain = Terrain::generate(config.width, config.height, config.depth, rng.gen());
        let population = Population::generate(
            &mut rng,
            config.entity_count,
            config.spawn_zone,
            config.expected_death_age,
        );
        WorldState {
            terrain,
            population,
            tick: 0,
            config: config.clone(),
            rng,
        }
    }

    /// Advance the simulation by one step.
    pub fn advance_one_tick(&mut self) {
        self.population.step(&self.terrain, &mut self.rng);
        self.tick += 1;
    }

    /// Recompute the terrain grid with a fresh noise seed.
    pub fn regenerate_terrain(&mut self) {
        self.terrain = Terrain::generate(
            self.config.width,
            self.config.height,
            self.config.depth,
            self.rng.gen(),
        );
    }

    /// Respawn the entity population and restart the tick counter.
    pub fn regenerate_entities(&mut self) {
        self.population = Population::generate(
            &mut self.rng,
            self.config.entity_count,
            self.config.spawn_zone,
            self.config.expected_death_age,
        );
        self.tick = 0;
    }

    /// Recompute world state; with `preserve_terrain` only the entities
    /// are replaced and the terrain grid is kept as-is.
    pub fn regenerate(&mut self, preserve_terrain: bool) {
        if !preserve_terrain {
            self.regenerate_terrain();
        }
        self.regenerate_entities();
    }

    pub fn terrain_snapshot(&self) -> TerrainSnapshot {
        self.terrain.snapshot()
    }

    pub fn entity_snapshot(&self) -> EntitySnapshot {
        self.population.snapshot()
    }

    /// Terrain dimensions; also the raster layer and frame dimensions.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.terrain.width(), self.terrain.height())
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn alive_count(&self) -> usize {
        self.population.alive_count()
    }

    pub fn entity_count(&self) -> usize {
        self.population.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> WorldConfig {
        WorldConfig {
            width: 32,
            height: 24,
            depth: 10,
            entity_count: 5,
            spawn_zone: (4, 4, 20, 20),
            expected_death_age: 400,
            seed: Some(11),
        }
    }

    #[test]
    fn test_generate_shapes() {
        let world = WorldState::generate(&small_config());
        assert_eq!(world.dimensions(), (32, 24));
        let terrain = world.terrain_snapshot();
        assert!(terrain.shape_matches());
        assert_eq!(world.entity_snapshot().len(), 5);
        assert_eq!(world.tick(), 0);
    }

    #[test]
    fn test_advance_bumps_tick_and_moves_entities() {
        let mut world = WorldState::generate(&small_config());
        let before = world.entity_snapshot();
        world.advance_one_tick();
        assert_eq!(world.tick(), 1);
        let after = world.entity_snapshot();
        assert_ne!(before, after);
    }

    #[test]
    fn test_regenerate_preserving_terrain() {
        let mut world = WorldState::generate(&small_config());
        let terrain_before = world.terrain_snapshot();
        let entities_before = world.entity_snapshot();

        world.regenerate(true);
        assert_eq!(world.terrain_snapshot(), terrain_before);
        assert_ne!(world.entity_snapshot(), entities_before);
        assert_eq!(world.tick(), 0);
    }

    #[test]
    fn test_regenerate_full_replaces_terrain() {
        let mut world = WorldState::generate(&small_config());
        let terrain_before = world.terrain_snapshot();
        world.regenerate(false);
        assert_ne!(world.terrain_snapshot(), terrain_before);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let a = WorldState::generate(&small_config());
        let b = WorldState::generate(&small_config());
        assert_eq!(a.terrain_snapshot(), b.terrain_snapshot());
        assert_eq!(a.entity_snapshot(), b.entity_snapshot());
    }
}
