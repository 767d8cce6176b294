//! Entity population
//!
//! Entities spawn uniformly inside a configured rectangle and wander
//! the map. Movement speed depends on the material under the entity:
//! everyone is fastest on grass, climbers handle mud better, skaters
//! handle ice better. Each entity ages one unit per tick and dies when
//! it reaches a death age sampled from a Weibull distribution, so
//! lifespans cluster around the configured mean instead of being
//! uniform.

use crate::world::snapshot::{EntityPoint, EntitySnapshot};
use crate::world::terrain::{Terrain, MATERIAL_ICE, MATERIAL_MUD};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Weibull};

const BASE_MUD_SCALAR: f32 = 0.6;
const PROFICIENT_MUD_SCALAR: f32 = 0.8;

const BASE_ICE_SCALAR: f32 = 0.4;
const PROFICIENT_ICE_SCALAR: f32 = 0.7;

// Weibull shape for death ages; narrow enough that most entities die
// near the mean. The divisor is gamma(1 + 1/k) for k = 4, which turns
// the mean into the distribution's scale parameter.
const DEATH_AGE_SHAPE: f64 = 4.0;
const DEATH_AGE_MEAN_TO_SCALE: f64 = 0.906_402;

#[derive(Debug, Clone)]
struct Entity {
    id: u32,
    x: f32,
    y: f32,
    heading: f32,
    grass_speed: f32,
    mud_speed: f32,
    ice_speed: f32,
    radius: u32,
    age: u32,
    death_age: u32,
    alive: bool,
}

impl Entity {
    fn spawn(rng: &mut StdRng, id: u32, zone: (u16, u16, u16, u16), expected_death_age: u32) -> Entity {
        let (x1, y1, x2, y2) = zone;
        let grass_speed = rng.gen_range(1.0..3.0);
        let is_climber = rng.gen_bool(0.3);
        let is_skater = rng.gen_bool(0.3);

        let mud_speed = if is_climber {
            grass_speed * PROFICIENT_MUD_SCALAR
        } else {
            grass_speed * BASE_MUD_SCALAR
        };
        let ice_speed = if is_skater {
            grass_speed * PROFICIENT_ICE_SCALAR
        } else {
            grass_speed * BASE_ICE_SCALAR
        };

        Entity {
            id,
            x: rng.gen_range(x1 as f32..x2 as f32),
            y: rng.gen_range(y1 as f32..y2 as f32),
            heading: rng.gen_range(0.0..std::f32::consts::TAU),
            grass_speed,
            mud_speed,
            ice_speed,
            radius: rng.gen_range(2..=4),
            age: 0,
            death_age: sample_death_age(rng, expected_death_age),
            alive: true,
        }
    }

    fn speed_on(&self, material: u8) -> f32 {
        match material {
            MATERIAL_MUD => self.mud_speed,
            MATERIAL_ICE => self.ice_speed,
            _ => self.grass_speed,
        }
    }
}

fn sample_death_age(rng: &mut StdRng, expected: u32) -> u32 {
    let scale = expected as f64 / DEATH_AGE_MEAN_TO_SCALE;
    let weibull = Weibull::new(scale, DEATH_AGE_SHAPE).unwrap();
    weibull.sample(rng).round().max(1.0) as u32
}

/// The living (and dead) entity set owned by the engine.
#[derive(Debug, Clone)]
pub struct Population {
    entities: Vec<Entity>,
    spawn_zone: (u16, u16, u16, u16),
    expected_death_age: u32,
    next_id: u32,
}

impl Population {
    /// Spawn `count` fresh entities inside the zone.
    pub fn generate(
        rng: &mut StdRng,
        count: u32,
        spawn_zone: (u16, u16, u16, u16),
        expected_death_age: u32,
    ) -> Population {
        let entities = (0..count)
            .map(|id| Entity::spawn(rng, id, spawn_zone, expected_death_age))
            .collect();
        Population {
            entities,
            spawn_zone,
            expected_death_age,
            next_id: count,
        }
    }

    /// Advance every living entity by one tick: age it, kill it at its
    /// death age, otherwise wander with material-dependent speed.
    /// Positions clamp to the terrain bounds.
    pub fn step(&mut self, terrain: &Terrain, rng: &mut StdRng) {
        let max_x = (terrain.width() - 1) as f32;
        let max_y = (terrain.height() - 1) as f32;

        for entity in self.entities.iter_mut().filter(|e| e.alive) {
            entity.age += 1;
            if entity.age >= entity.death_age {
                entity.alive = false;
                continue;
            }

            let cx = (entity.x.clamp(0.0, max_x)) as u16;
            let cy = (entity.y.clamp(0.0, max_y)) as u16;
            let speed = entity.speed_on(terrain.material_at(cx, cy));

            entity.heading += rng.gen_range(-0.6..0.6);
            entity.x = (entity.x + entity.heading.cos() * speed).clamp(0.0, max_x);
            entity.y = (entity.y + entity.heading.sin() * speed).clamp(0.0, max_y);
        }
    }

    /// Copy the population out as an ordered snapshot. Dead entities
    /// stay in the list with `alive = false`.
    pub fn snapshot(&self) -> EntitySnapshot {
        self.entities
            .iter()
            .map(|e| EntityPoint {
                id: e.id,
                x: e.x,
                y: e.y,
                alive: e.alive,
                radius: e.radius,
            })
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alive).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}
