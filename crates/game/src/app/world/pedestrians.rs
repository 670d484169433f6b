use engine::{Rgba, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;

use super::terrain::{TerrainKind, TileGrid};

const PEDESTRIAN_MIN_SPEED: f32 = 30.0;
const PEDESTRIAN_MAX_SPEED: f32 = 50.0;
const WALK_MIN_SECONDS: f32 = 2.0;
const WALK_MAX_SECONDS: f32 = 5.0;
const PAUSE_MIN_SECONDS: f32 = 1.0;
const PAUSE_MAX_SECONDS: f32 = 3.0;
pub const PEDESTRIAN_RADIUS: f32 = 7.0;
const PEDESTRIAN_COLORS: [Rgba; 4] = [
    [232, 160, 120, 255],
    [170, 110, 80, 255],
    [120, 80, 150, 255],
    [90, 140, 200, 255],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinal {
    North,
    South,
    East,
    West,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [Cardinal::North, Cardinal::South, Cardinal::East, Cardinal::West];

    /// Unit step in world space (y grows downward).
    pub fn unit(self) -> Vec2 {
        match self {
            Cardinal::North => Vec2::new(0.0, -1.0),
            Cardinal::South => Vec2::new(0.0, 1.0),
            Cardinal::East => Vec2::new(1.0, 0.0),
            Cardinal::West => Vec2::new(-1.0, 0.0),
        }
    }

    pub fn reversed(self) -> Cardinal {
        match self {
            Cardinal::North => Cardinal::South,
            Cardinal::South => Cardinal::North,
            Cardinal::East => Cardinal::West,
            Cardinal::West => Cardinal::East,
        }
    }

    fn random(rng: &mut impl Rng) -> Cardinal {
        Cardinal::ALL
            .choose(rng)
            .copied()
            .unwrap_or(Cardinal::North)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WanderState {
    Walking { remaining: f32 },
    Paused { remaining: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pedestrian {
    pub position: Vec2,
    pub direction: Cardinal,
    pub speed: f32,
    pub state: WanderState,
    pub depth: f32,
    pub color: Rgba,
}

impl Pedestrian {
    pub fn is_paused(&self) -> bool {
        matches!(self.state, WanderState::Paused { .. })
    }

    /// One wander step. A blocked destination (non-walkable or outside the
    /// map) reverses the heading instead of moving, so the position only ever
    /// changes to walkable tiles.
    pub fn update(&mut self, dt: f32, grid: &TileGrid, rng: &mut impl Rng) {
        match self.state {
            WanderState::Paused { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.direction = Cardinal::random(rng);
                    self.state = WanderState::Walking {
                        remaining: rng.gen_range(WALK_MIN_SECONDS..=WALK_MAX_SECONDS),
                    };
                } else {
                    self.state = WanderState::Paused { remaining };
                }
            }
            WanderState::Walking { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.state = WanderState::Paused {
                        remaining: rng.gen_range(PAUSE_MIN_SECONDS..=PAUSE_MAX_SECONDS),
                    };
                    return;
                }
                self.state = WanderState::Walking { remaining };
                let destination = self.position + self.direction.unit() * (self.speed * dt);
                if grid.is_pedestrian_walkable_at(destination) {
                    self.position = destination;
                } else {
                    self.direction = self.direction.reversed();
                }
            }
        }
    }

    /// Soft displacement from contact with the player; dropped when it would
    /// leave walkable ground.
    pub fn nudge(&mut self, offset: Vec2, grid: &TileGrid) -> bool {
        let destination = self.position + offset;
        if grid.is_pedestrian_walkable_at(destination) {
            self.position = destination;
            true
        } else {
            false
        }
    }
}

pub fn spawn_pedestrians(grid: &TileGrid, count: usize, rng: &mut impl Rng) -> Vec<Pedestrian> {
    let sidewalk_tiles: Vec<(u32, u32)> = grid
        .iter()
        .filter(|(_, _, kind)| *kind == TerrainKind::Sidewalk)
        .map(|(col, row, _)| (col, row))
        .collect();
    let picked: Vec<(u32, u32)> = sidewalk_tiles.choose_multiple(rng, count).copied().collect();

    picked
        .into_iter()
        .map(|(col, row)| Pedestrian {
            position: grid.tile_center(col, row),
            direction: Cardinal::random(rng),
            speed: rng.gen_range(PEDESTRIAN_MIN_SPEED..=PEDESTRIAN_MAX_SPEED),
            state: WanderState::Walking {
                remaining: rng.gen_range(WALK_MIN_SECONDS..=WALK_MAX_SECONDS),
            },
            depth: grid.tile_center(col, row).y,
            color: PEDESTRIAN_COLORS
                .choose(rng)
                .copied()
                .unwrap_or(PEDESTRIAN_COLORS[0]),
        })
        .collect()
}
