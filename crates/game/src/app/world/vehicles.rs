use engine::{Rgba, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;

use super::terrain::{is_road_line, TerrainKind, TileGrid};

const VEHICLE_MIN_SPEED: f32 = 80.0;
const VEHICLE_MAX_SPEED: f32 = 140.0;
const VEHICLE_TRAVEL_TILES: f32 = 4.0;
const VEHICLE_LENGTH_TILES: f32 = 1.25;
const VEHICLE_WIDTH_TILES: f32 = 0.6;
const VEHICLE_COLORS: [Rgba; 5] = [
    [204, 64, 56, 255],
    [52, 110, 196, 255],
    [236, 196, 64, 255],
    [240, 240, 236, 255],
    [40, 40, 44, 255],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelAxis {
    Horizontal,
    Vertical,
}

/// Patrols back and forth along one axis between `min_bound` and
/// `max_bound`, which always lie within `origin ± max_travel`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub position: Vec2,
    pub axis: TravelAxis,
    pub direction: f32,
    pub speed: f32,
    pub origin: f32,
    pub max_travel: f32,
    pub min_bound: f32,
    pub max_bound: f32,
    pub depth: f32,
    pub color: Rgba,
}

impl Vehicle {
    pub fn new(
        position: Vec2,
        axis: TravelAxis,
        direction: f32,
        speed: f32,
        max_travel: f32,
        world_size: Vec2,
    ) -> Self {
        let origin = match axis {
            TravelAxis::Horizontal => position.x,
            TravelAxis::Vertical => position.y,
        };
        let world_extent = match axis {
            TravelAxis::Horizontal => world_size.x,
            TravelAxis::Vertical => world_size.y,
        };
        Self {
            position,
            axis,
            direction: if direction < 0.0 { -1.0 } else { 1.0 },
            speed,
            origin,
            max_travel,
            min_bound: (origin - max_travel).max(0.0),
            max_bound: (origin + max_travel).min(world_extent).max(origin),
            depth: position.y,
            color: VEHICLE_COLORS[0],
        }
    }

    pub fn axis_position(&self) -> f32 {
        match self.axis {
            TravelAxis::Horizontal => self.position.x,
            TravelAxis::Vertical => self.position.y,
        }
    }

    fn set_axis_position(&mut self, value: f32) {
        match self.axis {
            TravelAxis::Horizontal => self.position.x = value,
            TravelAxis::Vertical => self.position.y = value,
        }
    }

    pub fn size(&self, tile_size: f32) -> Vec2 {
        let length = tile_size * VEHICLE_LENGTH_TILES;
        let width = tile_size * VEHICLE_WIDTH_TILES;
        match self.axis {
            TravelAxis::Horizontal => Vec2::new(length, width),
            TravelAxis::Vertical => Vec2::new(width, length),
        }
    }

    /// Advances along the axis and bounces at either bound. The position is
    /// clamped so a long step can never overshoot the patrol range.
    pub fn update(&mut self, dt: f32) {
        let next = self.axis_position() + self.direction * self.speed * dt;
        if next >= self.max_bound {
            self.set_axis_position(self.max_bound);
            self.direction = -1.0;
        } else if next <= self.min_bound {
            self.set_axis_position(self.min_bound);
            self.direction = 1.0;
        } else {
            self.set_axis_position(next);
        }
    }
}

/// Places up to `count` vehicles on distinct plain Road tiles. Crosswalks are
/// skipped so every vehicle has an unambiguous travel axis.
pub fn spawn_vehicles(
    grid: &TileGrid,
    count: usize,
    road_spacing: u32,
    road_width: u32,
    rng: &mut impl Rng,
) -> Vec<Vehicle> {
    let road_tiles: Vec<(u32, u32)> = grid
        .iter()
        .filter(|(_, _, kind)| *kind == TerrainKind::Road)
        .map(|(col, row, _)| (col, row))
        .collect();

    let max_travel = grid.tile_size() * VEHICLE_TRAVEL_TILES;
    let picked: Vec<(u32, u32)> = road_tiles.choose_multiple(rng, count).copied().collect();
    picked
        .into_iter()
        .map(|(col, row)| {
            let axis = if is_road_line(row, road_spacing, road_width) {
                TravelAxis::Horizontal
            } else {
                TravelAxis::Vertical
            };
            let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let speed = rng.gen_range(VEHICLE_MIN_SPEED..=VEHICLE_MAX_SPEED);
            let mut vehicle = Vehicle::new(
                grid.tile_center(col, row),
                axis,
                direction,
                speed,
                max_travel,
                grid.world_size(),
            );
            vehicle.color = VEHICLE_COLORS
                .choose(rng)
                .copied()
                .unwrap_or(VEHICLE_COLORS[0]);
            vehicle
        })
        .collect()
}
