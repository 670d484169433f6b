use engine::{InputAction, InputSnapshot, Vec2};

use super::collision::CollisionRegion;
use super::pedestrians::{Pedestrian, PEDESTRIAN_RADIUS};
use super::terrain::{TerrainKind, TileGrid};
use super::vehicles::Vehicle;

pub const PLAYER_SPEED: f32 = 200.0;
pub const PLAYER_HALF_EXTENTS: Vec2 = Vec2::new(10.0, 12.0);
const DIAGONAL_SCALE: f32 = std::f32::consts::FRAC_1_SQRT_2;
const WATER_SPEED_FACTOR: f32 = 0.5;
const VEHICLE_NUDGE_IMPULSE: f32 = 260.0;
const PEDESTRIAN_PUSH_IMPULSE: f32 = 90.0;
const PEDESTRIAN_SHOVE_SPEED: f32 = 45.0;
const KNOCKBACK_DECAY_PER_SECOND: f32 = 6.0;
const KNOCKBACK_MAX_SPEED: f32 = 420.0;
const KNOCKBACK_REST_SPEED: f32 = 1.0;

/// Combined movement intent with equal magnitude for cardinal and diagonal
/// input. Opposing intents cancel per axis.
pub fn intent_direction(input: &InputSnapshot) -> Vec2 {
    let (mut dx, mut dy) = (0i32, 0i32);
    for action in InputAction::MOVEMENT {
        if !input.is_down(action) {
            continue;
        }
        if let Some((x, y)) = action.direction() {
            dx += x as i32;
            dy += y as i32;
        }
    }
    let x = dx.signum() as f32;
    let y = dy.signum() as f32;
    if x != 0.0 && y != 0.0 {
        Vec2::new(x * DIAGONAL_SCALE, y * DIAGONAL_SCALE)
    } else {
        Vec2::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactReport {
    pub vehicle_contacts: u32,
    pub pedestrian_contacts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub half_extents: Vec2,
    pub speed: f32,
    /// Impulse velocity from contacts, decays over time.
    pub knockback: Vec2,
    pub depth: f32,
}

impl Player {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            half_extents: PLAYER_HALF_EXTENTS,
            speed: PLAYER_SPEED,
            knockback: Vec2::ZERO,
            depth: position.y,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    /// Moves by intent plus knockback, one axis at a time so blocking
    /// regions stop motion along the colliding axis only.
    pub fn step_movement(
        &mut self,
        direction: Vec2,
        dt: f32,
        grid: &TileGrid,
        regions: &[CollisionRegion],
    ) {
        let mut velocity = direction * self.speed + self.knockback;
        if grid.kind_at_world(self.position) == Some(TerrainKind::Water) {
            velocity = velocity * WATER_SPEED_FACTOR;
        }

        if velocity.x != 0.0 {
            self.position.x += velocity.x * dt;
            for region in regions {
                if region.overlaps_box(self.position, self.half_extents) {
                    self.position.x = if velocity.x > 0.0 {
                        region.x - self.half_extents.x
                    } else {
                        region.x + region.width + self.half_extents.x
                    };
                }
            }
        }
        if velocity.y != 0.0 {
            self.position.y += velocity.y * dt;
            for region in regions {
                if region.overlaps_box(self.position, self.half_extents) {
                    self.position.y = if velocity.y > 0.0 {
                        region.y - self.half_extents.y
                    } else {
                        region.y + region.height + self.half_extents.y
                    };
                }
            }
        }

        let world = grid.world_size();
        self.position.x = self
            .position
            .x
            .clamp(self.half_extents.x, (world.x - self.half_extents.x).max(self.half_extents.x));
        self.position.y = self
            .position
            .y
            .clamp(self.half_extents.y, (world.y - self.half_extents.y).max(self.half_extents.y));

        let decay = (1.0 - KNOCKBACK_DECAY_PER_SECOND * dt).max(0.0);
        self.knockback = self.knockback * decay;
        if self.knockback.length() < KNOCKBACK_REST_SPEED {
            self.knockback = Vec2::ZERO;
        }
    }

    /// Vehicles nudge the player without being affected; pedestrians and the
    /// player push each other apart with a smaller impulse.
    pub fn resolve_contacts(
        &mut self,
        vehicles: &[Vehicle],
        pedestrians: &mut [Pedestrian],
        grid: &TileGrid,
        dt: f32,
    ) -> ContactReport {
        let mut report = ContactReport::default();
        for vehicle in vehicles {
            let half = vehicle.size(grid.tile_size()) * 0.5;
            if !self.overlaps(vehicle.position, half) {
                continue;
            }
            let away = separation(self.position, vehicle.position);
            self.add_knockback(away * VEHICLE_NUDGE_IMPULSE);
            report.vehicle_contacts += 1;
        }

        let pedestrian_half = Vec2::new(PEDESTRIAN_RADIUS, PEDESTRIAN_RADIUS);
        for pedestrian in pedestrians.iter_mut() {
            if !self.overlaps(pedestrian.position, pedestrian_half) {
                continue;
            }
            let away = separation(self.position, pedestrian.position);
            self.add_knockback(away * PEDESTRIAN_PUSH_IMPULSE);
            pedestrian.nudge(-away * (PEDESTRIAN_SHOVE_SPEED * dt), grid);
            report.pedestrian_contacts += 1;
        }
        report
    }

    fn overlaps(&self, other_center: Vec2, other_half: Vec2) -> bool {
        (self.position.x - other_center.x).abs() < self.half_extents.x + other_half.x
            && (self.position.y - other_center.y).abs() < self.half_extents.y + other_half.y
    }

    fn add_knockback(&mut self, impulse: Vec2) {
        let combined = self.knockback + impulse;
        let speed = combined.length();
        self.knockback = if speed > KNOCKBACK_MAX_SPEED {
            combined * (KNOCKBACK_MAX_SPEED / speed)
        } else {
            combined
        };
    }
}

/// Unit vector from `other` toward `me`; straight up when the centers coincide.
fn separation(me: Vec2, other: Vec2) -> Vec2 {
    let away = (me - other).normalized_or_zero();
    if away.is_zero() {
        Vec2::new(0.0, -1.0)
    } else {
        away
    }
}
