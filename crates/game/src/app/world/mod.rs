pub mod challenge;
pub mod collision;
pub mod decorations;
pub mod minimap;
pub mod pedestrians;
pub mod player;
pub mod terrain;
pub mod vehicles;

use engine::{InputSnapshot, QuestionBank, SimulationCommand, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::app::score::ScoreReporter;
use challenge::{place_objects, ChallengeBoard};
use collision::{build_collision_regions, CollisionRegion};
use decorations::{place_decorations, Decoration};
use minimap::{MinimapProjection, MINIMAP_STRIDE};
use pedestrians::{spawn_pedestrians, Pedestrian};
use player::{intent_direction, Player};
use terrain::{generate_terrain, GenerationError, TerrainKind, TerrainParams, TileGrid};
use vehicles::{spawn_vehicles, Vehicle};

#[derive(Debug, Clone, PartialEq)]
pub struct WorldParams {
    pub terrain: TerrainParams,
    pub vehicle_count: usize,
    pub pedestrian_count: usize,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            terrain: TerrainParams::default(),
            vehicle_count: 14,
            pedestrian_count: 36,
        }
    }
}

/// Everything the simulation mutates. Generation is pure and seeded; the
/// wander AI draws from its own stream so per-tick randomness never perturbs
/// a regenerated world.
#[derive(Debug, Clone)]
pub struct WorldState {
    seed: u64,
    grid: TileGrid,
    regions: Vec<CollisionRegion>,
    decorations: Vec<Decoration>,
    vehicles: Vec<Vehicle>,
    pedestrians: Vec<Pedestrian>,
    player: Player,
    board: ChallengeBoard,
    minimap: MinimapProjection,
    ai_rng: ChaCha8Rng,
}

impl WorldState {
    pub fn generate(
        params: &WorldParams,
        bank: &QuestionBank,
        seed: u64,
    ) -> Result<Self, GenerationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = generate_terrain(&params.terrain, &mut rng)?;
        let regions = build_collision_regions(&grid);
        let decorations = place_decorations(&grid, params.terrain.layout, &mut rng);
        let objects = place_objects(&grid, bank, &mut rng);
        let vehicles = spawn_vehicles(
            &grid,
            params.vehicle_count,
            params.terrain.road_spacing,
            params.terrain.road_width,
            &mut rng,
        );
        let pedestrians = spawn_pedestrians(&grid, params.pedestrian_count, &mut rng);
        let player = Player::new(find_spawn_point(&grid));
        let minimap = MinimapProjection::from_grid(&grid, MINIMAP_STRIDE);
        let ai_rng = ChaCha8Rng::seed_from_u64(rng.gen());

        info!(
            seed,
            layout = %params.terrain.layout,
            cols = grid.cols(),
            rows = grid.rows(),
            regions = regions.len(),
            decorations = decorations.len(),
            objects = objects.len(),
            vehicles = vehicles.len(),
            pedestrians = pedestrians.len(),
            "world_generated"
        );

        let mut world = Self {
            seed,
            grid,
            regions,
            decorations,
            vehicles,
            pedestrians,
            player,
            board: ChallengeBoard::new(objects),
            minimap,
            ai_rng,
        };
        world.board.update_proximity(world.player.position);
        Ok(world)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn regions(&self) -> &[CollisionRegion] {
        &self.regions
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn pedestrians(&self) -> &[Pedestrian] {
        &self.pedestrians
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn board(&self) -> &ChallengeBoard {
        &self.board
    }

    pub fn minimap(&self) -> &MinimapProjection {
        &self.minimap
    }

    /// One fixed step. While a session is open, movement input is discarded
    /// and the player takes no contact impulses; vehicles and pedestrians
    /// keep moving either way.
    pub fn step(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        reporter: &mut dyn ScoreReporter,
    ) -> SimulationCommand {
        let mut command = SimulationCommand::Continue;
        if self.board.is_session_open() {
            self.apply_session_input(input, reporter);
        } else {
            if input.cancel_pressed() {
                command = SimulationCommand::Quit;
            }
            let direction = intent_direction(input);
            self.player
                .step_movement(direction, dt, &self.grid, &self.regions);
            self.board.update_proximity(self.player.position);
            self.apply_activation(input);
        }

        for vehicle in &mut self.vehicles {
            vehicle.update(dt);
        }
        for pedestrian in &mut self.pedestrians {
            pedestrian.update(dt, &self.grid, &mut self.ai_rng);
        }
        if !self.board.is_session_open() {
            let contacts =
                self.player
                    .resolve_contacts(&self.vehicles, &mut self.pedestrians, &self.grid, dt);
            if contacts.vehicle_contacts > 0 {
                debug!(vehicles = contacts.vehicle_contacts, "player_nudged");
            }
        }

        self.refresh_depths();
        self.board.update_proximity(self.player.position);
        self.board.tick_feedback(dt);
        command
    }

    fn apply_session_input(&mut self, input: &InputSnapshot, reporter: &mut dyn ScoreReporter) {
        self.board.push_text(input.text_input());
        self.board.backspace(input.backspace_presses());
        if input.submit_pressed() {
            self.board.submit(reporter);
        }
        if input.cancel_pressed() {
            self.board.cancel();
        }
    }

    // A direct click wins over the activate intent in the same tick; the
    // second attempt lands on an open session and is ignored.
    fn apply_activation(&mut self, input: &InputSnapshot) {
        if let Some(point) = input.click_world() {
            if let Some(index) = self.board.object_at_point(point) {
                self.board.activate(index);
            }
        }
        if input.activate_pressed() {
            self.board.activate_nearby();
        }
    }

    fn refresh_depths(&mut self) {
        self.player.depth = self.player.position.y;
        for vehicle in &mut self.vehicles {
            vehicle.depth = vehicle.position.y;
        }
        for pedestrian in &mut self.pedestrians {
            pedestrian.depth = pedestrian.position.y;
        }
    }
}

fn is_spawnable(kind: TerrainKind) -> bool {
    !kind.blocks_movement() && !kind.is_road_surface() && kind != TerrainKind::Water
}

/// Nearest spawnable tile to the map center, searched ring by ring.
fn find_spawn_point(grid: &TileGrid) -> Vec2 {
    let center_col = i64::from(grid.cols() / 2);
    let center_row = i64::from(grid.rows() / 2);
    let max_radius = i64::from(grid.cols().max(grid.rows()));
    for radius in 0..=max_radius {
        for row in center_row - radius..=center_row + radius {
            for col in center_col - radius..=center_col + radius {
                let on_ring =
                    (row - center_row).abs() == radius || (col - center_col).abs() == radius;
                if !on_ring {
                    continue;
                }
                if grid.get(col, row).is_some_and(is_spawnable) {
                    return grid.tile_center(col as u32, row as u32);
                }
            }
        }
    }
    grid.world_size() * 0.5
}
