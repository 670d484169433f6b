use std::fmt::Write as _;

use engine::{
    GroundLayer, InputSnapshot, ProxyDesc, ProxyHost, ProxyId, ProxyLayer, ProxyShape,
    ProxyUpdate, QuestionBank, Rgba, Simulation, SimulationCommand, Vec2,
};
use tracing::info;

use super::config::GameConfig;
use super::score::ScoreReporter;
use super::world::challenge::FeedbackKind;
use super::world::decorations::DecorationKind;
use super::world::pedestrians::PEDESTRIAN_RADIUS;
use super::world::terrain::{GenerationError, TerrainKind};
use super::world::WorldState;

const PLAYER_COLOR: Rgba = [40, 90, 220, 255];
const MARKER_COLOR: Rgba = [255, 230, 60, 255];
const MARKER_SIZE: f32 = 10.0;
const MARKER_LIFT: f32 = 22.0;

#[derive(Debug, Default)]
struct ProxyIds {
    objects: Vec<(ProxyId, Rgba)>,
    vehicles: Vec<ProxyId>,
    pedestrians: Vec<ProxyId>,
    player: Option<ProxyId>,
    marker: Option<ProxyId>,
}

/// Drives a `WorldState` behind the engine's host-agnostic lifecycle.
pub struct CitySimulation {
    world: WorldState,
    reporter: Box<dyn ScoreReporter>,
    proxies: ProxyIds,
}

impl CitySimulation {
    pub fn new(
        config: &GameConfig,
        seed: u64,
        bank: &QuestionBank,
        reporter: Box<dyn ScoreReporter>,
    ) -> Result<Self, GenerationError> {
        let world = WorldState::generate(&config.world_params(), bank, seed)?;
        Ok(Self {
            world,
            reporter,
            proxies: ProxyIds::default(),
        })
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    fn spawn_static_proxies(&self, host: &mut dyn ProxyHost) {
        for region in self.world.regions() {
            host.spawn_proxy(ProxyDesc {
                debug_name: "building",
                layer: ProxyLayer::Obstacle,
                shape: ProxyShape::Rect,
                position: region.center(),
                size: region.size(),
                color: TerrainKind::Building.color(),
                depth: region.y + region.height,
                collidable: true,
            });
        }
        for decoration in self.world.decorations() {
            let shape = match decoration.kind {
                DecorationKind::LampPost => ProxyShape::Rect,
                _ => ProxyShape::Ellipse,
            };
            host.spawn_proxy(ProxyDesc {
                debug_name: decoration.kind.debug_name(),
                layer: ProxyLayer::Decoration,
                shape,
                position: decoration.position,
                size: decoration.size,
                color: decoration.color,
                depth: decoration.position.y,
                collidable: false,
            });
        }
    }

    fn marker_update(&self) -> ProxyUpdate {
        let board = self.world.board();
        let target = board
            .nearby()
            .filter(|_| !board.is_session_open())
            .and_then(|index| board.objects().get(index));
        match target {
            Some(object) => ProxyUpdate {
                position: object.position + Vec2::new(0.0, -MARKER_LIFT),
                depth: object.position.y,
                color: Some(MARKER_COLOR),
            },
            None => ProxyUpdate {
                position: self.world.player().position,
                depth: self.world.player().position.y,
                color: Some([MARKER_COLOR[0], MARKER_COLOR[1], MARKER_COLOR[2], 0]),
            },
        }
    }

    fn sync_proxies(&mut self, host: &mut dyn ProxyHost) {
        for (id, vehicle) in self.proxies.vehicles.iter().zip(self.world.vehicles()) {
            host.update_proxy(
                *id,
                ProxyUpdate {
                    position: vehicle.position,
                    depth: vehicle.depth,
                    color: None,
                },
            );
        }
        for (id, pedestrian) in self.proxies.pedestrians.iter().zip(self.world.pedestrians()) {
            host.update_proxy(
                *id,
                ProxyUpdate {
                    position: pedestrian.position,
                    depth: pedestrian.depth,
                    color: None,
                },
            );
        }
        for ((id, shown), object) in self
            .proxies
            .objects
            .iter_mut()
            .zip(self.world.board().objects())
        {
            let color = object.display_color();
            if *shown != color {
                *shown = color;
                host.update_proxy(
                    *id,
                    ProxyUpdate {
                        position: object.position,
                        depth: object.position.y,
                        color: Some(color),
                    },
                );
            }
        }
        if let Some(id) = self.proxies.player {
            let player = self.world.player();
            host.update_proxy(
                id,
                ProxyUpdate {
                    position: player.position,
                    depth: player.depth,
                    color: None,
                },
            );
        }
        if let Some(id) = self.proxies.marker {
            host.update_proxy(id, self.marker_update());
        }
        let minimap = self.world.minimap();
        host.set_minimap_dots(minimap.markers(
            self.world.player().position,
            self.world.board().objects(),
        ));
    }
}

impl Simulation for CitySimulation {
    fn init(&mut self, host: &mut dyn ProxyHost) {
        let grid = self.world.grid();
        host.set_ground(GroundLayer {
            cols: grid.cols(),
            rows: grid.rows(),
            tile_size: grid.tile_size(),
            colors: grid.colors(),
        });
        self.spawn_static_proxies(host);

        let mut proxies = ProxyIds::default();
        for object in self.world.board().objects() {
            let color = object.display_color();
            let id = host.spawn_proxy(ProxyDesc {
                debug_name: object.archetype.debug_name(),
                layer: ProxyLayer::Actor,
                shape: ProxyShape::Rect,
                position: object.position,
                size: object.size,
                color,
                depth: object.position.y,
                collidable: false,
            });
            proxies.objects.push((id, color));
        }
        let tile_size = self.world.grid().tile_size();
        for vehicle in self.world.vehicles() {
            proxies.vehicles.push(host.spawn_proxy(ProxyDesc {
                debug_name: "vehicle",
                layer: ProxyLayer::Actor,
                shape: ProxyShape::Rect,
                position: vehicle.position,
                size: vehicle.size(tile_size),
                color: vehicle.color,
                depth: vehicle.depth,
                collidable: true,
            }));
        }
        for pedestrian in self.world.pedestrians() {
            proxies.pedestrians.push(host.spawn_proxy(ProxyDesc {
                debug_name: "pedestrian",
                layer: ProxyLayer::Actor,
                shape: ProxyShape::Ellipse,
                position: pedestrian.position,
                size: Vec2::new(PEDESTRIAN_RADIUS * 2.0, PEDESTRIAN_RADIUS * 2.0),
                color: pedestrian.color,
                depth: pedestrian.depth,
                collidable: true,
            }));
        }
        let player = self.world.player();
        let player_id = host.spawn_proxy(ProxyDesc {
            debug_name: "player",
            layer: ProxyLayer::Actor,
            shape: ProxyShape::Rect,
            position: player.position,
            size: player.size(),
            color: PLAYER_COLOR,
            depth: player.depth,
            collidable: true,
        });
        proxies.player = Some(player_id);
        let marker = self.marker_update();
        proxies.marker = Some(host.spawn_proxy(ProxyDesc {
            debug_name: "interact_marker",
            layer: ProxyLayer::Marker,
            shape: ProxyShape::Ellipse,
            position: marker.position,
            size: Vec2::new(MARKER_SIZE, MARKER_SIZE),
            color: marker.color.unwrap_or(MARKER_COLOR),
            depth: marker.depth,
            collidable: false,
        }));
        host.follow(player_id);
        host.set_minimap(self.world.minimap().image().clone());
        self.proxies = proxies;
        self.sync_proxies(host);

        info!(
            seed = self.world.seed(),
            objects = self.world.board().objects().len(),
            "simulation_ready"
        );
    }

    fn tick(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        host: &mut dyn ProxyHost,
    ) -> SimulationCommand {
        let command = self
            .world
            .step(fixed_dt_seconds, input, self.reporter.as_mut());
        self.sync_proxies(host);
        command
    }

    fn shutdown(&mut self, host: &mut dyn ProxyHost) {
        host.clear();
        self.proxies = ProxyIds::default();
        let board = self.world.board();
        info!(
            score = board.score(),
            solved = board.solved_count(),
            objects = board.objects().len(),
            "session_finished"
        );
    }

    fn status_line(&self) -> Option<String> {
        let board = self.world.board();
        let mut line = format!(
            "Score {} | Solved {}/{}",
            board.score(),
            board.solved_count(),
            board.objects().len()
        );
        let Some(session) = board.session() else {
            if board.nearby().is_some() {
                line.push_str(" | Press E to investigate");
            }
            return Some(line);
        };
        if let Some(object) = board.objects().get(session.target) {
            let _ = write!(
                line,
                " | {} ({} pts)",
                object.question.prompt, object.question.points
            );
            if session.hint_visible() {
                if let Some(hint) = &object.question.hint {
                    let _ = write!(line, " | Hint: {hint}");
                }
            }
        }
        match session.feedback.map(|feedback| feedback.kind) {
            Some(FeedbackKind::Correct) => line.push_str(" | Correct!"),
            Some(FeedbackKind::Incorrect) => line.push_str(" | Not quite, try again"),
            None => {
                let _ = write!(line, " | > {}_", session.draft);
            }
        }
        Some(line)
    }
}
