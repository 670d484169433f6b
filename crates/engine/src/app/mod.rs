mod host;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod simulation;

pub use host::{
    GroundLayer, MinimapDot, MinimapImage, Proxy, ProxyDesc, ProxyHost, ProxyId, ProxyLayer,
    ProxyShape, ProxyStore, ProxyUpdate, Rgba,
};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{screen_to_world, world_to_screen, Camera2D, Renderer, Viewport};
pub use simulation::{Simulation, SimulationCommand, SimulationRunner, Vec2};
