mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{screen_to_world, world_to_screen, Camera2D, Viewport};

pub const MINIMAP_MARGIN_PX: i32 = 12;
