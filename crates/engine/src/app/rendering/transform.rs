use crate::app::Vec2;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.5;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Camera centered on `position`; world y grows downward like screen y.
#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        if self.zoom.is_finite() && self.zoom > f32::EPSILON {
            self.zoom
        } else {
            CAMERA_ZOOM_DEFAULT
        }
    }

    /// Keeps the view inside `world_size` when the world is larger than the
    /// viewport; centers it otherwise.
    pub fn clamp_to_world(&mut self, viewport: Viewport, world_size: Vec2) {
        let zoom = self.effective_zoom();
        let half_w = viewport.width as f32 * 0.5 / zoom;
        let half_h = viewport.height as f32 * 0.5 / zoom;
        self.position.x = clamp_axis(self.position.x, half_w, world_size.x);
        self.position.y = clamp_axis(self.position.y, half_h, world_size.y);
    }
}

fn clamp_axis(value: f32, half_extent: f32, world_extent: f32) -> f32 {
    if world_extent <= half_extent * 2.0 {
        return world_extent * 0.5;
    }
    value.clamp(half_extent, world_extent - half_extent)
}

pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let zoom = camera.effective_zoom();
    let x = (world.x - camera.position.x) * zoom + viewport.width as f32 * 0.5;
    let y = (world.y - camera.position.y) * zoom + viewport.height as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world(screen_px: Vec2, camera: &Camera2D, viewport: Viewport) -> Vec2 {
    let zoom = camera.effective_zoom();
    Vec2 {
        x: (screen_px.x - viewport.width as f32 * 0.5) / zoom + camera.position.x,
        y: (screen_px.y - viewport.height as f32 * 0.5) / zoom + camera.position.y,
    }
}
