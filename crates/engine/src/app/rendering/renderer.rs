use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::host::{GroundLayer, MinimapImage, Proxy, ProxyShape, ProxyStore, Rgba};

use super::transform::{world_to_screen, Camera2D, Viewport};
use super::MINIMAP_MARGIN_PX;

const CLEAR_COLOR: Rgba = [26, 26, 46, 255];
const MINIMAP_PIXEL_SCALE: i32 = 2;
const MINIMAP_FRAME_COLOR: Rgba = [12, 12, 20, 255];
const CULL_PADDING_PX: i32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl ScreenRectPx {
    fn is_visible(&self, viewport: Viewport) -> bool {
        self.right >= -CULL_PADDING_PX
            && self.bottom >= -CULL_PADDING_PX
            && self.left <= viewport.width as i32 + CULL_PADDING_PX
            && self.top <= viewport.height as i32 + CULL_PADDING_PX
    }
}

pub struct Renderer {
    window: &'static Window,
    pixels: Pixels<'static>,
    viewport: Viewport,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: &'static Window) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(window, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            draw_order: Vec::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(self.window, width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: &'static Window,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(width.max(1), height.max(1), surface)
    }

    pub(crate) fn render_store(&mut self, store: &ProxyStore, camera: &Camera2D) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let viewport = self.viewport;
        store.draw_order(&mut self.draw_order);
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        if let Some(ground) = store.ground() {
            draw_ground(frame, viewport, camera, ground);
        }
        for index in self.draw_order.iter().copied() {
            draw_proxy(frame, viewport, camera, &store.proxies()[index]);
        }
        if let Some(minimap) = store.minimap() {
            draw_minimap(frame, viewport, minimap, store);
        }

        self.pixels.render()
    }
}

fn draw_ground(frame: &mut [u8], viewport: Viewport, camera: &Camera2D, ground: &GroundLayer) {
    if ground.cols == 0 || ground.rows == 0 || ground.tile_size <= 0.0 {
        return;
    }
    let zoom = camera.effective_zoom();
    let half_w = viewport.width as f32 * 0.5 / zoom;
    let half_h = viewport.height as f32 * 0.5 / zoom;
    let col_min = ((camera.position.x - half_w) / ground.tile_size).floor().max(0.0) as u32;
    let row_min = ((camera.position.y - half_h) / ground.tile_size).floor().max(0.0) as u32;
    let col_max = (((camera.position.x + half_w) / ground.tile_size).ceil() as u32).min(ground.cols);
    let row_max = (((camera.position.y + half_h) / ground.tile_size).ceil() as u32).min(ground.rows);

    for row in row_min..row_max {
        for col in col_min..col_max {
            let Some(color) = ground.color_at(col, row) else {
                continue;
            };
            let top_left = crate::app::Vec2::new(
                col as f32 * ground.tile_size,
                row as f32 * ground.tile_size,
            );
            let bottom_right = crate::app::Vec2::new(
                (col + 1) as f32 * ground.tile_size,
                (row + 1) as f32 * ground.tile_size,
            );
            let (left, top) = world_to_screen(top_left, camera, viewport);
            let (right, bottom) = world_to_screen(bottom_right, camera, viewport);
            fill_rect(frame, viewport, ScreenRectPx { left, top, right, bottom }, color);
        }
    }
}

fn proxy_screen_rect(proxy: &Proxy, camera: &Camera2D, viewport: Viewport) -> ScreenRectPx {
    let half = proxy.size * 0.5;
    let (left, top) = world_to_screen(proxy.position - half, camera, viewport);
    let (right, bottom) = world_to_screen(proxy.position + half, camera, viewport);
    ScreenRectPx {
        left,
        top,
        right: right.max(left + 1),
        bottom: bottom.max(top + 1),
    }
}

fn draw_proxy(frame: &mut [u8], viewport: Viewport, camera: &Camera2D, proxy: &Proxy) {
    let rect = proxy_screen_rect(proxy, camera, viewport);
    if !rect.is_visible(viewport) {
        return;
    }
    match proxy.shape {
        ProxyShape::Rect => fill_rect(frame, viewport, rect, proxy.color),
        ProxyShape::Ellipse => fill_ellipse(frame, viewport, rect, proxy.color),
    }
}

fn draw_minimap(frame: &mut [u8], viewport: Viewport, minimap: &MinimapImage, store: &ProxyStore) {
    let map_w = minimap.cols as i32 * MINIMAP_PIXEL_SCALE;
    let map_h = minimap.rows as i32 * MINIMAP_PIXEL_SCALE;
    let origin_x = viewport.width as i32 - MINIMAP_MARGIN_PX - map_w;
    let origin_y = MINIMAP_MARGIN_PX;
    if origin_x < 0 {
        return;
    }

    fill_rect(
        frame,
        viewport,
        ScreenRectPx {
            left: origin_x - 2,
            top: origin_y - 2,
            right: origin_x + map_w + 2,
            bottom: origin_y + map_h + 2,
        },
        MINIMAP_FRAME_COLOR,
    );
    for row in 0..minimap.rows {
        for col in 0..minimap.cols {
            let Some(color) = minimap
                .colors
                .get(row as usize * minimap.cols as usize + col as usize)
                .copied()
            else {
                continue;
            };
            let left = origin_x + col as i32 * MINIMAP_PIXEL_SCALE;
            let top = origin_y + row as i32 * MINIMAP_PIXEL_SCALE;
            fill_rect(
                frame,
                viewport,
                ScreenRectPx {
                    left,
                    top,
                    right: left + MINIMAP_PIXEL_SCALE,
                    bottom: top + MINIMAP_PIXEL_SCALE,
                },
                color,
            );
        }
    }
    for dot in store.minimap_dots() {
        let cx = origin_x + (dot.position.x * MINIMAP_PIXEL_SCALE as f32).round() as i32;
        let cy = origin_y + (dot.position.y * MINIMAP_PIXEL_SCALE as f32).round() as i32;
        let r = dot.radius_px as i32;
        fill_rect(
            frame,
            viewport,
            ScreenRectPx {
                left: cx - r,
                top: cy - r,
                right: cx + r + 1,
                bottom: cy + r + 1,
            },
            dot.color,
        );
    }
}

fn fill_rect(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: Rgba) {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(viewport.width as i32);
    let bottom = rect.bottom.min(viewport.height as i32);
    for y in top..bottom {
        for x in left..right {
            blend_pixel(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn fill_ellipse(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: Rgba) {
    let rx = (rect.right - rect.left) as f32 * 0.5;
    let ry = (rect.bottom - rect.top) as f32 * 0.5;
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let cx = rect.left as f32 + rx;
    let cy = rect.top as f32 + ry;
    let top = rect.top.max(0);
    let bottom = rect.bottom.min(viewport.height as i32);
    let left = rect.left.max(0);
    let right = rect.right.min(viewport.width as i32);
    for y in top..bottom {
        let dy = (y as f32 + 0.5 - cy) / ry;
        for x in left..right {
            let dx = (x as f32 + 0.5 - cx) / rx;
            if dx * dx + dy * dy <= 1.0 {
                blend_pixel(frame, viewport.width as usize, x, y, color);
            }
        }
    }
}

fn blend_pixel(frame: &mut [u8], width: usize, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 {
        return;
    }
    let Some(byte_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
        .and_then(|pixel| pixel.checked_mul(4))
    else {
        return;
    };
    let Some(pixel) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };
    let alpha = color[3] as u32;
    if alpha == 255 {
        pixel.copy_from_slice(&color);
        return;
    }
    for channel in 0..3 {
        let src = color[channel] as u32;
        let dst = pixel[channel] as u32;
        pixel[channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
    }
    pixel[3] = 255;
}
