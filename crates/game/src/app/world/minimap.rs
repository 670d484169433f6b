use engine::{MinimapDot, MinimapImage, Rgba, Vec2};

use super::challenge::InteractiveObject;
use super::terrain::TileGrid;

pub const MINIMAP_STRIDE: u32 = 2;
const PLAYER_DOT_COLOR: Rgba = [255, 255, 255, 255];
const PLAYER_DOT_RADIUS: u32 = 2;
const OBJECT_DOT_RADIUS: u32 = 1;

/// Downsampled terrain colors, computed once, plus the world→minimap scale
/// used for every live marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapProjection {
    stride: u32,
    scale: f32,
    image: MinimapImage,
}

impl MinimapProjection {
    pub fn from_grid(grid: &TileGrid, stride: u32) -> Self {
        let stride = stride.max(1);
        let cols = grid.cols().div_ceil(stride);
        let rows = grid.rows().div_ceil(stride);
        let mut colors = Vec::with_capacity(cols as usize * rows as usize);
        for row in 0..rows {
            for col in 0..cols {
                let kind = grid.get(i64::from(col * stride), i64::from(row * stride));
                colors.push(kind.map(|kind| kind.color()).unwrap_or([0, 0, 0, 255]));
            }
        }
        Self {
            stride,
            scale: 1.0 / (stride as f32 * grid.tile_size()),
            image: MinimapImage { cols, rows, colors },
        }
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn image(&self) -> &MinimapImage {
        &self.image
    }

    pub fn project(&self, world: Vec2) -> Vec2 {
        world * self.scale
    }

    pub fn markers(&self, player: Vec2, objects: &[InteractiveObject]) -> Vec<MinimapDot> {
        let mut dots: Vec<MinimapDot> = objects
            .iter()
            .map(|object| MinimapDot {
                position: self.project(object.position),
                color: object.display_color(),
                radius_px: OBJECT_DOT_RADIUS,
            })
            .collect();
        dots.push(MinimapDot {
            position: self.project(player),
            color: PLAYER_DOT_COLOR,
            radius_px: PLAYER_DOT_RADIUS,
        });
        dots
    }
}

#[cfg(test)]
mod tests {
    use engine::QuestionDef;

    use super::*;
    use crate::app::world::challenge::{Archetype, SOLVED_COLOR};
    use crate::app::world::terrain::TerrainKind;

    #[test]
    fn samples_every_stride_tile() {
        let mut grid = TileGrid::filled(5, 4, 32.0, TerrainKind::Grass);
        grid.set(2, 2, TerrainKind::Road);
        grid.set(1, 1, TerrainKind::Building);
        let minimap = MinimapProjection::from_grid(&grid, 2);
        let image = minimap.image();
        assert_eq!((image.cols, image.rows), (3, 2));
        assert_eq!(image.colors.len(), 6);
        assert_eq!(image.colors[4], TerrainKind::Road.color());
        assert!(!image.colors.contains(&TerrainKind::Building.color()));
    }

    #[test]
    fn markers_share_the_linear_scale() {
        let grid = TileGrid::filled(10, 10, 32.0, TerrainKind::Grass);
        let minimap = MinimapProjection::from_grid(&grid, MINIMAP_STRIDE);
        let object = InteractiveObject::new(
            Vec2::new(128.0, 64.0),
            Vec2::new(20.0, 20.0),
            Archetype::Kiosk,
            QuestionDef {
                prompt: "p".to_string(),
                answer: "a".to_string(),
                hint: None,
                points: 1,
            },
        );
        let dots = minimap.markers(Vec2::new(320.0, 160.0), &[object]);
        assert_eq!(dots.len(), 2);
        assert_eq!(dots[0].position, Vec2::new(2.0, 1.0));
        assert_eq!(dots[0].color, Archetype::Kiosk.color());
        assert_ne!(dots[0].color, SOLVED_COLOR);
        assert_eq!(dots[1].position, Vec2::new(5.0, 2.5));
    }
}
