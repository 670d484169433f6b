use engine::Vec2;

use super::terrain::TileGrid;

/// Merged static obstacle in world units; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CollisionRegion {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Strict overlap with a box given by center and half extents; touching
    /// edges do not count.
    pub fn overlaps_box(&self, center: Vec2, half_extents: Vec2) -> bool {
        center.x + half_extents.x > self.x
            && center.x - half_extents.x < self.x + self.width
            && center.y + half_extents.y > self.y
            && center.y - half_extents.y < self.y + self.height
    }
}

/// Greedy width-then-height merge of blocking tiles in row-major order.
/// Every blocking tile ends up in exactly one region.
pub fn build_collision_regions(grid: &TileGrid) -> Vec<CollisionRegion> {
    let cols = grid.cols() as usize;
    let rows = grid.rows() as usize;
    let tile_size = grid.tile_size();
    let mut claimed = vec![false; cols * rows];
    let is_open = |col: usize, row: usize, claimed: &[bool]| {
        !claimed[row * cols + col]
            && grid
                .get(col as i64, row as i64)
                .is_some_and(|kind| kind.blocks_movement())
    };

    let mut regions = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if !is_open(col, row, &claimed) {
                continue;
            }

            let mut width = 1;
            while col + width < cols && is_open(col + width, row, &claimed) {
                width += 1;
            }

            let mut height = 1;
            while row + height < rows
                && (col..col + width).all(|c| is_open(c, row + height, &claimed))
            {
                height += 1;
            }

            for claim_row in row..row + height {
                for claim_col in col..col + width {
                    claimed[claim_row * cols + claim_col] = true;
                }
            }

            regions.push(CollisionRegion {
                x: col as f32 * tile_size,
                y: row as f32 * tile_size,
                width: width as f32 * tile_size,
                height: height as f32 * tile_size,
            });
        }
    }
    regions
}
