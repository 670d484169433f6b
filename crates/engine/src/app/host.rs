use super::simulation::Vec2;

pub type Rgba = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(pub u64);

/// Draw bands; proxies are ordered by layer first, then by depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProxyLayer {
    Obstacle,
    Decoration,
    Actor,
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyShape {
    Rect,
    Ellipse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyDesc {
    pub debug_name: &'static str,
    pub layer: ProxyLayer,
    pub shape: ProxyShape,
    /// Center in world units.
    pub position: Vec2,
    pub size: Vec2,
    pub color: Rgba,
    pub depth: f32,
    pub collidable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyUpdate {
    pub position: Vec2,
    pub depth: f32,
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    pub id: ProxyId,
    pub debug_name: &'static str,
    pub layer: ProxyLayer,
    pub shape: ProxyShape,
    pub position: Vec2,
    pub size: Vec2,
    pub color: Rgba,
    pub depth: f32,
    pub collidable: bool,
}

/// Per-tile colors for the static ground, row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundLayer {
    pub cols: u32,
    pub rows: u32,
    pub tile_size: f32,
    pub colors: Vec<Rgba>,
}

impl GroundLayer {
    pub fn color_at(&self, col: u32, row: u32) -> Option<Rgba> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.colors
            .get(row as usize * self.cols as usize + col as usize)
            .copied()
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.cols as f32 * self.tile_size,
            self.rows as f32 * self.tile_size,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinimapImage {
    pub cols: u32,
    pub rows: u32,
    pub colors: Vec<Rgba>,
}

/// Marker in minimap pixel space (origin = minimap top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapDot {
    pub position: Vec2,
    pub color: Rgba,
    pub radius_px: u32,
}

/// What the simulation needs from whatever draws and hosts its entities.
pub trait ProxyHost {
    fn set_ground(&mut self, ground: GroundLayer);
    fn spawn_proxy(&mut self, desc: ProxyDesc) -> ProxyId;
    fn update_proxy(&mut self, id: ProxyId, update: ProxyUpdate);
    fn despawn_proxy(&mut self, id: ProxyId) -> bool;
    fn follow(&mut self, id: ProxyId);
    fn set_minimap(&mut self, image: MinimapImage);
    fn set_minimap_dots(&mut self, dots: Vec<MinimapDot>);
    fn clear(&mut self);
}

#[derive(Debug, Default)]
struct ProxyIdAllocator {
    next: u64,
}

impl ProxyIdAllocator {
    fn allocate(&mut self) -> ProxyId {
        let id = ProxyId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// In-memory host. The windowed loop draws from it; headless runs and tests
/// inspect it directly.
#[derive(Debug, Default)]
pub struct ProxyStore {
    allocator: ProxyIdAllocator,
    proxies: Vec<Proxy>,
    ground: Option<GroundLayer>,
    follow_target: Option<ProxyId>,
    minimap: Option<MinimapImage>,
    minimap_dots: Vec<MinimapDot>,
    spawn_calls: u64,
    update_calls: u64,
}

impl ProxyStore {
    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    pub fn find(&self, id: ProxyId) -> Option<&Proxy> {
        self.index_of(id).map(|index| &self.proxies[index])
    }

    pub fn ground(&self) -> Option<&GroundLayer> {
        self.ground.as_ref()
    }

    pub fn follow_target(&self) -> Option<ProxyId> {
        self.follow_target
    }

    pub fn follow_position(&self) -> Option<Vec2> {
        self.follow_target
            .and_then(|id| self.find(id))
            .map(|proxy| proxy.position)
    }

    pub fn minimap(&self) -> Option<&MinimapImage> {
        self.minimap.as_ref()
    }

    pub fn minimap_dots(&self) -> &[MinimapDot] {
        &self.minimap_dots
    }

    pub fn spawn_calls(&self) -> u64 {
        self.spawn_calls
    }

    pub fn update_calls(&self) -> u64 {
        self.update_calls
    }

    pub fn count_named(&self, debug_name: &str) -> usize {
        self.proxies
            .iter()
            .filter(|proxy| proxy.debug_name == debug_name)
            .count()
    }

    /// Indices into `proxies()` in draw order: layer, then depth, then spawn order.
    pub fn draw_order(&self, out: &mut Vec<usize>) {
        out.clear();
        out.extend(0..self.proxies.len());
        out.sort_by(|&a, &b| {
            let pa = &self.proxies[a];
            let pb = &self.proxies[b];
            pa.layer
                .cmp(&pb.layer)
                .then(pa.depth.total_cmp(&pb.depth))
                .then(pa.id.cmp(&pb.id))
        });
    }

    // Ids are allocated monotonically and despawn keeps relative order, so
    // the vector stays sorted by id.
    fn index_of(&self, id: ProxyId) -> Option<usize> {
        self.proxies
            .binary_search_by_key(&id, |proxy| proxy.id)
            .ok()
    }
}

impl ProxyHost for ProxyStore {
    fn set_ground(&mut self, ground: GroundLayer) {
        self.ground = Some(ground);
    }

    fn spawn_proxy(&mut self, desc: ProxyDesc) -> ProxyId {
        let id = self.allocator.allocate();
        self.spawn_calls = self.spawn_calls.saturating_add(1);
        self.proxies.push(Proxy {
            id,
            debug_name: desc.debug_name,
            layer: desc.layer,
            shape: desc.shape,
            position: desc.position,
            size: desc.size,
            color: desc.color,
            depth: desc.depth,
            collidable: desc.collidable,
        });
        id
    }

    fn update_proxy(&mut self, id: ProxyId, update: ProxyUpdate) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.update_calls = self.update_calls.saturating_add(1);
        let proxy = &mut self.proxies[index];
        proxy.position = update.position;
        proxy.depth = update.depth;
        if let Some(color) = update.color {
            proxy.color = color;
        }
    }

    fn despawn_proxy(&mut self, id: ProxyId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.proxies.remove(index);
        if self.follow_target == Some(id) {
            self.follow_target = None;
        }
        true
    }

    fn follow(&mut self, id: ProxyId) {
        self.follow_target = Some(id);
    }

    fn set_minimap(&mut self, image: MinimapImage) {
        self.minimap = Some(image);
    }

    fn set_minimap_dots(&mut self, dots: Vec<MinimapDot>) {
        self.minimap_dots = dots;
    }

    fn clear(&mut self) {
        self.proxies.clear();
        self.ground = None;
        self.follow_target = None;
        self.minimap = None;
        self.minimap_dots.clear();
    }
}
