//! World-facing data types and the streaming-cache collaborator seam.
//!
//! The viewport never owns world data. Terrain cuts, live actors, lighting
//! and attachment state all come from an external streaming cache behind
//! [`WorldSource`]; lookups that are still in flight return [`Suspend`].

use crate::error::Suspend;
use glam::{IVec2, Mat4, Vec2, Vec3};
use std::sync::Arc;

/// World units per terrain tile along each axis.
pub const TILE_SZ: i32 = 11;
/// Tiles per terrain cut along each axis.
pub const CUT_SZ: i32 = 25;
/// Independently toggleable overlay channels.
pub const OVERLAY_CHANNELS: usize = 32;

pub type ActorId = u64;

/// Opaque reference to an externally managed resource (mesh/sprite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceRef(pub u32);

/// Something the external renderer can draw. The viewport only needs the
/// identity it reports in click messages and whether it can be rendered in
/// a single solid color for picking passes.
pub trait Drawable: Send + Sync {
    /// Mesh identity carried in click messages; -1 when the drawable has
    /// no resourced mesh.
    fn mesh_id(&self) -> i32 {
        -1
    }
    /// True when the drawable supports flat single-color rendering.
    fn flat(&self) -> bool {
        false
    }
}

/// Cached render state composed onto an entry (tint layers and the like;
/// the renderer interprets it, the viewport just carries it through).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub tint: Option<[u8; 4]>,
}

/// An overlay sub-part of an actor (effect, equipment marker).
#[derive(Clone)]
pub struct ActorOverlay {
    pub id: i32,
    pub drawable: Arc<dyn Drawable>,
}

/// Snapshot of one live world object as exposed by the object cache.
#[derive(Clone)]
pub struct Actor {
    pub id: ActorId,
    /// Map-plane position in world units.
    pub rc: Vec2,
    /// Heading in radians.
    pub a: f64,
    pub drawable: Arc<dyn Drawable>,
    pub overlays: Vec<ActorOverlay>,
    pub state: RenderState,
}

/// One streamed terrain chunk: the mesh plus its tile-space bounds, which
/// the picking protocol needs to decode hit coordinates.
#[derive(Clone)]
pub struct TerrainCut {
    pub drawable: Arc<dyn Drawable>,
    /// Upper-left corner in tile coordinates.
    pub ul: IVec2,
    /// Extent in tiles.
    pub sz: IVec2,
}

/// World lighting state (direction given spherically).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub amb: [f32; 3],
    pub dif: [f32; 3],
    pub spc: [f32; 3],
    pub elev: f32,
    pub ang: f32,
}

/// Directional light resolved for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirLight {
    pub amb: [f32; 3],
    pub dif: [f32; 3],
    pub spc: [f32; 3],
    pub dir: Vec3,
}

impl Lighting {
    pub fn dir_light(&self) -> DirLight {
        DirLight {
            amb: self.amb,
            dif: self.dif,
            spc: self.spc,
            dir: Vec3::new(
                self.elev.cos() * self.ang.cos(),
                self.elev.cos() * self.ang.sin(),
                self.elev.sin(),
            ),
        }
    }
}

/// Handle to a cache-owned selection overlay region; dropping it removes
/// the region from the map.
pub trait RegionHandle: Send {
    fn update(&mut self, c1: IVec2, c2: IVec2);
}

/// The streaming world cache and object container, as seen by the viewport.
pub trait WorldSource {
    /// The controlled actor, when one exists.
    fn player(&self) -> Option<Actor>;
    /// Snapshot of all live actors for this frame.
    fn actors(&self) -> Vec<Actor>;
    /// Terrain height at a map position.
    fn height(&self, mc: Vec2) -> Result<f32, Suspend>;
    /// Terrain cut mesh at cut coordinates.
    fn cut(&self, cc: IVec2) -> Result<TerrainCut, Suspend>;
    /// Overlay mesh for one channel over one cut, when the cut has any
    /// overlaid tiles on that channel.
    fn overlay_cut(&self, channel: usize, cc: IVec2) -> Option<Arc<dyn Drawable>>;
    /// Decorative flavor actors associated with a cut.
    fn flavor(&self, cc: IVec2) -> Result<Vec<Actor>, Suspend>;
    /// Transform inherited from a following/attachment relation, when the
    /// actor has one and it is resolvable.
    fn attach_transform(&self, actor: &Actor) -> Result<Option<Mat4>, Suspend>;
    /// Terrain-conforming render state for an actor standing at `mc`.
    fn tile_state(&self, mc: Vec2) -> Result<Option<RenderState>, Suspend> {
        let _ = mc;
        Ok(None)
    }
    /// Current world lighting, when the zone defines any.
    fn lighting(&self) -> Option<Lighting> {
        None
    }
    /// Hint the cache to prefetch the tile rectangle `[ul, br]`.
    fn request_area(&self, ul: IVec2, br: IVec2) {
        let _ = (ul, br);
    }
    /// Raise the fetch priority of whatever `cause` is waiting on.
    fn boost(&self, cause: &Suspend) {
        let _ = cause;
    }
    /// Create a selection overlay region spanning tiles `[c1, c2]`.
    fn overlay_region(&self, c1: IVec2, c2: IVec2, mask: u32) -> Box<dyn RegionHandle>;
    /// Resolve the drawable for a placement preview resource.
    fn preview_drawable(
        &self,
        res: ResourceRef,
        data: Option<&[u8]>,
    ) -> Result<Arc<dyn Drawable>, Suspend>;
}

/// Tile containing a map position.
pub fn tile_at(mc: Vec2) -> IVec2 {
    IVec2::new(
        (mc.x / TILE_SZ as f32).floor() as i32,
        (mc.y / TILE_SZ as f32).floor() as i32,
    )
}

/// Cut containing a tile.
pub fn cut_at(tc: IVec2) -> IVec2 {
    IVec2::new(tc.x.div_euclid(CUT_SZ), tc.y.div_euclid(CUT_SZ))
}

/// 3D position of an actor: map position plus terrain height, which may
/// still be streaming in.
pub fn actor_pos(world: &dyn WorldSource, actor: &Actor) -> Result<Vec3, Suspend> {
    let z = world.height(actor.rc)?;
    Ok(Vec3::new(actor.rc.x, actor.rc.y, z))
}
