//! Shared fixtures: an in-memory world source and a software pick
//! renderer that answers pass readbacks from a configured pointer
//! position.
#![allow(dead_code)]

use glam::{IVec2, Mat4, Vec2};
use mapview::error::Suspend;
use mapview::pick::{FlatPass, PickRenderer, PixelCallback, SolidEntry};
use mapview::world::{
    tile_at, Actor, ActorOverlay, Drawable, Lighting, RegionHandle, RenderState, ResourceRef,
    TerrainCut, WorldSource, CUT_SZ, TILE_SZ,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct Mesh {
    pub id: i32,
    pub flat: bool,
}

impl Drawable for Mesh {
    fn mesh_id(&self) -> i32 {
        self.id
    }
    fn flat(&self) -> bool {
        self.flat
    }
}

pub fn mesh(id: i32, flat: bool) -> Arc<dyn Drawable> {
    Arc::new(Mesh { id, flat })
}

pub fn actor(id: u64, rc: Vec2, mesh_id: i32) -> Actor {
    Actor {
        id,
        rc,
        a: 0.0,
        drawable: mesh(mesh_id, true),
        overlays: Vec::new(),
        state: RenderState::default(),
    }
}

pub fn actor_with_overlay(id: u64, rc: Vec2, mesh_id: i32, ol: i32, ol_mesh: i32) -> Actor {
    let mut a = actor(id, rc, mesh_id);
    a.overlays.push(ActorOverlay {
        id: ol,
        drawable: mesh(ol_mesh, true),
    });
    a
}

#[derive(Default)]
pub struct RegionLog {
    pub updates: Vec<(IVec2, IVec2)>,
    pub dropped: bool,
}

struct TestRegion(Arc<Mutex<RegionLog>>);

impl RegionHandle for TestRegion {
    fn update(&mut self, c1: IVec2, c2: IVec2) {
        self.0.lock().unwrap().updates.push((c1, c2));
    }
}

impl Drop for TestRegion {
    fn drop(&mut self) {
        self.0.lock().unwrap().dropped = true;
    }
}

pub struct TestWorld {
    pub player: Option<Actor>,
    pub actors: Vec<Actor>,
    pub cuts: HashMap<IVec2, TerrainCut>,
    /// Overlay mesh served for every streamed cut, per channel.
    pub overlays: HashMap<usize, Arc<dyn Drawable>>,
    pub lighting: Option<Lighting>,
    pub region_log: Arc<Mutex<RegionLog>>,
    pub boosted: Mutex<Vec<String>>,
    pub requested: Mutex<Vec<(IVec2, IVec2)>>,
}

impl TestWorld {
    pub fn empty() -> Self {
        Self {
            player: None,
            actors: Vec::new(),
            cuts: HashMap::new(),
            overlays: HashMap::new(),
            lighting: None,
            region_log: Arc::new(Mutex::new(RegionLog::default())),
            boosted: Mutex::new(Vec::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// World with every cut in a square of the given radius around the
    /// origin streamed in.
    pub fn grid(radius: i32) -> Self {
        let mut w = Self::empty();
        for cy in -radius..=radius {
            for cx in -radius..=radius {
                let at = IVec2::new(cx, cy);
                w.cuts.insert(
                    at,
                    TerrainCut {
                        drawable: mesh(-1, false),
                        ul: at * CUT_SZ,
                        sz: IVec2::splat(CUT_SZ),
                    },
                );
            }
        }
        w
    }
}

impl WorldSource for TestWorld {
    fn player(&self) -> Option<Actor> {
        self.player.clone()
    }

    fn actors(&self) -> Vec<Actor> {
        self.actors.clone()
    }

    fn height(&self, _mc: Vec2) -> Result<f32, Suspend> {
        Ok(0.0)
    }

    fn cut(&self, cc: IVec2) -> Result<TerrainCut, Suspend> {
        self.cuts
            .get(&cc)
            .cloned()
            .ok_or_else(|| Suspend::new(format!("cut ({}, {})", cc.x, cc.y)))
    }

    fn overlay_cut(&self, channel: usize, cc: IVec2) -> Option<Arc<dyn Drawable>> {
        if !self.cuts.contains_key(&cc) {
            return None;
        }
        self.overlays.get(&channel).cloned()
    }

    fn flavor(&self, _cc: IVec2) -> Result<Vec<Actor>, Suspend> {
        Ok(Vec::new())
    }

    fn attach_transform(&self, _actor: &Actor) -> Result<Option<Mat4>, Suspend> {
        Ok(None)
    }

    fn lighting(&self) -> Option<Lighting> {
        self.lighting
    }

    fn request_area(&self, ul: IVec2, br: IVec2) {
        self.requested.lock().unwrap().push((ul, br));
    }

    fn boost(&self, cause: &Suspend) {
        self.boosted.lock().unwrap().push(cause.to_string());
    }

    fn overlay_region(&self, c1: IVec2, c2: IVec2, _mask: u32) -> Box<dyn RegionHandle> {
        self.region_log.lock().unwrap().updates.push((c1, c2));
        Box::new(TestRegion(Arc::clone(&self.region_log)))
    }

    fn preview_drawable(
        &self,
        _res: ResourceRef,
        _data: Option<&[u8]>,
    ) -> Result<Arc<dyn Drawable>, Suspend> {
        Ok(mesh(99, false))
    }
}

/// Software stand-in for the offscreen pick renderer. It pretends the
/// pointer hovers the configured world position and answers each pass the
/// way the real flat passes would.
pub struct FakePick {
    /// Map position under the pointer; None reads back as background.
    pub over: Option<Vec2>,
    /// Mesh id of the object under the pointer, for object passes.
    pub hit_mesh: Option<i32>,
}

impl FakePick {
    pub fn background() -> Self {
        Self {
            over: None,
            hit_mesh: None,
        }
    }

    pub fn over(mc: Vec2) -> Self {
        Self {
            over: Some(mc),
            hit_mesh: None,
        }
    }

    fn solid(&self, entries: &[SolidEntry]) -> [u8; 4] {
        let object_pass = entries.first().map_or(true, |e| e.drawable.flat());
        if object_pass {
            if let Some(m) = self.hit_mesh {
                if let Some(e) = entries.iter().find(|e| e.drawable.mesh_id() == m) {
                    return [e.color[0], e.color[1], e.color[2], 255];
                }
            }
        } else if let Some(mc) = self.over {
            let span = (CUT_SZ * TILE_SZ) as f32;
            let hit = entries.iter().find(|e| {
                let o = Vec2::new(e.xf.w_axis.x, e.xf.w_axis.y);
                mc.x >= o.x && mc.x < o.x + span && mc.y >= o.y && mc.y < o.y + span
            });
            if let Some(e) = hit {
                return [e.color[0], e.color[1], e.color[2], 255];
            }
        }
        [0, 0, 0, 0]
    }
}

impl PickRenderer for FakePick {
    fn readback(
        &mut self,
        _view: Mat4,
        _proj: Mat4,
        pass: FlatPass<'_>,
        _sc: Vec2,
        done: PixelCallback,
    ) {
        let px = match pass {
            FlatPass::Solid(entries) => self.solid(entries),
            FlatPass::CutTiles(cuts) => match self.over {
                Some(mc) => {
                    let t = tile_at(mc);
                    match cuts.iter().find(|c| {
                        t.x >= c.ul.x
                            && t.y >= c.ul.y
                            && t.x < c.ul.x + c.sz.x
                            && t.y < c.ul.y + c.sz.y
                    }) {
                        Some(c) => [
                            (t.x - c.ul.x + 1) as u8,
                            (t.y - c.ul.y + 1) as u8,
                            0,
                            255,
                        ],
                        None => [0, 0, 0, 0],
                    }
                }
                None => [0, 0, 0, 0],
            },
            FlatPass::CutPixels(_) => match self.over {
                Some(mc) => {
                    let t = tile_at(mc);
                    let off = mc - Vec2::new((t.x * TILE_SZ) as f32, (t.y * TILE_SZ) as f32);
                    let enc = |v: f32| ((v.floor() as i32 * 255 + TILE_SZ - 1) / TILE_SZ) as u8;
                    [enc(off.x), enc(off.y), 0, 255]
                }
                None => [0, 0, 255, 255],
            },
        };
        done(px);
    }
}
