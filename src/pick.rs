//! Color-encoded offscreen picking.
//!
//! Clicks resolve against flat-color passes rendered by the external
//! renderer through [`PickRenderer`]: every pickable thing gets a unique
//! 24-bit color, the pass is drawn offscreen, and the pixel under the
//! click is read back and decoded. Readbacks may complete later and out
//! of order; each check accumulates its passes behind a mutex and fires
//! its callback exactly once when all of them have landed.

use crate::world::{ActorId, Drawable, TILE_SZ};
use glam::{IVec2, Mat4, Vec2};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Spread a pick id over three channels, four significant bits per channel
/// per nibble, so ids survive low-precision offscreen formats.
pub fn encode_pick_color(i: u32) -> [u8; 3] {
    let r = ((i & 0x00000f) << 4) | ((i & 0x00f000) >> 12);
    let g = (i & 0x0000f0) | ((i & 0x0f0000) >> 16);
    let b = ((i & 0x000f00) >> 4) | ((i & 0xf00000) >> 20);
    [r as u8, g as u8, b as u8]
}

/// Pass-scoped bijection between pick colors and identities. Ids start at
/// 1; the background reads back as color 0 and decodes to nothing.
pub struct PickColorMap<T> {
    next: u32,
    map: HashMap<[u8; 3], T>,
}

impl<T> Default for PickColorMap<T> {
    fn default() -> Self {
        Self {
            next: 1,
            map: HashMap::new(),
        }
    }
}

impl<T> PickColorMap<T> {
    pub fn assign(&mut self, val: T) -> [u8; 3] {
        debug_assert!(self.next < 1 << 24);
        let color = encode_pick_color(self.next);
        self.next += 1;
        self.map.insert(color, val);
        color
    }

    pub fn lookup(&self, color: [u8; 3]) -> Option<&T> {
        self.map.get(&color)
    }
}

/// A drawable rendered in one assigned solid color.
pub struct SolidEntry {
    pub color: [u8; 3],
    pub drawable: Arc<dyn Drawable>,
    pub xf: Mat4,
}

/// A terrain cut participating in a coordinate-encoding pass.
pub struct CutEntry {
    pub drawable: Arc<dyn Drawable>,
    pub ul: IVec2,
    pub sz: IVec2,
    pub xf: Mat4,
}

/// One offscreen flat pass. The renderer knows how to emit the per-pass
/// encodings; the viewport only decodes the read-back pixel.
pub enum FlatPass<'a> {
    /// Each entry in its assigned solid color.
    Solid(&'a [SolidEntry]),
    /// Cuts with the 1-based tile column/row of each fragment in R/G.
    CutTiles(&'a [CutEntry]),
    /// Cuts with the sub-tile offset of each fragment scaled 0-255 in R/G;
    /// B must be 0 wherever the offset is valid.
    CutPixels(&'a [CutEntry]),
}

pub type PixelCallback = Box<dyn FnOnce([u8; 4]) + Send>;

/// Renderer seam for picking: draw `pass` offscreen with the given
/// matrices and deliver the color under `sc` to `done` exactly once,
/// possibly from another thread.
pub trait PickRenderer {
    fn readback(&mut self, view: Mat4, proj: Mat4, pass: FlatPass<'_>, sc: Vec2, done: PixelCallback);
}

/// What a click on an object resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickInfo {
    pub actor: ActorId,
    /// Actor map position at pick time.
    pub rc: Vec2,
    pub overlay: Option<i32>,
    pub mesh: i32,
}

/// An object-pick candidate: flat-capable drawable plus the click identity
/// it stands for.
pub struct ObjPickable {
    pub info: ClickInfo,
    pub drawable: Arc<dyn Drawable>,
    pub xf: Mat4,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct MapState {
    cut: Option<usize>,
    tile: IVec2,
    pixel: Option<IVec2>,
    mask: u8,
    done: Option<Box<dyn FnOnce(Option<Vec2>) + Send>>,
}

fn map_resolve(bounds: &[(IVec2, IVec2)], st: &mut MapState) {
    let Some(done) = st.done.take() else { return };
    let hit = st.cut.and_then(|i| {
        let (ul, sz) = bounds[i];
        let t = st.tile;
        if t.x < 0 || t.y < 0 || t.x >= sz.x || t.y >= sz.y {
            return None;
        }
        // Imprecise offset pass degrades to the tile corner.
        let px = st.pixel.unwrap_or(IVec2::ZERO);
        Some(Vec2::new(
            ((ul.x + t.x) * TILE_SZ + px.x) as f32,
            ((ul.y + t.y) * TILE_SZ + px.y) as f32,
        ))
    });
    done(hit);
}

/// Resolve the world coordinate under a screen point via three passes:
/// cut identity, tile within cut, sub-tile offset.
pub fn check_map_click(
    renderer: &mut dyn PickRenderer,
    view: Mat4,
    proj: Mat4,
    cuts: &[CutEntry],
    sc: Vec2,
    done: Box<dyn FnOnce(Option<Vec2>) + Send>,
) {
    let mut colors = PickColorMap::default();
    let solid: Vec<SolidEntry> = cuts
        .iter()
        .enumerate()
        .map(|(i, c)| SolidEntry {
            color: colors.assign(i),
            drawable: Arc::clone(&c.drawable),
            xf: c.xf,
        })
        .collect();
    let bounds: Arc<Vec<(IVec2, IVec2)>> = Arc::new(cuts.iter().map(|c| (c.ul, c.sz)).collect());
    let st = Arc::new(Mutex::new(MapState {
        cut: None,
        tile: IVec2::ZERO,
        pixel: None,
        mask: 0,
        done: Some(done),
    }));
    let colors = Arc::new(colors);

    let (s, b, cm) = (Arc::clone(&st), Arc::clone(&bounds), Arc::clone(&colors));
    renderer.readback(
        view,
        proj,
        FlatPass::Solid(&solid),
        sc,
        Box::new(move |px| {
            let mut st = lock(&s);
            st.cut = cm.lookup([px[0], px[1], px[2]]).copied();
            st.mask |= 1;
            if st.mask == 7 {
                map_resolve(&b, &mut st);
            }
        }),
    );

    let (s, b) = (Arc::clone(&st), Arc::clone(&bounds));
    renderer.readback(
        view,
        proj,
        FlatPass::CutTiles(cuts),
        sc,
        Box::new(move |px| {
            let mut st = lock(&s);
            st.tile = IVec2::new(px[0] as i32 - 1, px[1] as i32 - 1);
            st.mask |= 2;
            if st.mask == 7 {
                map_resolve(&b, &mut st);
            }
        }),
    );

    let (s, b) = (st, bounds);
    renderer.readback(
        view,
        proj,
        FlatPass::CutPixels(cuts),
        sc,
        Box::new(move |px| {
            let mut st = lock(&s);
            st.pixel = (px[2] == 0).then(|| {
                IVec2::new(
                    px[0] as i32 * TILE_SZ / 255,
                    px[1] as i32 * TILE_SZ / 255,
                )
            });
            st.mask |= 4;
            if st.mask == 7 {
                map_resolve(&b, &mut st);
            }
        }),
    );
}

/// Resolve the object under a screen point via one solid-color pass over
/// the flat-capable pickables.
pub fn check_obj_click(
    renderer: &mut dyn PickRenderer,
    view: Mat4,
    proj: Mat4,
    pickables: &[ObjPickable],
    sc: Vec2,
    done: Box<dyn FnOnce(Option<ClickInfo>) + Send>,
) {
    let mut colors = PickColorMap::default();
    let solid: Vec<SolidEntry> = pickables
        .iter()
        .map(|p| SolidEntry {
            color: colors.assign(p.info.clone()),
            drawable: Arc::clone(&p.drawable),
            xf: p.xf,
        })
        .collect();
    renderer.readback(
        view,
        proj,
        FlatPass::Solid(&solid),
        sc,
        Box::new(move |px| {
            done(colors.lookup([px[0], px[1], px[2]]).cloned());
        }),
    );
}

/// Combined hit test: map pick and object pick against one click point.
/// No map hit means no hit at all, whatever the object pass saw.
pub fn check_hit(
    renderer: &mut dyn PickRenderer,
    view: Mat4,
    proj: Mat4,
    cuts: &[CutEntry],
    pickables: &[ObjPickable],
    sc: Vec2,
    done: Box<dyn FnOnce(Option<(Vec2, Option<ClickInfo>)>) + Send>,
) {
    struct HitState {
        mc: Option<Vec2>,
        obj: Option<ClickInfo>,
        mask: u8,
        done: Option<Box<dyn FnOnce(Option<(Vec2, Option<ClickInfo>)>) + Send>>,
    }
    fn hit_resolve(st: &mut HitState) {
        if let Some(done) = st.done.take() {
            done(st.mc.map(|mc| (mc, st.obj.take())));
        }
    }
    let st = Arc::new(Mutex::new(HitState {
        mc: None,
        obj: None,
        mask: 0,
        done: Some(done),
    }));

    let s = Arc::clone(&st);
    check_map_click(
        renderer,
        view,
        proj,
        cuts,
        sc,
        Box::new(move |mc| {
            let mut st = lock(&s);
            st.mc = mc;
            st.mask |= 1;
            if st.mask == 3 {
                hit_resolve(&mut st);
            }
        }),
    );

    let s = st;
    check_obj_click(
        renderer,
        view,
        proj,
        pickables,
        sc,
        Box::new(move |info| {
            let mut st = lock(&s);
            st.obj = info;
            st.mask |= 2;
            if st.mask == 3 {
                hit_resolve(&mut st);
            }
        }),
    );
}
