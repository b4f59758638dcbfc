//! Per-frame scene composition.
//!
//! Each frame the composer rebuilds an insertion-ordered render list:
//! terrain cuts in a square window around the focal point, overlay tints,
//! every live actor, the placement preview and any one-shot extras. The
//! external renderer consumes the list as-is.

use crate::defer::TaskQueue;
use crate::error::Suspend;
use crate::place::Placing;
use crate::world::{
    cut_at, tile_at, Actor, ActorId, DirLight, Drawable, RenderState, WorldSource, CUT_SZ,
    OVERLAY_CHANNELS, TILE_SZ,
};
use glam::{IVec2, Mat4, Vec2, Vec3};
use std::sync::Arc;

/// Default terrain window radius, in cuts.
pub const VIEW_RADIUS: i32 = 2;

/// Translucent tint per overlay channel; unpopulated channels are never
/// drawn even when enabled.
pub const OL_COLORS: [Option<[u8; 4]>; OVERLAY_CHANNELS] = {
    let mut t = [None; OVERLAY_CHANNELS];
    t[0] = Some([255, 0, 128, 32]);
    t[1] = Some([0, 0, 255, 32]);
    t[2] = Some([255, 0, 0, 32]);
    t[3] = Some([128, 0, 255, 32]);
    t[16] = Some([0, 255, 0, 32]);
    t[17] = Some([255, 255, 0, 32]);
    t
};

/// Provenance of a render entry, for object picking.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOwner {
    pub actor: ActorId,
    pub rc: Vec2,
    pub overlay: Option<i32>,
}

/// One drawable scheduled for this frame.
#[derive(Clone)]
pub struct RenderEntry {
    pub drawable: Arc<dyn Drawable>,
    pub xf: Mat4,
    pub state: RenderState,
    pub owner: Option<EntryOwner>,
}

/// Shadow pass parameters handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMap {
    pub res: u32,
    pub extent: f32,
    pub depth: f32,
    pub pos: Vec3,
    pub dir: Vec3,
}

const SHADOW_RES: u32 = 2048;
const SHADOW_EXTENT: f32 = 750.0;
const SHADOW_DEPTH: f32 = 5000.0;
/// Shadow focus drift and age that force a re-render of the shadow map.
const SHADOW_DIST: f32 = 50.0;
const SHADOW_AGE: f64 = 0.1;

pub struct SceneComposer {
    pub view: i32,
    visol: [i32; OVERLAY_CHANNELS],
    pub show_flavor: bool,
    extra: TaskQueue<RenderEntry>,
    shadow: Option<ShadowMap>,
    shadow_cc: Vec3,
    shadow_at: f64,
}

impl SceneComposer {
    pub fn new(show_flavor: bool) -> Self {
        Self {
            view: VIEW_RADIUS,
            visol: [0; OVERLAY_CHANNELS],
            show_flavor,
            extra: TaskQueue::default(),
            shadow: None,
            shadow_cc: Vec3::ZERO,
            shadow_at: 0.0,
        }
    }

    pub fn visol(&self, ol: usize) -> bool {
        self.visol[ol] > 0
    }

    pub fn enol(&mut self, ol: usize) {
        self.visol[ol] += 1;
    }

    pub fn disol(&mut self, ol: usize) {
        if self.visol[ol] == 0 {
            log::warn!(target: "mapview", "overlay {ol} disabled more often than enabled");
            return;
        }
        self.visol[ol] -= 1;
    }

    pub fn enol_mask(&mut self, mask: u32) {
        for ol in 0..OVERLAY_CHANNELS {
            if mask & (1 << ol) != 0 {
                self.enol(ol);
            }
        }
    }

    pub fn disol_mask(&mut self, mask: u32) {
        for ol in 0..OVERLAY_CHANNELS {
            if mask & (1 << ol) != 0 {
                self.disol(ol);
            }
        }
    }

    /// Queue a drawable for exactly one upcoming frame. Safe to call from
    /// any thread.
    pub fn extra(&self, entry: RenderEntry) {
        self.extra.push(entry);
    }

    pub fn shadow(&self) -> Option<ShadowMap> {
        self.shadow
    }

    /// Compose the frame into `rl`. `cc` is the view-center map position,
    /// `focus` the resolved focal point. A terrain cut that has not
    /// streamed in suspends the whole frame; everything else degrades
    /// per-item.
    pub fn setup(
        &mut self,
        rl: &mut Vec<RenderEntry>,
        world: &dyn WorldSource,
        cc: Vec2,
        focus: Vec3,
        placing: Option<&Placing>,
        clock: f64,
        shadows: bool,
    ) -> Result<Option<DirLight>, Suspend> {
        let cutc = cut_at(tile_at(cc));

        for oy in -self.view..=self.view {
            for ox in -self.view..=self.view {
                let at = cutc + IVec2::new(ox, oy);
                let cut = world.cut(at)?;
                rl.push(RenderEntry {
                    drawable: cut.drawable,
                    xf: cut_translation(at),
                    state: RenderState::default(),
                    owner: None,
                });
                if self.show_flavor {
                    for f in world.flavor(at).unwrap_or_default() {
                        add_actor(rl, world, &f);
                    }
                }
            }
        }

        for oy in -self.view..=self.view {
            for ox in -self.view..=self.view {
                let at = cutc + IVec2::new(ox, oy);
                for ol in 0..OVERLAY_CHANNELS {
                    if self.visol[ol] <= 0 {
                        continue;
                    }
                    let Some(color) = OL_COLORS[ol] else { continue };
                    if let Some(d) = world.overlay_cut(ol, at) {
                        rl.push(RenderEntry {
                            drawable: d,
                            xf: cut_translation(at),
                            state: RenderState { tint: Some(color) },
                            owner: None,
                        });
                    }
                }
            }
        }

        for actor in world.actors() {
            add_actor(rl, world, &actor);
        }

        let light = world.lighting().map(|l| l.dir_light());
        if shadows {
            if let Some(l) = light {
                // The anchor moves only on the drift trigger; an age
                // refresh re-renders at the pinned position with the
                // current light.
                let drift =
                    self.shadow.is_none() || self.shadow_cc.distance(focus) > SHADOW_DIST;
                if drift {
                    self.shadow_cc = focus;
                }
                if drift || clock - self.shadow_at > SHADOW_AGE {
                    self.shadow_at = clock;
                    self.shadow = Some(ShadowMap {
                        res: SHADOW_RES,
                        extent: SHADOW_EXTENT,
                        depth: SHADOW_DEPTH,
                        pos: self.shadow_cc + l.dir * 1000.0,
                        dir: -l.dir,
                    });
                }
            } else {
                self.shadow = None;
            }
        } else {
            self.shadow = None;
        }

        if let Some(p) = placing {
            p.add_to(rl, world);
        }
        rl.extend(self.extra.drain());

        Ok(light)
    }
}

fn cut_translation(at: IVec2) -> Mat4 {
    Mat4::from_translation(Vec3::new(
        (at.x * CUT_SZ * TILE_SZ) as f32,
        (at.y * CUT_SZ * TILE_SZ) as f32,
        0.0,
    ))
}

/// Add one actor and its overlays to the render list. The attachment
/// transform wins when resolvable; otherwise the actor stands on the
/// terrain at its own position and heading, tinted by the tile under it.
/// Streaming gaps degrade the entry instead of suspending the frame.
pub fn add_actor(rl: &mut Vec<RenderEntry>, world: &dyn WorldSource, actor: &Actor) {
    let xf = match world.attach_transform(actor) {
        Ok(Some(m)) => m,
        _ => {
            let z = world.height(actor.rc).unwrap_or(0.0);
            Mat4::from_translation(Vec3::new(actor.rc.x, actor.rc.y, z))
                * Mat4::from_rotation_z(actor.a as f32)
        }
    };
    let mut state = actor.state.clone();
    if state.tint.is_none() {
        if let Ok(Some(ts)) = world.tile_state(actor.rc) {
            state.tint = ts.tint;
        }
    }
    let owner = |overlay| {
        Some(EntryOwner {
            actor: actor.id,
            rc: actor.rc,
            overlay,
        })
    };
    rl.push(RenderEntry {
        drawable: Arc::clone(&actor.drawable),
        xf,
        state: state.clone(),
        owner: owner(None),
    });
    for ol in &actor.overlays {
        rl.push(RenderEntry {
            drawable: Arc::clone(&ol.drawable),
            xf,
            state: state.clone(),
            owner: owner(Some(ol.id)),
        });
    }
}
