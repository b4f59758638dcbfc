//! Placement preview.
//!
//! While a placement is pending the server-named resource follows the
//! mouse over the terrain, snapped and oriented by a pluggable adjustment
//! policy, and is drawn as an ordinary actor at the end of the frame.

use crate::math::cangle;
use crate::msg::{MOD_CTRL, MOD_SHIFT};
use crate::scene::RenderEntry;
use crate::world::{tile_at, RenderState, ResourceRef, WorldSource, TILE_SZ};
use glam::{Mat4, Vec2, Vec3};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacePose {
    pub rc: Vec2,
    /// Heading in radians, canonicalized into (-π, π].
    pub a: f64,
}

pub trait PlaceAdjust: Send {
    /// Reposition the preview for a pointer at map position `mc`.
    fn adjust(&mut self, pose: &mut PlacePose, mc: Vec2, mods: u32, player: Option<Vec2>);
    /// Offer a wheel rotation; true consumes it.
    fn rotate(&mut self, pose: &mut PlacePose, amount: i32, mods: u32) -> bool;
}

/// Stock adjustment: tile-center snapping (ctrl for free positioning) and
/// player-facing orientation in quarter turns until the first manual
/// rotation unlocks the angle.
#[derive(Debug, Default)]
pub struct StdPlace {
    freerot: bool,
}

impl PlaceAdjust for StdPlace {
    fn adjust(&mut self, pose: &mut PlacePose, mc: Vec2, mods: u32, player: Option<Vec2>) {
        pose.rc = if mods & MOD_CTRL == 0 {
            let t = tile_at(mc);
            Vec2::new(
                (t.x * TILE_SZ) as f32 + TILE_SZ as f32 / 2.0,
                (t.y * TILE_SZ) as f32 + TILE_SZ as f32 / 2.0,
            )
        } else {
            mc
        };
        if let Some(pl) = player {
            if !self.freerot {
                let to_pl = pl - pose.rc;
                let a = (to_pl.y as f64).atan2(to_pl.x as f64);
                pose.a = (a / FRAC_PI_2).round() * FRAC_PI_2;
            }
        }
    }

    fn rotate(&mut self, pose: &mut PlacePose, amount: i32, mods: u32) -> bool {
        if mods & MOD_SHIFT == 0 {
            return false;
        }
        self.freerot = true;
        if mods & MOD_CTRL == 0 {
            pose.a = FRAC_PI_4 * ((pose.a + amount as f64 * FRAC_PI_4) / FRAC_PI_4).round();
        } else {
            pose.a += amount as f64 * PI / 16.0;
        }
        pose.a = cangle(pose.a);
        true
    }
}

/// State of a pending placement.
pub struct Placing {
    pub pose: PlacePose,
    pub adjust: Box<dyn PlaceAdjust>,
    res: ResourceRef,
    data: Option<Vec<u8>>,
    overlays: Vec<(ResourceRef, Option<Vec<u8>>)>,
    /// Screen position of the last applied adjustment; a click only emits
    /// a place message once the preview has been positioned.
    pub last_sc: Option<Vec2>,
}

impl Placing {
    pub fn new(
        res: ResourceRef,
        data: Option<Vec<u8>>,
        overlays: Vec<(ResourceRef, Option<Vec<u8>>)>,
    ) -> Self {
        Self {
            pose: PlacePose {
                rc: Vec2::ZERO,
                a: 0.0,
            },
            adjust: Box::new(StdPlace::default()),
            res,
            data,
            overlays,
            last_sc: None,
        }
    }

    pub fn apply_adjust(&mut self, sc: Vec2, mc: Vec2, mods: u32, player: Option<Vec2>) {
        self.adjust.adjust(&mut self.pose, mc, mods, player);
        self.last_sc = Some(sc);
    }

    pub fn rotate(&mut self, amount: i32, mods: u32) -> bool {
        self.adjust.rotate(&mut self.pose, amount, mods)
    }

    /// Append the preview to the render list. Resources still streaming in
    /// simply leave the preview invisible this frame.
    pub fn add_to(&self, rl: &mut Vec<RenderEntry>, world: &dyn WorldSource) {
        let Ok(drawable) = world.preview_drawable(self.res, self.data.as_deref()) else {
            return;
        };
        let z = world.height(self.pose.rc).unwrap_or(0.0);
        let xf = Mat4::from_translation(Vec3::new(self.pose.rc.x, self.pose.rc.y, z))
            * Mat4::from_rotation_z(self.pose.a as f32);
        rl.push(RenderEntry {
            drawable,
            xf,
            state: RenderState::default(),
            owner: None,
        });
        for (res, data) in &self.overlays {
            if let Ok(d) = world.preview_drawable(*res, data.as_deref()) {
                rl.push(RenderEntry {
                    drawable: d,
                    xf,
                    state: RenderState::default(),
                    owner: None,
                });
            }
        }
    }
}
