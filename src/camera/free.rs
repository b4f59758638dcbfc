//! Unconstrained orbit camera.

use super::{default_proj, Camera};
use crate::math::{norm_tau, pointed};
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

const EYE_LIFT: f32 = 15.0;
const MIN_DIST: f32 = 5.0;
const WHEEL_STEP: f32 = 5.0;

struct Drag {
    orig: Vec2,
    elevorig: f32,
    anglorig: f32,
}

pub struct FreeCam {
    dist: f32,
    elev: f32,
    angl: f32,
    drag: Option<Drag>,
    view: Mat4,
    proj: Mat4,
}

impl Default for FreeCam {
    fn default() -> Self {
        Self {
            dist: 50.0,
            elev: FRAC_PI_4,
            angl: 0.0,
            drag: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        }
    }
}

impl FreeCam {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Camera for FreeCam {
    fn resized(&mut self, sz: Vec2) {
        self.proj = default_proj(sz);
    }

    fn tick(&mut self, _dt: f32, focus: Vec3, offset: Vec3) {
        let base = focus + offset + Vec3::Z * EYE_LIFT;
        self.view = pointed(base, self.dist, self.elev, self.angl);
    }

    fn view(&self) -> Mat4 {
        self.view
    }

    fn proj(&self) -> Mat4 {
        self.proj
    }

    fn angle(&self) -> f32 {
        self.angl
    }

    fn click(&mut self, sc: Vec2) -> bool {
        self.drag = Some(Drag {
            orig: sc,
            elevorig: self.elev,
            anglorig: self.angl,
        });
        true
    }

    fn drag(&mut self, sc: Vec2) {
        let Some(d) = &self.drag else { return };
        self.elev = (d.elevorig - (sc.y - d.orig.y) / 100.0).clamp(0.0, FRAC_PI_2);
        self.angl = norm_tau(d.anglorig + (sc.x - d.orig.x) / 100.0);
    }

    fn release(&mut self) {
        self.drag = None;
    }

    fn wheel(&mut self, _sc: Vec2, amount: i32) -> bool {
        self.dist = (self.dist + amount as f32 * WHEEL_STEP).max(MIN_DIST);
        true
    }
}
