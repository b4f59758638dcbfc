//! Damped follow camera with an elevation-driven field of view.
//!
//! The eye trails a lagged copy of the focal point; the field of view is
//! fitted through three calibration points so low elevations widen the
//! view while the horizon stays near a constant screen height.

use super::{Camera, Z_FAR, Z_NEAR};
use crate::math::{cangle, damp_frac, frustum, norm_tau, pointed};
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};
use std::f64::consts::FRAC_PI_4;

/// Eye height above the lagged focal point.
const H: f32 = 10.0;
/// Focal lag snaps instead of damping beyond this distance.
const DEAD_ZONE: f32 = 250.0;
const MAX_ELEV: f32 = FRAC_PI_2 - 0.1;
const MIN_DIST: f32 = 50.0;

// Field-of-view calibration: field(a) passes through F0 at a=0, F1 at a=1
// and F2 at a=2, where a = elev / (π/4).
const F0: f64 = 0.2;
const F1: f64 = 0.5;
const F2: f64 = 0.9;

fn field(elev: f32) -> f32 {
    let fl = 2f64.sqrt();
    let fa = ((fl * (F1 - F0)) - (F2 - F0)) / (fl - 2.0);
    let fb = ((F2 - F0) - (2.0 * (F1 - F0))) / (fl - 2.0);
    let a = elev as f64 / FRAC_PI_4;
    (F0 + fa * a + fb * a.sqrt()) as f32
}

struct Drag {
    orig: Vec2,
    anglorig: f32,
}

pub struct FollowCam {
    /// Viewport aspect (h/w) and the aspect-scaled nominal view distance.
    ca: f32,
    cd: f32,
    curc: Option<Vec3>,
    elev: f32,
    telev: f32,
    angl: f32,
    tangl: f32,
    drag: Option<Drag>,
    view: Mat4,
    proj: Mat4,
}

impl Default for FollowCam {
    fn default() -> Self {
        Self {
            ca: 0.75,
            cd: 300.0,
            curc: None,
            elev: PI / 6.0,
            telev: PI / 6.0,
            angl: 0.0,
            tangl: 0.0,
            drag: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        }
    }
}

impl FollowCam {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orbit distance compensating the eye height so the focal point keeps
    /// a constant apparent screen position at the given elevation.
    fn dist(&self, elev: f32) -> f32 {
        let da = (self.ca * field(elev)).atan();
        ((self.cd - H / elev.tan()) * (elev - da).sin() / da.sin()) - H / elev.sin()
    }
}

impl Camera for FollowCam {
    fn resized(&mut self, sz: Vec2) {
        self.ca = sz.y / sz.x;
        self.cd = 400.0 * self.ca;
    }

    fn tick(&mut self, dt: f32, focus: Vec3, offset: Vec3) {
        let cf = damp_frac(dt);

        self.elev += (self.telev - self.elev) * cf;
        if (self.telev - self.elev).abs() < 1e-4 {
            self.elev = self.telev;
        }

        self.angl += cangle((self.tangl - self.angl) as f64) as f32 * cf;
        if cangle((self.tangl - self.angl) as f64).abs() < 1e-4 {
            self.angl = self.tangl;
        }

        match self.curc {
            None => self.curc = Some(focus),
            Some(cur) => {
                let lag = focus.truncate() - cur.truncate();
                if lag.length() > DEAD_ZONE {
                    self.curc = Some(focus);
                } else if lag.length_squared() > 0.0 {
                    // Re-aim the target azimuth so the eye stays put in the
                    // world while the focal point walks under it.
                    let pd = self.elev.cos() * self.dist(self.elev);
                    let base = cur.truncate() + Vec2::from_angle(self.tangl) * pd;
                    let mut next = cur + (focus - cur) * cf;
                    if next.distance(focus) < 0.01 {
                        next = focus;
                    }
                    let to_base = base - next.truncate();
                    self.tangl = to_base.y.atan2(to_base.x);
                    self.curc = Some(next);
                }
            }
        }

        // Shift the pair together so the shortest-arc relation survives.
        let shift = self.angl - norm_tau(self.angl);
        self.angl -= shift;
        self.tangl -= shift;

        let cur = self.curc.unwrap_or(focus);
        let f = field(self.elev);
        self.view = pointed(
            cur + offset + Vec3::Z * H,
            self.dist(self.elev),
            self.elev,
            self.angl,
        );
        self.proj = frustum(-f, f, -self.ca * f, self.ca * f, Z_NEAR, Z_FAR);
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
            anglorig: self.tangl,
        });
        true
    }

    fn drag(&mut self, sc: Vec2) {
        let Some(d) = &self.drag else { return };
        self.tangl = norm_tau(d.anglorig + (sc.x - d.orig.x) / 100.0);
    }

    fn release(&mut self) {
        self.drag = None;
    }

    fn wheel(&mut self, _sc: Vec2, amount: i32) -> bool {
        let prev = self.telev;
        self.telev = (self.telev + amount as f32 * self.telev * 0.02).min(MAX_ELEV);
        if self.dist(self.telev) < MIN_DIST {
            self.telev = prev;
        }
        true
    }
}
