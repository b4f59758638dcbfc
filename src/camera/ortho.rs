//! Orthographic cameras.
//!
//! `OrthoCam` is the fixed-parameter base; `SOrthoCam` adds damped focus,
//! azimuth and zoom on top of it and is the default camera. Both support
//! an "exact" mode that snaps the view to whole framebuffer pixels so the
//! isometric terrain stays free of crawling artifacts.

use super::{Camera, Z_FAR, Z_NEAR};
use crate::error::ViewError;
use crate::math::{damp_frac, norm_tau, pointed};
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const EYE_LIFT: f32 = 15.0;
const DIST: f32 = 500.0;
const DEAD_ZONE: f32 = 250.0;

fn ortho_proj(sz: Vec2, field: f32) -> Mat4 {
    let aspect = sz.y / sz.x;
    Mat4::orthographic_rh_gl(
        -field,
        field,
        -field * aspect,
        field * aspect,
        Z_NEAR,
        Z_FAR,
    )
}

/// Translate the view so the jitter reference `jc` lands on a whole pixel.
/// The reference follows the camera: once its image drifts more than 500
/// screen units off-center it is dropped and re-anchored next frame.
fn pixel_snap(vm: Mat4, jc: &mut Option<Vec3>, anchor: Vec3, sz: Vec2, field: f32) -> Mat4 {
    let j = *jc.get_or_insert(anchor);
    let pfac = sz.x / (field * 2.0);
    let vj = vm.transform_point3(j) * pfac;
    let corr = Vec3::new(vj.x.round() - vj.x, vj.y.round() - vj.y, 0.0) / pfac;
    if vj.x.abs() > 500.0 || vj.y.abs() > 500.0 {
        *jc = None;
    }
    Mat4::from_translation(corr) * vm
}

fn parse_exact(args: &[String]) -> Result<bool, ViewError> {
    let mut exact = false;
    for arg in args {
        match arg.as_str() {
            "-e" => exact = true,
            other => {
                return Err(ViewError::Config(format!(
                    "unknown camera option {other:?}"
                )))
            }
        }
    }
    Ok(exact)
}

struct Drag {
    orig: Vec2,
    anglorig: f32,
}

/// Fixed orthographic camera; azimuth adjustable by drag.
pub struct OrthoCam {
    exact: bool,
    sz: Vec2,
    angl: f32,
    field: f32,
    jc: Option<Vec3>,
    drag: Option<Drag>,
    view: Mat4,
    proj: Mat4,
}

impl OrthoCam {
    pub fn new(exact: bool) -> Self {
        Self {
            exact,
            sz: Vec2::ONE,
            angl: norm_tau(-PI / 4.0),
            field: 100.0 * 2f32.sqrt(),
            jc: None,
            drag: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        }
    }

    pub fn from_args(args: &[String]) -> Result<Self, ViewError> {
        Ok(Self::new(parse_exact(args)?))
    }
}

impl Camera for OrthoCam {
    fn resized(&mut self, sz: Vec2) {
        self.sz = sz;
    }

    fn tick(&mut self, _dt: f32, focus: Vec3, offset: Vec3) {
        let mut vm = pointed(
            focus + offset + Vec3::Z * EYE_LIFT,
            DIST,
            PI / 6.0,
            self.angl,
        );
        if self.exact {
            vm = pixel_snap(vm, &mut self.jc, focus, self.sz, self.field);
        }
        self.view = vm;
        self.proj = ortho_proj(self.sz, self.field);
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
            anglorig: self.angl,
        });
        true
    }

    fn drag(&mut self, sc: Vec2) {
        let Some(d) = &self.drag else { return };
        self.angl = norm_tau(d.anglorig + (sc.x - d.orig.x) / 100.0);
    }

    fn release(&mut self) {
        self.drag = None;
    }
}

/// Smoothed orthographic camera: damped focus, azimuth and zoom, with the
/// azimuth snapping to the diagonal of its 90° sector when zoomed out.
pub struct SOrthoCam {
    exact: bool,
    sz: Vec2,
    cc: Option<Vec3>,
    jc: Option<Vec3>,
    angl: f32,
    tangl: f32,
    field: f32,
    tfield: f32,
    drag: Option<Drag>,
    view: Mat4,
    proj: Mat4,
}

impl SOrthoCam {
    pub fn new(exact: bool) -> Self {
        let field = 100.0 * 2f32.sqrt();
        let angl = norm_tau(-PI / 4.0);
        Self {
            exact,
            sz: Vec2::ONE,
            cc: None,
            jc: None,
            angl,
            tangl: angl,
            field,
            tfield: field,
            drag: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        }
    }

    pub fn from_args(args: &[String]) -> Result<Self, ViewError> {
        Ok(Self::new(parse_exact(args)?))
    }

    fn snap_to_sector(&mut self) {
        self.tangl = FRAC_PI_2 * ((self.tangl / FRAC_PI_2).floor() + 0.5);
    }
}

impl Camera for SOrthoCam {
    fn resized(&mut self, sz: Vec2) {
        self.sz = sz;
    }

    fn tick(&mut self, dt: f32, focus: Vec3, offset: Vec3) {
        let cf = damp_frac(dt);

        match &mut self.cc {
            Some(cc) if focus.truncate().distance(cc.truncate()) <= DEAD_ZONE => {
                // In exact mode small residuals stay put so the pixel snap
                // does not fight the damping.
                if !self.exact || focus.distance(*cc) > 2.0 {
                    *cc += (focus - *cc) * cf;
                }
            }
            _ => self.cc = Some(focus),
        }
        let cc = self.cc.unwrap_or(focus);

        self.angl += (self.tangl - self.angl) * cf;
        while self.angl > TAU {
            self.angl -= TAU;
            self.tangl -= TAU;
            if let Some(d) = &mut self.drag {
                d.anglorig -= TAU;
            }
        }
        while self.angl < 0.0 {
            self.angl += TAU;
            self.tangl += TAU;
            if let Some(d) = &mut self.drag {
                d.anglorig += TAU;
            }
        }
        if (self.tangl - self.angl).abs() < 1e-3 {
            self.angl = self.tangl;
        } else {
            self.jc = Some(cc);
        }

        self.field += (self.tfield - self.field) * cf;
        if (self.tfield - self.field).abs() < 0.1 {
            self.field = self.tfield;
        } else {
            self.jc = Some(cc);
        }

        let mut vm = pointed(cc + offset + Vec3::Z * EYE_LIFT, DIST, PI / 6.0, self.angl);
        if self.exact {
            vm = pixel_snap(vm, &mut self.jc, cc, self.sz, self.field);
        }
        self.view = vm;
        self.proj = ortho_proj(self.sz, self.field);
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
            anglorig: self.angl,
        });
        true
    }

    fn drag(&mut self, sc: Vec2) {
        let Some(d) = &self.drag else { return };
        self.tangl = d.anglorig + (sc.x - d.orig.x) / 100.0;
    }

    fn release(&mut self) {
        self.drag = None;
        if self.tfield > 100.0 {
            self.snap_to_sector();
        }
    }

    fn wheel(&mut self, _sc: Vec2, amount: i32) -> bool {
        self.tfield = (self.tfield + amount as f32 * 10.0)
            .clamp(50.0, self.sz.x * 2f32.sqrt() / 8.0);
        if self.tfield > 100.0 {
            self.snap_to_sector();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(exact: bool) -> SOrthoCam {
        let mut c = SOrthoCam::new(exact);
        c.resized(Vec2::new(1000.0, 750.0));
        c
    }

    #[test]
    fn azimuth_damps_and_snaps() {
        let mut c = sized(false);
        assert!(c.click(Vec2::ZERO));
        c.drag(Vec2::new(100.0, 0.0));
        for _ in 0..300 {
            c.tick(0.05, Vec3::ZERO, Vec3::ZERO);
            assert!((0.0..TAU).contains(&c.angle()));
        }
        assert_eq!(c.angl, c.tangl);
    }

    #[test]
    fn zoom_clamps_and_sector_snaps_past_threshold() {
        let mut c = sized(false);
        for _ in 0..100 {
            assert!(c.wheel(Vec2::ZERO, 10));
        }
        assert!((c.tfield - 1000.0 * 2f32.sqrt() / 8.0).abs() < 1e-3);
        // Zoomed past 100: target azimuth centers its quarter sector.
        let sector = (c.tangl / FRAC_PI_2).floor();
        assert!((c.tangl - FRAC_PI_2 * (sector + 0.5)).abs() < 1e-5);
        for _ in 0..100 {
            assert!(c.wheel(Vec2::ZERO, -10));
        }
        assert_eq!(c.tfield, 50.0);
    }

    #[test]
    fn focus_snaps_past_dead_zone_and_damps_inside() {
        let mut c = sized(false);
        c.tick(0.016, Vec3::ZERO, Vec3::ZERO);
        c.tick(0.016, Vec3::new(260.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(c.cc.unwrap().x, 260.0);
        let goal = Vec3::new(300.0, 0.0, 0.0);
        for _ in 0..400 {
            c.tick(0.05, goal, Vec3::ZERO);
        }
        assert!(c.cc.unwrap().distance(goal) < 0.5);
    }

    #[test]
    fn exact_mode_keeps_reference_on_whole_pixels() {
        let mut c = sized(true);
        c.tick(0.016, Vec3::new(12.3, 45.6, 0.0), Vec3::ZERO);
        let jc = c.jc.expect("jitter reference anchored");
        let pfac = 1000.0 / (c.field * 2.0);
        let vj = c.view.transform_point3(jc) * pfac;
        assert!((vj.x - vj.x.round()).abs() < 1e-3);
        assert!((vj.y - vj.y.round()).abs() < 1e-3);
    }

    #[test]
    fn exact_mode_skips_tiny_focus_residuals() {
        let mut c = sized(true);
        c.tick(0.016, Vec3::ZERO, Vec3::ZERO);
        c.tick(0.016, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(c.cc.unwrap(), Vec3::ZERO);
    }

    #[test]
    fn args_parse_exact_flag_and_reject_junk() {
        assert!(SOrthoCam::from_args(&["-e".into()]).unwrap().exact);
        assert!(!SOrthoCam::from_args(&[]).unwrap().exact);
        assert!(SOrthoCam::from_args(&["-q".into()]).is_err());
    }
}
