//! Camera model family.
//!
//! Every variant resolves to a view and projection matrix after `tick`;
//! drag and wheel input is offered to the active camera first and falls
//! through to other handlers when declined.

pub mod follow;
pub mod free;
pub mod ortho;
pub mod registry;

pub use follow::FollowCam;
pub use free::FreeCam;
pub use ortho::{OrthoCam, SOrthoCam};
pub use registry::CameraRegistry;

use glam::{Mat4, Vec2, Vec3};

pub const Z_NEAR: f32 = 1.0;
pub const Z_FAR: f32 = 5000.0;

/// Perspective frustum with horizontal half-field `field`, scaled to the
/// viewport aspect vertically.
pub fn field_proj(sz: Vec2, field: f32) -> Mat4 {
    let aspect = sz.y / sz.x;
    crate::math::frustum(
        -field,
        field,
        -field * aspect,
        field * aspect,
        Z_NEAR,
        Z_FAR,
    )
}

/// Generic projection for cameras without an elevation-driven field model.
pub fn default_proj(sz: Vec2) -> Mat4 {
    field_proj(sz, 0.5)
}

pub trait Camera: Send {
    fn resized(&mut self, sz: Vec2);
    /// Advance animation state and rebuild the matrices. `focus` is the
    /// focal point resolved by the caller; `offset` is the current shake
    /// displacement.
    fn tick(&mut self, dt: f32, focus: Vec3, offset: Vec3);
    fn view(&self) -> Mat4;
    fn proj(&self) -> Mat4;
    /// Current azimuth, normalized into [0, 2π).
    fn angle(&self) -> f32;
    /// Offer a drag start; true captures subsequent `drag` calls.
    fn click(&mut self, sc: Vec2) -> bool {
        let _ = sc;
        false
    }
    fn drag(&mut self, sc: Vec2) {
        let _ = sc;
    }
    fn release(&mut self) {}
    /// Offer a wheel event; true consumes it.
    fn wheel(&mut self, sc: Vec2, amount: i32) -> bool {
        let _ = (sc, amount);
        false
    }
}
