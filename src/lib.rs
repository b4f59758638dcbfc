//! Map viewport core for a networked game client.
//!
//! Renders a streamed, tile-based world around a focal point, drives a
//! family of camera models, and resolves screen clicks into world
//! coordinates and object identities via color-encoded offscreen passes.
//!
//! Rendering itself is an external collaborator: each frame the viewport
//! produces an ordered list of [`scene::RenderEntry`] values plus lighting
//! state, and drives picking through the [`pick::PickRenderer`] seam. The
//! streaming world cache is likewise abstracted behind
//! [`world::WorldSource`]; data that has not arrived yet surfaces as a
//! [`Suspend`] value, never as a fault.

pub mod camera;
pub mod defer;
pub mod error;
pub mod mapview;
pub mod math;
pub mod msg;
pub mod pick;
pub mod place;
pub mod prefs;
pub mod scene;
pub mod select;
pub mod world;

pub use error::{Suspend, ViewError};
pub use mapview::{Frame, FrameResult, FrameTask, MapView};
