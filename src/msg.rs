//! Inbound UI messages and outbound click/selection messages.
//!
//! These mirror the client's session protocol: the session layer decodes
//! server widget messages into [`ViewMsg`] and encodes [`OutMsg`] back onto
//! the wire. The viewport itself never touches sockets.

use crate::pick::ClickInfo;
use crate::world::ResourceRef;
use glam::{IVec2, Vec2};

pub const MOD_SHIFT: u32 = 1;
pub const MOD_CTRL: u32 = 2;
pub const MOD_ALT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Middle,
    Right,
}

impl Button {
    /// Wire encoding used by the session protocol.
    pub fn code(self) -> u32 {
        match self {
            Button::Left => 1,
            Button::Middle => 2,
            Button::Right => 3,
        }
    }
}

/// Server-to-viewport control messages.
#[derive(Clone)]
pub enum ViewMsg {
    /// Enter placement mode previewing `res`.
    Place {
        res: ResourceRef,
        data: Option<Vec<u8>>,
        overlays: Vec<(ResourceRef, Option<Vec<u8>>)>,
    },
    /// Leave placement mode.
    Unplace,
    /// Recenter the view on a map position.
    Move { cc: Vec2 },
    /// Flash the given overlay channels for a duration.
    FlashOl { mask: u32, duration_ms: u32 },
    /// Enter (`on` = true) or leave area-selection mode.
    Sel { on: bool },
    /// Kick the camera with a decaying shake.
    Shake { magnitude: f32 },
}

/// Viewport-to-server messages.
#[derive(Debug, Clone, PartialEq)]
pub enum OutMsg {
    Click {
        pc: IVec2,
        mc: Vec2,
        button: Button,
        mods: u32,
        hit: Option<ClickInfo>,
    },
    ItemAct {
        pc: IVec2,
        mc: Vec2,
        mods: u32,
        hit: Option<ClickInfo>,
    },
    Place {
        mc: Vec2,
        angle_deg: i32,
        button: Button,
        mods: u32,
    },
    Drop {
        pc: IVec2,
        mc: Vec2,
        mods: u32,
    },
    Sel {
        start: IVec2,
        end: IVec2,
        mods: u32,
    },
}
