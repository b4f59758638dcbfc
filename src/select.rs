//! Rectangular tile selection.
//!
//! Opened by the server with `sel(true)`: the first press pins a start
//! tile and opens a cache overlay region on the selection channel, drags
//! stretch it to the min/max corner rectangle, release reports the raw
//! start and end tiles back.

use crate::msg::OutMsg;
use crate::world::{tile_at, RegionHandle, WorldSource};
use glam::{IVec2, Vec2};

/// Overlay channel showing the selection rectangle.
pub const SEL_CHANNEL: usize = 17;

#[derive(Default)]
pub struct Selector {
    start: Option<IVec2>,
    region: Option<Box<dyn RegionHandle>>,
    mods: u32,
    label: Option<String>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the start tile under `mc`; modifiers are captured at press time.
    /// A second press replaces any rectangle in progress.
    pub fn begin(&mut self, mc: Vec2, mods: u32, world: &dyn WorldSource) {
        let tc = tile_at(mc);
        self.start = Some(tc);
        self.mods = mods;
        self.label = None;
        self.region = Some(world.overlay_region(tc, tc, 1 << SEL_CHANNEL));
    }

    /// Stretch the rectangle to the tile under `mc`.
    pub fn update(&mut self, mc: Vec2) {
        let Some(start) = self.start else { return };
        let tc = tile_at(mc);
        let c1 = start.min(tc);
        let c2 = start.max(tc);
        if let Some(region) = &mut self.region {
            region.update(c1, c2);
        }
        self.label = Some(format!("{}×{}", c2.x - c1.x + 1, c2.y - c1.y + 1));
    }

    /// Close the rectangle at the tile under `mc` and report it. True when
    /// a selection was actually in progress.
    pub fn finish(&mut self, mc: Vec2, out: &mut Vec<OutMsg>) -> bool {
        let Some(start) = self.start.take() else {
            return false;
        };
        self.region = None;
        self.label = None;
        out.push(OutMsg::Sel {
            start,
            end: tile_at(mc),
            mods: self.mods,
        });
        true
    }

    /// True while a press has pinned the start tile.
    pub fn dragging(&self) -> bool {
        self.start.is_some()
    }

    /// Current "W×H" size readout.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
