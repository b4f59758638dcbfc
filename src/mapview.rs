//! The viewport core: camera management, frame composition, deferred
//! picking and interaction dispatch.
//!
//! Input handlers never resolve world coordinates inline. They queue
//! deferred tasks; `draw` runs the queued picks against the frame it just
//! composed, and completed picks dispatch their actions the same frame
//! (or the next one when the readback comes home late).

use crate::camera::{Camera, CameraRegistry};
use crate::defer::TaskQueue;
use crate::error::{Suspend, ViewError};
use crate::msg::{Button, OutMsg, ViewMsg};
use crate::pick::{check_hit, check_map_click, ClickInfo, CutEntry, ObjPickable, PickRenderer};
use crate::place::Placing;
use crate::prefs::PrefStore;
use crate::scene::{self, RenderEntry, SceneComposer, ShadowMap};
use crate::select::{Selector, SEL_CHANNEL};
use crate::world::{actor_pos, cut_at, tile_at, DirLight, WorldSource, CUT_SZ, TILE_SZ};
use glam::{IVec2, Mat4, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Everything the renderer needs for one frame.
pub struct Frame {
    pub entries: Vec<RenderEntry>,
    pub light: Option<DirLight>,
    pub shadow: Option<ShadowMap>,
    pub view: Mat4,
    pub proj: Mat4,
}

pub enum FrameResult {
    Ready(Frame),
    /// The frame could not be composed; the cause names what is still
    /// streaming in.
    Loading(String),
}

/// A one-shot task run against a composed frame, after the scene and the
/// queued picks.
pub type FrameTask = Box<dyn FnOnce(&mut Frame) + Send>;

/// Mouse events forwarded to a grab holder, pre-resolved to map space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrabEvent {
    Down(Button, u32),
    Up(Button),
    Wheel(i32),
    Move,
}

/// An external grab holder receiving map-space mouse events.
pub trait Grabber: Send {
    fn mousedown(&mut self, mc: Vec2, button: Button, mods: u32, out: &mut Vec<OutMsg>) -> bool;
    fn mouseup(&mut self, mc: Vec2, button: Button, out: &mut Vec<OutMsg>);
    fn wheel(&mut self, mc: Vec2, amount: i32, out: &mut Vec<OutMsg>) -> bool;
    fn mousemove(&mut self, mc: Vec2, out: &mut Vec<OutMsg>);
}

enum GrabTarget {
    Selection,
    External(Box<dyn Grabber>),
}

#[derive(Debug, Clone, Copy)]
enum MapAction {
    AdjustPlace { mods: u32 },
    Grab(GrabEvent),
}

#[derive(Debug, Clone, Copy)]
enum HitAction {
    Click { button: Button, mods: u32 },
    ItemAct { mods: u32 },
    Drop { mods: u32 },
}

enum Deferred {
    MapTest { sc: Vec2, on: MapAction },
    HitTest { sc: Vec2, on: HitAction },
}

enum Resolved {
    Map {
        on: MapAction,
        sc: Vec2,
        mc: Option<Vec2>,
    },
    Hit {
        on: HitAction,
        sc: Vec2,
        hit: Option<(Vec2, Option<ClickInfo>)>,
    },
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MapView {
    sz: Vec2,
    /// View-center map position; follows the player when one exists.
    cc: Vec2,
    camera: Box<dyn Camera>,
    registry: CameraRegistry,
    prefs: PrefStore,
    scene: SceneComposer,
    placing: Option<Placing>,
    selection: Option<Selector>,
    grab: Option<GrabTarget>,
    grab_moves: bool,
    mouse: Option<Vec2>,
    delayed: TaskQueue<Deferred>,
    frame_tasks: TaskQueue<FrameTask>,
    resolved: Arc<Mutex<Vec<Resolved>>>,
    camdrag: bool,
    shake: f64,
    camoff: Vec3,
    rng: ChaCha8Rng,
    clock: f64,
    olflash: u32,
    olftimer: Option<f64>,
    camload: Option<Suspend>,
    lastload: Option<Suspend>,
}

impl MapView {
    pub fn new(sz: Vec2, cc: Vec2, prefs: PrefStore) -> Self {
        let registry = CameraRegistry::with_defaults();
        let mut camera = registry.restore(&prefs.vals);
        camera.resized(sz);
        let scene = SceneComposer::new(prefs.vals.show_flavor);
        Self {
            sz,
            cc,
            camera,
            registry,
            prefs,
            scene,
            placing: None,
            selection: None,
            grab: None,
            grab_moves: false,
            mouse: None,
            delayed: TaskQueue::default(),
            frame_tasks: TaskQueue::default(),
            resolved: Arc::new(Mutex::new(Vec::new())),
            camdrag: false,
            shake: 0.0,
            camoff: Vec3::ZERO,
            rng: ChaCha8Rng::seed_from_u64(0x6d61_7076),
            clock: 0.0,
            olflash: 0,
            olftimer: None,
            camload: None,
            lastload: None,
        }
    }

    fn focal(&self, world: &dyn WorldSource) -> Result<Vec3, Suspend> {
        if let Some(pl) = world.player() {
            actor_pos(world, &pl)
        } else {
            let z = world.height(self.cc)?;
            Ok(Vec3::new(self.cc.x, self.cc.y, z))
        }
    }

    /// Advance time-driven state: the clock, the shake envelope and the
    /// camera animation. A suspended focal lookup skips the camera tick
    /// and marks the frame as loading.
    pub fn tick(&mut self, dt: f32, world: &dyn WorldSource) {
        self.clock += dt as f64;
        self.camload = None;
        match self.focal(world) {
            Ok(fp) => {
                if self.shake > 0.0 {
                    self.shake *= 100f64.powf(-(dt as f64));
                    if self.shake < 0.01 {
                        self.shake = 0.0;
                    }
                }
                let s = self.shake as f32;
                self.camoff = Vec3::new(
                    (self.rng.gen::<f32>() - 0.5) * s,
                    (self.rng.gen::<f32>() - 0.5) * s,
                    (self.rng.gen::<f32>() - 0.5) * s,
                );
                self.camera.tick(dt, fp, self.camoff);
            }
            Err(e) => self.camload = Some(e),
        }
    }

    /// Compose a frame, run the deferred picks against it and dispatch
    /// completed interactions into `out`.
    pub fn draw(
        &mut self,
        world: &dyn WorldSource,
        px: &mut dyn PickRenderer,
        out: &mut Vec<OutMsg>,
    ) -> FrameResult {
        if let Some(pl) = world.player() {
            self.cc = pl.rc;
        }
        let cutc = cut_at(tile_at(self.cc));
        let r = self.scene.view + 1;
        world.request_area(
            (cutc - IVec2::splat(r)) * CUT_SZ,
            (cutc + IVec2::splat(r + 1)) * CUT_SZ - IVec2::ONE,
        );
        if let Some(deadline) = self.olftimer {
            if self.clock >= deadline {
                self.unflashol();
            }
        }
        match self.draw_inner(world, px, out) {
            Ok(frame) => FrameResult::Ready(frame),
            Err(cause) => {
                world.boost(&cause);
                self.lastload = Some(cause.clone());
                FrameResult::Loading(cause.to_string())
            }
        }
    }

    fn draw_inner(
        &mut self,
        world: &dyn WorldSource,
        px: &mut dyn PickRenderer,
        out: &mut Vec<OutMsg>,
    ) -> Result<Frame, Suspend> {
        if let Some(e) = &self.camload {
            return Err(e.clone());
        }
        let focus = self.focal(world)?;

        // Picks completed since last frame.
        self.dispatch_resolved(world, out);

        let mut entries = Vec::new();
        let light = self.scene.setup(
            &mut entries,
            world,
            self.cc,
            focus,
            self.placing.as_ref(),
            self.clock,
            self.prefs.vals.shadows,
        )?;

        let tasks = self.delayed.drain();
        self.run_deferred(tasks, world, px);
        // Readbacks that completed synchronously dispatch this frame.
        self.dispatch_resolved(world, out);

        let mut frame = Frame {
            entries,
            light,
            shadow: self.scene.shadow(),
            view: self.camera.view(),
            proj: self.camera.proj(),
        };
        for task in self.frame_tasks.drain() {
            task(&mut frame);
        }
        Ok(frame)
    }

    fn run_deferred(&mut self, tasks: Vec<Deferred>, world: &dyn WorldSource, px: &mut dyn PickRenderer) {
        if tasks.is_empty() {
            return;
        }
        let cuts = self.collect_cuts(world);
        let picks = self.collect_pickables(world);
        let (view, proj) = (self.camera.view(), self.camera.proj());
        for task in tasks {
            match task {
                Deferred::MapTest { sc, on } => {
                    let res = Arc::clone(&self.resolved);
                    check_map_click(
                        px,
                        view,
                        proj,
                        &cuts,
                        sc,
                        Box::new(move |mc| {
                            lock(&res).push(Resolved::Map { on, sc, mc });
                        }),
                    );
                }
                Deferred::HitTest { sc, on } => {
                    let res = Arc::clone(&self.resolved);
                    check_hit(
                        px,
                        view,
                        proj,
                        &cuts,
                        &picks,
                        sc,
                        Box::new(move |hit| {
                            lock(&res).push(Resolved::Hit { on, sc, hit });
                        }),
                    );
                }
            }
        }
    }

    /// Pickable terrain for the current window; cuts still streaming in
    /// simply cannot be clicked this frame.
    fn collect_cuts(&self, world: &dyn WorldSource) -> Vec<CutEntry> {
        let cutc = cut_at(tile_at(self.cc));
        let v = self.scene.view;
        let mut cuts = Vec::new();
        for oy in -v..=v {
            for ox in -v..=v {
                if let Ok(cut) = world.cut(cutc + IVec2::new(ox, oy)) {
                    let xf = Mat4::from_translation(Vec3::new(
                        (cut.ul.x * TILE_SZ) as f32,
                        (cut.ul.y * TILE_SZ) as f32,
                        0.0,
                    ));
                    cuts.push(CutEntry {
                        drawable: cut.drawable,
                        ul: cut.ul,
                        sz: cut.sz,
                        xf,
                    });
                }
            }
        }
        cuts
    }

    /// Flat-capable actor entries with provenance, transformed exactly as
    /// the visible scene places them.
    fn collect_pickables(&self, world: &dyn WorldSource) -> Vec<ObjPickable> {
        let mut rl = Vec::new();
        for actor in world.actors() {
            scene::add_actor(&mut rl, world, &actor);
        }
        rl.into_iter()
            .filter_map(|e| {
                let owner = e.owner?;
                e.drawable.flat().then(|| ObjPickable {
                    info: ClickInfo {
                        actor: owner.actor,
                        rc: owner.rc,
                        overlay: owner.overlay,
                        mesh: e.drawable.mesh_id(),
                    },
                    drawable: e.drawable,
                    xf: e.xf,
                })
            })
            .collect()
    }

    fn dispatch_resolved(&mut self, world: &dyn WorldSource, out: &mut Vec<OutMsg>) {
        let resolved = std::mem::take(&mut *lock(&self.resolved));
        for r in resolved {
            match r {
                Resolved::Map { on, sc, mc } => {
                    let Some(mc) = mc else { continue };
                    match on {
                        MapAction::AdjustPlace { mods } => {
                            let player = world.player().map(|p| p.rc);
                            if let Some(p) = &mut self.placing {
                                p.apply_adjust(sc, mc, mods, player);
                            }
                        }
                        MapAction::Grab(ev) => self.grab_event(ev, mc, world, out),
                    }
                }
                Resolved::Hit { on, sc, hit } => {
                    let pc = IVec2::new(sc.x as i32, sc.y as i32);
                    match on {
                        HitAction::Click { button, mods } => {
                            if let Some((mc, info)) = hit {
                                out.push(OutMsg::Click {
                                    pc,
                                    mc,
                                    button,
                                    mods,
                                    hit: info,
                                });
                            }
                        }
                        HitAction::ItemAct { mods } => {
                            if let Some((mc, info)) = hit {
                                out.push(OutMsg::ItemAct {
                                    pc,
                                    mc,
                                    mods,
                                    hit: info,
                                });
                            }
                        }
                        HitAction::Drop { mods } => {
                            if let Some((mc, _)) = hit {
                                out.push(OutMsg::Drop { pc, mc, mods });
                            }
                        }
                    }
                }
            }
        }
    }

    fn grab_event(
        &mut self,
        ev: GrabEvent,
        mc: Vec2,
        world: &dyn WorldSource,
        out: &mut Vec<OutMsg>,
    ) {
        match &mut self.grab {
            Some(GrabTarget::Selection) => {
                let Some(sel) = &mut self.selection else { return };
                match ev {
                    GrabEvent::Down(Button::Left, mods) => {
                        sel.begin(mc, mods, world);
                        self.grab_moves = true;
                    }
                    GrabEvent::Down(..) | GrabEvent::Wheel(_) => {}
                    GrabEvent::Move => sel.update(mc),
                    GrabEvent::Up(_) => {
                        if sel.finish(mc, out) {
                            self.grab_moves = false;
                        }
                    }
                }
            }
            Some(GrabTarget::External(g)) => match ev {
                GrabEvent::Down(button, mods) => {
                    g.mousedown(mc, button, mods, out);
                }
                GrabEvent::Up(button) => g.mouseup(mc, button, out),
                GrabEvent::Wheel(amount) => {
                    g.wheel(mc, amount, out);
                }
                GrabEvent::Move => g.mousemove(mc, out),
            },
            None => {}
        }
    }

    fn grab_wants(&self, button: Button) -> bool {
        match &self.grab {
            Some(GrabTarget::Selection) => button == Button::Left,
            Some(GrabTarget::External(_)) => true,
            None => false,
        }
    }

    pub fn mousedown(&mut self, sc: Vec2, button: Button, mods: u32, out: &mut Vec<OutMsg>) {
        self.mouse = Some(sc);
        if button == Button::Middle {
            if self.camera.click(sc) {
                self.camdrag = true;
            }
        } else if let Some(p) = &self.placing {
            if p.last_sc.is_some() {
                out.push(OutMsg::Place {
                    mc: p.pose.rc,
                    angle_deg: (p.pose.a * 180.0 / PI) as i32,
                    button,
                    mods,
                });
            }
        } else if self.grab_wants(button) {
            self.delayed.push(Deferred::MapTest {
                sc,
                on: MapAction::Grab(GrabEvent::Down(button, mods)),
            });
        } else {
            self.delayed.push(Deferred::HitTest {
                sc,
                on: HitAction::Click { button, mods },
            });
        }
    }

    pub fn mousemove(&mut self, sc: Vec2, mods: u32) {
        self.mouse = Some(sc);
        if self.grab.is_some() && self.grab_moves {
            self.delayed.push(Deferred::MapTest {
                sc,
                on: MapAction::Grab(GrabEvent::Move),
            });
        }
        if self.camdrag {
            self.camera.drag(sc);
        } else if let Some(p) = &self.placing {
            if p.last_sc != Some(sc) {
                self.delayed.push(Deferred::MapTest {
                    sc,
                    on: MapAction::AdjustPlace { mods },
                });
            }
        }
    }

    pub fn mouseup(&mut self, sc: Vec2, button: Button) {
        if button == Button::Middle {
            if self.camdrag {
                self.camera.release();
                self.camdrag = false;
            }
        } else if self.grab.is_some() {
            self.delayed.push(Deferred::MapTest {
                sc,
                on: MapAction::Grab(GrabEvent::Up(button)),
            });
        }
    }

    /// True when the wheel event was consumed by a grab holder, the
    /// placement rotation or the camera.
    pub fn mousewheel(&mut self, sc: Vec2, amount: i32, mods: u32) -> bool {
        if matches!(self.grab, Some(GrabTarget::External(_))) {
            self.delayed.push(Deferred::MapTest {
                sc,
                on: MapAction::Grab(GrabEvent::Wheel(amount)),
            });
            return true;
        }
        if let Some(p) = &mut self.placing {
            if p.rotate(amount, mods) {
                return true;
            }
        }
        self.camera.wheel(sc, amount)
    }

    /// Queue `task` to run against the next frame that actually composes,
    /// once the scene and this frame's picks are in place. Safe to call
    /// from any thread.
    pub fn frame_task(&self, task: FrameTask) {
        self.frame_tasks.push(task);
    }

    pub fn drop_item(&mut self, sc: Vec2, mods: u32) {
        self.delayed.push(Deferred::HitTest {
            sc,
            on: HitAction::Drop { mods },
        });
    }

    pub fn item_interact(&mut self, sc: Vec2, mods: u32) {
        self.delayed.push(Deferred::HitTest {
            sc,
            on: HitAction::ItemAct { mods },
        });
    }

    fn unflashol(&mut self) {
        self.scene.disol_mask(self.olflash);
        self.olflash = 0;
        self.olftimer = None;
    }

    pub fn uimsg(&mut self, msg: ViewMsg) {
        match msg {
            ViewMsg::Place {
                res,
                data,
                overlays,
            } => {
                self.placing = Some(Placing::new(res, data, overlays));
                // Position the preview under the pointer right away.
                if let Some(sc) = self.mouse {
                    self.delayed.push(Deferred::MapTest {
                        sc,
                        on: MapAction::AdjustPlace { mods: 0 },
                    });
                }
            }
            ViewMsg::Unplace => self.placing = None,
            ViewMsg::Move { cc } => self.cc = cc,
            ViewMsg::FlashOl { mask, duration_ms } => {
                self.unflashol();
                self.olflash = mask;
                self.scene.enol_mask(mask);
                self.olftimer = Some(self.clock + duration_ms as f64 / 1000.0);
            }
            ViewMsg::Sel { on } => {
                if on && self.selection.is_none() {
                    self.selection = Some(Selector::new());
                    self.scene.enol(SEL_CHANNEL);
                    self.grab = Some(GrabTarget::Selection);
                } else if !on && self.selection.take().is_some() {
                    self.scene.disol(SEL_CHANNEL);
                    if matches!(self.grab, Some(GrabTarget::Selection)) {
                        self.grab = None;
                        self.grab_moves = false;
                    }
                }
            }
            ViewMsg::Shake { magnitude } => self.shake = magnitude as f64,
        }
    }

    /// Hand map-space mouse events to an external holder. Replaces any
    /// previous holder.
    pub fn grab(&mut self, g: Box<dyn Grabber>) {
        self.grab = Some(GrabTarget::External(g));
        self.grab_moves = false;
    }

    pub fn release_grab(&mut self) {
        self.grab = None;
        self.grab_moves = false;
    }

    /// Forward grabbed mouse moves through map picks too. Off by default;
    /// moves are by far the most frequent event.
    pub fn grab_moves(&mut self, on: bool) {
        self.grab_moves = on;
    }

    /// Operator console commands.
    pub fn command(&mut self, cmd: &str, args: &[String]) -> Result<Option<String>, ViewError> {
        match cmd {
            "cam" => {
                let Some((name, cargs)) = args.split_first() else {
                    return Ok(None);
                };
                self.camera = self.registry.make(name, cargs)?;
                self.camera.resized(self.sz);
                self.prefs.vals.defcam = Some(name.clone());
                self.prefs.vals.camargs = cargs.to_vec();
                if let Err(e) = self.prefs.save() {
                    log::warn!(target: "mapview", "saving camera preference: {e:#}");
                }
                Ok(None)
            }
            "whyload" => Ok(Some(match &self.lastload {
                Some(l) => l.to_string(),
                None => "not loading".to_owned(),
            })),
            _ => Err(ViewError::Config(format!("no such command: {cmd}"))),
        }
    }

    pub fn resize(&mut self, sz: Vec2) {
        self.sz = sz;
        self.camera.resized(sz);
    }

    /// True while a selection press has pinned a start tile.
    pub fn selecting(&self) -> bool {
        self.selection.as_ref().is_some_and(|s| s.dragging())
    }

    /// Size readout of a selection drag in progress.
    pub fn tooltip(&self) -> Option<&str> {
        self.selection.as_ref().and_then(|s| s.label())
    }

    pub fn camera(&self) -> &dyn Camera {
        &*self.camera
    }

    pub fn scene(&self) -> &SceneComposer {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneComposer {
        &mut self.scene
    }

    pub fn placing(&self) -> Option<&Placing> {
        self.placing.as_ref()
    }
}
