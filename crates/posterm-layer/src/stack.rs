//! The layer stack and compositor
//!
//! Active layers are kept back to front: the list head is the bottom of the
//! stack and the tail is what the user sees on top. Inactive layers have
//! been created but not shown yet. Every screen update ends in one compose
//! pass, which repaints a damaged area from the layers that intersect it and
//! then the overlays (rubber band, message banner) on top.

use crate::backend::{Align, DrawBackend, Painter, TextRun};
use crate::input::{InputOutcome, KeyEvent, MouseAction, MouseEvent};
use crate::layer::{Layer, LayerKey};
use crate::object::{LayerObject, ObjectEvent, Response};
use crate::region::Region;
use crate::screensaver::Screensaver;
use posterm_list::{DList, NodeId, SList};
use tracing::{debug, info};

const RUBBER_BAND_COLOR: u8 = 15;
const BANNER_HEIGHT: i32 = 32;
const BANNER_COLOR: u8 = 3;
const BANNER_TEXT_COLOR: u8 = 15;
const SCREENSAVER_FILL: u8 = 0;

/// Which group a detached layer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    key: LayerKey,
    dx: i32,
    dy: i32,
}

/// Active and inactive layers plus the transient interface state
#[derive(Debug)]
pub struct LayerStack {
    active: DList<Layer>,
    inactive: SList<Layer>,
    screen: Region,
    background: u8,
    rubber_band: Option<Region>,
    drag: Option<Drag>,
    blanked: bool,
    screensaver: Screensaver,
    hovered: Option<(LayerKey, u16)>,
    last_touched: Option<(LayerKey, Option<u16>)>,
    message: Option<String>,
}

impl LayerStack {
    /// Empty stack for a `width` x `height` pixel screen
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            active: DList::new(),
            inactive: SList::new(),
            screen: Region::new(0, 0, width, height),
            background: 0,
            rubber_band: None,
            drag: None,
            blanked: false,
            screensaver: Screensaver::new(),
            hovered: None,
            last_touched: None,
            message: None,
        }
    }

    /// Use `screensaver` instead of an entropy-seeded one
    pub fn with_screensaver(mut self, screensaver: Screensaver) -> Self {
        self.screensaver = screensaver;
        self
    }

    pub fn screen(&self) -> Region {
        self.screen
    }

    /// Colour painted where no layer covers the screen
    pub fn set_background(&mut self, color: u8) {
        self.background = color;
    }

    // Membership

    /// Insert an active layer on top of the stack
    pub fn add(&mut self, layer: Layer) -> LayerKey {
        let key = layer.key();
        self.active.add_to_tail(layer);
        key
    }

    /// Insert a layer that is not drawn until shown
    pub fn add_inactive(&mut self, layer: Layer) -> LayerKey {
        let key = layer.key();
        self.inactive.add_to_tail(layer);
        key
    }

    /// Make a layer the topmost active layer. Returns `false` if no layer
    /// has this key.
    pub fn show(&mut self, key: LayerKey) -> bool {
        if let Some(node) = self.inactive.find(|l| l.key() == key) {
            if let Some(layer) = self.inactive.remove(node) {
                debug!("Showing layer {}", layer.id());
                self.active.add_to_tail(layer);
                return true;
            }
        }
        self.raise(key)
    }

    /// Move an active layer to the top
    pub fn raise(&mut self, key: LayerKey) -> bool {
        let Some(node) = self.active.find(|l| l.key() == key) else {
            return false;
        };
        if self.active.tail() == Some(node) {
            return true;
        }
        match self.active.remove(node) {
            Some(layer) => {
                self.active.add_to_tail(layer);
                true
            }
            None => false,
        }
    }

    /// Detach a layer, handing it back with the group it was in.
    ///
    /// Pointer state referring to it is dropped. Nothing is repainted.
    pub fn remove(&mut self, key: LayerKey) -> Option<(Layer, Placement)> {
        let detached = if let Some(node) = self.active.find(|l| l.key() == key) {
            self.active.remove(node).map(|l| (l, Placement::Active))
        } else {
            let node = self.inactive.find(|l| l.key() == key)?;
            self.inactive.remove(node).map(|l| (l, Placement::Inactive))
        };

        if self.drag.is_some_and(|d| d.key == key) {
            self.drag = None;
        }
        if self.hovered.is_some_and(|(k, _)| k == key) {
            self.hovered = None;
        }
        if self.last_touched.is_some_and(|(k, _)| k == key) {
            self.last_touched = None;
        }
        detached
    }

    /// Detach the first layer with protocol id `id`: the frontmost active
    /// one, or failing that the oldest inactive one. Repeated kills reach
    /// duplicates.
    pub fn kill(&mut self, id: u16) -> Option<(Layer, Placement)> {
        let key = self.find_by_id(id)?;
        let killed = self.remove(key);
        if killed.is_some() {
            info!("Killed layer {}", id);
        }
        killed
    }

    pub fn get(&self, key: LayerKey) -> Option<&Layer> {
        if let Some(node) = self.active.find(|l| l.key() == key) {
            return self.active.get(node);
        }
        let node = self.inactive.find(|l| l.key() == key)?;
        self.inactive.get(node)
    }

    pub fn get_mut(&mut self, key: LayerKey) -> Option<&mut Layer> {
        if let Some(node) = self.active.find(|l| l.key() == key) {
            return self.active.get_mut(node);
        }
        let node = self.inactive.find(|l| l.key() == key)?;
        self.inactive.get_mut(node)
    }

    pub fn is_active(&self, key: LayerKey) -> bool {
        self.active.find(|l| l.key() == key).is_some()
    }

    /// Key of the first layer with protocol id `id`, in [`kill`](Self::kill)
    /// order
    pub fn find_by_id(&self, id: u16) -> Option<LayerKey> {
        if let Some(node) = self.active.rfind(|l| l.id() == id) {
            return self.active.get(node).map(Layer::key);
        }
        let node = self.inactive.find(|l| l.id() == id)?;
        self.inactive.get(node).map(Layer::key)
    }

    /// Active layers, back to front
    pub fn active_keys(&self) -> Vec<LayerKey> {
        self.active.iter().map(Layer::key).collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.count()
    }

    pub fn inactive_count(&self) -> usize {
        self.inactive.count()
    }

    // Hit testing

    /// Frontmost active layer containing `(x, y)`
    pub fn find_by_point(&self, x: i32, y: i32) -> Option<LayerKey> {
        self.active
            .iter()
            .rev()
            .find(|l| l.region().contains(x, y))
            .map(Layer::key)
    }

    /// Frontmost active layer covering all of `region`
    pub fn occluder(&self, region: Region) -> Option<LayerKey> {
        self.active
            .iter()
            .rev()
            .find(|l| l.region().contains_region(&region))
            .map(Layer::key)
    }

    // Composition

    /// Repaint the screen.
    ///
    /// With `select_all` every active layer is drawn; otherwise each flagged
    /// layer's area is repaired, so layers it fully covers stay untouched.
    /// Returns the layers whose update was satisfied; their flags are
    /// cleared.
    pub fn update_all(
        &mut self,
        backend: &mut dyn DrawBackend,
        select_all: bool,
    ) -> Vec<LayerKey> {
        if self.blanked {
            return Vec::new();
        }

        let updated: Vec<LayerKey> = if select_all {
            let nodes: Vec<NodeId> = self.active.ids().collect();
            self.compose(backend, self.screen, &nodes, true)
        } else {
            let flagged: Vec<(LayerKey, Region)> = self
                .active
                .iter()
                .filter(|l| l.needs_update())
                .map(|l| (l.key(), l.region()))
                .collect();
            for &(_, region) in &flagged {
                self.repair(backend, region);
            }
            flagged.into_iter().map(|(key, _)| key).collect()
        };

        self.active.for_each_mut(|_, layer| {
            if updated.contains(&layer.key()) {
                layer.clear_update();
            }
        });
        updated
    }

    /// Repaint `region` from every active layer intersecting it, back to
    /// front, each clipped to the intersection. Returns the layers drawn.
    pub fn update_area(
        &mut self,
        backend: &mut dyn DrawBackend,
        region: Region,
    ) -> Vec<LayerKey> {
        let area = region.intersect(&self.screen);
        if area.is_empty() || self.blanked {
            return Vec::new();
        }
        let nodes: Vec<NodeId> = self
            .active
            .ids()
            .filter(|&node| {
                self.active
                    .get(node)
                    .is_some_and(|l| l.region().intersects(&area))
            })
            .collect();
        self.compose(backend, area, &nodes, true)
    }

    /// Like [`update_area`](Self::update_area), but layers behind `stop_at`
    /// are skipped: collection walks front to back and ends at `stop_at`,
    /// then the collected layers are drawn back to front.
    pub fn optimal_update_area(
        &mut self,
        backend: &mut dyn DrawBackend,
        region: Region,
        stop_at: LayerKey,
    ) -> Vec<LayerKey> {
        let area = region.intersect(&self.screen);
        if area.is_empty() || self.blanked {
            return Vec::new();
        }

        let mut nodes = Vec::new();
        let mut covered = false;
        let mut reached = false;
        for node in self.active.ids().rev() {
            let Some(layer) = self.active.get(node) else {
                continue;
            };
            if layer.region().intersects(&area) {
                nodes.push(node);
            }
            if layer.key() == stop_at {
                covered = layer.region().contains_region(&area);
                reached = true;
                break;
            }
        }
        if !reached {
            debug!("optimal-update: {:?} is not active, repainting the whole area", stop_at);
        }
        nodes.reverse();
        self.compose(backend, area, &nodes, !covered)
    }

    /// Repaint `region`, skipping whatever is hidden under the frontmost
    /// layer that covers it
    pub fn repair(&mut self, backend: &mut dyn DrawBackend, region: Region) -> Vec<LayerKey> {
        match self.occluder(region.intersect(&self.screen)) {
            Some(top) => self.optimal_update_area(backend, region, top),
            None => self.update_area(backend, region),
        }
    }

    fn compose(
        &self,
        backend: &mut dyn DrawBackend,
        area: Region,
        nodes: &[NodeId],
        fill: bool,
    ) -> Vec<LayerKey> {
        backend.set_clip(area);
        if fill {
            backend.fill_rect(area, self.background);
        }

        let mut drawn = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let Some(layer) = self.active.get(node) else {
                continue;
            };
            let r = layer.region();
            let bounds = r.intersect(&area);
            if bounds.is_empty() {
                continue;
            }
            let mut painter = Painter::new(backend, r.x(), r.y(), bounds);
            layer.render(&mut painter);
            drawn.push(layer.key());
        }

        self.draw_overlays(backend, area);
        backend.present(area);
        drawn
    }

    fn draw_overlays(&self, backend: &mut dyn DrawBackend, area: Region) {
        if let Some(band) = self.rubber_band {
            if band.intersects(&area) {
                backend.set_clip(area);
                backend.outline_rect(band, RUBBER_BAND_COLOR, 2);
            }
        }

        if let Some(text) = &self.message {
            let banner = self.banner_region();
            let bounds = banner.intersect(&area);
            if !bounds.is_empty() {
                let mut painter = Painter::new(backend, 0, 0, bounds);
                painter.fill_rect(banner, BANNER_COLOR);
                painter.text(&TextRun {
                    x: banner.x() + banner.w() / 2,
                    y: banner.y() + 4,
                    text,
                    font: 0,
                    color: BANNER_TEXT_COLOR,
                    align: Align::Center,
                    max_width: Some(banner.w()),
                });
            }
        }
    }

    // Rubber band

    pub fn rubber_band(&self) -> Option<Region> {
        self.rubber_band
    }

    /// Show the selection outline at `region`, repairing where it was
    pub fn rubber_band_update(&mut self, backend: &mut dyn DrawBackend, region: Region) {
        let old = self.rubber_band.replace(region);
        let damage = old.map_or(region, |o| o.union(&region));
        self.update_area(backend, damage);
    }

    pub fn rubber_band_off(&mut self, backend: &mut dyn DrawBackend) {
        if let Some(old) = self.rubber_band.take() {
            self.update_area(backend, old);
        }
    }

    // Message banner

    fn banner_region(&self) -> Region {
        let s = self.screen;
        Region::new(s.x(), s.bottom() - BANNER_HEIGHT, s.w(), BANNER_HEIGHT)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Show `text` in a banner above every layer
    pub fn set_message(&mut self, backend: &mut dyn DrawBackend, text: impl Into<String>) {
        self.message = Some(text.into());
        let banner = self.banner_region();
        self.update_area(backend, banner);
    }

    pub fn clear_message(&mut self, backend: &mut dyn DrawBackend) {
        if self.message.take().is_some() {
            let banner = self.banner_region();
            self.repair(backend, banner);
        }
    }

    // Screensaver

    pub fn is_blanked(&self) -> bool {
        self.blanked
    }

    pub fn set_screensaver_images(&mut self, images: Vec<String>) {
        self.screensaver.set_images(images);
    }

    /// Blank the screen with a screensaver image, or restore it.
    ///
    /// Blanking while already blank moves on to another image.
    pub fn set_blanked(&mut self, backend: &mut dyn DrawBackend, blanked: bool) {
        if blanked {
            if !self.blanked {
                info!("Blanking screen");
            }
            self.blanked = true;
            self.drag = None;
            self.draw_screensaver(backend);
        } else if self.blanked {
            info!("Unblanking screen");
            self.blanked = false;
            self.update_all(backend, true);
        }
    }

    fn draw_screensaver(&mut self, backend: &mut dyn DrawBackend) {
        let screen = self.screen;
        backend.set_clip(screen);
        backend.fill_rect(screen, SCREENSAVER_FILL);
        if let Some(image) = self.screensaver.pick() {
            let mut painter = Painter::new(backend, 0, 0, screen);
            painter.image(screen, image);
        }
        backend.present(screen);
    }

    // Input

    /// Layer and object the last touch or press landed on
    pub fn last_touched(&self) -> Option<(LayerKey, Option<u16>)> {
        self.last_touched
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Route a pointer event.
    ///
    /// Pressing a title bar starts dragging that layer until release. Other
    /// presses and releases go to the object under the pointer, or are
    /// reported against the layer when no object takes them. Motion only
    /// updates hover state and feeds objects that track it.
    pub fn mouse_action(
        &mut self,
        backend: &mut dyn DrawBackend,
        event: MouseEvent,
    ) -> Option<InputOutcome> {
        let MouseEvent { action, x, y } = event;
        if self.blanked {
            if action == MouseAction::Press {
                self.set_blanked(backend, false);
                return Some(InputOutcome::Unblanked);
            }
            return None;
        }

        if let Some(drag) = self.drag {
            self.continue_drag(backend, drag, action, x, y);
            return None;
        }

        if action == MouseAction::Move {
            self.hover(backend, x, y);
            let (key, object) = self.hovered?;
            let (lx, ly) = self.get(key)?.to_local(x, y);
            let response =
                self.with_object(backend, key, object, |obj| obj.mouse_action(action, lx, ly));
            return self.report(key, object, response);
        }

        let key = self.find_by_point(x, y)?;
        let layer = self.get(key)?;
        let (lx, ly) = layer.to_local(x, y);
        let object = layer.find_object(x, y);

        if action == MouseAction::Press {
            if layer.title_bar().is_some_and(|bar| bar.contains(x, y)) {
                self.start_drag(backend, key, lx, ly);
                return None;
            }
            self.last_touched = Some((key, object));
        }

        if let Some(object) = object {
            let response =
                self.with_object(backend, key, object, |obj| obj.mouse_action(action, lx, ly));
            if !response.is_ignored() {
                return self.report(key, object, response);
            }
        }

        let layer = self.get(key)?.id();
        Some(InputOutcome::Mouse {
            layer,
            action,
            x: lx,
            y: ly,
        })
    }

    /// Route a touch: a press and release at one point
    pub fn touch(
        &mut self,
        backend: &mut dyn DrawBackend,
        x: i32,
        y: i32,
    ) -> Option<InputOutcome> {
        if self.blanked {
            self.set_blanked(backend, false);
            return Some(InputOutcome::Unblanked);
        }

        let key = self.find_by_point(x, y)?;
        let layer = self.get(key)?;
        let layer_id = layer.id();
        let (lx, ly) = layer.to_local(x, y);
        let object = layer.find_object(x, y);
        self.last_touched = Some((key, object));

        if let Some(object) = object {
            let response = self.with_object(backend, key, object, |obj| {
                obj.mouse_action(MouseAction::Press, lx, ly)
            });
            self.with_object(backend, key, object, |obj| {
                obj.mouse_action(MouseAction::Release, lx, ly)
            });
            if !response.is_ignored() {
                return self.report(key, object, response);
            }
        }

        Some(InputOutcome::Touch {
            layer: layer_id,
            x: lx,
            y: ly,
        })
    }

    /// Route a key to the last touched object, or report it unclaimed
    pub fn keyboard(
        &mut self,
        backend: &mut dyn DrawBackend,
        key: KeyEvent,
    ) -> Option<InputOutcome> {
        if self.blanked {
            self.set_blanked(backend, false);
            return Some(InputOutcome::Unblanked);
        }

        if let Some((layer, Some(object))) = self.last_touched {
            let response = self.with_object(backend, layer, object, |obj| obj.keyboard(key));
            if !response.is_ignored() {
                return self.report(layer, object, response);
            }
        }

        Some(InputOutcome::Key {
            code: key.code,
            modifiers: key.modifiers,
        })
    }

    /// Run `f` on an object and repaint it if it reacted
    fn with_object<F>(
        &mut self,
        backend: &mut dyn DrawBackend,
        key: LayerKey,
        object: u16,
        f: F,
    ) -> Response
    where
        F: FnOnce(&mut (dyn LayerObject + 'static)) -> Response,
    {
        let Some(layer) = self.get_mut(key) else {
            return Response::Ignored;
        };
        let before = layer.object_screen_region(object);
        let Some(obj) = layer.object_mut(object) else {
            return Response::Ignored;
        };
        let response = f(obj);

        if !response.is_ignored() {
            let after = layer.object_screen_region(object);
            if let Some(damage) = before.into_iter().chain(after).reduce(|a, b| a.union(&b)) {
                if self.is_active(key) {
                    self.repair(backend, damage);
                }
            }
        }
        response
    }

    fn report(&self, key: LayerKey, object: u16, response: Response) -> Option<InputOutcome> {
        let Response::Event(event) = response else {
            return None;
        };
        let layer = self.get(key)?.id();
        Some(match event {
            ObjectEvent::Pressed => InputOutcome::ButtonPress { layer, object },
            ObjectEvent::Selected(index) => InputOutcome::ItemSelect {
                layer,
                object,
                index,
            },
            ObjectEvent::Scrolled(value) => InputOutcome::Scroll {
                layer,
                object,
                value,
            },
            ObjectEvent::Committed(text) => InputOutcome::TextCommit {
                layer,
                object,
                text,
            },
        })
    }

    fn hover(&mut self, backend: &mut dyn DrawBackend, x: i32, y: i32) {
        let now = self
            .find_by_point(x, y)
            .and_then(|key| Some((key, self.get(key)?.find_object(x, y)?)));
        if now == self.hovered {
            return;
        }
        if let Some((key, object)) = self.hovered.take() {
            self.with_object(backend, key, object, |obj| obj.mouse_exit());
        }
        if let Some((key, object)) = now {
            self.with_object(backend, key, object, |obj| obj.mouse_enter());
        }
        self.hovered = now;
    }

    fn start_drag(&mut self, backend: &mut dyn DrawBackend, key: LayerKey, dx: i32, dy: i32) {
        debug!("Dragging layer {:?}", key);
        self.drag = Some(Drag { key, dx, dy });
        if self.active.tail().and_then(|n| self.active.get(n)).map(Layer::key) != Some(key) {
            self.raise(key);
            if let Some(region) = self.get(key).map(Layer::region) {
                self.update_area(backend, region);
            }
        }
    }

    fn continue_drag(
        &mut self,
        backend: &mut dyn DrawBackend,
        drag: Drag,
        action: MouseAction,
        x: i32,
        y: i32,
    ) {
        match action {
            MouseAction::Move => {
                let Some(layer) = self.get_mut(drag.key) else {
                    self.drag = None;
                    return;
                };
                let old = layer.region();
                layer.move_to(x - drag.dx, y - drag.dy);
                let new = layer.region();
                if old != new && self.is_active(drag.key) {
                    self.update_area(backend, old.union(&new));
                }
            }
            MouseAction::Release => {
                debug!("Drag of {:?} ended", drag.key);
                self.drag = None;
            }
            MouseAction::Press => {}
        }
    }
}
