//! Opcode dispatch
//!
//! [`Interpreter::drain`] pulls complete commands off the inbound queue and
//! applies them in order. Commands that cannot apply (no schema, a layer
//! that no longer exists, an object id nobody owns) are logged at debug and
//! skipped so one bad command never stalls the stream.

use crate::context::Terminal;
use crate::outcome::encode_outcome;
use crate::payment::{PaymentDesk, PaymentProcessor};
use crate::settings::Settings;
use crate::InterpError;
use posterm_layer::{
    Align, DrawBackend, DrawOp, InputOutcome, ItemList, ItemMenu, KeyEvent, Layer, LayerObject,
    LayerStack, MouseAction, MouseEvent, PushButton, Region, Scrollbar, TextEntry,
};
use posterm_link::{
    Command, Direction, Link, LinkError, Next, PaymentKind, Registry, ServerOp, TerminalOp,
    PROTOCOL_VERSION,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Whether the terminal should keep running after a drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// Input from the devices, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Touch { x: i32, y: i32 },
    Key(KeyEvent),
}

fn region(cmd: &mut Command) -> Result<Region, LinkError> {
    let x = cmd.take_u16()?;
    let y = cmd.take_u16()?;
    let w = cmd.take_u16()?;
    let h = cmd.take_u16()?;
    Ok(Region::new(
        i32::from(x),
        i32::from(y),
        i32::from(w),
        i32::from(h),
    ))
}

fn coord(cmd: &mut Command) -> Result<i32, LinkError> {
    cmd.take_u16().map(i32::from)
}

/// Applies server commands to a [`Terminal`] and reports input back
#[derive(Debug)]
pub struct Interpreter {
    registry: Registry,
    terminal: Terminal,
    payment: PaymentDesk,
    last_input: Instant,
    last_data: Instant,
}

impl Interpreter {
    pub fn new(
        stack: LayerStack,
        processor: Box<dyn PaymentProcessor>,
    ) -> Result<Self, InterpError> {
        let now = Instant::now();
        Ok(Self {
            registry: Registry::standard()?,
            terminal: Terminal::new(stack),
            payment: PaymentDesk::new(processor),
            last_input: now,
            last_data: now,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    pub fn payment(&self) -> &PaymentDesk {
        &self.payment
    }

    /// Queue the hello that opens every session
    pub fn hello(&self, link: &mut Link, name: &str) -> Result<(), InterpError> {
        let screen = self.terminal.stack.screen();
        let hello = Command::build(TerminalOp::TermInfo)
            .str(name)
            .u16(PROTOCOL_VERSION)
            .u16(screen.w().clamp(0, i32::from(u16::MAX)) as u16)
            .u16(screen.h().clamp(0, i32::from(u16::MAX)) as u16)
            .finish();
        link.send(&self.registry, &hello)?;
        Ok(())
    }

    /// Execute every complete command in the inbound queue.
    ///
    /// A partially received command stays buffered until the rest arrives.
    /// Stops early, leaving later commands queued, on `Shutdown`.
    pub fn drain(
        &mut self,
        link: &mut Link,
        backend: &mut dyn DrawBackend,
    ) -> Result<Flow, InterpError> {
        if !link.inbound.is_empty() {
            self.last_data = Instant::now();
        }

        loop {
            match self.registry.next(Direction::ToTerminal, &mut link.inbound)? {
                Next::Command(cmd) => {
                    if self.execute(cmd, link, backend)? == Flow::Shutdown {
                        return Ok(Flow::Shutdown);
                    }
                }
                Next::Unknown(opcode) => debug!("Ignoring unknown opcode {}", opcode),
                Next::Incomplete | Next::Empty => break,
            }
        }
        link.inbound.compact();
        Ok(Flow::Continue)
    }

    /// Apply one decoded command
    pub fn execute(
        &mut self,
        mut cmd: Command,
        link: &mut Link,
        backend: &mut dyn DrawBackend,
    ) -> Result<Flow, InterpError> {
        let Ok(op) = ServerOp::try_from(cmd.opcode()) else {
            debug!("No handler for opcode {}", cmd.opcode());
            return Ok(Flow::Continue);
        };
        debug!("Executing {}", op.name());

        if let Some(kind) = PaymentKind::from_op(op) {
            let reply = self
                .payment
                .handle(kind, &mut cmd)
                .map_err(|source| InterpError::Payload {
                    name: op.name(),
                    source,
                })?;
            link.send(&self.registry, &reply)?;
            return Ok(Flow::Continue);
        }

        self.apply(op, &mut cmd, backend)
            .map_err(|source| InterpError::Payload {
                name: op.name(),
                source,
            })
    }

    fn apply(
        &mut self,
        op: ServerOp,
        cmd: &mut Command,
        backend: &mut dyn DrawBackend,
    ) -> Result<Flow, LinkError> {
        match op {
            // Layer lifecycle
            ServerOp::NewLayer => {
                let id = cmd.take_u16()?;
                let region = region(cmd)?;
                let flags = cmd.take_u8()?;
                let title = cmd.take_str()?;
                let title = self.terminal.translations.lookup(&title).to_string();
                let key = self
                    .terminal
                    .stack
                    .add_inactive(Layer::new(id, region, flags, title));
                self.terminal.ctx.target = Some(key);
            }
            ServerOp::ShowLayer => {
                let id = cmd.take_u16()?;
                self.show_layer(id, backend);
            }
            ServerOp::KillLayer => {
                let id = cmd.take_u16()?;
                match self.terminal.stack.kill(id) {
                    Some((layer, placement)) => {
                        if placement == posterm_layer::Placement::Active {
                            self.repair(backend, layer.region());
                        }
                    }
                    None => debug!("kill-layer: no layer {}", id),
                }
            }
            ServerOp::TargetLayer => {
                let id = cmd.take_u16()?;
                match self.terminal.stack.find_by_id(id) {
                    Some(key) => self.terminal.ctx.target = Some(key),
                    None => debug!("target-layer: no layer {}", id),
                }
            }
            ServerOp::CurrentLayer => {
                let id = cmd.take_u16()?;
                match self.terminal.stack.find_by_id(id) {
                    Some(key) => self.terminal.ctx.current = Some(key),
                    None => debug!("current-layer: no layer {}", id),
                }
            }

            // Drawing into the current layer
            ServerOp::TextLeft | ServerOp::TextCenter | ServerOp::TextRight => {
                let align = match op {
                    ServerOp::TextCenter => Align::Center,
                    ServerOp::TextRight => Align::Right,
                    _ => Align::Left,
                };
                let x = coord(cmd)?;
                let y = coord(cmd)?;
                let font = cmd.take_u8()?;
                let color = cmd.take_u8()?;
                let max_width = cmd.take_u16()?;
                let text = cmd.take_str()?;
                let text = self.terminal.translations.lookup(&text).to_string();
                self.draw(
                    op,
                    DrawOp::Text {
                        x,
                        y,
                        font,
                        color,
                        align,
                        max_width: (max_width > 0).then_some(i32::from(max_width)),
                        text,
                    },
                );
            }
            ServerOp::Rectangle => {
                let region = region(cmd)?;
                let color = cmd.take_u8()?;
                let thickness = cmd.take_u8()?;
                self.draw(
                    op,
                    DrawOp::Rectangle {
                        region,
                        color,
                        thickness,
                    },
                );
            }
            ServerOp::SolidRectangle => {
                let region = region(cmd)?;
                let color = cmd.take_u8()?;
                self.draw(op, DrawOp::SolidRectangle { region, color });
            }
            ServerOp::HLine | ServerOp::VLine => {
                let x = coord(cmd)?;
                let y = coord(cmd)?;
                let len = coord(cmd)?;
                let thickness = cmd.take_u8()?;
                let color = cmd.take_u8()?;
                let line = if op == ServerOp::HLine {
                    DrawOp::HLine {
                        x,
                        y,
                        len,
                        thickness,
                        color,
                    }
                } else {
                    DrawOp::VLine {
                        x,
                        y,
                        len,
                        thickness,
                        color,
                    }
                };
                self.draw(op, line);
            }
            ServerOp::Frame => {
                let region = region(cmd)?;
                let width = cmd.take_u8()?;
                let style = cmd.take_u8()?;
                self.draw(
                    op,
                    DrawOp::Frame {
                        region,
                        width,
                        style,
                    },
                );
            }
            ServerOp::FilledFrame => {
                let region = region(cmd)?;
                let width = cmd.take_u8()?;
                let style = cmd.take_u8()?;
                let texture = cmd.take_u8()?;
                self.draw(
                    op,
                    DrawOp::FilledFrame {
                        region,
                        width,
                        style,
                        texture,
                    },
                );
            }
            ServerOp::Shadow => {
                let region = region(cmd)?;
                let size = cmd.take_u8()?;
                let shape = cmd.take_u8()?;
                self.draw(
                    op,
                    DrawOp::Shadow {
                        region,
                        size,
                        shape,
                    },
                );
            }
            ServerOp::StatusBar => {
                let region = region(cmd)?;
                let bar_color = cmd.take_u8()?;
                let font = cmd.take_u8()?;
                let text_color = cmd.take_u8()?;
                let text = cmd.take_str()?;
                let text = self.terminal.translations.lookup(&text).to_string();
                self.draw(
                    op,
                    DrawOp::StatusBar {
                        region,
                        bar_color,
                        font,
                        text_color,
                        text,
                    },
                );
            }
            ServerOp::EditCursor => {
                let region = region(cmd)?;
                self.draw(op, DrawOp::EditCursor { region });
            }
            ServerOp::Zone => {
                let region = region(cmd)?;
                let frame = cmd.take_u8()?;
                let texture = cmd.take_u8()?;
                let shape = cmd.take_u8()?;
                self.draw(
                    op,
                    DrawOp::Zone {
                        region,
                        frame,
                        texture,
                        shape,
                    },
                );
            }

            // Whole page
            ServerOp::BlankPage => {
                let texture = cmd.take_u8()?;
                match self.terminal.current_mut() {
                    Some(layer) => layer.blank(texture),
                    None => debug!("blank-page: no current layer"),
                }
            }
            ServerOp::Background => {
                let texture = cmd.take_u8()?;
                match self.terminal.current_mut() {
                    Some(layer) => layer.set_background(texture),
                    None => self.terminal.stack.set_background(texture),
                }
            }
            ServerOp::SetClip => {
                let clip = region(cmd)?;
                match self.terminal.current_mut() {
                    Some(layer) => layer.set_clip(Some(clip)),
                    None => debug!("set-clip: no current layer"),
                }
            }
            ServerOp::ClearClip => match self.terminal.current_mut() {
                Some(layer) => layer.set_clip(None),
                None => debug!("clear-clip: no current layer"),
            },
            ServerOp::UpdateAll => {
                let select_all = cmd.take_u8()? != 0;
                if self.terminal.calibrating {
                    // Flagged layers keep their flags for the next update
                    debug!("update-all held back while calibrating");
                    if select_all {
                        let screen = self.terminal.stack.screen();
                        self.terminal.defer_repair(screen);
                    }
                } else {
                    self.terminal.stack.update_all(backend, select_all);
                }
            }
            ServerOp::UpdateArea => {
                let area = region(cmd)?;
                if self.terminal.calibrating {
                    debug!("update-area held back while calibrating");
                    self.terminal.defer_repair(area);
                } else {
                    self.terminal.stack.update_area(backend, area);
                }
            }
            ServerOp::SelectUpdate => {
                let band = region(cmd)?;
                self.terminal.stack.rubber_band_update(backend, band);
            }
            ServerOp::SelectOff => self.terminal.stack.rubber_band_off(backend),

            // Layer objects
            ServerOp::PushButton => {
                let id = cmd.take_u16()?;
                let region = region(cmd)?;
                let font = cmd.take_u8()?;
                let texture = cmd.take_u8()?;
                let label = cmd.take_str()?;
                let label = self.terminal.translations.lookup(&label).to_string();
                self.attach(
                    op,
                    Box::new(PushButton::new(id, region, font, texture, label)),
                );
            }
            ServerOp::Scrollbar => {
                let id = cmd.take_u16()?;
                let region = region(cmd)?;
                let total = cmd.take_u16()?;
                let visible = cmd.take_u16()?;
                self.attach(op, Box::new(Scrollbar::new(id, region, total, visible)));
            }
            ServerOp::ItemList => {
                let id = cmd.take_u16()?;
                let region = region(cmd)?;
                let font = cmd.take_u8()?;
                let sorted = cmd.take_u8()? != 0;
                let items = self.translate_all(cmd.take_str_list()?);
                self.attach(
                    op,
                    Box::new(ItemList::new(id, region, font, sorted, items)),
                );
            }
            ServerOp::ItemMenu => {
                let id = cmd.take_u16()?;
                let region = region(cmd)?;
                let font = cmd.take_u8()?;
                let items = self.translate_all(cmd.take_str_list()?);
                self.attach(op, Box::new(ItemMenu::new(id, region, font, items)));
            }
            ServerOp::TextEntry => {
                let id = cmd.take_u16()?;
                let region = region(cmd)?;
                let font = cmd.take_u8()?;
                let max_len = cmd.take_u16()?;
                let text = cmd.take_str()?;
                self.attach(
                    op,
                    Box::new(TextEntry::new(id, region, font, max_len, text)),
                );
            }

            // Control
            ServerOp::Translations => {
                let pairs = cmd.take_str_pairs()?;
                debug!("Loaded {} translations", pairs.len());
                self.terminal.translations.reload(pairs);
            }
            ServerOp::SetMessage => {
                let text = cmd.take_str()?;
                let text = self.terminal.translations.lookup(&text).to_string();
                self.terminal.stack.set_message(backend, text);
            }
            ServerOp::ClearMessage => self.terminal.stack.clear_message(backend),
            ServerOp::BlankTime => {
                self.terminal.settings.blank_timeout =
                    Settings::timeout_from_secs(cmd.take_u16()?);
            }
            ServerOp::ConnTimeout => {
                self.terminal.settings.conn_timeout =
                    Settings::timeout_from_secs(cmd.take_u16()?);
            }
            ServerOp::SetCursor => {
                let shape = cmd.take_u8()?;
                self.terminal.settings.cursor = shape;
                backend.set_cursor(shape);
            }
            ServerOp::Bell => backend.bell(cmd.take_u8()?),
            ServerOp::Iconify => backend.iconify(),
            ServerOp::Shutdown => {
                info!("Server requested shutdown");
                return Ok(Flow::Shutdown);
            }
            ServerOp::Calibrate => {
                info!("Entering touch calibration");
                self.terminal.calibrating = true;
            }
            ServerOp::BlankScreen => self.terminal.stack.set_blanked(backend, true),
            ServerOp::ScreensaverImages => {
                let images = cmd.take_str_list()?;
                debug!("Loaded {} screensaver images", images.len());
                self.terminal.stack.set_screensaver_images(images);
            }

            ServerOp::CcAuth
            | ServerOp::CcPreAuth
            | ServerOp::CcFinalAuth
            | ServerOp::CcVoid
            | ServerOp::CcVoidCancel
            | ServerOp::CcRefund
            | ServerOp::CcRefundCancel
            | ServerOp::CcSettle
            | ServerOp::CcInit
            | ServerOp::CcTotals
            | ServerOp::CcDetails
            | ServerOp::CcClearSaf
            | ServerOp::CcSafDetails => {
                debug!("{} reached the page dispatcher", op.name());
            }
        }
        Ok(Flow::Continue)
    }

    fn show_layer(&mut self, id: u16, backend: &mut dyn DrawBackend) {
        let stack = &mut self.terminal.stack;
        // A freshly built page is the target; prefer it over an older
        // active layer with the same id
        let key = self
            .terminal
            .ctx
            .target
            .filter(|&k| !stack.is_active(k) && stack.get(k).is_some_and(|l| l.id() == id))
            .or_else(|| stack.find_by_id(id));
        let Some(key) = key else {
            debug!("show-layer: no layer {}", id);
            return;
        };

        stack.show(key);
        let area = stack.get(key).map(Layer::region);
        self.terminal.ctx.current = Some(key);
        if self.terminal.calibrating {
            // Flagged so the first update after calibration draws it
            if let Some(layer) = self.terminal.stack.get_mut(key) {
                layer.request_update();
            }
        }
        if let Some(area) = area {
            self.repair(backend, area);
        }
        if !self.terminal.calibrating {
            if let Some(layer) = self.terminal.stack.get_mut(key) {
                layer.clear_update();
            }
        }
    }

    /// Recompose `area`, or hold it back while calibrating
    fn repair(&mut self, backend: &mut dyn DrawBackend, area: Region) {
        if self.terminal.calibrating {
            debug!("Repair of {:?} held back while calibrating", area);
            self.terminal.defer_repair(area);
        } else {
            self.terminal.stack.repair(backend, area);
        }
    }

    fn draw(&mut self, op: ServerOp, draw_op: DrawOp) {
        match self.terminal.current_mut() {
            Some(layer) => layer.record(draw_op),
            None => debug!("{}: no current layer", op.name()),
        }
    }

    fn attach(&mut self, op: ServerOp, object: Box<dyn LayerObject>) {
        match self.terminal.target_mut() {
            Some(layer) => {
                layer.add_object(object);
            }
            None => debug!("{}: no target layer", op.name()),
        }
    }

    fn translate_all(&self, items: Vec<String>) -> Vec<String> {
        items
            .into_iter()
            .map(|item| self.terminal.translations.lookup(&item).to_string())
            .collect()
    }

    // Input

    /// Route one input event and queue whatever the server should hear.
    ///
    /// While calibrating, the first touch or press is reported as the
    /// calibration point and nothing else is routed. Repaints held back
    /// during calibration are drawn once it ends.
    pub fn input(
        &mut self,
        link: &mut Link,
        backend: &mut dyn DrawBackend,
        event: InputEvent,
    ) -> Result<Option<InputOutcome>, InterpError> {
        self.last_input = Instant::now();

        if self.terminal.calibrating {
            let point = match event {
                InputEvent::Touch { x, y } => Some((x, y)),
                InputEvent::Mouse(MouseEvent {
                    action: MouseAction::Press,
                    x,
                    y,
                }) => Some((x, y)),
                _ => None,
            };
            if let Some((x, y)) = point {
                info!("Calibration touch at {},{}", x, y);
                self.terminal.calibrating = false;
                if let Some(area) = self.terminal.deferred_repair.take() {
                    self.terminal.stack.repair(backend, area);
                }
                let reply = Command::build(TerminalOp::Calibrated)
                    .u16(x.clamp(0, i32::from(u16::MAX)) as u16)
                    .u16(y.clamp(0, i32::from(u16::MAX)) as u16)
                    .finish();
                link.send(&self.registry, &reply)?;
            }
            return Ok(None);
        }

        let stack = &mut self.terminal.stack;
        let outcome = match event {
            InputEvent::Mouse(mouse) => stack.mouse_action(backend, mouse),
            InputEvent::Touch { x, y } => stack.touch(backend, x, y),
            InputEvent::Key(key) => stack.keyboard(backend, key),
        };

        if let Some(command) = outcome.as_ref().and_then(encode_outcome) {
            link.send(&self.registry, &command)?;
        }
        Ok(outcome)
    }

    // Timers

    /// Periodic housekeeping: blanks the screen once input has been idle
    /// for the blank timeout
    pub fn tick(&mut self, backend: &mut dyn DrawBackend, now: Instant) {
        let Some(timeout) = self.terminal.settings.blank_timeout else {
            return;
        };
        if !self.terminal.stack.is_blanked() && idle(self.last_input, now) >= timeout {
            self.terminal.stack.set_blanked(backend, true);
        }
    }

    /// Whether the server has been silent longer than the connection
    /// timeout
    pub fn connection_stale(&self, now: Instant) -> bool {
        self.terminal
            .settings
            .conn_timeout
            .is_some_and(|timeout| idle(self.last_data, now) >= timeout)
    }
}

fn idle(since: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(since)
}
