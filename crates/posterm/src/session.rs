//! The terminal event loop
//!
//! One task multiplexes three sources with `tokio::select!`: bytes from the
//! server, the housekeeping timer and console input. Every handler runs to
//! completion before the next event is taken, so the engine needs no
//! locking. After each handler the outbound queue is flushed and the rows
//! that changed are presented.

use crate::config::TerminalConfig;
use crate::input::Input;
use crate::screen::Presenter;
use anyhow::{Context, Result};
use posterm_interp::{Flow, Interpreter, PaymentProcessor};
use posterm_layer::{CellBuffer, LayerStack};
use posterm_link::{FailureCounter, Link, Transport};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server sent `Shutdown`
    Shutdown,

    /// Ctrl+C at the console
    Quit,

    /// Too many consecutive empty or failed reads
    ConnectionLost,

    /// The server stayed silent past its connection timeout
    TimedOut,
}

impl SessionEnd {
    pub fn exit_code(self) -> i32 {
        match self {
            SessionEnd::Shutdown | SessionEnd::Quit => 0,
            SessionEnd::ConnectionLost | SessionEnd::TimedOut => 1,
        }
    }
}

pub struct Session<P> {
    config: TerminalConfig,
    interp: Interpreter,
    link: Link,
    cells: CellBuffer,
    presenter: P,
}

impl<P: Presenter> Session<P> {
    pub fn new(
        config: TerminalConfig,
        processor: Box<dyn PaymentProcessor>,
        presenter: P,
    ) -> Result<Self> {
        let stack = LayerStack::new(i32::from(config.width), i32::from(config.height));
        let mut interp =
            Interpreter::new(stack, processor).context("Failed to load the protocol tables")?;
        interp.terminal_mut().settings.blank_timeout = config.blank_timeout;

        let (cols, rows) = config.grid();
        let cells = CellBuffer::new(
            cols,
            rows,
            i32::from(config.cell_width),
            i32::from(config.cell_height),
        );

        Ok(Self {
            config,
            interp,
            link: Link::new(),
            cells,
            presenter,
        })
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    pub fn cells(&self) -> &CellBuffer {
        &self.cells
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Match the cell grid to the console before anything is drawn
    pub fn fit_console(&mut self, cols: u16, rows: u16) {
        self.cells.resize(cols, rows);
    }

    /// Run until the server shuts the terminal down or the connection is
    /// lost
    pub async fn run(
        &mut self,
        transport: &mut dyn Transport,
        input_rx: &mut mpsc::UnboundedReceiver<Input>,
    ) -> Result<SessionEnd> {
        self.interp.hello(&mut self.link, &self.config.name)?;
        self.link
            .flush(transport)
            .await
            .context("Failed to send hello")?;
        info!("Sent hello as {}", self.config.name);

        let mut failures = FailureCounter::new(self.config.max_read_failures);
        let mut ticker = time::interval(self.config.timer_period);

        loop {
            tokio::select! {
                read = self.link.fill(transport) => {
                    if failures.record(read.as_ref().map(|n| *n)) {
                        warn!(
                            "No data after {} reads, giving up",
                            failures.consecutive()
                        );
                        return Ok(SessionEnd::ConnectionLost);
                    }
                    if self.interp.drain(&mut self.link, &mut self.cells)? == Flow::Shutdown {
                        info!("Server requested shutdown");
                        self.link.flush(transport).await?;
                        self.presenter.present(&mut self.cells)?;
                        return Ok(SessionEnd::Shutdown);
                    }
                }

                _ = ticker.tick() => {
                    let now = time::Instant::now().into_std();
                    if self.interp.connection_stale(now) {
                        warn!("Server silent past the connection timeout");
                        return Ok(SessionEnd::TimedOut);
                    }
                    self.interp.tick(&mut self.cells, now);
                }

                Some(input) = input_rx.recv() => {
                    match input {
                        Input::Event(event) => {
                            let outcome = self.interp.input(&mut self.link, &mut self.cells, event)?;
                            debug!("Input {:?} -> {:?}", event, outcome);
                        }
                        Input::Resize(cols, rows) => {
                            debug!("Console resized to {}x{}", cols, rows);
                            self.cells.resize(cols, rows);
                            let stack = &mut self.interp.terminal_mut().stack;
                            let screen = stack.screen();
                            stack.repair(&mut self.cells, screen);
                        }
                        Input::Quit => {
                            info!("Quit from the console");
                            return Ok(SessionEnd::Quit);
                        }
                    }
                }
            }

            if !self.link.outbound.is_empty() {
                self.link.flush(transport).await?;
            }
            self.presenter.present(&mut self.cells)?;
        }
    }
}
