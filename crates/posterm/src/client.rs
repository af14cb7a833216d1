//! posterm entry point: argument parsing, logging, console ownership

use crate::config::{Args, TerminalConfig};
use crate::input::{Input, InputMapper};
use crate::screen::{Headless, Screen};
use crate::session::{Session, SessionEnd};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event;
use posterm_interp::OfflineProcessor;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

/// Run the terminal and return the process exit code
pub async fn run() -> Result<i32> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = TerminalConfig::from_args(&args);
    info!(
        "posterm {} connecting to {} as {}",
        env!("CARGO_PKG_VERSION"),
        args.server,
        config.name
    );

    let mut transport = posterm_link::connect(&args.server)
        .await
        .with_context(|| format!("Failed to connect to {}", args.server))?;

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();

    let end = if args.headless {
        let mut session = Session::new(config, Box::new(OfflineProcessor), Headless::default())?;
        // The sender stays alive so the input branch simply never fires
        let _input_tx = input_tx;
        session.run(transport.as_mut(), &mut input_rx).await?
    } else {
        let mapper = InputMapper::new(config.cell_width, config.cell_height, config.touch);
        let screen = Screen::acquire()?;
        let mut session = Session::new(config, Box::new(OfflineProcessor), screen)?;

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let input_handle = tokio::task::spawn_blocking({
            let mut shutdown_rx = shutdown_tx.subscribe();
            move || loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                    match event::read() {
                        Ok(ev) => {
                            if let Some(input) = mapper.translate(ev) {
                                if input_tx.send(input).is_err() {
                                    break;
                                }
                            }
                        }
                        Err(_) => break,
                    }
                }
            }
        });

        if let Ok((cols, rows)) = Screen::size() {
            session.fit_console(cols, rows);
        }
        let result = session.run(transport.as_mut(), &mut input_rx).await;

        let _ = shutdown_tx.send(());
        drop(input_rx);
        let _ = input_handle.await;
        // Dropping the session releases the console
        drop(session);
        result?
    };

    match end {
        SessionEnd::Shutdown | SessionEnd::Quit => info!("Session ended: {:?}", end),
        SessionEnd::ConnectionLost | SessionEnd::TimedOut => {
            error!("Session ended: {:?}", end)
        }
    }
    Ok(end.exit_code())
}

fn init_logging(args: &Args) -> Result<()> {
    let level: tracing::Level = args.log_level.into();
    let builder = tracing_subscriber::fmt().with_max_level(level);

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}
