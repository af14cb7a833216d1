use posterm::{Headless, Input, Session, SessionEnd, TerminalConfig};
use posterm_interp::{InputEvent, OfflineProcessor};
use posterm_link::{
    ByteQueue, Command, Direction, Next, Registry, ServerOp, StreamTransport, TerminalOp, Value,
};
use posterm_test_utils::{init_test_logging, MemoryTransport, ServerScript};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

fn session(config: TerminalConfig) -> Session<Headless> {
    Session::new(config, Box::new(OfflineProcessor), Headless::default()).unwrap()
}

/// Read from the terminal until one whole command has arrived
async fn next_command(
    registry: &Registry,
    stream: &mut DuplexStream,
    queue: &mut ByteQueue,
) -> Command {
    loop {
        if let Next::Command(cmd) = registry.next(Direction::ToServer, queue).unwrap() {
            return cmd;
        }
        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "terminal closed the stream");
        queue.extend(&buf[..n]);
    }
}

#[tokio::test]
async fn test_server_shutdown_ends_session() {
    init_test_logging();
    let (mut transport, peer) = MemoryTransport::pair();
    peer.send(
        &ServerScript::new()
            .new_layer(5, 0, 0, 100, 50)
            .show_layer(5)
            .text_left(10, 10, "OK")
            .update_all(true)
            .shutdown()
            .bytes(),
    )
    .await;

    let mut session = session(TerminalConfig::default());
    let (_input_tx, mut input_rx) = mpsc::unbounded_channel();
    let end = session.run(&mut transport, &mut input_rx).await.unwrap();

    assert_eq!(end, SessionEnd::Shutdown);
    assert_eq!(end.exit_code(), 0);

    let cells = session.cells();
    assert!((0..cells.rows()).any(|row| cells.row_text(row).contains("OK")));
    assert!(session.presenter().presented_rows() > 0);

    let mut written = ByteQueue::from_bytes(&peer.written().await);
    match session
        .interpreter()
        .registry()
        .next(Direction::ToServer, &mut written)
        .unwrap()
    {
        Next::Command(cmd) => {
            assert_eq!(cmd.opcode(), u8::from(TerminalOp::TermInfo));
            assert_eq!(cmd.values()[0], Value::Str("posterm".into()));
        }
        other => panic!("expected hello, got {other:?}"),
    }
}

#[tokio::test]
async fn test_silent_server_exits_with_failure() {
    let (mut transport, _peer) = MemoryTransport::pair();
    let mut session = session(TerminalConfig::default());
    let (_input_tx, mut input_rx) = mpsc::unbounded_channel();

    let end = session.run(&mut transport, &mut input_rx).await.unwrap();
    assert_eq!(end, SessionEnd::ConnectionLost);
    assert_eq!(end.exit_code(), 1);
}

#[tokio::test]
async fn test_console_quit() {
    let (client, _server) = tokio::io::duplex(4096);
    let mut transport = StreamTransport::new(client);
    let mut session = session(TerminalConfig::default());
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    input_tx.send(Input::Quit).unwrap();

    let end = session.run(&mut transport, &mut input_rx).await.unwrap();
    assert_eq!(end, SessionEnd::Quit);
    assert_eq!(end.exit_code(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_connection_timeout_from_server() {
    let (client, mut server) = tokio::io::duplex(4096);
    server
        .write_all(
            &ServerScript::new()
                .command(Command::build(ServerOp::ConnTimeout).u16(1).finish())
                .bytes(),
        )
        .await
        .unwrap();

    let mut transport = StreamTransport::new(client);
    let mut session = session(TerminalConfig::default());
    let (_input_tx, mut input_rx) = mpsc::unbounded_channel();

    let end = session.run(&mut transport, &mut input_rx).await.unwrap();
    assert_eq!(end, SessionEnd::TimedOut);
    assert_eq!(end.exit_code(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_idle_console_blanks() {
    let (client, _server) = tokio::io::duplex(4096);
    let mut transport = StreamTransport::new(client);
    let mut session = session(TerminalConfig {
        blank_timeout: Some(Duration::from_secs(1)),
        ..TerminalConfig::default()
    });
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        let _ = input_tx.send(Input::Quit);
    });

    let end = session.run(&mut transport, &mut input_rx).await.unwrap();
    assert_eq!(end, SessionEnd::Quit);
    assert!(session.interpreter().terminal().stack.is_blanked());
}

#[tokio::test(start_paused = true)]
async fn test_touch_reaches_server() {
    init_test_logging();
    let (client, mut server) = tokio::io::duplex(64 * 1024);
    let mut transport = StreamTransport::new(client);
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();

    let server_task = tokio::spawn(async move {
        let registry = Registry::standard().unwrap();
        let mut from_terminal = ByteQueue::new();

        let hello = next_command(&registry, &mut server, &mut from_terminal).await;
        assert_eq!(hello.opcode(), u8::from(TerminalOp::TermInfo));

        let page = ServerScript::new()
            .new_layer(1, 0, 0, 200, 100)
            .show_layer(1)
            .push_button(3, 10, 10, 80, 30, "Pay")
            .update_all(true)
            .bytes();
        server.write_all(&page).await.unwrap();

        // Let the terminal draw the page before touching it
        tokio::time::sleep(Duration::from_millis(50)).await;
        input_tx
            .send(Input::Event(InputEvent::Touch { x: 20, y: 20 }))
            .unwrap();

        let press = next_command(&registry, &mut server, &mut from_terminal).await;
        server
            .write_all(&ServerScript::new().shutdown().bytes())
            .await
            .unwrap();
        press
    });

    let mut session = session(TerminalConfig::default());
    let end = session.run(&mut transport, &mut input_rx).await.unwrap();
    assert_eq!(end, SessionEnd::Shutdown);

    let press = server_task.await.unwrap();
    assert_eq!(press.opcode(), u8::from(TerminalOp::ButtonPress));
    assert_eq!(press.values(), &[Value::U16(1), Value::U16(3)]);
}
