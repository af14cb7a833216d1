use posterm_link::{
    ByteQueue, Command, Direction, FailureCounter, Link, LinkError, Next, Registry,
    StreamTransport, TerminalOp, Transport, MAX_READ_FAILURES,
};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn flush_writes_encoded_commands() {
    let registry = Registry::standard().unwrap();
    let (client, mut server) = duplex(1024);
    let mut transport = StreamTransport::new(client);
    let mut link = Link::new();

    let hello = Command::build(TerminalOp::TermInfo)
        .str("till-1")
        .u16(1)
        .u16(800)
        .u16(600)
        .finish();
    link.send(&registry, &hello).unwrap();
    let queued = link.outbound.remaining();

    let written = link.flush(&mut transport).await.unwrap();
    assert_eq!(written, queued);
    assert!(link.outbound.is_empty());
    assert_eq!(link.stats().commands_sent, 1);
    assert_eq!(link.stats().bytes_sent, queued as u64);

    let mut received = vec![0u8; queued];
    server.read_exact(&mut received).await.unwrap();
    let mut q = ByteQueue::from_bytes(&received);
    assert_eq!(
        registry.next(Direction::ToServer, &mut q).unwrap(),
        Next::Command(hello)
    );
}

#[tokio::test]
async fn fill_appends_to_inbound() {
    let (client, mut server) = duplex(1024);
    let mut transport = StreamTransport::new(client);
    let mut link = Link::new();

    server.write_all(&[1, 2, 3]).await.unwrap();
    let n = link.fill(&mut transport).await.unwrap();
    assert_eq!(n, 3);

    server.write_all(&[4]).await.unwrap();
    link.fill(&mut transport).await.unwrap();
    assert_eq!(link.inbound.as_slice(), &[1, 2, 3, 4]);
    assert_eq!(link.stats().bytes_received, 4);
}

#[tokio::test]
async fn closed_peer_reads_zero() {
    let (client, server) = duplex(64);
    drop(server);
    let mut transport = StreamTransport::new(client);
    let mut inbound = ByteQueue::new();
    assert_eq!(transport.read(&mut inbound).await.unwrap(), 0);
}

#[test]
fn send_rejects_unregistered_opcode() {
    let registry = Registry::new();
    let mut link = Link::new();
    let cmd = Command::build(TerminalOp::Touch).u16(0).u16(1).u16(2).finish();
    assert!(matches!(
        link.send(&registry, &cmd),
        Err(LinkError::UnknownOpcode(_))
    ));
    assert!(link.outbound.is_empty());
}

#[test]
fn failure_counter_trips_at_limit() {
    let mut counter = FailureCounter::default();
    let err = LinkError::TransportError("reset".into());

    for _ in 0..MAX_READ_FAILURES - 1 {
        assert!(!counter.record(Ok(0)));
    }
    assert_eq!(counter.consecutive(), MAX_READ_FAILURES - 1);
    assert!(counter.record(Err(&err)));
}

#[test]
fn failure_counter_resets_on_data() {
    let mut counter = FailureCounter::new(3);
    assert!(!counter.record(Ok(0)));
    assert!(!counter.record(Ok(0)));
    assert!(!counter.record(Ok(10)));
    assert_eq!(counter.consecutive(), 0);
    assert!(!counter.record(Ok(0)));
    assert!(!counter.record(Ok(0)));
    assert!(counter.record(Ok(0)));
}
