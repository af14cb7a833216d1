use posterm_interp::{Flow, InputEvent, Interpreter, OfflineProcessor, RenderContext};
use posterm_layer::{DrawOp, LayerStack, Region, Screensaver};
use posterm_link::{Link, ServerOp};
use posterm_test_utils::{init_test_logging, DrawCall, RecordingBackend, ServerScript};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

fn setup() -> (Interpreter, Link, RecordingBackend) {
    init_test_logging();
    let stack = LayerStack::new(640, 480).with_screensaver(Screensaver::seeded(5));
    let interp = Interpreter::new(stack, Box::new(OfflineProcessor)).unwrap();
    (interp, Link::new(), RecordingBackend::new(640, 480))
}

fn run(
    interp: &mut Interpreter,
    link: &mut Link,
    backend: &mut RecordingBackend,
    script: ServerScript,
) -> Flow {
    link.inbound.extend(&script.bytes());
    interp.drain(link, backend).unwrap()
}

#[test]
fn test_layer_five_scenario() {
    let (mut interp, mut link, mut backend) = setup();

    let script = ServerScript::new()
        .new_layer(5, 0, 0, 100, 50)
        .show_layer(5)
        .text_left(10, 10, "OK");
    assert_eq!(run(&mut interp, &mut link, &mut backend, script), Flow::Continue);

    let key = interp.terminal().stack.find_by_point(10, 10).unwrap();
    assert_eq!(interp.terminal().stack.get(key).unwrap().id(), 5);

    backend.clear();
    let drawn = interp
        .terminal_mut()
        .stack
        .update_area(&mut backend, Region::new(0, 0, 100, 50));
    assert_eq!(drawn, vec![key]);
    assert_eq!(backend.texts(), vec!["OK"]);

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().kill_layer(5),
    );
    assert_eq!(interp.terminal().stack.find_by_point(10, 10), None);
}

#[test]
fn test_update_area_command_draws_current_text() {
    let (mut interp, mut link, mut backend) = setup();
    let script = ServerScript::new()
        .new_layer(5, 0, 0, 100, 50)
        .show_layer(5)
        .text_left(10, 10, "OK");
    run(&mut interp, &mut link, &mut backend, script);

    backend.clear();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().update_area(0, 0, 100, 50),
    );
    assert_eq!(backend.texts(), vec!["OK"]);
    assert_eq!(backend.presents(), vec![Region::new(0, 0, 100, 50)]);
}

#[test]
fn test_unknown_opcodes_change_nothing() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().new_layer(1, 0, 0, 100, 100).show_layer(1),
    );
    let ctx_before = interp.terminal().ctx;
    let keys_before = interp.terminal().stack.active_keys();

    let flow = run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().raw(&[0xEE, 0xEF, 0x00]),
    );
    assert_eq!(flow, Flow::Continue);
    assert_eq!(interp.terminal().ctx, ctx_before);
    assert_eq!(interp.terminal().stack.active_keys(), keys_before);
    assert!(link.inbound.is_empty());

    // Draining carries on past unknown bytes in the same buffer
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().raw(&[0xEE]).new_layer(2, 0, 0, 10, 10),
    );
    assert_eq!(interp.terminal().stack.inactive_count(), 1);
}

#[test]
fn test_partial_command_waits_for_rest() {
    let (mut interp, mut link, mut backend) = setup();
    let bytes = ServerScript::new().new_layer(1, 0, 0, 100, 100).bytes();

    link.inbound.extend(&bytes[..5]);
    assert_eq!(interp.drain(&mut link, &mut backend).unwrap(), Flow::Continue);
    assert_eq!(interp.terminal().stack.inactive_count(), 0);
    assert_eq!(link.inbound.remaining(), 5);

    link.inbound.extend(&bytes[5..]);
    interp.drain(&mut link, &mut backend).unwrap();
    assert_eq!(interp.terminal().stack.inactive_count(), 1);
    assert!(link.inbound.is_empty());
}

#[test]
fn test_shutdown_stops_draining() {
    let (mut interp, mut link, mut backend) = setup();
    let flow = run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().shutdown().new_layer(1, 0, 0, 10, 10),
    );
    assert_eq!(flow, Flow::Shutdown);
    assert_eq!(interp.terminal().stack.inactive_count(), 0);
    assert!(!link.inbound.is_empty());
}

#[test]
fn test_kill_leaves_context_dangling() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().new_layer(5, 0, 0, 100, 50).show_layer(5),
    );
    let ctx = interp.terminal().ctx;
    assert!(ctx.current.is_some());

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .kill_layer(5)
            .text_left(1, 1, "lost")
            .push_button(1, 0, 0, 10, 10, "lost"),
    );
    assert_eq!(interp.terminal().ctx, ctx);
    assert!(interp.terminal_mut().current_mut().is_none());
    assert_eq!(interp.terminal().stack.active_count(), 0);
}

#[test]
fn test_kill_without_layer_is_noop() {
    let (mut interp, mut link, mut backend) = setup();
    let flow = run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().kill_layer(40).show_layer(41),
    );
    assert_eq!(flow, Flow::Continue);
    assert_eq!(interp.terminal().ctx, RenderContext::default());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_show_prefers_fresh_duplicate() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().new_layer(3, 0, 0, 100, 100).show_layer(3),
    );
    let first = interp.terminal().ctx.current.unwrap();

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().new_layer(3, 0, 0, 100, 100).show_layer(3),
    );
    let second = interp.terminal().ctx.current.unwrap();
    assert_ne!(first, second);
    assert_eq!(interp.terminal().stack.active_keys(), vec![first, second]);

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().kill_layer(3),
    );
    assert_eq!(interp.terminal().stack.active_keys(), vec![first]);
}

#[test]
fn test_open_does_not_steal_current_page() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .new_layer(5, 0, 0, 100, 50)
            .show_layer(5)
            .new_layer(6, 0, 0, 100, 50)
            .text_left(10, 10, "HERE"),
    );

    let stack = &interp.terminal().stack;
    let shown = stack.active_keys()[0];
    let next_page = interp.terminal().ctx.target.unwrap();
    assert_eq!(stack.get(shown).unwrap().id(), 5);
    assert_eq!(stack.get(next_page).unwrap().id(), 6);
    assert_eq!(interp.terminal().ctx.current, Some(shown));
    assert_eq!(stack.get(shown).unwrap().ops().count(), 1);
    assert_eq!(stack.get(next_page).unwrap().ops().count(), 0);
}

#[test]
fn test_calibration_holds_back_redraws() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .new_layer(5, 0, 0, 100, 50)
            .show_layer(5)
            .text_left(10, 10, "OK")
            .calibrate(),
    );
    assert!(interp.terminal().calibrating);

    backend.clear();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .update_all(true)
            .update_area(0, 0, 100, 50)
            .new_layer(6, 200, 200, 50, 50)
            .show_layer(6)
            .kill_layer(5),
    );
    assert!(backend.calls().is_empty());
    let six = interp.terminal().stack.find_by_id(6).unwrap();
    assert!(interp.terminal().stack.get(six).unwrap().needs_update());
    assert_eq!(
        interp.terminal().deferred_repair,
        Some(Region::new(0, 0, 640, 480))
    );

    // The calibration touch releases the held-back repaint
    interp
        .input(&mut link, &mut backend, InputEvent::Touch { x: 3, y: 4 })
        .unwrap();
    assert!(!interp.terminal().calibrating);
    assert_eq!(interp.terminal().deferred_repair, None);
    assert_eq!(backend.presents(), vec![Region::new(0, 0, 640, 480)]);

    backend.clear();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().update_all(false),
    );
    assert_eq!(backend.presents(), vec![Region::new(200, 200, 50, 50)]);
    assert!(!interp.terminal().stack.get(six).unwrap().needs_update());
}

#[test]
fn test_target_and_current_commands() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .new_layer(1, 0, 0, 200, 200)
            .new_layer(2, 0, 0, 200, 200)
            .target_layer(1)
            .push_button(7, 10, 10, 50, 20, "Go")
            .target_layer(99),
    );
    let stack = &interp.terminal().stack;
    let one = stack.find_by_id(1).unwrap();
    let two = stack.find_by_id(2).unwrap();
    assert_eq!(interp.terminal().ctx.target, Some(one));
    // Opening a layer never makes it current
    assert_eq!(interp.terminal().ctx.current, None);
    assert_eq!(stack.get(one).unwrap().object_count(), 1);
    assert_eq!(stack.get(two).unwrap().object_count(), 0);

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().current_layer(1).text_left(0, 0, "here"),
    );
    assert_eq!(interp.terminal().ctx.current, Some(one));
    assert_eq!(interp.terminal().stack.get(one).unwrap().ops().count(), 1);
}

#[test]
fn test_translations_apply_to_text() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .translations(&[("Total", "Summe")])
            .new_layer(1, 0, 0, 200, 200)
            .show_layer(1)
            .text_left(0, 0, "Total")
            .text_left(0, 30, "Tip"),
    );
    let layer = interp.terminal_mut().current_mut().unwrap();
    let texts: Vec<&str> = layer
        .ops()
        .filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["Summe", "Tip"]);
}

#[test]
fn test_blank_page_resets_layer() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .new_layer(1, 0, 0, 200, 200)
            .show_layer(1)
            .set_clip(0, 0, 50, 50)
            .text_left(0, 0, "old")
            .push_button(2, 0, 0, 20, 20, "x")
            .blank_page(6),
    );
    let layer = interp.terminal_mut().current_mut().unwrap();
    assert_eq!(layer.ops().count(), 0);
    assert_eq!(layer.object_count(), 0);
    assert_eq!(layer.clip(), None);
    assert_eq!(layer.background(), 6);
}

#[test]
fn test_update_all_clears_flags() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .new_layer(1, 0, 0, 200, 200)
            .show_layer(1)
            .solid_rectangle(0, 0, 20, 20, 3),
    );
    assert!(interp.terminal_mut().current_mut().unwrap().needs_update());

    backend.clear();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().update_all(false),
    );
    assert!(!interp.terminal_mut().current_mut().unwrap().needs_update());
    assert_eq!(backend.presents(), vec![Region::new(0, 0, 200, 200)]);
}

#[test]
fn test_device_commands_reach_backend() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .command(posterm_link::Command::build(ServerOp::SetCursor).u8(3).finish())
            .bell(50)
            .command(posterm_link::Command::build(ServerOp::Iconify).finish()),
    );
    assert_eq!(
        backend.calls(),
        &[DrawCall::Cursor(3), DrawCall::Bell(50), DrawCall::Iconify]
    );
    assert_eq!(interp.terminal().settings.cursor, 3);
}

#[test]
fn test_message_banner_commands() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .translations(&[("Offline", "Hors ligne")])
            .set_message("Offline"),
    );
    assert_eq!(interp.terminal().stack.message(), Some("Hors ligne"));

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().command(posterm_link::Command::build(ServerOp::ClearMessage).finish()),
    );
    assert_eq!(interp.terminal().stack.message(), None);
}

#[test]
fn test_blank_timeout_blanks_when_idle() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().blank_time(60),
    );
    assert_eq!(
        interp.terminal().settings.blank_timeout,
        Some(Duration::from_secs(60))
    );

    interp.tick(&mut backend, Instant::now());
    assert!(!interp.terminal().stack.is_blanked());

    interp.tick(&mut backend, Instant::now() + Duration::from_secs(61));
    assert!(interp.terminal().stack.is_blanked());

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().blank_time(0),
    );
    assert_eq!(interp.terminal().settings.blank_timeout, None);
}

#[test]
fn test_connection_timeout() {
    let (mut interp, mut link, mut backend) = setup();
    assert!(!interp.connection_stale(Instant::now() + Duration::from_secs(3600)));

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().command(
            posterm_link::Command::build(ServerOp::ConnTimeout)
                .u16(5)
                .finish(),
        ),
    );
    assert!(!interp.connection_stale(Instant::now()));
    assert!(interp.connection_stale(Instant::now() + Duration::from_secs(6)));
}

#[test]
fn test_blank_screen_shows_screensaver_image() {
    let (mut interp, mut link, _) = setup();
    let mut backend = RecordingBackend::new(640, 480).with_image("beach.png");
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new()
            .screensaver_images(&["beach.png"])
            .command(posterm_link::Command::build(ServerOp::BlankScreen).finish()),
    );
    assert!(interp.terminal().stack.is_blanked());
    assert_eq!(backend.images(), vec!["beach.png"]);
}

#[test]
fn test_rubber_band_commands() {
    let (mut interp, mut link, mut backend) = setup();
    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().command(
            posterm_link::Command::build(ServerOp::SelectUpdate)
                .u16(10)
                .u16(10)
                .u16(40)
                .u16(40)
                .finish(),
        ),
    );
    assert_eq!(
        interp.terminal().stack.rubber_band(),
        Some(Region::new(10, 10, 40, 40))
    );

    run(
        &mut interp,
        &mut link,
        &mut backend,
        ServerScript::new().command(posterm_link::Command::build(ServerOp::SelectOff).finish()),
    );
    assert_eq!(interp.terminal().stack.rubber_band(), None);
}
