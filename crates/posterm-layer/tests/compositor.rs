use posterm_layer::{Align, DrawOp, Layer, LayerStack, MouseAction, MouseEvent, Placement, Region, Screensaver};
use posterm_test_utils::{init_test_logging, DrawCall, RecordingBackend};
use pretty_assertions::assert_eq;

const W: i32 = 640;
const H: i32 = 480;

fn layer(id: u16, x: i32, y: i32, w: i32, h: i32) -> Layer {
    Layer::new(id, Region::new(x, y, w, h), 0, "")
}

fn shown(stack: &mut LayerStack, layer: Layer) -> posterm_layer::LayerKey {
    let key = stack.add_inactive(layer);
    assert!(stack.show(key));
    key
}

#[test]
fn test_most_recently_shown_wins_hit_test() {
    init_test_logging();
    let mut stack = LayerStack::new(W, H);
    let a = stack.add_inactive(layer(1, 0, 0, 100, 100));
    let b = stack.add_inactive(layer(2, 50, 50, 100, 100));

    stack.show(b);
    stack.show(a);
    assert_eq!(stack.find_by_point(60, 60), Some(a));

    stack.show(b);
    assert_eq!(stack.find_by_point(60, 60), Some(b));
    assert_eq!(stack.find_by_point(10, 10), Some(a));
    assert_eq!(stack.find_by_point(300, 300), None);
    assert_eq!(stack.active_keys(), vec![a, b]);
}

#[test]
fn test_inactive_layers_are_invisible() {
    let mut stack = LayerStack::new(W, H);
    let key = stack.add_inactive(layer(1, 0, 0, 100, 100));
    let mut backend = RecordingBackend::new(W, H);

    assert_eq!(stack.find_by_point(10, 10), None);
    assert!(stack.update_area(&mut backend, Region::new(0, 0, 100, 100)).is_empty());
    assert!(!stack.is_active(key));
    assert_eq!(stack.inactive_count(), 1);
}

#[test]
fn test_update_area_skips_disjoint_layers() {
    let mut stack = LayerStack::new(W, H);
    let a = shown(&mut stack, layer(1, 0, 0, 100, 100));
    let _b = shown(&mut stack, layer(2, 300, 300, 50, 50));
    let mut backend = RecordingBackend::new(W, H);

    let area = Region::new(50, 50, 100, 100);
    let drawn = stack.update_area(&mut backend, area);

    assert_eq!(drawn, vec![a]);
    assert_eq!(backend.presents(), vec![area]);
    let clips_inside = backend.calls().iter().all(|call| match call {
        DrawCall::SetClip(clip) => area.contains_region(clip),
        _ => true,
    });
    assert!(clips_inside, "{:?}", backend.calls());
}

#[test]
fn test_update_area_draws_back_to_front() {
    let mut stack = LayerStack::new(W, H);
    let bottom = shown(&mut stack, layer(1, 0, 0, 200, 200));
    let top = shown(&mut stack, layer(2, 20, 20, 50, 50));
    let mut backend = RecordingBackend::new(W, H);

    let drawn = stack.update_area(&mut backend, Region::new(0, 0, 100, 100));
    assert_eq!(drawn, vec![bottom, top]);
}

#[test]
fn test_update_area_off_screen_is_noop() {
    let mut stack = LayerStack::new(W, H);
    shown(&mut stack, layer(1, 0, 0, 100, 100));
    let mut backend = RecordingBackend::new(W, H);

    assert!(stack
        .update_area(&mut backend, Region::new(W + 10, 0, 50, 50))
        .is_empty());
    assert!(stack
        .update_area(&mut backend, Region::new(0, 0, 0, 50))
        .is_empty());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_optimal_update_stops_at_covering_layer() {
    let mut stack = LayerStack::new(W, H);
    let hidden = shown(&mut stack, layer(1, 0, 0, 200, 200));
    let cover = shown(&mut stack, layer(2, 0, 0, 200, 200));
    let badge = shown(&mut stack, layer(3, 10, 10, 20, 20));
    let mut backend = RecordingBackend::new(W, H);

    let area = Region::new(0, 0, 100, 100);
    let drawn = stack.optimal_update_area(&mut backend, area, cover);

    assert_eq!(drawn, vec![cover, badge]);
    assert!(!drawn.contains(&hidden));
    // The covering layer paints the whole area, so no background fill
    assert_eq!(
        backend.count(|c| matches!(c, DrawCall::FillRect { region, .. } if *region == area)),
        0
    );
}

#[test]
fn test_optimal_update_fills_when_not_covered() {
    let mut stack = LayerStack::new(W, H);
    let small = shown(&mut stack, layer(1, 0, 0, 50, 50));
    let mut backend = RecordingBackend::new(W, H);

    let area = Region::new(0, 0, 100, 100);
    let drawn = stack.optimal_update_area(&mut backend, area, small);

    assert_eq!(drawn, vec![small]);
    assert_eq!(
        backend.count(|c| matches!(c, DrawCall::FillRect { region, .. } if *region == area)),
        1
    );
}

#[test]
fn test_optimal_update_with_inactive_stop_draws_everything() {
    let mut stack = LayerStack::new(W, H);
    let below = shown(&mut stack, layer(1, 0, 0, 200, 200));
    let above = shown(&mut stack, layer(2, 0, 0, 200, 200));
    let parked = stack.add_inactive(layer(3, 0, 0, 200, 200));
    let mut backend = RecordingBackend::new(W, H);

    let area = Region::new(0, 0, 100, 100);
    let drawn = stack.optimal_update_area(&mut backend, area, parked);

    assert_eq!(drawn, vec![below, above]);
    assert_eq!(
        backend.count(|c| matches!(c, DrawCall::FillRect { region, .. } if *region == area)),
        1
    );
}

#[test]
fn test_repair_uses_occluder() {
    let mut stack = LayerStack::new(W, H);
    let hidden = shown(&mut stack, layer(1, 0, 0, 200, 200));
    let cover = shown(&mut stack, layer(2, 0, 0, 200, 200));
    let mut backend = RecordingBackend::new(W, H);

    let area = Region::new(10, 10, 50, 50);
    assert_eq!(stack.occluder(area), Some(cover));
    assert_eq!(stack.repair(&mut backend, area), vec![cover]);

    let wide = Region::new(150, 150, 100, 100);
    assert_eq!(stack.occluder(wide), None);
    assert_eq!(stack.repair(&mut backend, wide), vec![hidden, cover]);
}

#[test]
fn test_update_all_selects_flagged_layers() {
    let mut stack = LayerStack::new(W, H);
    let a = shown(&mut stack, layer(1, 0, 0, 100, 100));
    let b = shown(&mut stack, layer(2, 300, 300, 100, 100));
    let mut backend = RecordingBackend::new(W, H);

    let mut everything = stack.update_all(&mut backend, true);
    everything.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(everything, expected);
    assert!(!stack.get(a).unwrap().needs_update());
    assert!(!stack.get(b).unwrap().needs_update());

    stack.get_mut(b).unwrap().record(DrawOp::SolidRectangle {
        region: Region::new(0, 0, 10, 10),
        color: 4,
    });
    backend.clear();
    assert_eq!(stack.update_all(&mut backend, false), vec![b]);
    assert!(!stack.get(b).unwrap().needs_update());
    assert_eq!(backend.presents(), vec![Region::new(300, 300, 100, 100)]);

    backend.clear();
    assert!(stack.update_all(&mut backend, false).is_empty());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_flagged_update_skips_covered_layers() {
    let mut stack = LayerStack::new(W, H);
    let under = shown(&mut stack, layer(1, 0, 0, 200, 200));
    let over = shown(&mut stack, layer(2, 10, 10, 50, 50));
    let mut backend = RecordingBackend::new(W, H);
    stack.update_all(&mut backend, true);

    stack.get_mut(under).unwrap().record(DrawOp::Text {
        x: 0,
        y: 0,
        font: 0,
        color: 1,
        align: Align::Left,
        max_width: None,
        text: "under".into(),
    });
    stack.get_mut(under).unwrap().clear_update();
    stack.get_mut(over).unwrap().record(DrawOp::Text {
        x: 0,
        y: 0,
        font: 0,
        color: 1,
        align: Align::Left,
        max_width: None,
        text: "over".into(),
    });
    backend.clear();

    assert_eq!(stack.update_all(&mut backend, false), vec![over]);
    assert_eq!(backend.texts(), vec!["over".to_string()]);
    assert_eq!(backend.presents(), vec![Region::new(10, 10, 50, 50)]);
    assert!(!stack.get(over).unwrap().needs_update());
}

#[test]
fn test_kill_reaches_duplicates_in_order() {
    let mut stack = LayerStack::new(W, H);
    let older = shown(&mut stack, layer(7, 0, 0, 100, 100));
    let newer = shown(&mut stack, layer(7, 0, 0, 100, 100));
    let parked = stack.add_inactive(layer(7, 0, 0, 100, 100));

    let (first, placement) = stack.kill(7).unwrap();
    assert_eq!((first.key(), placement), (newer, Placement::Active));
    let (second, placement) = stack.kill(7).unwrap();
    assert_eq!((second.key(), placement), (older, Placement::Active));
    let (third, placement) = stack.kill(7).unwrap();
    assert_eq!((third.key(), placement), (parked, Placement::Inactive));
    assert!(stack.kill(7).is_none());
    assert_eq!(stack.active_count() + stack.inactive_count(), 0);
}

#[test]
fn test_kill_then_hit_test_is_none() {
    let mut stack = LayerStack::new(W, H);
    shown(&mut stack, layer(5, 0, 0, 100, 50));
    assert!(stack.find_by_point(10, 10).is_some());

    stack.kill(5);
    assert_eq!(stack.find_by_point(10, 10), None);
}

#[test]
fn test_show_unknown_key_is_false() {
    let mut stack = LayerStack::new(W, H);
    let key = shown(&mut stack, layer(1, 0, 0, 10, 10));
    stack.remove(key);
    assert!(!stack.show(key));
    assert!(stack.get(key).is_none());
}

#[test]
fn test_drag_title_bar_moves_and_raises() {
    init_test_logging();
    let mut stack = LayerStack::new(W, H);
    let titled = stack.add_inactive(Layer::new(
        1,
        Region::new(100, 100, 200, 150),
        posterm_layer::FLAG_TITLE_BAR,
        "Tables",
    ));
    stack.show(titled);
    let other = shown(&mut stack, layer(2, 250, 150, 100, 100));
    let mut backend = RecordingBackend::new(W, H);

    let press = MouseEvent::new(MouseAction::Press, 110, 105);
    assert_eq!(stack.mouse_action(&mut backend, press), None);
    assert!(stack.is_dragging());
    assert_eq!(stack.active_keys(), vec![other, titled]);

    let motion = MouseEvent::new(MouseAction::Move, 210, 205);
    assert_eq!(stack.mouse_action(&mut backend, motion), None);
    assert_eq!(stack.get(titled).unwrap().region(), Region::new(200, 200, 200, 150));
    assert_eq!(
        backend.presents().last(),
        Some(&Region::new(100, 100, 300, 250))
    );

    let release = MouseEvent::new(MouseAction::Release, 210, 205);
    assert_eq!(stack.mouse_action(&mut backend, release), None);
    assert!(!stack.is_dragging());
}

#[test]
fn test_rubber_band_repairs_old_outline() {
    let mut stack = LayerStack::new(W, H);
    shown(&mut stack, layer(1, 0, 0, W, H));
    let mut backend = RecordingBackend::new(W, H);

    let first = Region::new(10, 10, 50, 50);
    stack.rubber_band_update(&mut backend, first);
    assert_eq!(stack.rubber_band(), Some(first));
    assert_eq!(
        backend.count(|c| matches!(c, DrawCall::OutlineRect { region, .. } if *region == first)),
        1
    );

    let second = Region::new(100, 100, 20, 20);
    backend.clear();
    stack.rubber_band_update(&mut backend, second);
    assert_eq!(backend.presents(), vec![first.union(&second)]);

    backend.clear();
    stack.rubber_band_off(&mut backend);
    assert_eq!(stack.rubber_band(), None);
    assert_eq!(backend.presents(), vec![second]);
    assert_eq!(
        backend.count(|c| matches!(c, DrawCall::OutlineRect { .. })),
        0
    );
}

#[test]
fn test_message_banner_draws_over_layers() {
    let mut stack = LayerStack::new(W, H);
    let key = shown(&mut stack, layer(1, 0, 0, W, H));
    stack
        .get_mut(key)
        .unwrap()
        .record(DrawOp::Text {
            x: 10,
            y: H - 20,
            font: 0,
            color: 0,
            align: posterm_layer::Align::Left,
            max_width: None,
            text: "Subtotal".into(),
        });
    let mut backend = RecordingBackend::new(W, H);

    stack.set_message(&mut backend, "Card declined");
    assert_eq!(stack.message(), Some("Card declined"));
    assert_eq!(backend.texts(), vec!["Subtotal", "Card declined"]);
    assert_eq!(backend.presents(), vec![Region::new(0, H - 32, W, 32)]);

    backend.clear();
    stack.clear_message(&mut backend);
    assert_eq!(stack.message(), None);
    assert_eq!(backend.texts(), vec!["Subtotal"]);
}

#[test]
fn test_screensaver_never_repeats_and_unblanks() {
    let mut stack = LayerStack::new(W, H).with_screensaver(Screensaver::seeded(11));
    let key = shown(&mut stack, layer(1, 0, 0, 100, 100));
    stack.set_screensaver_images(vec!["a.png".into(), "b.png".into()]);
    let mut backend = RecordingBackend::new(W, H)
        .with_image("a.png")
        .with_image("b.png");

    stack.set_blanked(&mut backend, true);
    assert!(stack.is_blanked());
    stack.set_blanked(&mut backend, true);
    let shown_images = backend.images();
    assert_eq!(shown_images.len(), 2);
    assert_ne!(shown_images[0], shown_images[1]);

    assert!(stack
        .update_area(&mut backend, Region::new(0, 0, 100, 100))
        .is_empty());

    backend.clear();
    stack.set_blanked(&mut backend, false);
    assert!(!stack.is_blanked());
    assert_eq!(backend.presents(), vec![stack.screen()]);
    assert!(stack.is_active(key));
}
