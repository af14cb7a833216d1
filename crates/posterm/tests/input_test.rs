use crossterm::event::{
    Event, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyEventState, KeyModifiers,
    MouseButton, MouseEvent as TermMouseEvent, MouseEventKind,
};
use posterm::{Input, InputMapper};
use posterm_interp::InputEvent;
use posterm_layer::{keys, KeyEvent, MouseAction, MouseEvent};
use pretty_assertions::assert_eq;

fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
    Event::Key(TermKeyEvent::new(code, modifiers))
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
    Event::Mouse(TermMouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

#[test]
fn test_keys_map_to_terminal_codes() {
    let mapper = InputMapper::new(8, 16, false);
    let cases = [
        (key(KeyCode::Char('a'), KeyModifiers::NONE), KeyEvent::from_char('a')),
        (key(KeyCode::Enter, KeyModifiers::NONE), KeyEvent::new(keys::ENTER, 0)),
        (key(KeyCode::PageDown, KeyModifiers::NONE), KeyEvent::new(keys::PAGE_DOWN, 0)),
        (key(KeyCode::F(3), KeyModifiers::NONE), KeyEvent::new(keys::FUNCTION_BASE + 3, 0)),
        (
            key(KeyCode::Left, KeyModifiers::SHIFT | KeyModifiers::ALT),
            KeyEvent::new(keys::LEFT, keys::MOD_SHIFT | keys::MOD_ALT),
        ),
        (key(KeyCode::BackTab, KeyModifiers::NONE), KeyEvent::new(keys::TAB, keys::MOD_SHIFT)),
    ];
    for (event, expected) in cases {
        assert_eq!(
            mapper.translate(event),
            Some(Input::Event(InputEvent::Key(expected)))
        );
    }
}

#[test]
fn test_ctrl_c_quits() {
    let mapper = InputMapper::new(8, 16, false);
    assert_eq!(
        mapper.translate(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        Some(Input::Quit)
    );
}

#[test]
fn test_key_release_and_unmapped_keys_are_dropped() {
    let mapper = InputMapper::new(8, 16, false);
    let release = Event::Key(TermKeyEvent {
        code: KeyCode::Char('a'),
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Release,
        state: KeyEventState::NONE,
    });
    assert_eq!(mapper.translate(release), None);
    assert_eq!(mapper.translate(key(KeyCode::Insert, KeyModifiers::NONE)), None);
}

#[test]
fn test_mouse_cells_map_to_pixel_centres() {
    let mapper = InputMapper::new(8, 16, false);
    assert_eq!(
        mapper.translate(mouse(MouseEventKind::Down(MouseButton::Left), 2, 3)),
        Some(Input::Event(InputEvent::Mouse(MouseEvent::new(
            MouseAction::Press,
            20,
            56
        ))))
    );
    assert_eq!(
        mapper.translate(mouse(MouseEventKind::Moved, 0, 0)),
        Some(Input::Event(InputEvent::Mouse(MouseEvent::new(
            MouseAction::Move,
            4,
            8
        ))))
    );
    assert_eq!(
        mapper.translate(mouse(MouseEventKind::Down(MouseButton::Right), 0, 0)),
        None
    );
}

#[test]
fn test_touch_mode_reports_presses_only() {
    let mapper = InputMapper::new(8, 16, true);
    assert_eq!(
        mapper.translate(mouse(MouseEventKind::Down(MouseButton::Left), 1, 1)),
        Some(Input::Event(InputEvent::Touch { x: 12, y: 24 }))
    );
    assert_eq!(
        mapper.translate(mouse(MouseEventKind::Up(MouseButton::Left), 1, 1)),
        None
    );
}

#[test]
fn test_resize_is_forwarded() {
    let mapper = InputMapper::new(8, 16, false);
    assert_eq!(mapper.translate(Event::Resize(100, 40)), Some(Input::Resize(100, 40)));
}
