//! Console input translation
//!
//! Converts crossterm events into the pixel-space events the interpreter
//! routes. A mouse cell maps to the pixel at its centre.

use crossterm::event::{
    Event, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent as TermMouseEvent, MouseEventKind,
};
use posterm_interp::InputEvent;
use posterm_layer::{keys, KeyEvent, MouseAction, MouseEvent};

/// What the input reader hands to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Event(InputEvent),

    /// The console changed size (columns, rows)
    Resize(u16, u16),

    /// Local request to leave (Ctrl+C)
    Quit,
}

/// Maps console cells to screen pixels
#[derive(Debug, Clone, Copy)]
pub struct InputMapper {
    cell_width: i32,
    cell_height: i32,

    /// Clicks become touches
    touch: bool,
}

impl InputMapper {
    pub fn new(cell_width: u16, cell_height: u16, touch: bool) -> Self {
        Self {
            cell_width: i32::from(cell_width.max(1)),
            cell_height: i32::from(cell_height.max(1)),
            touch,
        }
    }

    pub fn translate(&self, event: Event) -> Option<Input> {
        match event {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    return None;
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Some(Input::Quit);
                }
                translate_key(key).map(|key| Input::Event(InputEvent::Key(key)))
            }
            Event::Mouse(mouse) => self.translate_mouse(mouse).map(Input::Event),
            Event::Resize(cols, rows) => Some(Input::Resize(cols, rows)),
            _ => None,
        }
    }

    fn translate_mouse(&self, mouse: TermMouseEvent) -> Option<InputEvent> {
        let x = i32::from(mouse.column) * self.cell_width + self.cell_width / 2;
        let y = i32::from(mouse.row) * self.cell_height + self.cell_height / 2;

        let action = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => MouseAction::Press,
            MouseEventKind::Up(MouseButton::Left) => MouseAction::Release,
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => MouseAction::Move,
            _ => return None,
        };

        if self.touch {
            // A touch screen only reports the press
            return (action == MouseAction::Press).then_some(InputEvent::Touch { x, y });
        }
        Some(InputEvent::Mouse(MouseEvent::new(action, x, y)))
    }
}

/// Convert a console key to a terminal key code
pub fn translate_key(key: TermKeyEvent) -> Option<KeyEvent> {
    let code = match key.code {
        KeyCode::Char(c) => u32::from(c),
        KeyCode::Enter => keys::ENTER,
        KeyCode::Tab | KeyCode::BackTab => keys::TAB,
        KeyCode::Backspace => keys::BACKSPACE,
        KeyCode::Esc => keys::ESCAPE,
        KeyCode::Delete => keys::DELETE,
        KeyCode::Left => keys::LEFT,
        KeyCode::Right => keys::RIGHT,
        KeyCode::Up => keys::UP,
        KeyCode::Down => keys::DOWN,
        KeyCode::Home => keys::HOME,
        KeyCode::End => keys::END,
        KeyCode::PageUp => keys::PAGE_UP,
        KeyCode::PageDown => keys::PAGE_DOWN,
        KeyCode::F(n) => keys::FUNCTION_BASE + u32::from(n),
        _ => return None,
    };

    let mut modifiers = 0;
    if key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab {
        modifiers |= keys::MOD_SHIFT;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        modifiers |= keys::MOD_CTRL;
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        modifiers |= keys::MOD_ALT;
    }
    Some(KeyEvent::new(code, modifiers))
}
