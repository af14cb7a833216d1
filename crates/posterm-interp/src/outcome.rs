//! Input outcomes as commands for the server

use posterm_layer::InputOutcome;
use posterm_link::{Command, TerminalOp};

fn coord(v: i32) -> u16 {
    v.clamp(0, i32::from(u16::MAX)) as u16
}

/// The command reporting `outcome`, or `None` when the server need not hear
/// about it
pub fn encode_outcome(outcome: &InputOutcome) -> Option<Command> {
    let command = match outcome {
        InputOutcome::Touch { layer, x, y } => Command::build(TerminalOp::Touch)
            .u16(*layer)
            .u16(coord(*x))
            .u16(coord(*y)),
        InputOutcome::Mouse {
            layer,
            action,
            x,
            y,
        } => Command::build(TerminalOp::Mouse)
            .u16(*layer)
            .u8(action.code())
            .u16(coord(*x))
            .u16(coord(*y)),
        InputOutcome::Key { code, modifiers } => {
            Command::build(TerminalOp::Key).u32(*code).u8(*modifiers)
        }
        InputOutcome::ButtonPress { layer, object } => {
            Command::build(TerminalOp::ButtonPress).u16(*layer).u16(*object)
        }
        InputOutcome::ItemSelect {
            layer,
            object,
            index,
        } => Command::build(TerminalOp::ItemSelect)
            .u16(*layer)
            .u16(*object)
            .u16(*index),
        InputOutcome::Scroll {
            layer,
            object,
            value,
        } => Command::build(TerminalOp::Scroll)
            .u16(*layer)
            .u16(*object)
            .u16(*value),
        InputOutcome::TextCommit {
            layer,
            object,
            text,
        } => Command::build(TerminalOp::TextCommit)
            .u16(*layer)
            .u16(*object)
            .str(text.as_str()),
        InputOutcome::Unblanked => return None,
    };
    Some(command.finish())
}
