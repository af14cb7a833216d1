//! Opcode schemas
//!
//! The wire format carries no type or length tags: both peers must agree on
//! the ordered field list of every opcode. That agreement lives here, in one
//! [`Registry`] consulted when decoding (to know whether a command is fully
//! buffered and how to read it) and when encoding (to refuse a command whose
//! fields drift from the table).

use crate::queue::ByteQueue;
use crate::LinkError;
use std::collections::HashMap;
use tracing::debug;

/// Type of one field in a command payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    /// Two-decimal fixed point in a 32-bit field
    Fixed,
    /// u16 length + UTF-8
    Str,
    /// u16 count + strings
    StrList,
    /// u16 count + key/value strings
    StrPairs,
}

impl FieldKind {
    /// Encoded size for fixed-width kinds
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            FieldKind::U8 => Some(1),
            FieldKind::U16 => Some(2),
            FieldKind::U32 | FieldKind::Fixed => Some(4),
            FieldKind::U64 => Some(8),
            FieldKind::Str | FieldKind::StrList | FieldKind::StrPairs => None,
        }
    }
}

/// A decoded field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Fixed(f64),
    Str(String),
    StrList(Vec<String>),
    StrPairs(Vec<(String, String)>),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::U8(_) => FieldKind::U8,
            Value::U16(_) => FieldKind::U16,
            Value::U32(_) => FieldKind::U32,
            Value::U64(_) => FieldKind::U64,
            Value::Fixed(_) => FieldKind::Fixed,
            Value::Str(_) => FieldKind::Str,
            Value::StrList(_) => FieldKind::StrList,
            Value::StrPairs(_) => FieldKind::StrPairs,
        }
    }

    fn read(kind: FieldKind, queue: &mut ByteQueue) -> Result<Self, LinkError> {
        Ok(match kind {
            FieldKind::U8 => Value::U8(queue.get_u8()?),
            FieldKind::U16 => Value::U16(queue.get_u16()?),
            FieldKind::U32 => Value::U32(queue.get_u32()?),
            FieldKind::U64 => Value::U64(queue.get_u64()?),
            FieldKind::Fixed => Value::Fixed(queue.get_fixed()?),
            FieldKind::Str => Value::Str(queue.get_str()?),
            FieldKind::StrList => {
                let count = queue.get_u16()?;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    items.push(queue.get_str()?);
                }
                Value::StrList(items)
            }
            FieldKind::StrPairs => {
                let count = queue.get_u16()?;
                let mut pairs = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let key = queue.get_str()?;
                    let value = queue.get_str()?;
                    pairs.push((key, value));
                }
                Value::StrPairs(pairs)
            }
        })
    }

    fn write(&self, queue: &mut ByteQueue) {
        match self {
            Value::U8(v) => queue.put_u8(*v),
            Value::U16(v) => queue.put_u16(*v),
            Value::U32(v) => queue.put_u32(*v),
            Value::U64(v) => queue.put_u64(*v),
            Value::Fixed(v) => queue.put_fixed(*v),
            Value::Str(s) => queue.put_str(s),
            Value::StrList(items) => {
                let count = items.len().min(u16::MAX as usize);
                queue.put_u16(count as u16);
                for item in &items[..count] {
                    queue.put_str(item);
                }
            }
            Value::StrPairs(pairs) => {
                let count = pairs.len().min(u16::MAX as usize);
                queue.put_u16(count as u16);
                for (key, value) in &pairs[..count] {
                    queue.put_str(key);
                    queue.put_str(value);
                }
            }
        }
    }
}

/// A command: opcode plus its decoded fields, read back in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    opcode: u8,
    values: Vec<Value>,
    cursor: usize,
}

macro_rules! take_field {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $name(&mut self) -> Result<$ty, LinkError> {
            let index = self.cursor;
            match self.values.get(index) {
                Some(Value::$variant(v)) => {
                    self.cursor += 1;
                    Ok(v.clone())
                }
                other => Err(LinkError::FieldMismatch {
                    opcode: self.opcode,
                    index,
                    expected: FieldKind::$variant,
                    found: other.map(Value::kind),
                }),
            }
        }
    };
}

impl Command {
    /// Start building a command for `opcode`
    pub fn build(opcode: impl Into<u8>) -> CommandBuilder {
        CommandBuilder {
            opcode: opcode.into(),
            values: Vec::new(),
        }
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    take_field!(take_u8, U8, u8);
    take_field!(take_u16, U16, u16);
    take_field!(take_u32, U32, u32);
    take_field!(take_u64, U64, u64);
    take_field!(take_fixed, Fixed, f64);
    take_field!(take_str, Str, String);
    take_field!(take_str_list, StrList, Vec<String>);
    take_field!(take_str_pairs, StrPairs, Vec<(String, String)>);
}

/// Builder for outbound commands, see [`Command::build`]
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    opcode: u8,
    values: Vec<Value>,
}

impl CommandBuilder {
    pub fn u8(mut self, v: u8) -> Self {
        self.values.push(Value::U8(v));
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.values.push(Value::U16(v));
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.values.push(Value::U32(v));
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.values.push(Value::U64(v));
        self
    }

    pub fn fixed(mut self, v: f64) -> Self {
        self.values.push(Value::Fixed(v));
        self
    }

    pub fn str(mut self, v: impl Into<String>) -> Self {
        self.values.push(Value::Str(v.into()));
        self
    }

    pub fn str_list<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values
            .push(Value::StrList(items.into_iter().map(Into::into).collect()));
        self
    }

    pub fn str_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.values.push(Value::StrPairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    pub fn finish(self) -> Command {
        Command {
            opcode: self.opcode,
            values: self.values,
            cursor: 0,
        }
    }
}

/// Field layout of one opcode
#[derive(Debug, Clone)]
pub struct Schema {
    opcode: u8,
    name: &'static str,
    fields: &'static [FieldKind],
}

impl Schema {
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [FieldKind] {
        self.fields
    }

    /// Length in bytes of the command at the head of `queue`, opcode
    /// included, or `None` if it is not completely buffered yet.
    pub fn frame_len(&self, queue: &ByteQueue) -> Option<usize> {
        let available = queue.remaining();
        let mut offset = 1;

        for &kind in self.fields {
            match kind.fixed_size() {
                Some(size) => offset += size,
                None => {
                    let strings = match kind {
                        FieldKind::Str => 1,
                        FieldKind::StrList => {
                            let count = queue.peek_u16_at(offset)? as usize;
                            offset += 2;
                            count
                        }
                        _ => {
                            let count = queue.peek_u16_at(offset)? as usize;
                            offset += 2;
                            count * 2
                        }
                    };
                    for _ in 0..strings {
                        let len = queue.peek_u16_at(offset)? as usize;
                        offset += 2 + len;
                    }
                }
            }
            if offset > available {
                return None;
            }
        }

        (offset <= available).then_some(offset)
    }

    /// Decode the command at the head of `queue`.
    ///
    /// Callers check [`frame_len`](Self::frame_len) first; on a short queue
    /// this fails partway and leaves the queue partially consumed.
    pub fn decode(&self, queue: &mut ByteQueue) -> Result<Command, LinkError> {
        let opcode = queue.get_u8()?;
        if opcode != self.opcode {
            return Err(LinkError::SchemaError(format!(
                "{} expects opcode {}, queue holds {}",
                self.name, self.opcode, opcode
            )));
        }

        let mut values = Vec::with_capacity(self.fields.len());
        for &kind in self.fields {
            values.push(Value::read(kind, queue)?);
        }

        Ok(Command {
            opcode,
            values,
            cursor: 0,
        })
    }

    /// Append `command` to `queue` after checking its fields against the
    /// schema. Nothing is written when they disagree.
    pub fn encode(&self, command: &Command, queue: &mut ByteQueue) -> Result<(), LinkError> {
        if command.opcode != self.opcode {
            return Err(LinkError::SchemaError(format!(
                "{} cannot encode opcode {}",
                self.name, command.opcode
            )));
        }

        for (index, &expected) in self.fields.iter().enumerate() {
            let found = command.values.get(index).map(Value::kind);
            if found != Some(expected) {
                return Err(LinkError::FieldMismatch {
                    opcode: self.opcode,
                    index,
                    expected,
                    found,
                });
            }
        }
        if command.values.len() != self.fields.len() {
            return Err(LinkError::SchemaError(format!(
                "{} takes {} fields, command has {}",
                self.name,
                self.fields.len(),
                command.values.len()
            )));
        }

        queue.put_u8(self.opcode);
        for value in &command.values {
            value.write(queue);
        }
        Ok(())
    }
}

/// Which way a command travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Server to terminal: drawing and control commands
    ToTerminal,
    /// Terminal to server: input and replies
    ToServer,
}

/// Result of pulling the next command off a queue
#[derive(Debug, Clone, PartialEq)]
pub enum Next {
    /// A complete, decoded command
    Command(Command),
    /// An opcode with no schema; its byte was consumed
    Unknown(u8),
    /// The head command is not fully buffered yet; nothing was consumed
    Incomplete,
    /// The queue is empty
    Empty,
}

/// Opcode schemas for both directions
#[derive(Debug, Default, Clone)]
pub struct Registry {
    to_terminal: HashMap<u8, Schema>,
    to_server: HashMap<u8, Schema>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, direction: Direction) -> &HashMap<u8, Schema> {
        match direction {
            Direction::ToTerminal => &self.to_terminal,
            Direction::ToServer => &self.to_server,
        }
    }

    /// Add a schema. Duplicate opcodes or names within a direction are
    /// rejected so drift shows up at startup.
    pub fn register(
        &mut self,
        direction: Direction,
        opcode: u8,
        name: &'static str,
        fields: &'static [FieldKind],
    ) -> Result<(), LinkError> {
        let table = match direction {
            Direction::ToTerminal => &mut self.to_terminal,
            Direction::ToServer => &mut self.to_server,
        };

        if let Some(existing) = table.get(&opcode) {
            return Err(LinkError::SchemaError(format!(
                "opcode {opcode} registered twice ({} and {name})",
                existing.name
            )));
        }
        if table.values().any(|schema| schema.name == name) {
            return Err(LinkError::SchemaError(format!(
                "name {name} registered twice"
            )));
        }

        table.insert(
            opcode,
            Schema {
                opcode,
                name,
                fields,
            },
        );
        Ok(())
    }

    pub fn schema(&self, direction: Direction, opcode: u8) -> Option<&Schema> {
        self.table(direction).get(&opcode)
    }

    /// Number of schemas registered for `direction`
    pub fn len(&self, direction: Direction) -> usize {
        self.table(direction).len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_terminal.is_empty() && self.to_server.is_empty()
    }

    /// Pull the next command travelling in `direction` off `queue`.
    ///
    /// A command is only decoded once all of its bytes are buffered.
    pub fn next(&self, direction: Direction, queue: &mut ByteQueue) -> Result<Next, LinkError> {
        let Some(opcode) = queue.peek_u8() else {
            return Ok(Next::Empty);
        };

        let Some(schema) = self.schema(direction, opcode) else {
            queue.skip(1);
            return Ok(Next::Unknown(opcode));
        };

        if schema.frame_len(queue).is_none() {
            debug!(
                "{} incomplete: {} bytes buffered",
                schema.name,
                queue.remaining()
            );
            return Ok(Next::Incomplete);
        }

        schema.decode(queue).map(Next::Command)
    }

    /// Encode `command` into `queue` using the schema for `direction`
    pub fn encode(
        &self,
        direction: Direction,
        command: &Command,
        queue: &mut ByteQueue,
    ) -> Result<(), LinkError> {
        let schema = self
            .schema(direction, command.opcode)
            .ok_or(LinkError::UnknownOpcode(command.opcode))?;
        schema.encode(command, queue)
    }
}
