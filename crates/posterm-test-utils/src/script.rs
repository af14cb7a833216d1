use posterm_link::{ByteQueue, Command, Direction, Registry, ServerOp};

/// Builds the byte stream a server would send, one command at a time.
///
/// Commands are checked against the standard registry as they are added, so
/// a script that drifts from the protocol tables fails at the call site.
#[derive(Debug)]
pub struct ServerScript {
    registry: Registry,
    queue: ByteQueue,
}

impl Default for ServerScript {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerScript {
    pub fn new() -> Self {
        Self {
            registry: Registry::standard().expect("standard registry"),
            queue: ByteQueue::new(),
        }
    }

    /// Append any command
    pub fn command(mut self, command: Command) -> Self {
        self.registry
            .encode(Direction::ToTerminal, &command, &mut self.queue)
            .expect("command matches its schema");
        self
    }

    /// Append raw bytes, bypassing the registry
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.queue.extend(bytes);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.queue.as_slice().to_vec()
    }

    pub fn into_queue(self) -> ByteQueue {
        self.queue
    }

    pub fn new_layer(self, id: u16, x: u16, y: u16, w: u16, h: u16) -> Self {
        self.new_titled_layer(id, x, y, w, h, 0, "")
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_titled_layer(
        self,
        id: u16,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        flags: u8,
        title: &str,
    ) -> Self {
        self.command(
            Command::build(ServerOp::NewLayer)
                .u16(id)
                .u16(x)
                .u16(y)
                .u16(w)
                .u16(h)
                .u8(flags)
                .str(title)
                .finish(),
        )
    }

    fn with_id(self, op: ServerOp, id: u16) -> Self {
        self.command(Command::build(op).u16(id).finish())
    }

    pub fn show_layer(self, id: u16) -> Self {
        self.with_id(ServerOp::ShowLayer, id)
    }

    pub fn kill_layer(self, id: u16) -> Self {
        self.with_id(ServerOp::KillLayer, id)
    }

    pub fn target_layer(self, id: u16) -> Self {
        self.with_id(ServerOp::TargetLayer, id)
    }

    pub fn current_layer(self, id: u16) -> Self {
        self.with_id(ServerOp::CurrentLayer, id)
    }

    pub fn text_left(self, x: u16, y: u16, text: &str) -> Self {
        self.command(
            Command::build(ServerOp::TextLeft)
                .u16(x)
                .u16(y)
                .u8(0)
                .u8(1)
                .u16(0)
                .str(text)
                .finish(),
        )
    }

    pub fn solid_rectangle(self, x: u16, y: u16, w: u16, h: u16, color: u8) -> Self {
        self.command(
            Command::build(ServerOp::SolidRectangle)
                .u16(x)
                .u16(y)
                .u16(w)
                .u16(h)
                .u8(color)
                .finish(),
        )
    }

    pub fn blank_page(self, texture: u8) -> Self {
        self.command(Command::build(ServerOp::BlankPage).u8(texture).finish())
    }

    pub fn set_clip(self, x: u16, y: u16, w: u16, h: u16) -> Self {
        self.command(
            Command::build(ServerOp::SetClip)
                .u16(x)
                .u16(y)
                .u16(w)
                .u16(h)
                .finish(),
        )
    }

    pub fn update_all(self, select_all: bool) -> Self {
        self.command(
            Command::build(ServerOp::UpdateAll)
                .u8(u8::from(select_all))
                .finish(),
        )
    }

    pub fn update_area(self, x: u16, y: u16, w: u16, h: u16) -> Self {
        self.command(
            Command::build(ServerOp::UpdateArea)
                .u16(x)
                .u16(y)
                .u16(w)
                .u16(h)
                .finish(),
        )
    }

    pub fn push_button(self, id: u16, x: u16, y: u16, w: u16, h: u16, label: &str) -> Self {
        self.command(
            Command::build(ServerOp::PushButton)
                .u16(id)
                .u16(x)
                .u16(y)
                .u16(w)
                .u16(h)
                .u8(0)
                .u8(2)
                .str(label)
                .finish(),
        )
    }

    pub fn translations(self, pairs: &[(&str, &str)]) -> Self {
        self.command(
            Command::build(ServerOp::Translations)
                .str_pairs(pairs.iter().copied())
                .finish(),
        )
    }

    pub fn set_message(self, text: &str) -> Self {
        self.command(Command::build(ServerOp::SetMessage).str(text).finish())
    }

    pub fn blank_time(self, seconds: u16) -> Self {
        self.command(Command::build(ServerOp::BlankTime).u16(seconds).finish())
    }

    pub fn screensaver_images(self, images: &[&str]) -> Self {
        self.command(
            Command::build(ServerOp::ScreensaverImages)
                .str_list(images.iter().copied())
                .finish(),
        )
    }

    pub fn bell(self, volume: u8) -> Self {
        self.command(Command::build(ServerOp::Bell).u8(volume).finish())
    }

    pub fn calibrate(self) -> Self {
        self.command(Command::build(ServerOp::Calibrate).finish())
    }

    pub fn shutdown(self) -> Self {
        self.command(Command::build(ServerOp::Shutdown).finish())
    }

    /// Card request with the given opcode
    pub fn card(self, op: ServerOp, txn: u64, amount: f64, card: &str) -> Self {
        self.command(
            Command::build(op)
                .u64(txn)
                .fixed(amount)
                .fixed(0.0)
                .str(card)
                .str("12/30")
                .str("TEST HOLDER")
                .str("")
                .finish(),
        )
    }
}
