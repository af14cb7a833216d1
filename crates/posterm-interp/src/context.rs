//! Terminal state the interpreter mutates

use crate::settings::{Settings, Translations};
use posterm_layer::{Layer, LayerKey, LayerStack, Region};

/// Where drawing and new objects land.
///
/// Both are plain keys. Destroying a layer does not repoint them; a key
/// whose layer is gone simply resolves to nothing until the server names a
/// new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// Layer receiving drawing commands
    pub current: Option<LayerKey>,
    /// Layer receiving new layer objects
    pub target: Option<LayerKey>,
}

/// Everything the server's commands act on
#[derive(Debug)]
pub struct Terminal {
    pub stack: LayerStack,
    pub ctx: RenderContext,
    pub translations: Translations,
    pub settings: Settings,
    /// Waiting for the calibration touch
    pub calibrating: bool,
    /// Screen area whose repaint was held back during calibration
    pub deferred_repair: Option<Region>,
}

impl Terminal {
    pub fn new(stack: LayerStack) -> Self {
        Self {
            stack,
            ctx: RenderContext::default(),
            translations: Translations::new(),
            settings: Settings::default(),
            calibrating: false,
            deferred_repair: None,
        }
    }

    /// Hold back a repaint of `area` until calibration ends
    pub fn defer_repair(&mut self, area: Region) {
        self.deferred_repair = Some(match self.deferred_repair {
            Some(pending) => pending.union(&area),
            None => area,
        });
    }

    /// The current layer, if it still exists
    pub fn current_mut(&mut self) -> Option<&mut Layer> {
        let key = self.ctx.current?;
        self.stack.get_mut(key)
    }

    /// The target layer, if it still exists
    pub fn target_mut(&mut self) -> Option<&mut Layer> {
        let key = self.ctx.target?;
        self.stack.get_mut(key)
    }
}
