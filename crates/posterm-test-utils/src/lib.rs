pub mod backend;
pub mod fixtures;
pub mod network;
pub mod script;

pub use backend::{DrawCall, RecordingBackend};
pub use fixtures::TestFixtures;
pub use network::{MemoryPeer, MemoryTransport};
pub use script::ServerScript;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(
                        "posterm=debug,posterm_link=debug,posterm_layer=debug,posterm_interp=debug",
                    )),
            )
            .with_test_writer()
            .init();
    });
}
