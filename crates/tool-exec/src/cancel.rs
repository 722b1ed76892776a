//! Operator cancellation shared between the Ctrl+C handler and the process
//! waiter.

use std::sync::{
    Arc, Once,
    atomic::{AtomicBool, Ordering},
};

use tracing::warn;

/// Cloneable flag flipped once the operator asks the run to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Route Ctrl+C into this token.
    ///
    /// `ctrlc` accepts a single handler per process, so only the first call
    /// installs anything; later calls are ignored.
    pub fn install_ctrlc_handler(&self) {
        static CTRL_HANDLER: Once = Once::new();

        let handler_token = self.clone();
        CTRL_HANDLER.call_once(move || {
            if let Err(err) = ctrlc::set_handler(move || {
                handler_token.cancel();
            }) {
                warn!("Failed to install Ctrl+C handler: {err}");
            }
        });
    }
}
