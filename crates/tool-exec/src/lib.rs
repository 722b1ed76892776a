//! Blocking execution of external command-line tools.
//!
//! Tools run one at a time with inherited stdio; the caller observes them only
//! through their exit status. A [`CancelToken`] wired to Ctrl+C lets the
//! waiter kill the running tool and report the interruption.

pub mod cancel;
pub mod discover;
pub mod process;
pub mod types;

pub use cancel::CancelToken;
pub use discover::{find_executable, find_in, search_dirs};
pub use process::{DEFAULT_POLL_INTERVAL, SystemRunner, ToolRunner};
pub use types::{ExecError, Invocation, ToolExit};
