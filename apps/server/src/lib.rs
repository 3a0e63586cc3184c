//! HTTP API over the tubescope core: transcript retrieval and cached
//! transcript analysis.

pub mod error;
pub mod listener;
pub mod rate_limit;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use error::ApiError;
pub use listener::bind_with_fallback;
pub use routes::router;
pub use shutdown::{PanicSignal, ShutdownReason, shutdown_signal};
pub use state::AppState;
