//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first, see `main.rs`)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Current-user refresh (drops deleted accounts, reloads permissions)
//! 5. Security headers
//!
//! Authentication is enforced per handler by the extractors in [`auth`].

pub mod auth;
pub mod flash;
pub mod refresh;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalUser, PermissionMarker, RequirePermission, RequireUser, clear_current_user, perm,
    set_current_user,
};
pub use flash::{FlashLevel, FlashMessage};
pub use refresh::refresh_current_user;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
