//! Remote-control HTTP surface for a running dropwatch scheduler.
//!
//! Exposes an axum [`Router`] over any [`PollControl`] implementation. Every
//! route requires HTTP Basic auth.
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | `GET`  | `/status` | Current [`SchedulerStatus`](dropwatch_core::control::SchedulerStatus) |
//! | `POST` | `/start`  | Resume ticking |
//! | `POST` | `/stop`   | Pause ticking |
//! | `POST` | `/cycle`  | Run one cycle as soon as possible |

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use dropwatch_core::control::PollControl;
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ControlState<C> {
  pub control: Arc<C>,
  pub auth:    Arc<AuthConfig>,
}

impl<C> Clone for ControlState<C> {
  fn clone(&self) -> Self {
    Self { control: Arc::clone(&self.control), auth: Arc::clone(&self.auth) }
  }
}

/// Build the control router for `state`.
pub fn control_router<C>(state: ControlState<C>) -> Router<()>
where
  C: PollControl + 'static,
{
  Router::new()
    .route("/status", get(handlers::status::<C>))
    .route("/start", post(handlers::start::<C>))
    .route("/stop", post(handlers::stop::<C>))
    .route("/cycle", post(handlers::cycle::<C>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
