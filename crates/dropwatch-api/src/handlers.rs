//! Handlers for the control endpoints.

use axum::{Json, extract::State, http::StatusCode};
use dropwatch_core::control::{PollControl, SchedulerStatus};
use serde_json::{Value, json};

use crate::{ControlState, auth::Authenticated};

/// `GET /status`
pub async fn status<C: PollControl>(
  _: Authenticated,
  State(state): State<ControlState<C>>,
) -> Json<SchedulerStatus> {
  Json(state.control.status())
}

/// `POST /start`
pub async fn start<C: PollControl>(
  _: Authenticated,
  State(state): State<ControlState<C>>,
) -> (StatusCode, Json<Value>) {
  tracing::info!("remote start requested");
  state.control.start();
  (StatusCode::ACCEPTED, Json(json!({ "running": true })))
}

/// `POST /stop`
pub async fn stop<C: PollControl>(
  _: Authenticated,
  State(state): State<ControlState<C>>,
) -> (StatusCode, Json<Value>) {
  tracing::info!("remote stop requested");
  state.control.stop();
  (StatusCode::ACCEPTED, Json(json!({ "running": false })))
}

/// `POST /cycle`
pub async fn cycle<C: PollControl>(
  _: Authenticated,
  State(state): State<ControlState<C>>,
) -> (StatusCode, Json<Value>) {
  tracing::info!("remote cycle requested");
  state.control.trigger();
  (StatusCode::ACCEPTED, Json(json!({ "triggered": true })))
}
