//! Expo push notification dispatcher.
//!
//! `POST <expo>/--/api/v2/push/send` with one message per call.

use dropwatch_core::{notify::NotificationPayload, source::Notifier};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result, client::join_url};

/// Sends push notifications through the Expo push service.
#[derive(Clone)]
pub struct ExpoPushClient {
  client:       Client,
  base_url:     String,
  access_token: Option<String>,
}

impl ExpoPushClient {
  pub fn new(
    client: Client,
    base_url: impl Into<String>,
    access_token: Option<String>,
  ) -> Self {
    Self { client, base_url: base_url.into(), access_token }
  }

  async fn send(&self, message: &PushMessage<'_>) -> Result<()> {
    let url = join_url(&self.base_url, "--/api/v2/push/send");
    let mut req = self.client.post(&url).json(message);
    if let Some(token) = &self.access_token {
      req = req.bearer_auth(token);
    }
    let resp = req.send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { url, status });
    }
    let body = resp.bytes().await?;
    check_ticket(&body)
  }
}

impl Notifier for ExpoPushClient {
  type Error = Error;

  async fn notify(
    &self,
    target: &str,
    payload: &NotificationPayload,
  ) -> Result<()> {
    let message = PushMessage {
      to:    target,
      title: &payload.title,
      body:  &payload.body,
      data:  &payload.data,
      sound: "default",
    };
    let result = self.send(&message).await;
    if let Err(e) = &result {
      tracing::warn!(recipient = %target, error = %e, "push delivery failed");
    }
    result
  }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

/// One Expo push message.
#[derive(Debug, Serialize)]
pub struct PushMessage<'a> {
  pub to:    &'a str,
  pub title: &'a str,
  pub body:  &'a str,
  pub data:  &'a Map<String, Value>,
  pub sound: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
  data:   Option<RawTicket>,
  #[serde(default)]
  errors: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawTicket {
  status:  String,
  message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawError {
  message: String,
}

/// Check an Expo push response body for a rejected ticket or request error.
pub fn check_ticket(body: &[u8]) -> Result<()> {
  let raw: RawResponse = serde_json::from_slice(body)?;
  if let Some(err) = raw.errors.first() {
    return Err(Error::Rejected(err.message.clone()));
  }
  match raw.data {
    Some(ticket) if ticket.status == "ok" => Ok(()),
    Some(ticket) => Err(Error::Rejected(
      ticket.message.unwrap_or_else(|| ticket.status.clone()),
    )),
    None => Err(Error::Rejected("response carried no ticket".into())),
  }
}
