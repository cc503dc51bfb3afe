// antrian/core/src/notify.rs

//! Notifier Gateway: best-effort, at-most-once announcements of order events
//! over an injected messaging channel.

use crate::ledger::OrderLedger;
use crate::model::{KioskId, OrderId};
use anyhow::Context as _;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{event, instrument, Level};

/// Who a message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Recipient {
  Kiosk(KioskId),
  Buyer(String),
}

impl fmt::Display for Recipient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Recipient::Kiosk(id) => write!(f, "kiosk:{}", id),
      Recipient::Buyer(id) => write!(f, "buyer:{}", id),
    }
  }
}

/// An outbound messaging channel with an explicit connection lifecycle.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn connect(&self) -> anyhow::Result<()>;

  fn is_connected(&self) -> bool;

  async fn send(&self, recipient: &Recipient, message: &str) -> anyhow::Result<()>;
}

/// Dedup key: each order is announced at most once per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  OrderCreated,
  OrderCompleted,
}

impl EventKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      EventKind::OrderCreated => "order_created",
      EventKind::OrderCompleted => "order_completed",
    }
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
  Created {
    order_id: OrderId,
    kiosk_id: KioskId,
    item_count: i64,
    total_price: i64,
  },
  Completed {
    order_id: OrderId,
    buyer_id: String,
  },
}

impl OrderEvent {
  pub fn order_id(&self) -> OrderId {
    match self {
      OrderEvent::Created { order_id, .. } | OrderEvent::Completed { order_id, .. } => *order_id,
    }
  }

  pub fn kind(&self) -> EventKind {
    match self {
      OrderEvent::Created { .. } => EventKind::OrderCreated,
      OrderEvent::Completed { .. } => EventKind::OrderCompleted,
    }
  }

  pub fn recipient(&self) -> Recipient {
    match self {
      OrderEvent::Created { kiosk_id, .. } => Recipient::Kiosk(*kiosk_id),
      OrderEvent::Completed { buyer_id, .. } => Recipient::Buyer(buyer_id.clone()),
    }
  }

  pub fn message(&self) -> String {
    match self {
      OrderEvent::Created {
        order_id,
        item_count,
        total_price,
        ..
      } => format!("New order #{} ({} items, total {})", order_id, item_count, total_price),
      OrderEvent::Completed { order_id, .. } => format!("Order #{} is complete", order_id),
    }
  }
}

/// Bounds on how hard the gateway tries before dropping an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyPolicy {
  /// Upper bound on one connect or send.
  pub timeout: Duration,
  pub max_reconnects: u32,
  /// Waited `reconnect_backoff * n` before the n-th reconnect.
  pub reconnect_backoff: Duration,
}

impl Default for NotifyPolicy {
  fn default() -> Self {
    Self {
      timeout: Duration::from_millis(3000),
      max_reconnects: 3,
      reconnect_backoff: Duration::from_millis(200),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
  Sent,
  /// The event was already claimed for this order.
  Duplicate,
  /// Delivery failed and was given up on.
  Dropped,
}

pub struct NotifierGateway {
  notifier: Arc<dyn Notifier>,
  ledger: Arc<dyn OrderLedger>,
  policy: NotifyPolicy,
  in_flight: Mutex<Vec<JoinHandle<DispatchOutcome>>>,
}

impl NotifierGateway {
  pub fn new(notifier: Arc<dyn Notifier>, ledger: Arc<dyn OrderLedger>, policy: NotifyPolicy) -> Self {
    Self {
      notifier,
      ledger,
      policy,
      in_flight: Mutex::new(Vec::new()),
    }
  }

  pub fn policy(&self) -> NotifyPolicy {
    self.policy
  }

  /// Fire-and-forget: dispatches `order_event` on a background task and
  /// returns at once. Must be called from within a tokio runtime.
  pub fn publish(self: &Arc<Self>, order_event: OrderEvent) {
    let gateway = Arc::clone(self);
    let handle = tokio::spawn(async move { gateway.dispatch(&order_event).await });

    let mut in_flight = self.in_flight.lock();
    in_flight.retain(|h| !h.is_finished());
    in_flight.push(handle);
  }

  /// Waits until every published event has been sent, deduplicated or
  /// dropped. Used on shutdown so queued announcements are not cut off.
  pub async fn flush(&self) {
    let handles = std::mem::take(&mut *self.in_flight.lock());
    for handle in handles {
      if let Err(e) = handle.await {
        event!(Level::WARN, error = %e, "Notification task did not finish.");
      }
    }
  }

  /// Claims the event's dedup marker, then delivers it. Never fails: every
  /// problem is logged and reported as `Dropped`.
  ///
  /// The marker is claimed before sending, so a crash between claim and send
  /// loses the message rather than repeating it.
  #[instrument(skip(self, order_event), fields(order_id = order_event.order_id(), kind = %order_event.kind()))]
  pub async fn dispatch(&self, order_event: &OrderEvent) -> DispatchOutcome {
    match self
      .ledger
      .claim_notification(order_event.order_id(), order_event.kind())
      .await
    {
      Ok(true) => {}
      Ok(false) => {
        event!(Level::DEBUG, "Event already announced, skipping.");
        return DispatchOutcome::Duplicate;
      }
      Err(e) => {
        event!(Level::WARN, error = %e, "Could not claim notification marker; dropping event.");
        return DispatchOutcome::Dropped;
      }
    }

    let recipient = order_event.recipient();
    let message = order_event.message();
    match self.deliver(&recipient, &message).await {
      Ok(()) => {
        event!(Level::INFO, %recipient, "Notification sent.");
        DispatchOutcome::Sent
      }
      Err(e) => {
        event!(Level::WARN, %recipient, error = %format!("{:#}", e), "Notification dropped.");
        DispatchOutcome::Dropped
      }
    }
  }

  async fn deliver(&self, recipient: &Recipient, message: &str) -> anyhow::Result<()> {
    let mut last_error = match self.attempt(recipient, message, false).await {
      Ok(()) => return Ok(()),
      Err(e) => e,
    };

    for reconnect in 1..=self.policy.max_reconnects {
      event!(Level::DEBUG, reconnect, error = %last_error, "Send failed, reconnecting.");
      tokio::time::sleep(self.policy.reconnect_backoff * reconnect).await;
      match self.attempt(recipient, message, true).await {
        Ok(()) => return Ok(()),
        Err(e) => last_error = e,
      }
    }
    Err(last_error.context(format!("gave up after {} reconnects", self.policy.max_reconnects)))
  }

  async fn attempt(&self, recipient: &Recipient, message: &str, reconnect: bool) -> anyhow::Result<()> {
    if reconnect || !self.notifier.is_connected() {
      tokio::time::timeout(self.policy.timeout, self.notifier.connect())
        .await
        .context("connect timed out")??;
    }
    tokio::time::timeout(self.policy.timeout, self.notifier.send(recipient, message))
      .await
      .context("send timed out")??;
    Ok(())
  }
}
