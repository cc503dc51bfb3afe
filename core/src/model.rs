// antrian/core/src/model.rs

//! Order ledger records and the values they are built from.

use crate::error::QueueError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type OrderId = i64;
pub type KioskId = i64;
pub type OperatorId = i64;
pub type MenuItemId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Processing,
  Ready,
  Delivering,
  Done,
  Failed,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 7] = [
    OrderStatus::Pending,
    OrderStatus::Paid,
    OrderStatus::Processing,
    OrderStatus::Ready,
    OrderStatus::Delivering,
    OrderStatus::Done,
    OrderStatus::Failed,
  ];

  /// Statuses that hold a committed slot.
  pub const ADMITTED: [OrderStatus; 3] = [OrderStatus::Processing, OrderStatus::Ready, OrderStatus::Delivering];

  /// Statuses that occupy the kiosk queue: paid and waiting, or admitted.
  pub const ACTIVE: [OrderStatus; 4] = [
    OrderStatus::Paid,
    OrderStatus::Processing,
    OrderStatus::Ready,
    OrderStatus::Delivering,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Processing => "processing",
      OrderStatus::Ready => "ready",
      OrderStatus::Delivering => "delivering",
      OrderStatus::Done => "done",
      OrderStatus::Failed => "failed",
    }
  }

  pub fn is_admitted(&self) -> bool {
    Self::ADMITTED.contains(self)
  }

  pub fn is_active(&self) -> bool {
    Self::ACTIVE.contains(self)
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Done | OrderStatus::Failed)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = QueueError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| QueueError::Validation(format!("Unknown order status '{}'.", s)))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
  Pickup,
  Delivery,
}

impl DeliveryType {
  pub fn as_str(&self) -> &'static str {
    match self {
      DeliveryType::Pickup => "pickup",
      DeliveryType::Delivery => "delivery",
    }
  }
}

impl fmt::Display for DeliveryType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DeliveryType {
  type Err = QueueError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pickup" => Ok(DeliveryType::Pickup),
      "delivery" => Ok(DeliveryType::Delivery),
      other => Err(QueueError::Validation(format!("Unknown delivery type '{}'.", other))),
    }
  }
}

/// A committed `[start, finish)` interval in a kiosk's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
  pub start: DateTime<Utc>,
  pub finish: DateTime<Utc>,
}

impl Slot {
  /// Half-open overlap: slots that only touch (`a.finish == b.start`) do not overlap.
  /// Zero-length slots never overlap anything.
  pub fn overlaps(&self, other: &Slot) -> bool {
    self.start < other.finish && other.start < self.finish
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
  pub id: OrderId,
  pub kiosk_id: KioskId,
  pub buyer_id: String,
  pub status: OrderStatus,
  pub total_price: i64,
  pub total_estimated_minutes: i32,
  pub delivery_type: DeliveryType,
  pub delivery_address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub paid_at: Option<DateTime<Utc>>,
  pub processing_started_at: Option<DateTime<Utc>>,
  pub estimated_start_at: Option<DateTime<Utc>>,
  pub estimated_finish_at: Option<DateTime<Utc>>,
}

impl Order {
  /// Processing start if admitted, else payment time, else creation time.
  pub fn anchor_time(&self) -> DateTime<Utc> {
    self
      .processing_started_at
      .or(self.paid_at)
      .unwrap_or(self.created_at)
  }

  /// Total order of orders within a kiosk: anchor ascending, then id ascending.
  pub fn queue_key(&self) -> (DateTime<Utc>, OrderId) {
    (self.anchor_time(), self.id)
  }

  pub fn slot(&self) -> Option<Slot> {
    match (self.estimated_start_at, self.estimated_finish_at) {
      (Some(start), Some(finish)) => Some(Slot { start, finish }),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
  pub id: i64,
  pub order_id: OrderId,
  pub menu_item_id: MenuItemId,
  pub name: String,
  pub price: i64,
  pub estimated_minutes: i32,
  pub quantity: i32,
  pub subtotal: i64,
}

/// One row of a buyer's cart as read from the cart service, already joined
/// with the catalog item it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub menu_item_id: MenuItemId,
  pub name: String,
  pub price: i64,
  pub estimated_minutes: i32,
  pub quantity: i32,
  pub kiosk_id: KioskId,
}
