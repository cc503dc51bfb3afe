// antrian/server/src/models/order.rs

use antrian::{DeliveryType, Order, OrderStatus, QueueError};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const ORDER_COLUMNS: &str = "id, kiosk_id, buyer_id, status, total_price, total_estimated_minutes, \
   delivery_type, delivery_address, created_at, paid_at, processing_started_at, estimated_start_at, \
   estimated_finish_at";

/// `orders` as stored. Status and delivery type are TEXT columns.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: i64,
  pub kiosk_id: i64,
  pub buyer_id: String,
  pub status: String,
  pub total_price: i64,
  pub total_estimated_minutes: i32,
  pub delivery_type: String,
  pub delivery_address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub paid_at: Option<DateTime<Utc>>,
  pub processing_started_at: Option<DateTime<Utc>>,
  pub estimated_start_at: Option<DateTime<Utc>>,
  pub estimated_finish_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
  type Error = QueueError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    // The CHECK constraints make these unreachable unless the schema drifts.
    let status: OrderStatus = row
      .status
      .parse()
      .map_err(|_| QueueError::Internal(format!("order {} has unknown status '{}'", row.id, row.status)))?;
    let delivery_type: DeliveryType = row.delivery_type.parse().map_err(|_| {
      QueueError::Internal(format!(
        "order {} has unknown delivery type '{}'",
        row.id, row.delivery_type
      ))
    })?;

    Ok(Order {
      id: row.id,
      kiosk_id: row.kiosk_id,
      buyer_id: row.buyer_id,
      status,
      total_price: row.total_price,
      total_estimated_minutes: row.total_estimated_minutes,
      delivery_type,
      delivery_address: row.delivery_address,
      created_at: row.created_at,
      paid_at: row.paid_at,
      processing_started_at: row.processing_started_at,
      estimated_start_at: row.estimated_start_at,
      estimated_finish_at: row.estimated_finish_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn row(status: &str, delivery_type: &str) -> OrderRow {
    OrderRow {
      id: 3,
      kiosk_id: 1,
      buyer_id: "guest-3".to_string(),
      status: status.to_string(),
      total_price: 30_000,
      total_estimated_minutes: 12,
      delivery_type: delivery_type.to_string(),
      delivery_address: Some("Gedung A".to_string()),
      created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
      paid_at: None,
      processing_started_at: None,
      estimated_start_at: None,
      estimated_finish_at: None,
    }
  }

  #[test]
  fn text_columns_parse_into_enums() {
    let order = Order::try_from(row("delivering", "delivery")).unwrap();
    assert_eq!(order.status, OrderStatus::Delivering);
    assert_eq!(order.delivery_type, DeliveryType::Delivery);
  }

  #[test]
  fn unknown_text_values_are_internal_errors() {
    assert!(matches!(Order::try_from(row("cooking", "pickup")), Err(QueueError::Internal(_))));
    assert!(matches!(Order::try_from(row("paid", "drone")), Err(QueueError::Internal(_))));
  }
}
