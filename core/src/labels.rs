// antrian/core/src/labels.rs

//! Display labels keyed by (delivery type, status).

use crate::model::{DeliveryType, OrderStatus};

const LABELS: &[(DeliveryType, OrderStatus, &str)] = &[
  (DeliveryType::Pickup, OrderStatus::Pending, "Waiting for payment"),
  (DeliveryType::Pickup, OrderStatus::Paid, "Paid, waiting for the kiosk"),
  (DeliveryType::Pickup, OrderStatus::Processing, "Being prepared"),
  (DeliveryType::Pickup, OrderStatus::Ready, "Ready for pickup"),
  (DeliveryType::Pickup, OrderStatus::Delivering, "On its way"),
  (DeliveryType::Pickup, OrderStatus::Done, "Picked up"),
  (DeliveryType::Pickup, OrderStatus::Failed, "Cancelled"),
  (DeliveryType::Delivery, OrderStatus::Pending, "Waiting for payment"),
  (DeliveryType::Delivery, OrderStatus::Paid, "Paid, waiting for the kiosk"),
  (DeliveryType::Delivery, OrderStatus::Processing, "Being prepared"),
  (DeliveryType::Delivery, OrderStatus::Ready, "Packed, waiting for a courier"),
  (DeliveryType::Delivery, OrderStatus::Delivering, "Out for delivery"),
  (DeliveryType::Delivery, OrderStatus::Done, "Delivered"),
  (DeliveryType::Delivery, OrderStatus::Failed, "Cancelled"),
];

pub fn status_label(delivery_type: DeliveryType, status: OrderStatus) -> &'static str {
  LABELS
    .iter()
    .find(|(d, s, _)| *d == delivery_type && *s == status)
    .map(|(_, _, label)| *label)
    .unwrap_or_else(|| status.as_str())
}
