// antrian/core/src/checkout.rs

//! Checkout Transactor: turns a cart snapshot into an order draft. The
//! ledger commits the draft, its lines and the cart clear as one unit.

use crate::error::{QueueError, Result};
use crate::model::{CartLine, DeliveryType, KioskId, MenuItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery details supplied by the buyer at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
  pub delivery_type: DeliveryType,
  #[serde(default)]
  pub delivery_address: Option<String>,
}

impl DeliveryInfo {
  pub fn pickup() -> Self {
    Self {
      delivery_type: DeliveryType::Pickup,
      delivery_address: None,
    }
  }

  pub fn delivery(address: impl Into<String>) -> Self {
    Self {
      delivery_type: DeliveryType::Delivery,
      delivery_address: Some(address.into()),
    }
  }
}

/// A line snapshot captured from the catalog at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
  pub menu_item_id: MenuItemId,
  pub name: String,
  pub price: i64,
  pub estimated_minutes: i32,
  pub quantity: i32,
  pub subtotal: i64,
}

/// Everything the ledger needs to insert a pending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
  pub kiosk_id: KioskId,
  pub buyer_id: String,
  pub total_price: i64,
  pub total_estimated_minutes: i32,
  pub delivery_type: DeliveryType,
  pub delivery_address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub lines: Vec<DraftLine>,
}

fn overflow() -> QueueError {
  QueueError::Validation("Order totals are out of range.".to_string())
}

/// Validates the checkout input and computes totals.
///
/// Fails with `Validation` when the buyer id is blank, the cart is empty,
/// a delivery order has no address, a line has a non-positive quantity or a
/// negative price or estimate, or the cart spans more than one kiosk.
pub fn draft_order(buyer_id: &str, delivery: &DeliveryInfo, cart: &[CartLine], now: DateTime<Utc>) -> Result<OrderDraft> {
  if buyer_id.trim().is_empty() {
    return Err(QueueError::Validation("Buyer id is required.".to_string()));
  }

  let delivery_address = match delivery.delivery_type {
    DeliveryType::Delivery => {
      let address = delivery
        .delivery_address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| QueueError::Validation("Delivery address is required for delivery orders.".to_string()))?;
      Some(address.to_string())
    }
    DeliveryType::Pickup => None,
  };

  let Some(first) = cart.first() else {
    return Err(QueueError::Validation("Cart is empty.".to_string()));
  };
  let kiosk_id = first.kiosk_id;
  if let Some(stray) = cart.iter().find(|line| line.kiosk_id != kiosk_id) {
    return Err(QueueError::Validation(format!(
      "Cart mixes items from kiosks {} and {}.",
      kiosk_id, stray.kiosk_id
    )));
  }

  let mut total_price: i64 = 0;
  let mut total_minutes: i32 = 0;
  let mut lines = Vec::with_capacity(cart.len());
  for item in cart {
    if item.quantity <= 0 {
      return Err(QueueError::Validation(format!(
        "Quantity for '{}' must be positive.",
        item.name
      )));
    }
    if item.price < 0 || item.estimated_minutes < 0 {
      return Err(QueueError::Validation(format!(
        "Menu item '{}' has a negative price or estimate.",
        item.name
      )));
    }

    let subtotal = item.price.checked_mul(i64::from(item.quantity)).ok_or_else(overflow)?;
    let minutes = item.estimated_minutes.checked_mul(item.quantity).ok_or_else(overflow)?;
    total_price = total_price.checked_add(subtotal).ok_or_else(overflow)?;
    total_minutes = total_minutes.checked_add(minutes).ok_or_else(overflow)?;

    lines.push(DraftLine {
      menu_item_id: item.menu_item_id,
      name: item.name.clone(),
      price: item.price,
      estimated_minutes: item.estimated_minutes,
      quantity: item.quantity,
      subtotal,
    });
  }

  Ok(OrderDraft {
    kiosk_id,
    buyer_id: buyer_id.to_string(),
    total_price,
    total_estimated_minutes: total_minutes,
    delivery_type: delivery.delivery_type,
    delivery_address,
    created_at: now,
    lines,
  })
}
