// antrian/server/src/models/cart_item.rs

use antrian::CartLine;
use sqlx::FromRow;

/// A cart row joined with the menu item it points at.
#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
  pub menu_item_id: i64,
  pub name: String,
  pub price: i64,
  pub estimated_minutes: i32,
  pub quantity: i32,
  pub kiosk_id: i64,
}

impl From<CartItemRow> for CartLine {
  fn from(row: CartItemRow) -> Self {
    CartLine {
      menu_item_id: row.menu_item_id,
      name: row.name,
      price: row.price,
      estimated_minutes: row.estimated_minutes,
      quantity: row.quantity,
      kiosk_id: row.kiosk_id,
    }
  }
}
