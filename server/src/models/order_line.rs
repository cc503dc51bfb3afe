// antrian/server/src/models/order_line.rs

use antrian::OrderLine;
use sqlx::FromRow;

pub const ORDER_LINE_COLUMNS: &str = "id, order_id, menu_item_id, name, price, estimated_minutes, quantity, subtotal";

#[derive(Debug, Clone, FromRow)]
pub struct OrderLineRow {
  pub id: i64,
  pub order_id: i64,
  pub menu_item_id: i64,
  pub name: String,
  pub price: i64,
  pub estimated_minutes: i32,
  pub quantity: i32,
  pub subtotal: i64,
}

impl From<OrderLineRow> for OrderLine {
  fn from(row: OrderLineRow) -> Self {
    OrderLine {
      id: row.id,
      order_id: row.order_id,
      menu_item_id: row.menu_item_id,
      name: row.name,
      price: row.price,
      estimated_minutes: row.estimated_minutes,
      quantity: row.quantity,
      subtotal: row.subtotal,
    }
  }
}
