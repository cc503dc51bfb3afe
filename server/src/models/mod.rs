// antrian/server/src/models/mod.rs

//! Row shapes of the PostgreSQL tables and their conversion into the core
//! model.

pub mod cart_item;
pub mod order;
pub mod order_line;

pub use cart_item::CartItemRow;
pub use order::{OrderRow, ORDER_COLUMNS};
pub use order_line::{OrderLineRow, ORDER_LINE_COLUMNS};
