// antrian/core/examples/kiosk_rush.rs

//! A lunch rush at one kiosk, driven against the in-process ledger:
//! three buyers check out and pay, the operator admits them out of order,
//! and everyone watches their ETA.

use antrian::{
  CartLine, DeliveryInfo, Eta, ManualClock, MemoryLedger, Notifier, OrderStatus, PaymentOutcome, QueueError,
  QueueService, QueueSettings, Recipient,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

/// Prints messages instead of delivering them.
struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
  async fn connect(&self) -> anyhow::Result<()> {
    Ok(())
  }

  fn is_connected(&self) -> bool {
    true
  }

  async fn send(&self, recipient: &Recipient, message: &str) -> anyhow::Result<()> {
    println!("  [channel -> {}] {}", recipient, message);
    Ok(())
  }
}

const KIOSK: i64 = 7;
const OPERATOR: i64 = 70;

fn menu(menu_item_id: i64, name: &str, price: i64, minutes: i32, quantity: i32) -> CartLine {
  CartLine {
    menu_item_id,
    name: name.to_string(),
    price,
    estimated_minutes: minutes,
    quantity,
    kiosk_id: KIOSK,
  }
}

async fn show(service: &QueueService, order_id: i64, buyer: &str) -> Result<(), QueueError> {
  let view = service.get_buyer_order_status(order_id, buyer).await?;
  let eta = match view.eta {
    Eta::Position { queue_position } => format!("position #{}", queue_position),
    Eta::Countdown { remaining_seconds, .. } => format!("ready in {}s", remaining_seconds),
    Eta::None => "-".to_string(),
  };
  println!("  {:<8} order #{:<2} {:<28} {}", buyer, order_id, view.label, eta);
  Ok(())
}

#[tokio::main]
async fn main() -> Result<(), QueueError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let ledger = Arc::new(MemoryLedger::new());
  ledger.add_kiosk(KIOSK, OPERATOR);
  let clock = Arc::new(ManualClock::new(Utc::now()));
  let service = QueueService::new(ledger.clone(), clock.clone(), Arc::new(StdoutNotifier), QueueSettings::default());

  ledger.put_cart_item("ayu", menu(1, "Mie ayam", 15_000, 8, 1));
  ledger.put_cart_item("budi", menu(2, "Es teh", 4_000, 1, 2));
  ledger.put_cart_item("citra", menu(1, "Mie ayam", 15_000, 8, 2));

  let mut orders = Vec::new();
  for buyer in ["ayu", "budi", "citra"] {
    let delivery = if buyer == "citra" {
      DeliveryInfo::delivery("Gedung B, lantai 3")
    } else {
      DeliveryInfo::pickup()
    };
    let order = service.create_order(buyer, delivery).await?;
    service.confirm_payment(order.id, PaymentOutcome::Paid).await?;
    orders.push((buyer, order.id));
    clock.advance(Duration::seconds(40));
  }

  println!("After payment:");
  for (buyer, id) in &orders {
    show(&service, *id, buyer).await?;
  }

  // The operator starts the quick drink first, then the noodles.
  for (_, id) in [orders[1], orders[0], orders[2]] {
    service.update_order_status(id, OPERATOR, OrderStatus::Processing).await?;
    clock.advance(Duration::seconds(10));
  }

  println!("After admission:");
  for (buyer, id) in &orders {
    show(&service, *id, buyer).await?;
  }

  println!("Operator board:");
  let board = service.list_incoming_orders(OPERATOR, 1).await?;
  for row in &board.rows {
    info!(
      nomor_antrian = ?row.nomor_antrian,
      order_id = row.order.id,
      start = ?row.order.estimated_start_at,
      finish = ?row.order.estimated_finish_at,
      "{}",
      row.label
    );
  }

  let (_, drink) = orders[1];
  service.update_order_status(drink, OPERATOR, OrderStatus::Ready).await?;
  service.update_order_status(drink, OPERATOR, OrderStatus::Done).await?;
  println!("Finally:");
  show(&service, drink, "budi").await?;
  service.flush_notifications().await;
  Ok(())
}
