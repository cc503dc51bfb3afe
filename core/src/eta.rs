// antrian/core/src/eta.rs

//! ETA Projector: read-only views over a snapshot of a kiosk's queue.
//!
//! Before admission a buyer only gets an advisory queue position ordered by
//! anchor time. The committed schedule follows the order in which operators
//! actually admit orders, so the two can diverge; the position is a preview,
//! never a promise.

use crate::labels::status_label;
use crate::model::{KioskId, Order, OrderId, OrderLine, OrderStatus};
use crate::scheduler;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a buyer sees about when their order will be done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Eta {
  /// Not admitted yet: rank among the kiosk's active orders.
  Position { queue_position: u32 },
  /// Admitted: live countdown to the committed finish.
  Countdown {
    estimated_finish_at: DateTime<Utc>,
    remaining_seconds: i64,
  },
  /// Finished, failed, or admitted without a committed finish.
  None,
}

/// `1 + |{active orders of the same kiosk ahead of `order` in queue order}|`.
///
/// `kiosk_orders` may contain anything; only active orders of the same kiosk
/// count, and `order` itself never counts.
pub fn queue_position(order: &Order, kiosk_orders: &[Order]) -> u32 {
  let key = order.queue_key();
  let ahead = kiosk_orders
    .iter()
    .filter(|o| o.kiosk_id == order.kiosk_id && o.id != order.id && o.status.is_active())
    .filter(|o| o.queue_key() < key)
    .count();
  u32::try_from(ahead).unwrap_or(u32::MAX - 1) + 1
}

pub fn remaining_seconds(estimated_finish_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (estimated_finish_at - now).num_seconds().max(0)
}

pub fn project(order: &Order, kiosk_orders: &[Order], now: DateTime<Utc>) -> Eta {
  match order.status {
    OrderStatus::Pending | OrderStatus::Paid => Eta::Position {
      queue_position: queue_position(order, kiosk_orders),
    },
    status if status.is_admitted() => match order.estimated_finish_at {
      Some(estimated_finish_at) => Eta::Countdown {
        estimated_finish_at,
        remaining_seconds: remaining_seconds(estimated_finish_at, now),
      },
      None => Eta::None,
    },
    _ => Eta::None,
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyerOrderStatus {
  pub order_id: OrderId,
  pub status: OrderStatus,
  pub label: &'static str,
  #[serde(flatten)]
  pub eta: Eta,
}

pub fn buyer_status(order: &Order, kiosk_orders: &[Order], now: DateTime<Utc>) -> BuyerOrderStatus {
  BuyerOrderStatus {
    order_id: order.id,
    status: order.status,
    label: status_label(order.delivery_type, order.status),
    eta: project(order, kiosk_orders, now),
  }
}

/// One row of the operator dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct BoardRow {
  pub order: Order,
  pub lines: Vec<OrderLine>,
  /// 1-based rank among the kiosk's admitted orders; `None` while the order
  /// still waits for admission.
  pub nomor_antrian: Option<u32>,
  pub remaining_seconds: Option<i64>,
  pub label: &'static str,
}

/// One page of the operator dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct IncomingOrders {
  pub kiosk_id: KioskId,
  pub page: u32,
  pub page_size: u32,
  /// Active orders across all pages.
  pub total: usize,
  pub rows: Vec<BoardRow>,
}

/// The kiosk's active orders in queue order. Only admitted orders are
/// numbered: their anchor is fixed at admission, so a later admission always
/// lands behind them and never renumbers a row the operator already saw.
/// Lines are left empty for the caller to fill in for the rows it keeps.
pub fn operator_board(mut active: Vec<Order>, now: DateTime<Utc>) -> Vec<BoardRow> {
  active.retain(|o| o.status.is_active());
  scheduler::sort_queue(&mut active);

  let mut admitted = 0u32;
  active
    .into_iter()
    .map(|order| {
      let nomor_antrian = order.status.is_admitted().then(|| {
        admitted += 1;
        admitted
      });
      let remaining_seconds = match order.estimated_finish_at {
        Some(finish) if order.status.is_admitted() => Some(remaining_seconds(finish, now)),
        _ => None,
      };
      BoardRow {
        label: status_label(order.delivery_type, order.status),
        order,
        lines: Vec::new(),
        nomor_antrian,
        remaining_seconds,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::DeliveryType;
  use chrono::{Duration, TimeZone};

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
  }

  fn order(id: OrderId, status: OrderStatus, anchor_min: i64) -> Order {
    let anchor = t0() + Duration::minutes(anchor_min);
    let mut o = Order {
      id,
      kiosk_id: 1,
      buyer_id: format!("guest-{}", id),
      status,
      total_price: 15_000,
      total_estimated_minutes: 5,
      delivery_type: DeliveryType::Pickup,
      delivery_address: None,
      created_at: anchor,
      paid_at: None,
      processing_started_at: None,
      estimated_start_at: None,
      estimated_finish_at: None,
    };
    if status != OrderStatus::Pending {
      o.paid_at = Some(anchor);
    }
    if status.is_admitted() {
      o.processing_started_at = Some(anchor);
      o.estimated_start_at = Some(anchor);
      o.estimated_finish_at = Some(anchor + Duration::minutes(5));
    }
    o
  }

  #[test]
  fn position_counts_active_orders_ahead() {
    let me = order(10, OrderStatus::Paid, 5);
    let others = vec![
      order(1, OrderStatus::Processing, 1),
      order(2, OrderStatus::Pending, 2),
      order(3, OrderStatus::Done, 3),
      order(4, OrderStatus::Paid, 4),
      order(5, OrderStatus::Paid, 5),
      order(11, OrderStatus::Paid, 5),
      order(6, OrderStatus::Paid, 9),
      me.clone(),
    ];
    // 1 and 4 are earlier; 5 ties on anchor with a lower id. 2 is unpaid, 3 is done.
    assert_eq!(queue_position(&me, &others), 4);
  }

  #[test]
  fn empty_queue_is_position_one() {
    let me = order(1, OrderStatus::Pending, 0);
    assert_eq!(queue_position(&me, &[]), 1);
  }

  #[test]
  fn countdown_never_goes_negative() {
    let o = order(1, OrderStatus::Processing, 0);
    let later = t0() + Duration::minutes(30);
    assert_eq!(
      project(&o, &[], later),
      Eta::Countdown {
        estimated_finish_at: t0() + Duration::minutes(5),
        remaining_seconds: 0
      }
    );
    let early = t0() + Duration::minutes(2);
    assert!(matches!(project(&o, &[], early), Eta::Countdown { remaining_seconds: 180, .. }));
  }

  #[test]
  fn terminal_orders_have_no_eta() {
    assert_eq!(project(&order(1, OrderStatus::Done, 0), &[], t0()), Eta::None);
    assert_eq!(project(&order(2, OrderStatus::Failed, 0), &[], t0()), Eta::None);
  }

  #[test]
  fn board_numbers_rows_in_queue_order() {
    let board = operator_board(
      vec![
        order(7, OrderStatus::Paid, 8),
        order(3, OrderStatus::Ready, 1),
        order(5, OrderStatus::Processing, 4),
        order(9, OrderStatus::Pending, 0),
      ],
      t0() + Duration::minutes(5),
    );
    let ranks: Vec<(OrderId, Option<u32>, Option<i64>)> =
      board.iter().map(|r| (r.order.id, r.nomor_antrian, r.remaining_seconds)).collect();
    assert_eq!(ranks, vec![(3, Some(1), Some(60)), (5, Some(2), Some(240)), (7, None, None)]);
  }

  #[test]
  fn waiting_orders_are_listed_but_not_numbered() {
    let board = operator_board(
      vec![
        order(2, OrderStatus::Paid, 0),
        order(4, OrderStatus::Processing, 3),
        order(6, OrderStatus::Paid, 5),
        order(8, OrderStatus::Delivering, 6),
      ],
      t0(),
    );
    let ranks: Vec<(OrderId, Option<u32>)> = board.iter().map(|r| (r.order.id, r.nomor_antrian)).collect();
    assert_eq!(ranks, vec![(2, None), (4, Some(1)), (6, None), (8, Some(2))]);
  }

  #[test]
  fn buyer_view_serializes_flat() {
    let view = buyer_status(&order(1, OrderStatus::Paid, 0), &[], t0());
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["view"], "position");
    assert_eq!(json["queue_position"], 1);
    assert_eq!(json["label"], "Paid, waiting for the kiosk");
  }
}
