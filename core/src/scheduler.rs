// antrian/core/src/scheduler.rs

//! Queue Scheduler: slot arithmetic for admitting an order into its kiosk's
//! serial queue.
//!
//! The functions here are pure. Serializing the read of the queue tail with
//! the write of the new slot is the ledger's job (see
//! [`OrderLedger::apply_transition`](crate::ledger::OrderLedger::apply_transition)),
//! which holds a per-kiosk lock across both.

use crate::model::{KioskId, Order, OrderId, Slot};
use chrono::{DateTime, Duration, Utc};

/// Latest `estimated_finish_at` among the admitted orders of `kiosk_id`,
/// ignoring `exclude` (the order being admitted).
pub fn queue_tail<'a, I>(orders: I, kiosk_id: KioskId, exclude: OrderId) -> Option<DateTime<Utc>>
where
  I: IntoIterator<Item = &'a Order>,
{
  orders
    .into_iter()
    .filter(|o| o.kiosk_id == kiosk_id && o.id != exclude && o.status.is_admitted())
    .filter_map(|o| o.estimated_finish_at)
    .max()
}

/// Slot for an order taking `minutes` of work, admitted at `now` behind a
/// queue ending at `tail`.
///
/// `start = max(now, tail)` and `finish = start + minutes`; an empty queue
/// starts at `now`. Zero minutes yields an instant slot.
pub fn assign_slot(now: DateTime<Utc>, tail: Option<DateTime<Utc>>, minutes: i32) -> Slot {
  let start = tail.map_or(now, |tail| tail.max(now));
  let finish = start + Duration::minutes(i64::from(minutes.max(0)));
  Slot { start, finish }
}

/// Sorts orders into queue order: anchor time ascending, then id ascending.
pub fn sort_queue(orders: &mut [Order]) {
  orders.sort_by_key(Order::queue_key);
}

/// First pair of admitted orders whose slots overlap, if any.
///
/// Orders without a slot are ignored; different kiosks are never compared.
pub fn find_overlap(orders: &[Order]) -> Option<(OrderId, OrderId)> {
  let mut slotted: Vec<(KioskId, Slot, OrderId)> = orders
    .iter()
    .filter(|o| o.status.is_admitted())
    .filter_map(|o| o.slot().map(|slot| (o.kiosk_id, slot, o.id)))
    .collect();
  slotted.sort_by_key(|(kiosk_id, slot, id)| (*kiosk_id, slot.start, slot.finish, *id));

  // Sweep per kiosk keeping the slot that reaches furthest so far.
  let mut furthest: Option<(KioskId, Slot, OrderId)> = None;
  for (kiosk_id, slot, id) in slotted {
    match furthest {
      Some((k, reach, reach_id)) if k == kiosk_id => {
        if reach.overlaps(&slot) {
          return Some((reach_id, id));
        }
        if slot.finish > reach.finish {
          furthest = Some((kiosk_id, slot, id));
        }
      }
      _ => furthest = Some((kiosk_id, slot, id)),
    }
  }
  None
}
