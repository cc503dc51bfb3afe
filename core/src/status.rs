// antrian/core/src/status.rs

//! Status State Machine: the allow-list of transitions and the plan of field
//! updates a transition implies. Plans are computed while the ledger holds
//! the order's lock, so they always see the latest committed row.

use crate::error::{QueueError, Result};
use crate::model::{Order, OperatorId, OrderStatus};
use crate::scheduler;
use chrono::{DateTime, Utc};
use serde::Serialize;

use OrderStatus::*;

/// Forward-only transitions. Anything not listed is rejected.
pub const ALLOWED_TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
  (Pending, Paid),
  (Paid, Processing),
  (Processing, Ready),
  (Processing, Delivering),
  (Ready, Done),
  (Delivering, Done),
  (Pending, Failed),
  (Paid, Failed),
];

pub fn is_allowed(from: OrderStatus, to: OrderStatus) -> bool {
  ALLOWED_TRANSITIONS.contains(&(from, to))
}

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Actor {
  /// A kiosk operator; must own the order's kiosk.
  Operator(OperatorId),
  /// The payment gateway callback.
  System,
}

/// A requested transition, optionally guarded on the status it must start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
  pub target: OrderStatus,
  /// When set and the order is in another status, the request is a no-op.
  pub only_from: Option<OrderStatus>,
  /// Gateway settlement: once the order carries `paid_at` the request is a
  /// no-op, whatever status the order has moved on to.
  pub settles_payment: bool,
}

impl TransitionRequest {
  pub fn to(target: OrderStatus) -> Self {
    Self {
      target,
      only_from: None,
      settles_payment: false,
    }
  }

  pub fn guarded(from: OrderStatus, target: OrderStatus) -> Self {
    Self {
      only_from: Some(from),
      ..Self::to(target)
    }
  }

  pub fn settle_payment() -> Self {
    Self {
      settles_payment: true,
      ..Self::to(Paid)
    }
  }
}

/// Field values a transition writes. `None` means "leave as is".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
  pub status: OrderStatus,
  pub paid_at: Option<DateTime<Utc>>,
  pub processing_started_at: Option<DateTime<Utc>>,
  pub estimated_start_at: Option<DateTime<Utc>>,
  pub estimated_finish_at: Option<DateTime<Utc>>,
}

impl OrderUpdate {
  fn status_only(status: OrderStatus) -> Self {
    Self {
      status,
      paid_at: None,
      processing_started_at: None,
      estimated_start_at: None,
      estimated_finish_at: None,
    }
  }

  /// Applies the update to an in-memory row. Timestamps that are already set
  /// are never overwritten.
  pub fn apply_to(&self, order: &mut Order) {
    order.status = self.status;
    order.paid_at = order.paid_at.or(self.paid_at);
    order.processing_started_at = order.processing_started_at.or(self.processing_started_at);
    order.estimated_start_at = order.estimated_start_at.or(self.estimated_start_at);
    order.estimated_finish_at = order.estimated_finish_at.or(self.estimated_finish_at);
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
  /// Idempotent repeat: succeed without writing.
  Unchanged,
  Apply(OrderUpdate),
}

/// Decides what `request` does to `order` at `now`.
///
/// `queue_tail` is the latest finish among the kiosk's other admitted
/// orders; the ledger supplies it only for admissions.
pub fn plan_transition(
  order: &Order,
  request: TransitionRequest,
  now: DateTime<Utc>,
  queue_tail: Option<DateTime<Utc>>,
) -> Result<TransitionPlan> {
  let target = request.target;

  if let Some(from) = request.only_from {
    if order.status != from {
      return Ok(TransitionPlan::Unchanged);
    }
  }

  if request.settles_payment && order.paid_at.is_some() {
    return Ok(TransitionPlan::Unchanged);
  }
  // Retried requests succeed without touching the row.
  if order.status == target {
    return Ok(TransitionPlan::Unchanged);
  }

  if !is_allowed(order.status, target) {
    return Err(QueueError::InvalidTransition {
      from: order.status,
      to: target,
    });
  }

  let update = match target {
    Paid => OrderUpdate {
      paid_at: Some(now),
      ..OrderUpdate::status_only(Paid)
    },
    Processing => {
      let slot = scheduler::assign_slot(now, queue_tail, order.total_estimated_minutes);
      OrderUpdate {
        processing_started_at: Some(now),
        estimated_start_at: Some(slot.start),
        estimated_finish_at: Some(slot.finish),
        ..OrderUpdate::status_only(Processing)
      }
    }
    other => OrderUpdate::status_only(other),
  };
  Ok(TransitionPlan::Apply(update))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::DeliveryType;
  use chrono::{Duration, TimeZone};

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
  }

  fn order(status: OrderStatus) -> Order {
    Order {
      id: 11,
      kiosk_id: 2,
      buyer_id: "guest-11".to_string(),
      status,
      total_price: 25_000,
      total_estimated_minutes: 10,
      delivery_type: DeliveryType::Pickup,
      delivery_address: None,
      created_at: t0(),
      paid_at: None,
      processing_started_at: None,
      estimated_start_at: None,
      estimated_finish_at: None,
    }
  }

  #[test]
  fn allow_list_has_no_skips_or_backward_moves() {
    assert!(is_allowed(Pending, Paid));
    assert!(is_allowed(Processing, Delivering));
    assert!(!is_allowed(Pending, Done));
    assert!(!is_allowed(Pending, Processing));
    assert!(!is_allowed(Ready, Processing));
    assert!(!is_allowed(Done, Failed));
    assert!(!is_allowed(Processing, Failed));
  }

  #[test]
  fn pending_to_done_is_rejected() {
    let err = plan_transition(&order(Pending), TransitionRequest::to(Done), t0(), None).unwrap_err();
    assert!(matches!(
      err,
      QueueError::InvalidTransition {
        from: OrderStatus::Pending,
        to: OrderStatus::Done
      }
    ));
  }

  #[test]
  fn payment_stamps_paid_at_once() {
    let plan = plan_transition(&order(Pending), TransitionRequest::to(Paid), t0(), None).unwrap();
    let TransitionPlan::Apply(update) = plan else {
      panic!("expected an update");
    };
    assert_eq!(update.paid_at, Some(t0()));

    let mut paid = order(Paid);
    paid.paid_at = Some(t0());
    let again = plan_transition(&paid, TransitionRequest::to(Paid), t0() + Duration::minutes(1), None).unwrap();
    assert_eq!(again, TransitionPlan::Unchanged);
  }

  #[test]
  fn operator_cannot_move_a_paid_order_back_to_paid() {
    for status in [Processing, Ready, Delivering, Done] {
      let mut row = order(status);
      row.paid_at = Some(t0());
      let err = plan_transition(&row, TransitionRequest::to(Paid), t0(), None).unwrap_err();
      assert!(matches!(err, QueueError::InvalidTransition { to: Paid, .. }));
    }
  }

  #[test]
  fn settlement_after_admission_is_a_no_op() {
    let mut admitted = order(Processing);
    admitted.paid_at = Some(t0());
    admitted.processing_started_at = Some(t0());
    let plan = plan_transition(&admitted, TransitionRequest::settle_payment(), t0(), None).unwrap();
    assert_eq!(plan, TransitionPlan::Unchanged);

    let settled = plan_transition(&order(Pending), TransitionRequest::settle_payment(), t0(), None).unwrap();
    assert!(matches!(settled, TransitionPlan::Apply(OrderUpdate { status: Paid, .. })));
  }

  #[test]
  fn admission_commits_a_slot_behind_the_tail() {
    let mut paid = order(Paid);
    paid.paid_at = Some(t0());
    let now = t0() + Duration::minutes(2);
    let plan = plan_transition(&paid, TransitionRequest::to(Processing), now, Some(t0() + Duration::minutes(10))).unwrap();
    let TransitionPlan::Apply(update) = plan else {
      panic!("expected an update");
    };
    assert_eq!(update.processing_started_at, Some(now));
    assert_eq!(update.estimated_start_at, Some(t0() + Duration::minutes(10)));
    assert_eq!(update.estimated_finish_at, Some(t0() + Duration::minutes(20)));
  }

  #[test]
  fn repeated_admission_keeps_the_slot() {
    let mut admitted = order(Processing);
    admitted.processing_started_at = Some(t0());
    admitted.estimated_start_at = Some(t0());
    admitted.estimated_finish_at = Some(t0() + Duration::minutes(10));
    let plan = plan_transition(&admitted, TransitionRequest::to(Processing), t0(), None).unwrap();
    assert_eq!(plan, TransitionPlan::Unchanged);
  }

  #[test]
  fn ready_cannot_return_to_processing() {
    let mut ready = order(Ready);
    ready.processing_started_at = Some(t0());
    let err = plan_transition(&ready, TransitionRequest::to(Processing), t0(), None).unwrap_err();
    assert!(matches!(err, QueueError::InvalidTransition { from: Ready, to: Processing }));
  }

  #[test]
  fn repeating_the_current_status_is_a_no_op() {
    let plan = plan_transition(&order(Done), TransitionRequest::to(Done), t0(), None).unwrap();
    assert_eq!(plan, TransitionPlan::Unchanged);
  }

  #[test]
  fn guarded_request_ignores_other_statuses() {
    let mut paid = order(Paid);
    paid.paid_at = Some(t0());
    let plan = plan_transition(&paid, TransitionRequest::guarded(Pending, Failed), t0(), None).unwrap();
    assert_eq!(plan, TransitionPlan::Unchanged);
  }

  #[test]
  fn apply_never_overwrites_set_timestamps() {
    let mut row = order(Paid);
    row.paid_at = Some(t0());
    let update = OrderUpdate {
      paid_at: Some(t0() + Duration::hours(1)),
      ..OrderUpdate::status_only(Processing)
    };
    update.apply_to(&mut row);
    assert_eq!(row.status, Processing);
    assert_eq!(row.paid_at, Some(t0()));
  }
}
