// antrian/core/src/lib.rs

//! Antrian: per-kiosk order queue scheduling and ETA projection.
//!
//! A paid order is admitted into its kiosk's serial fulfillment queue, gets a
//! committed `[estimated_start_at, estimated_finish_at)` slot that never
//! overlaps another admitted order of the same kiosk, and can be tracked live
//! by the buyer (queue position, then countdown) and the operator (numbered
//! dashboard).
//!
//! Mutating operations run as named-step pipelines (see [`pipeline`]) over an
//! [`OrderLedger`], which is the single point of coordination:
//!  - Checkout writes the order, its lines and the cart clear atomically.
//!  - Status changes follow a forward-only allow-list.
//!  - Admissions are serialized per kiosk while the slot is computed.
//!  - Order events reach the [`Notifier`] at most once, best effort.

pub mod checkout;
pub mod clock;
pub mod error;
pub mod eta;
pub mod labels;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod status;
pub mod workflows;

// --- Re-exports for the Public API ---

pub use crate::checkout::{DeliveryInfo, OrderDraft};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::{PipelineError, QueueError, Result};
pub use crate::eta::{BoardRow, BuyerOrderStatus, Eta, IncomingOrders};
pub use crate::labels::status_label;
pub use crate::ledger::{MemoryLedger, OrderLedger, TransitionOutcome};
pub use crate::model::{
  CartLine, DeliveryType, KioskId, MenuItemId, OperatorId, Order, OrderId, OrderLine, OrderStatus, Slot,
};
pub use crate::notify::{DispatchOutcome, EventKind, Notifier, NotifierGateway, NotifyPolicy, OrderEvent, Recipient};
pub use crate::pipeline::{ContextData, Handler, Pipeline, PipelineControl, PipelineResult, StepDef};
pub use crate::registry::Registry;
pub use crate::service::{PaymentOutcome, QueueService, QueueSettings};
pub use crate::status::{Actor, TransitionRequest};
