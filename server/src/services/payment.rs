// antrian/server/src/services/payment.rs

use antrian::PaymentOutcome;

/// Maps a gateway `transaction_status` onto a payment outcome. Statuses that
/// settle nothing (`pending`, `authorize`, ...) map to `None` and are ignored.
pub fn classify_transaction(transaction_status: &str) -> Option<PaymentOutcome> {
  match transaction_status.trim().to_ascii_lowercase().as_str() {
    "settlement" | "capture" => Some(PaymentOutcome::Paid),
    "deny" | "expire" | "cancel" | "failure" => Some(PaymentOutcome::Failed),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gateway_statuses() {
    assert_eq!(classify_transaction("settlement"), Some(PaymentOutcome::Paid));
    assert_eq!(classify_transaction("Capture"), Some(PaymentOutcome::Paid));
    for failed in ["deny", "expire", "cancel", "failure"] {
      assert_eq!(classify_transaction(failed), Some(PaymentOutcome::Failed));
    }
    assert_eq!(classify_transaction("pending"), None);
    assert_eq!(classify_transaction(""), None);
  }
}
