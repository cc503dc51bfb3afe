// antrian/server/src/services/channel.rs

//! A stand-in for the kiosk/buyer messaging socket. It keeps an explicit
//! connection state and can lose it, which is all the gateway relies on.

use antrian::{Notifier, Recipient};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

const HANDSHAKE_LATENCY: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub struct ChannelNotifier {
  sender: String,
  connected: AtomicBool,
  delivered: AtomicU64,
}

impl ChannelNotifier {
  pub fn new(sender: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      connected: AtomicBool::new(false),
      delivered: AtomicU64::new(0),
    }
  }

  /// Drops the socket, as a remote close would. The gateway reconnects on the
  /// next send.
  pub fn drop_connection(&self) {
    if self.connected.swap(false, Ordering::SeqCst) {
      warn!(sender = %self.sender, "Messaging channel connection dropped.");
    }
  }

  pub fn delivered(&self) -> u64 {
    self.delivered.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Notifier for ChannelNotifier {
  async fn connect(&self) -> anyhow::Result<()> {
    tokio::time::sleep(HANDSHAKE_LATENCY).await;
    self.connected.store(true, Ordering::SeqCst);
    info!(sender = %self.sender, "Messaging channel connected.");
    Ok(())
  }

  fn is_connected(&self) -> bool {
    self.connected.load(Ordering::SeqCst)
  }

  async fn send(&self, recipient: &Recipient, message: &str) -> anyhow::Result<()> {
    if !self.is_connected() {
      anyhow::bail!("messaging channel is not connected");
    }
    let message_id = format!("msg_{}", Uuid::new_v4());
    self.delivered.fetch_add(1, Ordering::SeqCst);
    info!(
      sender = %self.sender,
      recipient = %recipient,
      message_id = %message_id,
      "Channel message sent: {}",
      message
    );
    Ok(())
  }
}
