// antrian/server/src/services/mod.rs

pub mod channel;
pub mod payment;

pub use channel::ChannelNotifier;
pub use payment::classify_transaction;
