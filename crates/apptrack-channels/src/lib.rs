//! # AppTrack Channels
//! Outbound notification channels.

pub mod email;

pub use email::EmailSender;
