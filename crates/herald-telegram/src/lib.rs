//! Telegram delivery: channel posts for the distribution queue and HTML
//! admin alerts for booking events, both over the Bot API `sendMessage`.

pub mod adapter;
pub mod alert;
pub mod error;
pub mod send;

pub use adapter::{AdminAlertReport, TelegramPlatform};
pub use alert::{AlertKind, BookingAlert};
pub use error::TelegramError;
