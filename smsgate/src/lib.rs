//! smsgate: send SMS through failover-capable, rate limited transports
//!
//! ```no_run
//! use smsgate::SmsGate;
//! use smsgate_common::{Message, Sms};
//!
//! let sender = SmsGate::new("sms://memory || sms://null").build()?;
//! let sms = Sms::new().from("+100").to(["+200"]).text("Hello");
//! sender.send(&Message::from(sms), None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod sender;

pub use config::{ConfigError, SmsGate, find_config_file};
pub use sender::SmsSender;
