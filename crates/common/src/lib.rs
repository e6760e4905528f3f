pub mod config;
pub mod connector;
pub mod error;
pub mod notify;
pub mod types;

pub use config::{AppConfig, BotConfig};
pub use connector::{Connector, ConnectorKind, Credentials};
pub use error::{Error, Result};
pub use notify::{BroadcastSink, FanoutSink, Notification, NotificationSink, TracingSink};
pub use types::*;
