pub mod alert_history;
pub mod candle_source;
pub mod http_client_factory;
pub mod notifier;
pub mod observability;
pub mod universe;
