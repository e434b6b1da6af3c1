pub mod candidate;
pub mod notification_log;
pub mod status_history;
