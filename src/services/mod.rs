pub mod heartbeat_monitor;
pub mod media_service;
pub mod resolver;
pub mod snapshot;
