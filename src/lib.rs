pub mod bridge;
pub mod logging;
pub mod notify;
pub mod server;
pub mod snapshot;
