pub mod config;
pub mod logging;

pub mod album;
pub mod dispatcher;
pub mod handlers;
pub mod journal;
pub mod progress;
pub mod queue;
