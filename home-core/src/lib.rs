pub mod command_log;
pub mod error;
pub mod events;
pub mod home;
pub mod model;
pub mod navigation;
pub mod persistence;
pub mod schedule;
pub mod stats;
pub mod storage;
pub mod store;
