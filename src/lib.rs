//! Sigbridge - HTTP bridge around a signature verification tool.

pub mod config;
pub mod delivery;
pub mod exec;
pub mod logs;
pub mod report;
pub mod service;
