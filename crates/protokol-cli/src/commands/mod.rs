//! Command handlers for the Protokol CLI.

pub mod clients;
pub mod draft;
pub mod entry;
pub mod finalize;
pub mod init;
pub mod maintenance;
pub mod queue;
pub mod return_leg;
pub mod sign;
pub mod snapshot;
pub mod tools;
