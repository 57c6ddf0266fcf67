//! Ports for the directory subsystem.

mod inbound;

pub use inbound::DirectoryApi;
