//! Transport adapters for the directory.

mod loopback;

pub(crate) use loopback::{Envelope, NodeLink};
