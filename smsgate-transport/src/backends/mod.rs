//! Backends built into every smsgate binary

pub mod memory;
pub mod null;

pub use self::{
    memory::{Delivered, Inbox, MemoryTransport, MemoryTransportFactory},
    null::{NullTransport, NullTransportFactory},
};
