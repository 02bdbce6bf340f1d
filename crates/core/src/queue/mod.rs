//! Offline scan queue: storage port and codec

pub mod codec;
pub mod ports;

pub use codec::{decode, encode};
pub use ports::{KeyValueStore, StoreError};
