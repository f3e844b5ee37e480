#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod amounts;
pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;
