//! Connectome server client and models

pub mod client;
pub mod models;
pub mod traits;

pub use client::NeuprintClient;
pub use models::*;
pub use traits::ConnectomeStore;

#[cfg(test)]
pub(crate) mod mock;
