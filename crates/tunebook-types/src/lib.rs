pub mod api;
pub mod models;
pub mod principal;
pub mod wire;

pub use principal::Principal;
pub use wire::{OptList, Page, Reply, WireError};
