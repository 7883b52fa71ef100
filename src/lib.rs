pub mod audio;
pub mod bids;
pub mod config;
pub mod doctor;
mod lock;
mod telemetry;
pub mod timing;

mod app;

pub(crate) use lock::lock_or_recover;
pub use app::*;
