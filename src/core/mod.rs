// Data model, dispatch engine and the built-in routines it dispatches to.
pub mod config;
pub mod dispatch;
pub mod error;
pub mod loaded;
pub mod loader;
pub mod record;
pub mod trace;
pub mod typechecks;
pub mod types;
pub mod value;

mod collections;
mod enums;
mod forward_ref;
mod scalar;
mod union;

pub use scalar::coerce;
