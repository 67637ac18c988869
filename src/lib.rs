pub mod binder;
pub mod config;
pub mod directory;
pub mod error;
pub mod extract;
pub mod gate;
pub mod identity;
pub mod reject;
