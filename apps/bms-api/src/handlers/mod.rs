//! Handlers 模块

pub mod auth;
pub mod automation;
pub mod buildings;
pub mod commands;
pub mod devices;
pub mod events;
pub mod locations;
pub mod runtime;

pub use auth::*;
pub use automation::*;
pub use buildings::*;
pub use commands::*;
pub use devices::*;
pub use events::*;
pub use locations::*;
pub use runtime::*;
