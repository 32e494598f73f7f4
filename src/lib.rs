pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use adapters::{DataFiles, FileSessionSource};
pub use core::{
    AllianceRegistry, ApportionmentEngine, LayoutProjector, PointerEvent, RegroupingController,
    SessionContext, SessionEngine, Simulator,
};
pub use utils::error::{Result, SeatError};
