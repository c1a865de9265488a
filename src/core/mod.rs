pub mod config;
pub mod config_loader;
pub mod error;
pub mod state_machine;
pub mod traits;

pub use config::PublishConfig;
pub use config_loader::{ConfigLoadOptions, ConfigLoader};
pub use error::*;
pub use state_machine::{PublishState, PublishStateMachine};
pub use traits::*;
