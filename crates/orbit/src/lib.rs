pub mod config;
pub mod error;
pub mod events;
pub mod ring;
pub mod sys;

pub use config::RingConfig;
pub use error::{HostError, RingError};
pub use events::RingInput;
pub use ring::{Ring, RingItem, RingSnapshot};
