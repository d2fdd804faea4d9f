pub mod config;
pub mod error;
pub mod format;
pub mod itinerary;
pub mod types;

pub use config::{DistanceCaps, ResolverConfig};
pub use error::{ConfigError, DirectionError, DirectionErrorKind, Endpoint};
pub use itinerary::*;
pub use types::*;
