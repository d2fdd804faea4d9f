//! Resolves map actions (searches, view changes, directions) against place
//! and route providers, one live action per channel.

pub mod cache;
pub mod channel;
pub mod directions;
pub mod outcome;
pub mod providers;
pub mod resolver;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use channel::Channel;
pub use directions::MY_LOCATION;
pub use outcome::{
    ActionOutcome, MapEffect, MapState, Marker, Resolution, ResolveStatus, RouteOverlay, Viewport,
};
pub use providers::{NominatimSearch, OsrmRouter};
pub use resolver::MapActionResolver;
pub use traits::{DeviceLocator, PlaceSearch, RouteLeg, RouteProvider};
