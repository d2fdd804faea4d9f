//! Turns language-model responses into structured itineraries and links stop
//! names back to provider place records.

pub mod blocks;
pub mod interpreter;
pub mod legacy;
pub mod markdown;
pub mod matcher;
pub mod structured;

pub use interpreter::{interpret, Interpretation, ItinerarySource, ResponseInterpreter};
pub use matcher::{find_best_match, PlaceMatcher};
pub use structured::{places_block_schema, PlacesBlock, PlacesError};
