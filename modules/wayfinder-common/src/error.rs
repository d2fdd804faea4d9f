use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RouteOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectionErrorKind {
    /// One endpoint could not be resolved to coordinates.
    InvalidRequest,
    /// The route provider returned nothing usable for any mode.
    NoRoute,
    /// Every returned mode exceeded its distance cap.
    RouteTooLong,
    /// A provider call failed outright.
    UnknownError,
}

impl std::fmt::Display for DirectionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DirectionErrorKind::InvalidRequest => "INVALID_REQUEST",
            DirectionErrorKind::NoRoute => "NO_ROUTE",
            DirectionErrorKind::RouteTooLong => "ROUTE_TOO_LONG",
            DirectionErrorKind::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(s)
    }
}

/// Which side of a directions request failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Origin,
    Destination,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Origin => f.write_str("starting point"),
            Endpoint::Destination => f.write_str("destination"),
        }
    }
}

/// A classified map-action failure. Always surfaced as a value, never thrown.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct DirectionError {
    pub kind: DirectionErrorKind,
    pub message: String,
    pub origin: String,
    pub destination: String,
}

impl DirectionError {
    pub fn unresolved(side: Endpoint, origin: &str, destination: &str) -> Self {
        let name = match side {
            Endpoint::Origin => origin,
            Endpoint::Destination => destination,
        };
        Self {
            kind: DirectionErrorKind::InvalidRequest,
            message: format!(
                "Could not find the {side} \"{name}\" for directions from {origin} to {destination}"
            ),
            origin: origin.to_string(),
            destination: destination.to_string(),
        }
    }

    pub fn no_route(origin: &str, destination: &str) -> Self {
        Self {
            kind: DirectionErrorKind::NoRoute,
            message: format!("No route found from {origin} to {destination}"),
            origin: origin.to_string(),
            destination: destination.to_string(),
        }
    }

    /// `shortest` is the shortest measured route among the rejected modes.
    pub fn too_long(origin: &str, destination: &str, shortest: &RouteOption) -> Self {
        Self {
            kind: DirectionErrorKind::RouteTooLong,
            message: format!(
                "The route from {origin} to {destination} is too long: the shortest option is {} by {}",
                shortest.distance, shortest.mode
            ),
            origin: origin.to_string(),
            destination: destination.to_string(),
        }
    }

    pub fn unknown(origin: &str, destination: &str, cause: impl std::fmt::Display) -> Self {
        Self {
            kind: DirectionErrorKind::UnknownError,
            message: format!("Something went wrong between {origin} and {destination}: {cause}"),
            origin: origin.to_string(),
            destination: destination.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
