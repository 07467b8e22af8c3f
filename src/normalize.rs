//! Reduces GTFS-RT vehicle positions to the flat train records served to
//! clients.
//!
//! Each [`FeedEntity`] either yields one [`SimplifiedVehicle`] or is skipped.
//! An entity is skipped when it carries no vehicle position or when that
//! vehicle position has no coordinates. Identity, trip and speed are filled
//! with placeholders when missing.

use chrono::{DateTime, TimeZone, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::gtfs_rt::{FeedEntity, FeedMessage, Position, TripDescriptor, VehicleDescriptor};

/// Serialized in place of a missing vehicle id.
pub const UNKNOWN_VEHICLE: &str = "Unknown";

/// Serialized in place of a missing or empty trip id.
pub const NO_SCHEDULE: &str = "No Schedule";

/// Who the vehicle is, as far as the feed tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleIdentity {
    Identified(String),
    Unknown,
}

impl VehicleIdentity {
    fn from_descriptor(descriptor: Option<&VehicleDescriptor>) -> Self {
        match descriptor.and_then(|d| d.id.as_ref()) {
            Some(id) => VehicleIdentity::Identified(id.clone()),
            None => VehicleIdentity::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VehicleIdentity::Identified(id) => id,
            VehicleIdentity::Unknown => UNKNOWN_VEHICLE,
        }
    }
}

/// Whether the vehicle is running a scheduled trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripAssignment {
    Scheduled(String),
    Unscheduled,
}

impl TripAssignment {
    fn from_descriptor(trip: Option<&TripDescriptor>) -> Self {
        match trip.and_then(|t| t.trip_id.as_ref()) {
            Some(trip_id) if !trip_id.is_empty() => TripAssignment::Scheduled(trip_id.clone()),
            _ => TripAssignment::Unscheduled,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TripAssignment::Scheduled(trip_id) => trip_id,
            TripAssignment::Unscheduled => NO_SCHEDULE,
        }
    }
}

/// A single train as published to clients.
///
/// `speed` keeps the distinction between a reported and an unreported
/// speed; on the wire both an absent speed and a zero speed read as `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifiedVehicle {
    pub identity: VehicleIdentity,
    pub trip: TripAssignment,
    pub lat: f32,
    pub lng: f32,
    pub speed: Option<f32>,
}

impl SimplifiedVehicle {
    /// Speed in metres per second as serialized; zero when unreported or
    /// not a finite number.
    pub fn speed_or_zero(&self) -> f32 {
        match self.speed {
            Some(speed) if speed.is_finite() && speed != 0.0 => speed,
            _ => 0.0,
        }
    }
}

impl Serialize for SimplifiedVehicle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SimplifiedVehicle", 5)?;
        s.serialize_field("id", self.identity.as_str())?;
        s.serialize_field("tripId", self.trip.as_str())?;
        s.serialize_field("lat", &self.lat)?;
        s.serialize_field("lng", &self.lng)?;
        s.serialize_field("speed", &self.speed_or_zero())?;
        s.end()
    }
}

/// Why an entity produced no train record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NoVehicle,
    NoPosition,
}

/// Maps one entity to a train record.
///
/// Every nested field is reached through the `Option` of its parent, so an
/// entity lacking a vehicle or position is reported as a [`Skip`] rather
/// than read.
pub fn normalize_entity(entity: &FeedEntity) -> Result<SimplifiedVehicle, Skip> {
    let vehicle = entity.vehicle.as_ref().ok_or(Skip::NoVehicle)?;
    let Position {
        latitude,
        longitude,
        speed,
        ..
    } = vehicle.position.as_ref().ok_or(Skip::NoPosition)?;

    Ok(SimplifiedVehicle {
        identity: VehicleIdentity::from_descriptor(vehicle.vehicle.as_ref()),
        trip: TripAssignment::from_descriptor(vehicle.trip.as_ref()),
        lat: *latitude,
        lng: *longitude,
        speed: *speed,
    })
}

/// Counts describing one normalization pass. Logged, never served.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub feed_timestamp: Option<DateTime<Utc>>,
    pub total_entities: usize,
    pub vehicles: usize,
    pub skipped_no_vehicle: usize,
    pub skipped_no_position: usize,
    pub unknown_identity: usize,
    pub unscheduled: usize,
    pub with_speed: usize,
}

impl NormalizeSummary {
    pub fn emitted(&self) -> usize {
        self.total_entities - self.skipped_no_vehicle - self.skipped_no_position
    }
}

/// Result of normalizing a whole feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub trains: Vec<SimplifiedVehicle>,
    pub summary: NormalizeSummary,
}

/// Normalizes every entity of `feed`, keeping feed order.
pub fn normalize_feed(feed: &FeedMessage) -> Normalized {
    let mut summary = NormalizeSummary {
        feed_timestamp: feed
            .header
            .timestamp
            .and_then(|ts| i64::try_from(ts).ok())
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        total_entities: feed.entity.len(),
        ..Default::default()
    };
    let mut trains = Vec::with_capacity(feed.entity.len());

    for entity in &feed.entity {
        if entity.vehicle.is_some() {
            summary.vehicles += 1;
        }

        match normalize_entity(entity) {
            Ok(train) => {
                if train.identity == VehicleIdentity::Unknown {
                    summary.unknown_identity += 1;
                }
                if train.trip == TripAssignment::Unscheduled {
                    summary.unscheduled += 1;
                }
                if train.speed.is_some() {
                    summary.with_speed += 1;
                }
                trains.push(train);
            }
            Err(skip) => {
                debug!(entity_id = %entity.id, reason = ?skip, "Entity skipped");
                match skip {
                    Skip::NoVehicle => summary.skipped_no_vehicle += 1,
                    Skip::NoPosition => summary.skipped_no_position += 1,
                }
            }
        }
    }

    Normalized { trains, summary }
}
