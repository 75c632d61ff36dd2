//! Room Directory Service payloads.
//!
//! The directory is plain CRUD over HTTP and lives outside the
//! synchronization engine; these are just the bodies it speaks.

use serde::{Deserialize, Serialize};

/// One room as returned by `GET /rooms` and `GET /rooms/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Opaque room identifier.
    pub id: String,
    /// Human-readable room name.
    pub name: String,
    /// Display name of the room host.
    pub host_name: String,
}

/// Body for `POST /rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Human-readable room name.
    pub name: String,
    /// Display name of the room host.
    pub host_name: String,
}
