//! Room Directory Service client.
//!
//! Plain CRUD over HTTP, outside the synchronization engine. The one
//! behavior that matters to the engine: a missing room must surface as a
//! distinct [`DirectoryError::RoomNotFound`], never be confused with a
//! loading state or a transport hiccup.

use auxroom_proto::directory::{CreateRoomRequest, RoomRecord};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Errors from the Room Directory Service.
///
/// Directory failures are fatal to session bootstrap; they are the only
/// errors a caller sees as a terminal state rather than a status indicator.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The requested room does not exist.
    #[error("room not found: {room_id}")]
    RoomNotFound {
        /// The id that was requested.
        room_id: String,
    },

    /// The directory responded with an unexpected status.
    #[error("directory request failed with status {0}")]
    Status(StatusCode),

    /// The request could not be completed.
    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be constructed.
    #[error("invalid directory url: {0}")]
    Url(#[from] url::ParseError),
}

/// HTTP client for the Room Directory Service.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base: Url,
}

impl DirectoryClient {
    /// Create a client against the given base URL.
    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// `GET /rooms`: all rooms, in directory order.
    pub async fn list_rooms(&self) -> Result<Vec<RoomRecord>, DirectoryError> {
        let url = self.base.join("rooms")?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// `POST /rooms`: create a room.
    pub async fn create_room(
        &self,
        name: &str,
        host_name: &str,
    ) -> Result<RoomRecord, DirectoryError> {
        let url = self.base.join("rooms")?;
        let body = CreateRoomRequest { name: name.to_owned(), host_name: host_name.to_owned() };
        let response = self.http.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// `GET /rooms/{id}`: one room's metadata.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::RoomNotFound`] on a 404.
    pub async fn fetch_room(&self, room_id: &str) -> Result<RoomRecord, DirectoryError> {
        let url = self.base.join(&format!("rooms/{room_id}"))?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DirectoryError::RoomNotFound { room_id: room_id.to_owned() });
        }
        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}
