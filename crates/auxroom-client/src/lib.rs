//! Tokio runtime for Auxroom room sessions.
//!
//! The pure engine lives in `auxroom-core`; this crate supplies the I/O:
//! a WebSocket chat channel with automatic reconnection, an HTTP playback
//! poller, the Room Directory client, and the single-task event loop that
//! ties them together.
//!
//! # Usage
//!
//! ```no_run
//! use auxroom_client::{ClientConfig, RoomSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://localhost:8000".parse()?, "ws://localhost:8000".parse()?);
//! let session = RoomSession::open(config, "r1", "guest").await?;
//!
//! let mut states = session.subscribe();
//! session.send_chat("hello").await?;
//! states.changed().await?;
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod directory;
mod env;
mod playback;
mod session;
mod transport;

pub use directory::{DirectoryClient, DirectoryError};
pub use env::SystemEnv;
pub use playback::PlaybackClient;
pub use session::{ClientConfig, RoomSession};
pub use transport::TransportError;
