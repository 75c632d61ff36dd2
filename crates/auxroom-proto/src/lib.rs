//! Wire formats for the Auxroom listening-room client.
//!
//! Three external surfaces, all JSON:
//!
//! - [`ChatFrame`]: the text frames exchanged over the persistent room
//!   channel.
//! - [`directory`]: request/response bodies for the Room Directory Service.
//! - [`playback`]: the snapshot returned by the Playback Status Provider.
//!
//! This crate is pure data: no I/O, no clocks. Parsing failures surface as
//! [`ProtocolError`] so callers can drop a bad frame without tearing down the
//! connection.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod frame;

pub mod directory;
pub mod playback;

pub use error::ProtocolError;
pub use frame::ChatFrame;
