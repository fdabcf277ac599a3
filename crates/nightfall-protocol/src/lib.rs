//! Wire protocol for Nightfall.
//!
//! This crate defines what callers and the server exchange:
//!
//! - **Identity** ([`PlayerId`], [`LobbyCode`]): opaque player ids and
//!   case-normalized lobby join codes.
//! - **Operations** ([`Request`], [`Response`]): what a caller can do,
//!   namely start a game, advance the phase, submit a role action, or
//!   update settings.
//! - **Framing** ([`Envelope`]): sequence number and timestamp around
//!   each payload.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become
//!   bytes.
//! - **Errors** ([`ProtocolError`] for encoding, [`ErrorKind`] for the
//!   categories reported back to callers).
//!
//! The protocol layer knows nothing about lobbies or night resolution. It
//! only describes the shapes that travel between the two sides.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<Request>) → Engine (GameService)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ActionKind, ActionOutcome, Envelope, ErrorKind, InvestigationResult,
    LobbyCode, Phase, PlayerId, Request, Response,
};
