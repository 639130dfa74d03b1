//! Client session capability for Matchroom.
//!
//! A session is the server's handle to one connected client. The transport
//! owns the concrete connection; rooms and the room service only see the
//! [`Session`] trait: a stable id, a mutable user binding, a non-blocking
//! send, and close. Rooms hold sessions by reference ([`SessionRef`]) and
//! never outlive the transport's ownership.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)       holds SessionRefs in channels, broadcasts to them
//!     |
//! Session layer (this)     the capability trait + errors
//!     |
//! Transport layer (below)  implements Session for real connections
//! ```

mod error;
mod session;

pub mod mock;

pub use error::SessionError;
pub use session::{Session, SessionRef};
