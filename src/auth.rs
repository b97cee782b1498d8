//! Identity and credential models shared by the broker and the portal client.

pub mod credential;
pub mod id;
pub mod identity;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use identity::*;
pub use secret::*;
