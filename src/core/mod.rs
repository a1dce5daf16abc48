//! Request-independent logic: authentication, authorization and imports

pub mod guard;
pub mod policy;
pub mod sync;

pub use guard::{authenticate, AuthRejection};
pub use policy::{authorize, Action, Resource, Subject};
pub use sync::SyncOrchestrator;
