//! Domain model for outbound dispatch.

mod batch;
mod event;
mod ids;
mod token;

pub use batch::{BrokerMessage, MessageBatch};
pub use event::{DispatchEvent, HttpMethod, ParseHttpMethodError};
pub use ids::{IdentityClientId, InvocationId};
pub use token::{AUTHORIZATION_HEADER, AccessToken};
