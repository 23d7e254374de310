//! Request and response types passed through to the engine

mod request;
mod response;

pub use request::{Attribution, Method, Request};
pub use response::SimulatedResponse;
