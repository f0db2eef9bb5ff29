//! Studium request gateway.
//!
//! The one crate that talks to the network: a reqwest implementation of the
//! backend contract plus the [`RequestGateway`] that guards it with
//! validation and duplicate detection.

mod fingerprint;
mod gateway;
mod http;

pub use fingerprint::{Fingerprint, InFlightGuard, RequestRegistry};
pub use gateway::{QuestionContext, RequestGateway};
pub use http::HttpBackendClient;
