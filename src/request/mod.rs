use ::reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[cfg(not(test))]
mod reqwest;
#[cfg(not(test))]
pub use self::reqwest::ReqwestApi as DefaultApi;

#[cfg(test)]
pub mod dummy;
#[cfg(test)]
pub use self::dummy::DummyApi as DefaultApi;

/// Headers relevant when fetching stylesheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Headers {
    pub content_type: Option<String>,
}

/// A subset of a Response, derived from [`reqwest::blocking::Response`].
pub struct Response<'url> {
    pub url: &'url str,
    pub status: StatusCode,
    pub headers: Headers,
    pub body: String,
}

/// Generalized HTTP access.
///
/// This abstracts away from the real thing to allow for deterministic local
/// tests with a DummyApi.
pub trait Api
where
    Self: Sized,
{
    /// Create the Api.
    fn create() -> Result<Self>;

    /// Send a get request.
    fn get<'url>(&self, url: &'url str) -> Result<Response<'url>>;
}
