use reqwest::{blocking::Client, header::CONTENT_TYPE};

use std::time::Duration as StdDuration;

use crate::error::{Error, Result};

use super::{Api, Headers, Response};

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Real api accessing the inter-webs.
#[derive(Debug)]
pub struct ReqwestApi {
    client: Client,
}

impl Api for ReqwestApi {
    fn create() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("frankenfont/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Reqwest)?;
        Ok(ReqwestApi { client })
    }

    fn get<'url>(&self, url: &'url str) -> Result<Response<'url>> {
        let resp = self.client.get(url).send().map_err(Error::Reqwest)?;
        Ok(Response {
            url,
            status: resp.status(),
            headers: resp.headers().into(),
            body: resp.text().map_err(Error::Reqwest)?,
        })
    }
}

impl From<&reqwest::header::HeaderMap> for Headers {
    fn from(map: &reqwest::header::HeaderMap) -> Self {
        let content_type = map
            .get(CONTENT_TYPE)
            .and_then(|raw| Some(raw.to_str().ok()?.to_owned()));
        Self { content_type }
    }
}
