//! This contains the [`DummyApi`] used for testing purposes.
use reqwest::StatusCode;

use crate::error::Result;

use super::{Api, Headers, Response};

pub const FONTS_CSS: &str = "https://cdn.invalid/fonts.css";
pub const MISSING_CSS: &str = "https://cdn.invalid/missing.css";

/// A dummy API, serving local, deterministic Responses
#[derive(Debug)]
pub struct DummyApi;

impl Api for DummyApi {
    fn create() -> Result<Self> {
        Ok(DummyApi)
    }

    fn get<'url>(&self, url: &'url str) -> Result<Response<'url>> {
        match url {
            FONTS_CSS => Ok(stylesheet(
                url,
                "pre, code { font-family: Consolas, monospace; }\n\
                 @media print { body { font: 12pt Georgia, serif; } }",
            )),
            MISSING_CSS => Ok(Response {
                url,
                status: StatusCode::NOT_FOUND,
                headers: Headers::default(),
                body: "Not Found".to_owned(),
            }),
            _ => panic!("BUG: Invalid url in dummy api: {:?}", url),
        }
    }
}

fn stylesheet<'url>(url: &'url str, body: &str) -> Response<'url> {
    Response {
        url,
        status: StatusCode::OK,
        headers: Headers {
            content_type: Some("text/css".to_owned()),
        },
        body: body.to_owned(),
    }
}
