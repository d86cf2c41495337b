//! The privileged side of the extension.
//!
//! Pages can't read the rules of stylesheets from other origins. The
//! background isn't bound by that and fetches the text on their behalf.
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    request::Api,
};


/// The answer to a stylesheet request, as sent over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MessageResponse {
    Ok { text: String },
    Error { error: String },
}

/// One-shot messages from the page to the privileged context.
pub trait MessageChannel {
    /// Send `message`, returning the raw response payload.
    fn send_message(&self, message: &str) -> String;
}

impl<T: MessageChannel + ?Sized> MessageChannel for &T {
    fn send_message(&self, message: &str) -> String {
        (**self).send_message(message)
    }
}

/// Fetches stylesheet text for pages.
#[derive(Debug)]
pub struct Background<A> {
    api: A,
}

impl<A: Api> Background<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn create() -> Result<Self> {
        Ok(Self::new(A::create()?))
    }

    /// Fetch the stylesheet at `url`.
    pub fn fetch_stylesheet(&self, url: &str) -> Result<String> {
        info!("Fetching stylesheet {}", url);
        let resp = self.api.get(url)?;
        if !resp.status.is_success() {
            return Err(Error::NonSuccessStatusCode(
                resp.url.to_owned(),
                resp.status,
            ));
        }
        match resp.headers.content_type.as_deref() {
            Some(mime) if !mime.starts_with("text/css") => {
                debug!("{} has unexpected content type {:?}", url, mime)
            }
            _ => {}
        }
        Ok(resp.body)
    }

    pub fn handle(&self, url: &str) -> MessageResponse {
        match self.fetch_stylesheet(url) {
            Ok(text) => MessageResponse::Ok { text },
            Err(why) => MessageResponse::Error {
                error: why.to_string(),
            },
        }
    }
}

impl<A: Api> MessageChannel for Background<A> {
    fn send_message(&self, message: &str) -> String {
        let response = self.handle(message);
        serde_json::to_string(&response).unwrap_or_else(|why| {
            let why = Error::Serializing(why, "answering a stylesheet request");
            format!(r#"{{"status":"error","error":{:?}}}"#, why.to_string())
        })
    }
}

/// Decode a payload received over the channel.
pub fn decode(url: &str, payload: &str) -> Result<String> {
    let response: MessageResponse = serde_json::from_str(payload)
        .map_err(|why| Error::Deserializing(why, "decoding a stylesheet response"))?;
    match response {
        MessageResponse::Ok { text } => Ok(text),
        MessageResponse::Error { error } => Err(Error::Fetch(url.to_owned(), error)),
    }
}
