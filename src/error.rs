use core::fmt;

use thiserror::Error;
use tracing::{debug, error, warn};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("reqwest error: {_0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("serialization failed while {_1}: {_0}")]
    Serializing(#[source] serde_json::Error, &'static str),
    #[error("deserialization failed while {_1}: {_0}")]
    Deserializing(#[source] serde_json::Error, &'static str),
    #[error("io error while {_1}: {_0}")]
    Io(#[source] std::io::Error, &'static str),
    #[error("could not read configuration file: {_0}")]
    ReadingConfig(#[source] std::io::Error),
    #[error("could not deserialize configuration file: {_0}")]
    DeserializingConfig(#[source] toml::de::Error),
    #[error("failed parsing url patterns specified in the configuration: {_0}")]
    ParsingUrlPattern(#[source] regex::Error),
    #[error("Url {_0:?} returned status {_1}")]
    NonSuccessStatusCode(String, reqwest::StatusCode),
    #[error("invalid url {_0:?}")]
    InvalidUrl(String),
    #[error("fetching {_0:?} through the background failed: {_1}")]
    Fetch(String, String),
    #[error("rules of stylesheet {_0:?} are not accessible from this origin")]
    Security(String),
    #[error("invalid selector {_0:?}")]
    InvalidSelector(String),
    #[error("failed to parse rule {_0:?}")]
    InvalidRule(String),
    #[error("index {_0} is out of range for a rule list of length {_1}")]
    IndexSize(usize, usize),
    #[error("could not parse font value {_0:?}: {_1}")]
    ParsingFont(String, &'static str),
    #[error("invalid replacement {_0:?}, expected something like `serif=Georgia`")]
    InvalidReplacement(String),
}

pub trait ResultExt<T> {
    fn log_err(self) -> Option<T>;
    fn log_warn(self) -> Option<T>;
    fn log_debug(self) -> Option<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn log_err(self) -> Option<T> {
        match self {
            Ok(inner) => Some(inner),
            Err(why) => {
                let why = why.into();
                error!("{}", why);
                None
            }
        }
    }

    fn log_warn(self) -> Option<T> {
        match self {
            Ok(inner) => Some(inner),
            Err(why) => {
                let why = why.into();
                warn!("{}", why);
                None
            }
        }
    }

    fn log_debug(self) -> Option<T> {
        match self {
            Ok(inner) => Some(inner),
            Err(why) => {
                let why = why.into();
                debug!("{}", why);
                None
            }
        }
    }
}

/// Debug print the given value using [`debug`].
pub fn pass_debug<T: fmt::Debug>(t: T) -> T {
    debug!("{:#?}", &t);
    t
}
