use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallSetupError {
    #[error("unknown OAuth call provider '{0}'")]
    UnknownProvider(String),
    #[error("invalid Jitsi server url '{url}': {source}")]
    InvalidJitsiUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("realm video chat provider id {0} is not among the available providers")]
    UnavailableVideoChatProvider(i64),
}
