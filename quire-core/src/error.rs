use thiserror::Error;

/// All errors produced by quire-core.
#[derive(Debug, Error)]
pub enum QuireError {
    /// The backend handled the command and rejected it, carrying its own
    /// error detail. This is the normal failure path of the boundary.
    #[error("command '{command}' rejected by backend: {detail}")]
    CommandRejected {
        command: &'static str,
        detail: String,
    },

    /// The transport dropped the reply channel before the backend answered.
    #[error("transport dropped the reply for '{0}'")]
    ReplyDropped(&'static str),

    /// A request failed to serialize, or a reply did not match the shape the
    /// registry declares for this command.
    #[error("malformed payload for '{command}': {source}")]
    Payload {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The settings file could not be re-read as a settings object. Reload
    /// bypasses the tolerant merge, so this only fires on a file that was not
    /// produced by a prior save.
    #[error("settings reload failed: {0}")]
    SettingsReload(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuireError>;
