use thiserror::Error;

/// Errors surfaced by the operation tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A fetch reported a plain failure message. Convenient for fetch
    /// closures that have no richer error type of their own.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The tracker was already disposed when the operation was requested.
    #[error("operation tracker already disposed")]
    Disposed,
}

impl TrackerError {
    /// Create a [`TrackerError::Fetch`] with a message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_messages() {
        let e = TrackerError::fetch("connection reset");
        assert_eq!(e.to_string(), "fetch failed: connection reset");
        assert_eq!(
            TrackerError::Disposed.to_string(),
            "operation tracker already disposed"
        );
    }
}
