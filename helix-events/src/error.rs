use std::fmt;

#[derive(Debug)]
pub enum EventError {
    /// The bus stopped accepting events.
    Closed,
    /// A publisher could not hand the event over.
    Publish(String),
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::Closed => write!(f, "Event bus closed"),
            EventError::Publish(msg) => write!(f, "Event publish failed: {}", msg),
        }
    }
}

impl std::error::Error for EventError {}
