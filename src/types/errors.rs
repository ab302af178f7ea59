use std::fmt;

// === AgentError ===

/// Errors from calls to a tab's in-page agent.
#[derive(Debug)]
pub enum AgentError {
    /// No agent is registered for the tab, or navigation invalidated it.
    Unavailable(String),
    /// The agent did not answer within the configured bound.
    Timeout(String),
    /// The transport to the agent failed outright.
    Transport(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Unavailable(tab) => write!(f, "No agent for tab: {}", tab),
            AgentError::Timeout(tab) => write!(f, "Agent timed out for tab: {}", tab),
            AgentError::Transport(msg) => write!(f, "Agent transport error: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {}

// === CommandError ===

/// Errors surfaced to callers of the command dispatcher.
///
/// Neither variant is retried automatically; any optimistic registry
/// update has been rolled back by the time the error is returned.
#[derive(Debug)]
pub enum CommandError {
    /// No agent is present or reachable for the target tab.
    AgentUnavailable(String),
    /// The remote call exceeded its bound (or the transport failed,
    /// which is indistinguishable at this boundary).
    Timeout(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::AgentUnavailable(tab) => {
                write!(f, "Agent unavailable for tab: {}", tab)
            }
            CommandError::Timeout(tab) => write!(f, "Command timed out for tab: {}", tab),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<AgentError> for CommandError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Unavailable(tab) => CommandError::AgentUnavailable(tab),
            AgentError::Timeout(tab) => CommandError::Timeout(tab),
            AgentError::Transport(msg) => CommandError::Timeout(msg),
        }
    }
}

// === SignalError ===

/// Schema violations in incoming push payloads or command requests.
#[derive(Debug)]
pub enum SignalError {
    /// A required field is absent or has the wrong type.
    MissingField(&'static str),
    /// A numeric field is outside its valid range.
    OutOfRange(String),
    /// The requested action is not part of the command vocabulary.
    UnknownAction(String),
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::MissingField(field) => write!(f, "Missing field: {}", field),
            SignalError::OutOfRange(msg) => write!(f, "Value out of range: {}", msg),
            SignalError::UnknownAction(action) => write!(f, "Unknown action: {}", action),
        }
    }
}

impl std::error::Error for SignalError {}

// === HostError ===

/// Errors from calls to the host browser boundary.
#[derive(Debug)]
pub enum HostError {
    /// The host side of the bridge is gone.
    Unavailable(String),
    /// The host rejected the request (privileged page, unknown tab, ...).
    Rejected(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Unavailable(msg) => write!(f, "Host unavailable: {}", msg),
            HostError::Rejected(msg) => write!(f, "Host rejected request: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}
