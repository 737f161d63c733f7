use std::fmt;

use soia_core::CodecError;

/// Errors raised while assembling a [`crate::Service`] (method registration).
#[derive(Debug)]
pub enum RegistryError {
    /// Two methods were registered under the same method number.
    DuplicateRegistration { name: String, number: i32 },
    /// A method was registered after the service had already been built.
    FinalizedMutation { name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateRegistration { name, number } => {
                write!(f, "method number {} is already registered (tried to add {:?})", number, name)
            }
            RegistryError::FinalizedMutation { name } => {
                write!(f, "cannot register method {:?}: service is already built", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors raised while dispatching a single RPC request (§7 propagation
/// table): codec errors on the request path and routing errors both map to
/// 400, handler errors map to 500.
#[derive(Debug)]
pub enum HandlerError {
    /// The request envelope or request body failed to decode.
    Codec(CodecError),
    /// The envelope named a method that does not exist, or a name that
    /// matches more than one registered method.
    Routing(String),
    /// The user-supplied handler returned an error.
    Handler(String),
}

impl HandlerError {
    /// Status code this error maps to on the RPC boundary (§7, §6.3).
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Codec(_) => 400,
            HandlerError::Routing(_) => 400,
            HandlerError::Handler(_) => 500,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Codec(e) => write!(f, "malformed request: {}", e),
            HandlerError::Routing(msg) => write!(f, "routing error: {}", msg),
            HandlerError::Handler(msg) => write!(f, "handler error: {}", msg),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for HandlerError {
    fn from(e: CodecError) -> Self {
        HandlerError::Codec(e)
    }
}
