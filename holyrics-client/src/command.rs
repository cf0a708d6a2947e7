//! Commands understood by the controller's `/api` endpoint

use serde_json::{json, Value};

/// The commands used by the state poller and the lifecycle coordinator
///
/// Host actions can still send arbitrary commands through
/// [`CommandTransport::send`](crate::CommandTransport::send); this enum only
/// names the ones the adapter itself depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetBibleVersions,
    GetCurrentPresentation { include_slides: bool },
    GetAlert,
    GetF8,
    GetF9,
    GetF10,
}

impl Command {
    /// The path segment after `/api/`
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetBibleVersions => "GetBibleVersions",
            Command::GetCurrentPresentation { .. } => "GetCurrentPresentation",
            Command::GetAlert => "GetAlert",
            Command::GetF8 => "GetF8",
            Command::GetF9 => "GetF9",
            Command::GetF10 => "GetF10",
        }
    }

    /// JSON body sent with the command
    pub fn options(&self) -> Value {
        match self {
            Command::GetCurrentPresentation { include_slides } => {
                json!({ "include_slides": include_slides })
            }
            _ => json!({}),
        }
    }
}

/// Check that a command name looks like an identifier from the `/api` namespace
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
