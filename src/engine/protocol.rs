//! Wire contract of the native engine.
//!
//! Each call is one `Request` answered by one `Envelope`. On the wire both
//! are single-line JSON objects:
//!
//! ```text
//! -> {"op":"createCommand","name":"serve"}
//! <- {"success":true,"data":7}
//! -> {"op":"addOption","handle":7,"flags":"-p, --port <n>","description":"Port"}
//! <- {"success":false,"error":"Invalid command ID","code":1}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::OptionValue;

/// Largest handle the engine may hand out (2^53 - 1).
pub const MAX_HANDLE: u64 = 9_007_199_254_740_991;

/// Opaque identifier of a command inside the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Handle(u64);

impl Handle {
    /// Validate a raw identifier. Zero and values above [`MAX_HANDLE`] are invalid.
    pub fn new(raw: u64) -> Option<Handle> {
        if raw == 0 || raw > MAX_HANDLE {
            None
        } else {
            Some(Handle(raw))
        }
    }

    /// The raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Handle {
    type Error = String;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Handle::new(raw).ok_or_else(|| format!("invalid command handle {}", raw))
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> u64 {
        handle.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error codes the native engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCode {
    Success,
    InvalidId,
    NullParam,
    ParseFail,
    Memory,
    Other(i32),
}

impl NativeCode {
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => NativeCode::Success,
            1 => NativeCode::InvalidId,
            2 => NativeCode::NullParam,
            3 => NativeCode::ParseFail,
            4 => NativeCode::Memory,
            other => NativeCode::Other(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            NativeCode::Success => 0,
            NativeCode::InvalidId => 1,
            NativeCode::NullParam => 2,
            NativeCode::ParseFail => 3,
            NativeCode::Memory => 4,
            NativeCode::Other(code) => code,
        }
    }
}

/// One call against the engine's fixed function contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Hello,
    Version,
    IsAvailable,
    GetLastError,
    CreateCommand {
        name: String,
    },
    AddOption {
        handle: u64,
        flags: String,
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<OptionValue>,
    },
    AddArgument {
        handle: u64,
        name: String,
        description: String,
        required: bool,
    },
    AddChild {
        parent: u64,
        child: u64,
    },
    SetDescription {
        handle: u64,
        text: String,
    },
    SetVersion {
        handle: u64,
        text: String,
    },
    SetAllowUnknown {
        handle: u64,
        allow: bool,
    },
    /// `key` is the option's canonical name
    SetOptionHidden {
        handle: u64,
        key: String,
        hidden: bool,
    },
    SetOptionEnv {
        handle: u64,
        key: String,
        env: String,
    },
    ParseArgs {
        handle: u64,
        argv: Vec<String>,
    },
    GetHelp {
        handle: u64,
    },
    AddRef {
        handle: u64,
    },
    Release {
        handle: u64,
    },
}

impl Request {
    /// Contract name of the call, used in errors and logs.
    pub fn op(&self) -> &'static str {
        match self {
            Request::Hello => "hello",
            Request::Version => "version",
            Request::IsAvailable => "isAvailable",
            Request::GetLastError => "getLastError",
            Request::CreateCommand { .. } => "createCommand",
            Request::AddOption { .. } => "addOption",
            Request::AddArgument { .. } => "addArgument",
            Request::AddChild { .. } => "addChild",
            Request::SetDescription { .. } => "setDescription",
            Request::SetVersion { .. } => "setVersion",
            Request::SetAllowUnknown { .. } => "setAllowUnknown",
            Request::SetOptionHidden { .. } => "setOptionHidden",
            Request::SetOptionEnv { .. } => "setOptionEnv",
            Request::ParseArgs { .. } => "parseArgs",
            Request::GetHelp { .. } => "getHelp",
            Request::AddRef { .. } => "addRef",
            Request::Release { .. } => "release",
        }
    }

    /// The command handle this call targets, if any.
    pub fn handle(&self) -> Option<u64> {
        match self {
            Request::AddOption { handle, .. }
            | Request::AddArgument { handle, .. }
            | Request::SetDescription { handle, .. }
            | Request::SetVersion { handle, .. }
            | Request::SetAllowUnknown { handle, .. }
            | Request::SetOptionHidden { handle, .. }
            | Request::SetOptionEnv { handle, .. }
            | Request::ParseArgs { handle, .. }
            | Request::GetHelp { handle }
            | Request::AddRef { handle }
            | Request::Release { handle } => Some(*handle),
            Request::AddChild { child, .. } => Some(*child),
            _ => None,
        }
    }
}

/// Result envelope returned for every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl Envelope {
    /// A successful envelope carrying `data`.
    pub fn ok(data: impl Into<Value>) -> Self {
        Envelope {
            success: true,
            data: Some(data.into()),
            error: None,
            code: None,
        }
    }

    /// A successful envelope with no payload.
    pub fn empty() -> Self {
        Envelope {
            success: true,
            data: None,
            error: None,
            code: None,
        }
    }

    /// A failed envelope.
    pub fn err(code: NativeCode, message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code.as_i32()),
        }
    }
}
