//! Execution engines.
//!
//! A command runs on one of two engines:
//! - The native engine, an external process driven through [`NativeAdapter`]
//! - The in-process [`fallback`] engine
//!
//! [`Runtime`] decides which one new commands bind to.

pub mod error;
pub mod fallback;
pub mod native;
pub mod probe;
pub mod protocol;
pub mod runtime;
pub mod transport;

pub use error::EngineError;
pub use native::NativeAdapter;
pub use probe::{EngineLoader, ProbeError, ProbeOutcome, ProcessLoader};
pub use protocol::{Handle, Request};
pub use runtime::{BackendStatus, Runtime};
pub use transport::{EngineTransport, LineTransport, ProcessTransport};
