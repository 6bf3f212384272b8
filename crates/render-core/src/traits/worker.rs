//! Worker traits

use futures::future::BoxFuture;

use crate::error::SessionError;
use crate::traits::BoxedStream;
use crate::types::SessionId;

/// The work a session performs; resolves to the session's exit status
pub type SessionJob = BoxFuture<'static, i32>;

/// Consumes data streams on behalf of the server
///
/// The server decides when sessions start and when they are reaped; the
/// worker decides what happens to the bytes.
pub trait Worker: Send + Sync {
    /// Build the job for a freshly accepted stream
    ///
    /// The stream has already had its flags word consumed. Returning an error
    /// drops the stream without registering a session.
    fn create(&self, id: SessionId, stream: BoxedStream) -> Result<SessionJob, SessionError>;

    /// Release downstream resources
    ///
    /// Called exactly once, after every session has been joined during
    /// drain. Never called when the server exits through STOP.
    fn finalize(&self) {}
}
