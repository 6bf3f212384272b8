//! Shared fixtures for the supervisor integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::sync::mpsc;
use tokio::time::Instant;

use render_core::error::SessionError;
use render_core::traits::{BoxedStream, Dialer, SessionJob, StreamListener, Worker};
use render_core::SessionId;
use render_server::ServerEvent;

/// A dial the supervisor attempted
#[derive(Debug, Clone)]
pub struct DialAttempt {
    pub host: String,
    pub port: u16,
    pub at: Instant,
}

/// Dialer that hands out pre-arranged in-memory streams
///
/// Once the script runs out every dial is refused.
#[derive(Default)]
pub struct ScriptedDialer {
    streams: Mutex<VecDeque<BoxedStream>>,
    attempts: Mutex<Vec<DialAttempt>>,
}

impl ScriptedDialer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a stream for the next dial and return the peer's end
    pub fn push_stream(&self) -> DuplexStream {
        let (ours, theirs) = tokio::io::duplex(1024);
        self.streams.lock().unwrap().push_back(Box::new(ours));
        theirs
    }

    /// Queue an arbitrary stream for the next dial
    pub fn push_boxed(&self, stream: BoxedStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn attempts(&self) -> Vec<DialAttempt> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, host: &str, port: u16) -> io::Result<BoxedStream> {
        self.attempts.lock().unwrap().push(DialAttempt {
            host: host.to_string(),
            port,
            at: Instant::now(),
        });

        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }
}

/// Listener that hands out pre-arranged streams, then fails
#[derive(Default)]
pub struct ScriptedListener {
    streams: VecDeque<BoxedStream>,
}

impl ScriptedListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a stream for the next accept and return the client's end
    pub fn push_stream(&mut self) -> DuplexStream {
        let (ours, theirs) = tokio::io::duplex(1024);
        self.streams.push_back(Box::new(ours));
        theirs
    }
}

#[async_trait]
impl StreamListener for ScriptedListener {
    async fn accept(&mut self) -> io::Result<BoxedStream> {
        self.streams
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "listener torn down"))
    }

    fn address(&self) -> String {
        "scripted".to_string()
    }
}

/// Stream whose writes start failing once `budget` bytes went through
///
/// Reads keep working, so the only way the server notices is by writing.
pub struct WriteLimitedStream {
    inner: DuplexStream,
    budget: usize,
}

impl WriteLimitedStream {
    /// Create the stream and return it with the peer's end
    pub fn pair(budget: usize) -> (Self, DuplexStream) {
        let (ours, theirs) = tokio::io::duplex(1024);
        (Self { inner: ours, budget }, theirs)
    }
}

impl AsyncRead for WriteLimitedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for WriteLimitedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.budget == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write side closed",
            )));
        }

        let len = buf.len().min(this.budget);
        match Pin::new(&mut this.inner).poll_write(cx, &buf[..len]) {
            Poll::Ready(Ok(written)) => {
                this.budget -= written;
                Poll::Ready(Ok(written))
            }
            other => other,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Worker that refuses every stream
#[derive(Default)]
pub struct FailingWorker {
    attempts: AtomicUsize,
    finalized: AtomicUsize,
}

impl FailingWorker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }
}

impl Worker for FailingWorker {
    fn create(&self, id: SessionId, _stream: BoxedStream) -> Result<SessionJob, SessionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SessionError::Create(format!("{} refused by worker", id)))
    }

    fn finalize(&self) {
        self.finalized.fetch_add(1, Ordering::SeqCst);
    }
}

/// Worker that drains each stream to EOF and counts what happened
#[derive(Default)]
pub struct TrackingWorker {
    started: AtomicUsize,
    finished: Arc<AtomicUsize>,
    finalized: AtomicUsize,
    finished_at_finalize: AtomicUsize,
}

impl TrackingWorker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }

    /// How many sessions had finished when `finalize` ran
    pub fn finished_at_finalize(&self) -> usize {
        self.finished_at_finalize.load(Ordering::SeqCst)
    }

    /// Poll until `count` sessions have finished
    pub async fn wait_finished(&self, count: usize) {
        while self.finished() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Worker for TrackingWorker {
    fn create(&self, _id: SessionId, mut stream: BoxedStream) -> Result<SessionJob, SessionError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let finished = Arc::clone(&self.finished);

        Ok(Box::pin(async move {
            let status = match tokio::io::copy(&mut stream, &mut tokio::io::sink()).await {
                Ok(_) => 0,
                Err(_) => 1,
            };
            finished.fetch_add(1, Ordering::SeqCst);
            status
        }))
    }

    fn finalize(&self) {
        self.finished_at_finalize
            .store(self.finished(), Ordering::SeqCst);
        self.finalized.fetch_add(1, Ordering::SeqCst);
    }
}

/// Read one native-endian word from the peer side of a control stream
pub async fn read_word(stream: &mut DuplexStream) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf).await?;
    Ok(u32::from_ne_bytes(buf))
}

/// Write one native-endian word from the peer side of a control stream
pub async fn write_word(stream: &mut DuplexStream, word: u32) {
    stream.write_all(&word.to_ne_bytes()).await.unwrap();
}

/// Next event, failing the test if none arrives in time
pub async fn expect_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for server event")
        .expect("event channel closed")
}
