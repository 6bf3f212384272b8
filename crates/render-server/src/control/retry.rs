//! Fixed-delay retry for the control connection

use std::time::Duration;

use render_core::config::ServerConfig;

/// Retry policy that always waits the same amount of time
///
/// There is no cap on attempts and no growth: the server keeps trying to
/// reach its peer for as long as the process lives.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    /// Delay between attempts
    delay: Duration,
    /// Number of delays handed out so far
    attempts: u64,
}

impl FixedDelay {
    /// Create a policy from configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.retry_delay)
    }

    /// Create a policy with an explicit delay
    pub fn new(delay: Duration) -> Self {
        Self { delay, attempts: 0 }
    }

    /// Get the next delay and count the attempt
    pub fn next_delay(&mut self) -> Duration {
        self.attempts += 1;
        self.delay
    }

    /// Sleep for the next delay
    pub async fn wait(&mut self) {
        let delay = self.next_delay();
        tracing::info!("Reconnecting in {:?} (attempt {})", delay, self.attempts);
        tokio::time::sleep(delay).await;
    }

    /// Number of retries so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}
