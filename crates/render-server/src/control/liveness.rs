//! Control connection liveness tracking

use std::time::Duration;

use tokio::time::Instant;

/// What to do after a silent wait on the control connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessCheck {
    /// No PING is outstanding; send one
    SendPing,
    /// A PING is outstanding but younger than the timeout
    Waiting,
    /// A PING has gone unanswered for at least the timeout
    Dead { waited: Duration },
}

/// Tracks the single outstanding PING on a control connection
///
/// A silent window sends a PING; a PONG clears it. If the next silent window
/// ends with the PING still unanswered the connection is considered dead,
/// so two consecutive missed windows trigger a teardown.
#[derive(Debug, Clone)]
pub struct Liveness {
    /// Silence allowed before probing, and probe lifetime
    timeout: Duration,
    /// When the unanswered PING was sent
    ping_sent_at: Option<Instant>,
}

impl Liveness {
    /// Create a tracker with no PING outstanding
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ping_sent_at: None,
        }
    }

    /// Silence allowed before probing
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Decide what a silent window means at `now`
    pub fn check(&self, now: Instant) -> LivenessCheck {
        match self.ping_sent_at {
            None => LivenessCheck::SendPing,
            Some(sent) => {
                let waited = now.saturating_duration_since(sent);
                if waited >= self.timeout {
                    LivenessCheck::Dead { waited }
                } else {
                    LivenessCheck::Waiting
                }
            }
        }
    }

    /// Record that a PING went out at `now`
    pub fn ping_sent(&mut self, now: Instant) {
        self.ping_sent_at = Some(now);
    }

    /// Record that the peer answered
    pub fn pong_received(&mut self) {
        self.ping_sent_at = None;
    }

    /// Whether a PING is waiting for its PONG
    pub fn is_outstanding(&self) -> bool {
        self.ping_sent_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_first_silence_sends_ping() {
        let liveness = Liveness::new(TIMEOUT);
        assert_eq!(liveness.check(Instant::now()), LivenessCheck::SendPing);
        assert!(!liveness.is_outstanding());
    }

    #[test]
    fn test_second_silence_is_dead() {
        let start = Instant::now();
        let mut liveness = Liveness::new(TIMEOUT);
        liveness.ping_sent(start);

        assert_eq!(
            liveness.check(start + TIMEOUT),
            LivenessCheck::Dead { waited: TIMEOUT }
        );
    }

    #[test]
    fn test_young_ping_keeps_waiting() {
        let start = Instant::now();
        let mut liveness = Liveness::new(TIMEOUT);
        liveness.ping_sent(start);

        assert_eq!(
            liveness.check(start + Duration::from_secs(2)),
            LivenessCheck::Waiting
        );
    }

    #[test]
    fn test_pong_clears_outstanding_ping() {
        let start = Instant::now();
        let mut liveness = Liveness::new(TIMEOUT);
        liveness.ping_sent(start);
        liveness.pong_received();

        // Long after the old PING, a fresh one is due rather than a teardown
        assert_eq!(
            liveness.check(start + TIMEOUT * 3),
            LivenessCheck::SendPing
        );
    }
}
