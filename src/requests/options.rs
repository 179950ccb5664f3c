use std::time::Duration;

/// Per-submission options.
///
/// `timeout` bounds how long a request may wait **in the queue**. It never
/// limits the executor itself; a request that has started runs until its
/// executor returns.
///
/// - `None` → inherit `Config::queue_timeout_ms` (which may itself be "no timeout")
/// - `Some(Duration::ZERO)` → explicitly no timeout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Maximum time spent queued before the request is rejected with `Timeout`.
    pub timeout: Option<Duration>,
}

impl SubmitOptions {
    /// Options inheriting every default from the engine config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue wait timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Convenience for `with_timeout(Duration::from_millis(ms))`.
    pub fn with_timeout_ms(self, ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(ms))
    }

    /// Resolves the effective wait timeout against the engine default.
    pub(crate) fn effective_timeout(&self, default: Option<Duration>) -> Option<Duration> {
        match self.timeout {
            Some(d) if d.is_zero() => None,
            Some(d) => Some(d),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherits_default_timeout() {
        let opts = SubmitOptions::new();
        assert_eq!(
            opts.effective_timeout(Some(Duration::from_secs(3))),
            Some(Duration::from_secs(3))
        );
        assert_eq!(opts.effective_timeout(None), None);
    }

    #[test]
    fn test_zero_disables_timeout() {
        let opts = SubmitOptions::new().with_timeout(Duration::ZERO);
        assert_eq!(opts.effective_timeout(Some(Duration::from_secs(3))), None);
    }

    #[test]
    fn test_explicit_timeout_wins() {
        let opts = SubmitOptions::new().with_timeout_ms(50);
        assert_eq!(
            opts.effective_timeout(Some(Duration::from_secs(3))),
            Some(Duration::from_millis(50))
        );
    }
}
