/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Engine builder for fluent configuration.
//!
//! This module provides a builder API for configuring FIX engines.

use crate::application::{Application, NoOpApplication};
use ironfix_session::config::SessionConfig;
use std::sync::Arc;
use std::time::Duration;

/// Engine-wide knobs, grouped the way [`SessionConfig`] groups per-session
/// knobs: connection lifecycle timing plus the worker pool sizing for the
/// per-session single-writer sequencers.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether to use TLS.
    pub use_tls: bool,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Reconnect interval.
    pub reconnect_interval: Duration,
    /// Maximum reconnect attempts.
    pub max_reconnect_attempts: u32,
    /// Number of worker threads available to service per-session sequencers.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_tls: false,
            connect_timeout: Duration::from_secs(30),
            reconnect_interval: Duration::from_secs(5),
            max_reconnect_attempts: 10,
            worker_threads: std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(4),
        }
    }
}

/// Builder for configuring a FIX engine.
#[derive(Debug)]
pub struct EngineBuilder<A: Application = NoOpApplication> {
    /// Application callback handler.
    application: Arc<A>,
    /// Session configurations.
    sessions: Vec<SessionConfig>,
    /// Whether to use TLS.
    use_tls: bool,
    /// Connection timeout.
    connect_timeout: Duration,
    /// Reconnect interval.
    reconnect_interval: Duration,
    /// Maximum reconnect attempts.
    max_reconnect_attempts: u32,
    /// Number of worker threads for per-session sequencers.
    worker_threads: usize,
}

impl Default for EngineBuilder<NoOpApplication> {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder<NoOpApplication> {
    /// Creates a new engine builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            application: Arc::new(NoOpApplication),
            sessions: Vec::new(),
            use_tls: false,
            connect_timeout: Duration::from_secs(30),
            reconnect_interval: Duration::from_secs(5),
            max_reconnect_attempts: 10,
            worker_threads: EngineConfig::default().worker_threads,
        }
    }
}

impl<A: Application> EngineBuilder<A> {
    /// Sets the application callback handler.
    #[must_use]
    pub fn with_application<B: Application>(self, application: B) -> EngineBuilder<B> {
        EngineBuilder {
            application: Arc::new(application),
            sessions: self.sessions,
            use_tls: self.use_tls,
            connect_timeout: self.connect_timeout,
            reconnect_interval: self.reconnect_interval,
            max_reconnect_attempts: self.max_reconnect_attempts,
            worker_threads: self.worker_threads,
        }
    }

    /// Adds a session configuration.
    #[must_use]
    pub fn add_session(mut self, config: SessionConfig) -> Self {
        self.sessions.push(config);
        self
    }

    /// Enables TLS for connections.
    #[must_use]
    pub const fn with_tls(mut self, enabled: bool) -> Self {
        self.use_tls = enabled;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reconnect interval.
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Sets the maximum reconnect attempts.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Returns the configured sessions.
    #[must_use]
    pub fn sessions(&self) -> &[SessionConfig] {
        &self.sessions
    }

    /// Returns whether TLS is enabled.
    #[must_use]
    pub const fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the reconnect interval.
    #[must_use]
    pub const fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Returns the maximum reconnect attempts.
    #[must_use]
    pub const fn max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts
    }

    /// Returns the application handler.
    #[must_use]
    pub fn application(&self) -> Arc<A> {
        Arc::clone(&self.application)
    }

    /// Sets the worker pool size used to service per-session sequencers.
    #[must_use]
    pub const fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Returns the configured worker pool size.
    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Collects the engine-wide knobs into an [`EngineConfig`].
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            use_tls: self.use_tls,
            connect_timeout: self.connect_timeout,
            reconnect_interval: self.reconnect_interval,
            max_reconnect_attempts: self.max_reconnect_attempts,
            worker_threads: self.worker_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironfix_core::types::CompId;

    #[test]
    fn test_engine_builder_default() {
        let builder = EngineBuilder::new();
        assert!(!builder.use_tls());
        assert_eq!(builder.connect_timeout(), Duration::from_secs(30));
        assert_eq!(builder.max_reconnect_attempts(), 10);
        assert!(builder.sessions().is_empty());
    }

    #[test]
    fn test_engine_builder_with_session() {
        let config = SessionConfig::new(
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
            "FIX.4.4",
        );

        let builder = EngineBuilder::new()
            .add_session(config)
            .with_tls(true)
            .with_connect_timeout(Duration::from_secs(60));

        assert_eq!(builder.sessions().len(), 1);
        assert!(builder.use_tls());
        assert_eq!(builder.connect_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_engine_config_from_builder() {
        let builder = EngineBuilder::new().with_worker_threads(2).with_tls(true);
        let config = builder.engine_config();
        assert_eq!(config.worker_threads, 2);
        assert!(config.use_tls);
    }
}
