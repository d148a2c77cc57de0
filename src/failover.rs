//! Failover transport URIs.
//!
//! `failover:(tcp://a:61613,tcp://b:61613)?initialReconnectDelay=100`
//! describes a deterministic sequence of broker endpoints with reconnect
//! delays, mirroring the ActiveMQ failover transport options. The core
//! only produces the schedule; connecting and sleeping are the driver's
//! job.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

/// Failover URI parse failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailoverError {
    #[error("failover URI must start with 'failover:'")]
    MissingScheme,

    #[error("unbalanced parentheses in failover URI")]
    UnbalancedParentheses,

    #[error("failover URI names no broker")]
    EmptyBrokerList,

    #[error("invalid broker URI {0:?}: {1}")]
    InvalidBrokerUri(String, String),

    #[error("unknown failover option: {0:?}")]
    UnknownOption(String),

    #[error("invalid value {value:?} for failover option {option:?}")]
    InvalidOptionValue { option: String, value: String },
}

/// Transport scheme of a single broker endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Tcp,
    Ssl,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Tcp => "tcp",
            Scheme::Ssl => "ssl",
        }
    }
}

/// One broker endpoint: `tcp://host:port` or `ssl://host:port`.
///
/// Round-trips exactly through `FromStr` and `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerUri {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl FromStr for BrokerUri {
    type Err = FailoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| FailoverError::InvalidBrokerUri(s.to_string(), reason.into());
        let (scheme, rest) = s.split_once("://").ok_or_else(|| invalid("missing '://'"))?;
        let scheme = match scheme {
            "tcp" => Scheme::Tcp,
            "ssl" => Scheme::Ssl,
            _ => return Err(invalid("scheme must be tcp or ssl")),
        };
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for BrokerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}

/// Reconnect options, named and defaulted as in the ActiveMQ failover
/// transport.
#[derive(Debug, Clone, PartialEq)]
pub struct FailoverOptions {
    /// Delay in ms before the first retry after a failure.
    pub initial_reconnect_delay: u64,
    /// Upper cap on any delay, in ms.
    pub max_reconnect_delay: u64,
    /// Grow the delay by `back_off_multiplier` on every retry.
    pub use_exponential_back_off: bool,
    pub back_off_multiplier: f64,
    /// `-1` = unlimited, `0` = never reconnect, `>0` = retry cap.
    pub max_reconnect_attempts: i32,
    /// When `>0`, overrides `max_reconnect_attempts` until the first
    /// successful connect.
    pub startup_max_reconnect_attempts: i32,
    /// Shuffle the endpoint list at the start of every cycle.
    pub randomize: bool,
}

impl Default for FailoverOptions {
    fn default() -> Self {
        Self {
            initial_reconnect_delay: 10,
            max_reconnect_delay: 30_000,
            use_exponential_back_off: true,
            back_off_multiplier: 2.0,
            max_reconnect_attempts: -1,
            startup_max_reconnect_attempts: 0,
            randomize: true,
        }
    }
}

/// A parsed failover URI: broker list plus reconnect options.
///
/// Accepted grammar: `failover:(uri1,uri2,...)?opt=value&...` or the
/// shorthand `failover:uri1,uri2,...` (which takes no options).
#[derive(Debug, Clone, PartialEq)]
pub struct FailoverUri {
    pub brokers: Vec<BrokerUri>,
    pub options: FailoverOptions,
}

impl FromStr for FailoverUri {
    type Err = FailoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("failover:")
            .ok_or(FailoverError::MissingScheme)?;

        let (list, query) = if let Some(inner) = rest.strip_prefix('(') {
            let close = inner
                .find(')')
                .ok_or(FailoverError::UnbalancedParentheses)?;
            let after = &inner[close + 1..];
            let query = match after.strip_prefix('?') {
                Some(q) => Some(q),
                None if after.is_empty() => None,
                None => return Err(FailoverError::UnbalancedParentheses),
            };
            (&inner[..close], query)
        } else {
            (rest, None)
        };

        let mut brokers = Vec::new();
        for uri in list.split(',') {
            let uri = uri.trim();
            if uri.is_empty() {
                continue;
            }
            brokers.push(uri.parse::<BrokerUri>()?);
        }
        if brokers.is_empty() {
            return Err(FailoverError::EmptyBrokerList);
        }

        let mut options = FailoverOptions::default();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    FailoverError::InvalidOptionValue {
                        option: pair.to_string(),
                        value: String::new(),
                    }
                })?;
                apply_option(&mut options, key, value)?;
            }
        }

        Ok(Self { brokers, options })
    }
}

fn apply_option(options: &mut FailoverOptions, key: &str, value: &str) -> Result<(), FailoverError> {
    fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, FailoverError> {
        value
            .parse::<T>()
            .map_err(|_| FailoverError::InvalidOptionValue {
                option: key.to_string(),
                value: value.to_string(),
            })
    }

    match key {
        "initialReconnectDelay" => options.initial_reconnect_delay = parse(key, value)?,
        "maxReconnectDelay" => options.max_reconnect_delay = parse(key, value)?,
        "useExponentialBackOff" => options.use_exponential_back_off = parse(key, value)?,
        "backOffMultiplier" => options.back_off_multiplier = parse(key, value)?,
        "maxReconnectAttempts" => options.max_reconnect_attempts = parse(key, value)?,
        "startupMaxReconnectAttempts" => {
            options.startup_max_reconnect_attempts = parse(key, value)?
        }
        "randomize" => options.randomize = parse(key, value)?,
        _ => return Err(FailoverError::UnknownOption(key.to_string())),
    }
    Ok(())
}

impl FailoverUri {
    /// Start the reconnect schedule with an entropy-seeded RNG.
    pub fn schedule(&self) -> Failover {
        self.schedule_with_rng(StdRng::from_entropy())
    }

    /// Start the reconnect schedule with a fixed seed, for deterministic
    /// shuffling in tests.
    pub fn schedule_seeded(&self, seed: u64) -> Failover {
        self.schedule_with_rng(StdRng::seed_from_u64(seed))
    }

    fn schedule_with_rng(&self, rng: StdRng) -> Failover {
        Failover {
            brokers: self.brokers.clone(),
            options: self.options.clone(),
            rng,
            cursor: 0,
            attempt: 0,
            next_delay: self.options.initial_reconnect_delay,
            connected_once: false,
        }
    }
}

/// Lazy sequence of `(endpoint, delay_ms)` connect attempts.
///
/// The first pair carries delay 0; every later pair carries the back-off
/// delay to wait before trying its endpoint. End of iteration means the
/// attempt cap is exhausted and the driver must treat the connection as
/// permanently failed. After a successful connect, [`reset`](Failover::reset)
/// restarts the schedule (and retires the startup attempt cap).
#[derive(Debug, Clone)]
pub struct Failover {
    brokers: Vec<BrokerUri>,
    options: FailoverOptions,
    rng: StdRng,
    cursor: usize,
    attempt: u64,
    next_delay: u64,
    connected_once: bool,
}

impl Failover {
    /// Restart the schedule after a successful connect: the attempt
    /// counter and delay reset, and `startupMaxReconnectAttempts` no
    /// longer applies.
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.next_delay = self.options.initial_reconnect_delay;
        self.connected_once = true;
    }

    fn attempt_cap(&self) -> i32 {
        if !self.connected_once && self.options.startup_max_reconnect_attempts > 0 {
            self.options.startup_max_reconnect_attempts
        } else {
            self.options.max_reconnect_attempts
        }
    }
}

impl Iterator for Failover {
    type Item = (BrokerUri, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let cap = self.attempt_cap();
        if cap >= 0 && self.attempt > cap as u64 {
            return None;
        }

        // wrapping back to the head starts a new cycle
        if self.cursor == 0 && self.options.randomize {
            self.brokers.shuffle(&mut self.rng);
        }

        let delay = if self.attempt == 0 {
            0
        } else {
            let delay = self.next_delay.min(self.options.max_reconnect_delay);
            if self.options.use_exponential_back_off {
                let grown = (self.next_delay as f64) * self.options.back_off_multiplier;
                self.next_delay = if grown >= self.options.max_reconnect_delay as f64 {
                    self.options.max_reconnect_delay
                } else {
                    grown as u64
                };
            }
            delay
        };

        let broker = self.brokers[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.brokers.len();
        self.attempt += 1;
        debug!(broker = %broker, delay_ms = delay, attempt = self.attempt, "failover attempt scheduled");
        Some((broker, delay))
    }
}
