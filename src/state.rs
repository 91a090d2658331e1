use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::logging::log_stale_response;
use crate::shape::TargetFeature;

pub const DEFAULT_BACKEND: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Url,
    pub timeout_secs: Option<u64>,
    pub sample_limit: usize,
    pub target: TargetFeature,
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Url::parse(DEFAULT_BACKEND).expect("default backend url"),
            timeout_secs: None,
            sample_limit: 5,
            target: TargetFeature::default(),
            top_n: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `GRIDLENS_*` values supplied by `get`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let backend = match get("GRIDLENS_BACKEND") {
            Some(raw) => parse_backend(&raw)?,
            None => defaults.backend,
        };
        Ok(Self {
            backend,
            timeout_secs: parse_number(&get, "GRIDLENS_TIMEOUT_SECS")?,
            sample_limit: parse_number(&get, "GRIDLENS_SAMPLE_LIMIT")?
                .unwrap_or(defaults.sample_limit),
            target: TargetFeature::new(
                get("GRIDLENS_TARGET").unwrap_or(defaults.target.name),
                get("GRIDLENS_TARGET_CLASS").unwrap_or(defaults.target.categorical),
            ),
            top_n: parse_number(&get, "GRIDLENS_TOP_N")?.unwrap_or(defaults.top_n),
        })
    }

    pub fn with_backend(mut self, raw: &str) -> Result<Self> {
        self.backend = parse_backend(raw)?;
        Ok(self)
    }

    /// Joins `path` onto the backend base, keeping any path prefix the base carries.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.backend.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path))
    }
}

fn parse_number<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid {} {:?}", key, raw))
        })
        .transpose()
}

fn parse_backend(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid backend url {:?}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!("unsupported backend scheme {:?}", other)),
    }
}

// =============================================================================
// Result slots
// =============================================================================

/// Identifies one request issued against a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Holds the latest result of one kind of request.
///
/// Every request takes a ticket before it is sent. A response is stored only
/// if its ticket is still the newest one issued; older responses are dropped.
/// A failed request records its message but keeps the last good value.
#[derive(Debug)]
pub struct Slot<T> {
    name: &'static str,
    issued: u64,
    completed: u64,
    value: Option<T>,
    error: Option<String>,
}

impl<T> Slot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            issued: 0,
            completed: 0,
            value: None,
            error: None,
        }
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Returns false when the response was stale and discarded.
    pub fn complete(&mut self, ticket: Ticket, result: Result<T, String>) -> bool {
        if ticket.0 != self.issued {
            log_stale_response(self.name, ticket.0, self.issued);
            return false;
        }
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
            }
            Err(message) => self.error = Some(message),
        }
        self.completed = ticket.0;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.completed < self.issued
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl<T: Clone> Slot<T> {
    pub fn snapshot(&self) -> SlotSnapshot<T> {
        SlotSnapshot {
            value: self.value.clone(),
            error: self.error.clone(),
            pending: self.is_pending(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotSnapshot<T> {
    pub value: Option<T>,
    pub error: Option<String>,
    pub pending: bool,
}

/// A slot shared between concurrently running requests.
#[derive(Debug)]
pub struct SharedSlot<T>(Arc<Mutex<Slot<T>>>);

impl<T> Clone for SharedSlot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> SharedSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self(Arc::new(Mutex::new(Slot::new(name))))
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // A poisoned slot still holds consistent data; every write is a single assignment.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn issue(&self) -> Ticket {
        self.lock().issue()
    }

    pub fn complete(&self, ticket: Ticket, result: Result<T, String>) -> bool {
        self.lock().complete(ticket, result)
    }
}

impl<T: Clone> SharedSlot<T> {
    pub fn snapshot(&self) -> SlotSnapshot<T> {
        self.lock().snapshot()
    }
}
