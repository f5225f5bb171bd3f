//! Small stateless helpers: rate limiting, validation, escaping.
//!
//! `Throttle`, `Debouncer` and `sanitize_html` are for front-ends rendering
//! the event stream; the crate itself does not call them.

use std::future::Future;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::task::JoinHandle;

use crate::config::messages;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static SPECIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("valid special-char regex"));

const MIN_PASSWORD_LENGTH: usize = 8;

/// Lets a call through at most once per `interval`.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true (and starts a new window) if the previous accepted call is
    /// at least `interval` old.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    fn ready_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Runs only the most recent of a burst of calls, `delay` after it arrived.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `work`, cancelling anything scheduled earlier and not yet run.
    /// Must be called from within a tokio runtime.
    pub fn call<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        }));
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

/// Escape text for inclusion in HTML.
pub fn sanitize_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// A user-presentable message for any error.
pub fn format_error(error: &anyhow::Error) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        messages::GENERIC_ERROR.to_string()
    } else {
        message
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLevel {
    Weak,
    Medium,
    Strong,
}

impl std::fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weak => write!(f, "weak"),
            Self::Medium => write!(f, "medium"),
            Self::Strong => write!(f, "strong"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasswordRequirements {
    pub min_length: bool,
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_number: bool,
    pub has_special: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    /// Number of requirements met, 0..=5
    pub score: u8,
    pub level: StrengthLevel,
    pub requirements: PasswordRequirements,
}

pub fn check_password_strength(password: &str) -> PasswordStrength {
    let requirements = PasswordRequirements {
        min_length: password.chars().count() >= MIN_PASSWORD_LENGTH,
        has_upper: password.chars().any(|c| c.is_ascii_uppercase()),
        has_lower: password.chars().any(|c| c.is_ascii_lowercase()),
        has_number: password.chars().any(|c| c.is_ascii_digit()),
        has_special: SPECIAL_RE.is_match(password),
    };

    let score = [
        requirements.min_length,
        requirements.has_upper,
        requirements.has_lower,
        requirements.has_number,
        requirements.has_special,
    ]
    .iter()
    .filter(|met| **met)
    .count() as u8;

    let level = match score {
        4.. => StrengthLevel::Strong,
        3 => StrengthLevel::Medium,
        _ => StrengthLevel::Weak,
    };

    PasswordStrength {
        score,
        level,
        requirements,
    }
}

/// Opaque unique id, used to correlate log lines of one request.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
