//! Core traits for testability and abstraction.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Trait for reading the current time.
///
/// Due dates are compared against local wall-clock time while creation
/// timestamps are recorded in UTC. Abstracting the clock lets tests freeze
/// "now" at a known instant.
pub trait Clock {
    /// The current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// The current local wall-clock time, without a timezone.
    fn now_local(&self) -> NaiveDateTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a single instant.
///
/// Both readings return the same wall-clock value, so a fixed clock behaves
/// as if the local timezone were UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0.and_utc()
    }

    fn now_local(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_utc(&self) -> DateTime<Utc> {
        (**self).now_utc()
    }

    fn now_local(&self) -> NaiveDateTime {
        (**self).now_local()
    }
}
