use jiff::Timestamp;

/// Time source for cache expiry, injectable so tests can move time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
