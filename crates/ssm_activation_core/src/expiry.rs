use chrono::{DateTime, Duration, Utc};

/// How long a freshly created activation stays usable.
pub fn activation_lifetime() -> Duration {
    Duration::hours(1)
}

/// Expiry is derived from the invocation's clock reading, never from process
/// start, so warm containers keep issuing activations that expire in the future.
pub fn activation_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + activation_lifetime()
}
