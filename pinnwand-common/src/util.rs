use thiserror::Error;
use time::Duration;

/// A strictly positive span of time. Token lifetimes are stored as this so
/// an expiry of zero or less cannot be represented.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Default, Hash)]
pub struct PositiveDuration(Duration);

impl PositiveDuration {
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        duration.is_positive().then_some(Self(duration))
    }

    /// Panics when the duration is not positive. Meant for durations that
    /// are fixed at compile time, like the token lifetime.
    #[must_use]
    pub fn new_unchecked(duration: Duration) -> Self {
        Self::new(duration).expect("Duration was not positive.")
    }

    #[must_use]
    pub fn get(self) -> Duration {
        self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The duration is not positive: {0}")]
pub struct NonPositiveDurationError(Duration);

impl TryFrom<Duration> for PositiveDuration {
    type Error = NonPositiveDurationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NonPositiveDurationError(value))
    }
}

#[cfg(test)]
mod tests {
    use crate::util::PositiveDuration;
    use time::Duration;

    #[test]
    fn rejects_non_positive_durations() {
        assert_eq!(PositiveDuration::new(Duration::ZERO), None);
        assert_eq!(PositiveDuration::new(Duration::seconds(-1)), None);
        assert!(PositiveDuration::new(Duration::seconds(1)).is_some());
    }

    #[test]
    fn round_trips_through_try_from() {
        let duration = Duration::days(30);
        let positive = PositiveDuration::try_from(duration).unwrap();
        assert_eq!(positive.get(), duration);
    }
}
