//! Storage granularities for measurement rows.

/// Granularity tag stored on every row. `Raw` is the only directly sampled
/// granularity; the other three are always averages over RAW rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketDuration {
    Raw,
    Minute,
    Hour,
    Day,
}

impl BucketDuration {
    /// Duration in seconds; doubles as the stored column value and the
    /// query filter key.
    pub fn secs(&self) -> i64 {
        match self {
            BucketDuration::Raw => 10,
            BucketDuration::Minute => 60,
            BucketDuration::Hour => 60 * 60,
            BucketDuration::Day => 60 * 60 * 24,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BucketDuration::Raw => "raw",
            BucketDuration::Minute => "minute",
            BucketDuration::Hour => "hour",
            BucketDuration::Day => "day",
        }
    }

    pub fn from_secs(secs: i64) -> Option<Self> {
        match secs {
            10 => Some(BucketDuration::Raw),
            60 => Some(BucketDuration::Minute),
            3600 => Some(BucketDuration::Hour),
            86400 => Some(BucketDuration::Day),
            _ => None,
        }
    }

    pub fn all() -> [BucketDuration; 4] {
        [
            BucketDuration::Raw,
            BucketDuration::Minute,
            BucketDuration::Hour,
            BucketDuration::Day,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_round_trip() {
        for bucket in BucketDuration::all() {
            assert_eq!(BucketDuration::from_secs(bucket.secs()), Some(bucket));
        }
        assert_eq!(BucketDuration::from_secs(0), None);
        assert_eq!(BucketDuration::from_secs(120), None);
    }

    #[test]
    fn test_fixed_constants() {
        assert_eq!(BucketDuration::Raw.secs(), 10);
        assert_eq!(BucketDuration::Minute.secs(), 60);
        assert_eq!(BucketDuration::Hour.secs(), 3600);
        assert_eq!(BucketDuration::Day.secs(), 86400);
    }
}
