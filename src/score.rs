//! Frequency/recency scoring.
//!
//! Both search paths rank their candidates with the same shape of formula: a
//! weighted sum of raw occurrence count and an inverse-hours recency term.
//! Commands weight frequency 0.6 / recency 0.4; files weight 0.7 / 0.3 and
//! apply a 0.8 penalty to directories. The functions take `now` explicitly so
//! they stay pure and testable.

use chrono::{DateTime, Utc};

const COMMAND_FREQUENCY_WEIGHT: f64 = 0.6;
const COMMAND_RECENCY_WEIGHT: f64 = 0.4;

const FILE_FREQUENCY_WEIGHT: f64 = 0.7;
const FILE_RECENCY_WEIGHT: f64 = 0.3;
const DIRECTORY_PENALTY: f64 = 0.8;

/// Score a command from its aggregate frequency and most recent use.
///
/// A missing timestamp contributes zero recency; a timestamp in the future
/// is clamped so recency never exceeds 1.
pub fn command_score(frequency: usize, last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let frequency_score = frequency as f64;

    let recency_score = match last_seen {
        Some(ts) => {
            let hours = hours_between(ts, now).max(0.0);
            1.0 / (hours + 1.0)
        }
        None => 0.0,
    };

    COMMAND_FREQUENCY_WEIGHT * frequency_score + COMMAND_RECENCY_WEIGHT * recency_score
}

/// Score an indexed file from its access count and last-access time.
///
/// Returns 0 when the record has never been timestamped.
pub fn file_score(
    access_count: i32,
    last_access: Option<DateTime<Utc>>,
    is_directory: bool,
    now: DateTime<Utc>,
) -> f64 {
    let Some(ts) = last_access else {
        return 0.0;
    };

    let hours = hours_between(ts, now);
    let frequency_score = access_count as f64;
    let recency_score = 1.0 / (hours + 1.0);

    let mut score = FILE_FREQUENCY_WEIGHT * frequency_score + FILE_RECENCY_WEIGHT * recency_score;
    if is_directory {
        score *= DIRECTORY_PENALTY;
    }
    score
}

fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn command_score_weights_frequency_and_recency() {
        let now = Utc::now();
        let one_hour_ago = now - Duration::hours(1);

        // freq 3, 1h ago: 0.6*3 + 0.4*(1/2) = 2.0
        let score = command_score(3, Some(one_hour_ago), now);
        assert!((score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn command_score_without_timestamp_has_no_recency() {
        let now = Utc::now();
        let score = command_score(5, None, now);
        assert!((score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn command_score_clamps_future_timestamps() {
        let now = Utc::now();
        let future = now + Duration::hours(10);
        let score = command_score(1, Some(future), now);
        // recency clamps to 1/(0+1) = 1
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recent_commands_outrank_older_ones_at_equal_frequency() {
        let now = Utc::now();
        let recent = command_score(2, Some(now - Duration::hours(1)), now);
        let older = command_score(2, Some(now - Duration::hours(50)), now);
        assert!(recent > older);
    }

    #[test]
    fn file_score_is_zero_without_timestamp() {
        let now = Utc::now();
        assert_eq!(file_score(100, None, false, now), 0.0);
    }

    #[test]
    fn file_score_penalizes_directories() {
        let now = Utc::now();
        let ts = Some(now - Duration::hours(2));
        let file = file_score(4, ts, false, now);
        let dir = file_score(4, ts, true, now);
        assert!((dir - file * 0.8).abs() < 1e-9);
    }
}
