use jiff::civil::Date;
use tracing::warn;

use super::activity::ActivityLog;
use super::history::HistoryStore;

/// Dashboard figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Distinct articles ever shown.
    pub total: usize,
    /// Successful runs logged today.
    pub today: usize,
}

impl Stats {
    pub fn collect(history: &HistoryStore, activity: &ActivityLog, today: Date) -> Self {
        let total = history.len().unwrap_or_else(|e| {
            warn!(error = %e, "Could not count history");
            0
        });

        Self {
            total,
            today: activity.count_successes_on(today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_collect() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::open(dir.path());
        let activity = ActivityLog::open(dir.path());

        history.append("1").unwrap();
        history.append("2").unwrap();
        std::fs::write(
            activity.path(),
            "[2024-02-29 10:00:00] SUCCESS: Found unique: 'Leap'\n",
        )
        .unwrap();

        let stats = Stats::collect(&history, &activity, date(2024, 2, 29));
        assert_eq!(stats, Stats { total: 2, today: 1 });
    }

    #[test]
    fn test_collect_empty() {
        let dir = tempfile::tempdir().unwrap();
        let stats = Stats::collect(
            &HistoryStore::open(dir.path()),
            &ActivityLog::open(dir.path()),
            date(2024, 1, 1),
        );
        assert_eq!(stats, Stats::default());
    }
}
