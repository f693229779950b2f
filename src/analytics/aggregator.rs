// src/analytics/aggregator.rs

//! Per-student progress statistics.
//!
//! `aggregate` is a pure function over already-fetched data: the caller
//! filters attempts down to one student and loads the list catalog, then
//! hands both over. Nothing here performs I/O or keeps state between calls.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{attempt::AttemptRecord, word_list::ListCatalog};

/// Statistics for one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSummary {
    pub name: String,
    pub correct: u64,
    pub total: u64,
    /// Integer in [0, 100].
    pub percentage: u8,
    pub stars: u64,
    /// Newest first. Attempts sharing a timestamp keep their input order.
    pub attempts: Vec<AttemptRecord>,
}

/// Statistics across every list a student has practised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    pub overall_percentage: u8,
    pub total_attempts: u64,
    pub correct_attempts: u64,
    pub total_stars: u64,
    pub list_stats: BTreeMap<i64, ListSummary>,
}

/// Outcome of an aggregation.
///
/// `NoData` means nothing countable was found. It is a different state from
/// a 0% score over real attempts and serializes differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Progress {
    NoData,
    Ready(OverallStats),
}

impl Progress {
    pub fn stats(&self) -> Option<&OverallStats> {
        match self {
            Progress::Ready(stats) => Some(stats),
            Progress::NoData => None,
        }
    }
}

/// Data-integrity problem found while aggregating. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// Attempts reference a list the catalog does not know.
    UnknownList { list_id: i64, attempts: usize },
    /// A stored record failed validation and was left out.
    MalformedRecord { record_id: i64, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub progress: Progress,
    pub warnings: Vec<IntegrityWarning>,
}

/// Rounds `part / whole * 100` half-up to an integer percentage.
///
/// Returns 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole);
    let pct = (part * 100 + whole / 2) / whole;
    // part <= whole keeps this within 0..=100
    pct as u8
}

/// Computes per-list and overall statistics for one student's attempts.
pub fn aggregate(attempts: &[AttemptRecord], catalog: &ListCatalog) -> Aggregation {
    let mut groups: BTreeMap<i64, Vec<&AttemptRecord>> = BTreeMap::new();
    for attempt in attempts {
        groups.entry(attempt.list_id).or_default().push(attempt);
    }

    let mut warnings = Vec::new();
    let mut list_stats = BTreeMap::new();

    for (list_id, group) in groups {
        let Some(entry) = catalog.get(&list_id) else {
            tracing::warn!(
                list_id,
                attempts = group.len(),
                "Attempts reference a list missing from the catalog; skipping group"
            );
            warnings.push(IntegrityWarning::UnknownList {
                list_id,
                attempts: group.len(),
            });
            continue;
        };

        list_stats.insert(list_id, summarize_list(&entry.title, group));
    }

    let total_attempts: u64 = list_stats.values().map(|s| s.total).sum();
    if total_attempts == 0 {
        return Aggregation {
            progress: Progress::NoData,
            warnings,
        };
    }

    let correct_attempts: u64 = list_stats.values().map(|s| s.correct).sum();
    let total_stars: u64 = list_stats.values().map(|s| s.stars).sum();

    Aggregation {
        progress: Progress::Ready(OverallStats {
            overall_percentage: percentage(correct_attempts, total_attempts),
            total_attempts,
            correct_attempts,
            total_stars,
            list_stats,
        }),
        warnings,
    }
}

fn summarize_list(name: &str, group: Vec<&AttemptRecord>) -> ListSummary {
    let total = group.len() as u64;
    let correct = group.iter().filter(|a| a.correct).count() as u64;
    let stars = group.iter().map(|a| u64::from(a.stars_earned)).sum();

    let mut attempts: Vec<AttemptRecord> = group.into_iter().cloned().collect();
    // stable, so equal timestamps keep insertion order
    attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    ListSummary {
        name: name.to_string(),
        correct,
        total,
        percentage: percentage(correct, total),
        stars,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::word_list::CatalogEntry;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn attempt(list_id: i64, word: &str, correct: bool, stars: u32, minutes: i64) -> AttemptRecord {
        AttemptRecord {
            student_id: 7,
            list_id,
            word: word.to_string(),
            correct,
            stars_earned: stars,
            student_answer: format!("answer for {}", word),
            timestamp: base_time() + Duration::minutes(minutes),
        }
    }

    fn catalog(entries: &[(i64, &str)]) -> ListCatalog {
        entries
            .iter()
            .map(|(id, title)| {
                (
                    *id,
                    CatalogEntry {
                        title: title.to_string(),
                    },
                )
            })
            .collect()
    }

    fn ready(aggregation: &Aggregation) -> &OverallStats {
        aggregation.progress.stats().expect("expected stats")
    }

    #[test]
    fn empty_attempts_are_no_data() {
        let result = aggregate(&[], &catalog(&[(1, "Animals")]));
        assert_eq!(result.progress, Progress::NoData);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn all_lists_unknown_is_no_data_with_warnings() {
        let attempts = vec![attempt(99, "a", true, 3, 0), attempt(99, "b", false, 0, 1)];
        let result = aggregate(&attempts, &catalog(&[(1, "Animals")]));

        assert_eq!(result.progress, Progress::NoData);
        assert_eq!(
            result.warnings,
            vec![IntegrityWarning::UnknownList {
                list_id: 99,
                attempts: 2
            }]
        );
    }

    #[test]
    fn zero_percent_is_not_no_data() {
        let attempts = vec![attempt(1, "a", false, 0, 0)];
        let result = aggregate(&attempts, &catalog(&[(1, "Animals")]));
        let stats = ready(&result);

        assert_eq!(stats.overall_percentage, 0);
        assert_eq!(stats.total_attempts, 1);
    }

    #[test]
    fn single_list_two_of_three() {
        let attempts = vec![
            attempt(1, "kucing", true, 3, 0),
            attempt(1, "anjing", true, 3, 1),
            attempt(1, "burung", false, 0, 2),
        ];
        let result = aggregate(&attempts, &catalog(&[(1, "Animals")]));
        let stats = ready(&result);
        let list = &stats.list_stats[&1];

        assert_eq!(list.name, "Animals");
        assert_eq!(list.correct, 2);
        assert_eq!(list.total, 3);
        assert_eq!(list.percentage, 67);
        assert_eq!(list.stars, 6);
        assert_eq!(stats.total_stars, 6);
    }

    #[test]
    fn overall_is_computed_from_counts_not_list_percentages() {
        let mut attempts = Vec::new();
        for i in 0..5 {
            attempts.push(attempt(1, "a", i < 4, if i < 4 { 3 } else { 0 }, i));
        }
        for i in 0..5 {
            attempts.push(attempt(2, "b", i < 1, if i < 1 { 3 } else { 0 }, i));
        }

        let result = aggregate(&attempts, &catalog(&[(1, "List A"), (2, "List B")]));
        let stats = ready(&result);

        assert_eq!(stats.overall_percentage, 50);
        assert_eq!(stats.list_stats[&1].percentage, 80);
        assert_eq!(stats.list_stats[&2].percentage, 20);
    }

    #[test]
    fn unknown_list_is_excluded_from_totals() {
        let attempts = vec![
            attempt(1, "a", true, 3, 0),
            attempt(1, "b", false, 0, 1),
            attempt(42, "c", true, 3, 2),
        ];
        let result = aggregate(&attempts, &catalog(&[(1, "Animals")]));
        let stats = ready(&result);

        assert_eq!(stats.list_stats.len(), 1);
        assert!(stats.list_stats.contains_key(&1));
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.correct_attempts, 1);
        assert_eq!(stats.total_stars, 3);
        assert_eq!(
            result.warnings,
            vec![IntegrityWarning::UnknownList {
                list_id: 42,
                attempts: 1
            }]
        );
    }

    #[test]
    fn list_totals_sum_to_overall() {
        let attempts = vec![
            attempt(1, "a", true, 3, 0),
            attempt(2, "b", false, 0, 1),
            attempt(3, "c", true, 2, 2),
            attempt(2, "d", true, 3, 3),
            attempt(3, "e", false, 0, 4),
        ];
        let result = aggregate(&attempts, &catalog(&[(1, "A"), (2, "B"), (3, "C")]));
        let stats = ready(&result);

        let total: u64 = stats.list_stats.values().map(|s| s.total).sum();
        let correct: u64 = stats.list_stats.values().map(|s| s.correct).sum();
        assert_eq!(total, stats.total_attempts);
        assert_eq!(correct, stats.correct_attempts);
        assert_eq!(
            stats.overall_percentage,
            percentage(stats.correct_attempts, stats.total_attempts)
        );
    }

    #[test]
    fn attempts_sorted_newest_first_with_stable_ties() {
        let attempts = vec![
            attempt(1, "oldest", true, 3, 0),
            attempt(1, "tie-first", true, 3, 5),
            attempt(1, "newest", false, 0, 9),
            attempt(1, "tie-second", false, 0, 5),
        ];
        let result = aggregate(&attempts, &catalog(&[(1, "Animals")]));
        let words: Vec<&str> = ready(&result).list_stats[&1]
            .attempts
            .iter()
            .map(|a| a.word.as_str())
            .collect();

        assert_eq!(words, vec!["newest", "tie-first", "tie-second", "oldest"]);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let attempts = vec![
            attempt(2, "x", true, 3, 3),
            attempt(1, "y", false, 0, 3),
            attempt(1, "z", true, 1, 3),
        ];
        let catalog = catalog(&[(1, "A"), (2, "B")]);

        assert_eq!(aggregate(&attempts, &catalog), aggregate(&attempts, &catalog));
    }

    #[test]
    fn percentage_rounds_half_up_and_stays_in_range() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 200), 1);
        assert_eq!(percentage(7, 7), 100);
        assert_eq!(percentage(9, 7), 100);
    }

    #[test]
    fn no_data_serializes_distinctly() {
        let json = serde_json::to_value(Progress::NoData).unwrap();
        assert_eq!(json, serde_json::json!({"status": "no_data"}));

        let attempts = vec![attempt(1, "a", false, 0, 0)];
        let result = aggregate(&attempts, &catalog(&[(1, "Animals")]));
        let json = serde_json::to_value(&result.progress).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["overall_percentage"], 0);
        assert_eq!(json["list_stats"]["1"]["name"], "Animals");
    }
}
