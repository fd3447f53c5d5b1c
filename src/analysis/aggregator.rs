//! Contradiction aggregation and statistics.
//!
//! This module provides utilities for filtering, ordering and summarising
//! the contradictions received during a session.

use crate::models::{ContradictionRecord, Severity};
use std::collections::HashMap;

/// Keep only contradictions at or above `min`.
pub fn filter_min_severity(records: &mut Vec<ContradictionRecord>, min: Severity) {
    records.retain(|r| r.severity >= min);
}

/// Sort contradictions by severity (high first), keeping arrival order
/// within a severity.
pub fn sort_by_severity(records: &mut [ContradictionRecord]) {
    records.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Whether any contradiction reaches the given severity.
pub fn any_at_or_above(records: &[ContradictionRecord], threshold: Severity) -> bool {
    records.iter().any(|r| r.severity >= threshold)
}

/// Group contradictions by document pair.
pub fn group_by_pair(records: &[ContradictionRecord]) -> Vec<(String, Vec<&ContradictionRecord>)> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<&ContradictionRecord>> = HashMap::new();

    for record in records {
        let key = record.pair_key();
        if !grouped.contains_key(&key) {
            order.push(key.clone());
        }
        grouped.entry(key).or_default().push(record);
    }

    order
        .into_iter()
        .filter_map(|key| grouped.remove(&key).map(|group| (key, group)))
        .collect()
}

/// Identify the documents involved in the most contradictions.
pub fn most_conflicted_documents(records: &[ContradictionRecord], n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        *counts.entry(record.doc1.as_str()).or_default() += 1;
        if record.doc2 != record.doc1 {
            *counts.entry(record.doc2.as_str()).or_default() += 1;
        }
    }

    let mut documents: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(doc, count)| (doc.to_string(), count))
        .collect();

    // Highest count first, ties by name for stable output
    documents.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    documents.truncate(n);

    documents
}

/// Mean confidence of the given contradictions, if any.
pub fn average_confidence(records: &[ContradictionRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }

    let sum: f64 = records.iter().map(|r| r.confidence).sum();
    Some(sum / records.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record(doc1: &str, doc2: &str, severity: Severity, confidence: f64) -> ContradictionRecord {
        ContradictionRecord {
            doc1: doc1.to_string(),
            doc2: doc2.to_string(),
            sentence1: "Payment is due in 30 days.".to_string(),
            sentence2: "Payment is due in 60 days.".to_string(),
            severity,
            confidence,
            similarity: 0.6,
        }
    }

    #[test]
    fn test_filter_min_severity() {
        let mut records = vec![
            create_test_record("a", "b", Severity::Low, 60.0),
            create_test_record("a", "b", Severity::High, 95.0),
            create_test_record("a", "c", Severity::Medium, 80.0),
        ];

        filter_min_severity(&mut records, Severity::Medium);

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.severity >= Severity::Medium));
    }

    #[test]
    fn test_sort_by_severity_is_stable() {
        let mut records = vec![
            create_test_record("first", "x", Severity::Low, 60.0),
            create_test_record("second", "x", Severity::High, 95.0),
            create_test_record("third", "x", Severity::Low, 61.0),
            create_test_record("fourth", "x", Severity::Medium, 80.0),
        ];

        sort_by_severity(&mut records);

        let docs: Vec<_> = records.iter().map(|r| r.doc1.as_str()).collect();
        assert_eq!(docs, vec!["second", "fourth", "first", "third"]);
    }

    #[test]
    fn test_any_at_or_above() {
        let records = vec![create_test_record("a", "b", Severity::Medium, 80.0)];
        assert!(any_at_or_above(&records, Severity::Low));
        assert!(any_at_or_above(&records, Severity::Medium));
        assert!(!any_at_or_above(&records, Severity::High));
        assert!(!any_at_or_above(&[], Severity::Low));
    }

    #[test]
    fn test_group_by_pair_keeps_first_seen_order() {
        let records = vec![
            create_test_record("b", "c", Severity::Low, 60.0),
            create_test_record("a", "b", Severity::High, 95.0),
            create_test_record("b", "c", Severity::Medium, 80.0),
        ];

        let groups = group_by_pair(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b ↔ c");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a ↔ b");
    }

    #[test]
    fn test_most_conflicted_documents() {
        let records = vec![
            create_test_record("a", "b", Severity::Low, 60.0),
            create_test_record("a", "c", Severity::High, 95.0),
            create_test_record("b", "c", Severity::Medium, 80.0),
            create_test_record("a", "d", Severity::Medium, 80.0),
        ];

        let top = most_conflicted_documents(&records, 2);

        assert_eq!(top, vec![("a".to_string(), 3), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_average_confidence() {
        assert_eq!(average_confidence(&[]), None);

        let records = vec![
            create_test_record("a", "b", Severity::Low, 60.0),
            create_test_record("a", "b", Severity::High, 90.0),
        ];
        assert_eq!(average_confidence(&records), Some(75.0));
    }
}
