//! Top-K ranking of the accumulated word counts.

use std::collections::HashMap;

/// Reduce a full word -> count map to its top `k` entries.
///
/// Order: count descending, then word length descending, then the word
/// itself ascending. The three keys make the order total, so equal inputs
/// always rank identically.
pub fn rank(counts: &HashMap<String, usize>, k: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts
        .iter()
        .map(|(word, count)| (word.clone(), *count))
        .collect();

    entries.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.0.chars().count().cmp(&a.0.chars().count()))
            .then_with(|| a.0.cmp(&b.0))
    });

    entries.truncate(k);
    entries
}
