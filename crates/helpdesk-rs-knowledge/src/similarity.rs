//! Case-insensitive string similarity scores in `[0, 1]`.

use helpdesk_rs_config::SimilarityMetric;

/// Score how similar two strings are, ignoring case.
pub fn similarity(a: &str, b: &str, metric: SimilarityMetric) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    match metric {
        SimilarityMetric::Gestalt => gestalt_ratio(&a, &b),
        SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(&a, &b),
        SimilarityMetric::JaroWinkler => strsim::jaro_winkler(&a, &b),
    }
}

/// Ratcliff/Obershelp ratio: `2 * matched / total`.
pub fn gestalt_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_characters(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Count characters covered by recursively taking the longest common block.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, alo, ahi, b, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties resolve to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    alo: usize,
    ahi: usize,
    b: &[char],
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo + 1;
    let mut best = (alo, blo, 0);
    let mut previous = vec![0usize; width];
    let mut current = vec![0usize; width];
    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let run = previous[slot - 1] + 1;
                current[slot] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            } else {
                current[slot] = 0;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}
