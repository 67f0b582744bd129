//! Line-based drift measurement between two canonical documents.

use serde::Serialize;

/// Line counts and percentage of a line diff
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub added_lines: usize,
    pub removed_lines: usize,
    pub unchanged_lines: usize,
    pub total_lines: usize,
    /// `(added + removed) / total * 100`, two decimals. Can exceed 100 when
    /// both sides changed completely.
    pub change_percent: f64,
}

/// Split into lines, each keeping its trailing newline. Empty text has no lines.
fn lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Length of the shortest edit script between `a` and `b` (Myers, O((n+m)·D)).
fn shortest_edit(a: &[&str], b: &[&str]) -> usize {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = (n + m) as usize;
    if max == 0 {
        return 0;
    }

    let offset = max as isize;
    let mut v = vec![0isize; 2 * max + 2];

    for d in 0..=max as isize {
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) { v[idx + 1] } else { v[idx - 1] + 1 };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                return d as usize;
            }
            k += 2;
        }
    }

    max
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compare `old` against `new` line by line.
///
/// Unchanged lines are the longest common subsequence; everything else on the
/// old side is removed and on the new side added.
pub fn diff(old: &str, new: &str) -> DiffStats {
    let old_lines = lines(old);
    let new_lines = lines(new);
    let (n, m) = (old_lines.len(), new_lines.len());

    let edits = shortest_edit(&old_lines, &new_lines);
    let common = (n + m - edits) / 2;

    let added_lines = m - common;
    let removed_lines = n - common;
    let total_lines = n.max(m);
    let change_percent = if total_lines == 0 {
        0.0
    } else {
        round2((added_lines + removed_lines) as f64 / total_lines as f64 * 100.0)
    };

    DiffStats { added_lines, removed_lines, unchanged_lines: common, total_lines, change_percent }
}

/// Whether a measured drift counts as a change for a site's threshold
pub fn exceeds_threshold(change_percent: f64, threshold: f64) -> bool {
    change_percent > threshold
}
