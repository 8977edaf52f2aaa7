//! Entrant list cleanup and heat/group splitting

use std::collections::HashSet;

/// Trim labels, drop empty ones and remove case-insensitive duplicates
/// (first spelling wins)
pub fn dedupe_entrants<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(l.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Split into `ceil(n / cap)` heats whose sizes differ by at most one
pub fn split_into_heats(labels: &[String], cap: usize) -> Vec<Vec<String>> {
    if labels.is_empty() {
        return Vec::new();
    }
    let cap = cap.max(1);
    let count = labels.len().div_ceil(cap);
    let base = labels.len() / count;
    let extra = labels.len() % count;

    let mut heats = Vec::with_capacity(count);
    let mut rest = labels;
    for i in 0..count {
        let size = base + usize::from(i < extra);
        let (heat, tail) = rest.split_at(size);
        heats.push(heat.to_vec());
        rest = tail;
    }
    heats
}

/// Fixed-size groups for the preliminary stage
///
/// The last group may be short. A lone leftover joins the group before it so
/// every group can field a real heat.
pub fn split_into_groups(labels: &[String], size: usize) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = labels.chunks(size.max(1)).map(<[String]>::to_vec).collect();
    if groups.len() >= 2 && groups.last().is_some_and(|g| g.len() < 2) {
        if let Some(runt) = groups.pop() {
            if let Some(prev) = groups.last_mut() {
                prev.extend(runt);
            }
        }
    }
    groups
}

/// Entrants that advance out of a heat of `heat_size`: never everyone
pub fn advancers_for(heat_size: usize, advancers_per_heat: usize) -> usize {
    advancers_per_heat.min(heat_size.saturating_sub(1)).max(1)
}
