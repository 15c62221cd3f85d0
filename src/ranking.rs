//! Partner rankings by synapse count

use serde::Serialize;
use std::collections::HashMap;

/// A frequency table of connection partners, sorted by synapse count
/// descending. Ties keep first-seen input order, so the result is
/// deterministic for a given row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionRanking {
    entries: Vec<(String, u64)>,
}

impl ConnectionRanking {
    /// Count occurrences of each partner name and sort by count descending.
    pub fn from_partner_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for name in names {
            let count = counts.entry(name).or_insert(0);
            if *count == 0 {
                order.push(name);
            }
            *count += 1;
        }
        let mut entries: Vec<(String, u64)> = order
            .into_iter()
            .map(|name| (name.to_string(), counts[name]))
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self { entries }
    }

    /// Keep only the first `n` entries. Asking for more than available
    /// returns everything unchanged.
    pub fn top(mut self, n: usize) -> Self {
        self.entries.truncate(n);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Iterate entries in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), *c))
    }

    /// Partner names in rank order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}
