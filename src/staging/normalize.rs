//! Header cleaning for staging column names

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static RE_NON_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid regex"));
// Whitespace in front of a percent sign is absorbed: "Win %" -> "WinPercent"
static RE_PERCENT_SIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*%").expect("Invalid regex"));

/// Clean a single raw header label
///
/// Trim, `%` to `Percent`, spaces to underscores, drop periods, hyphens to
/// underscores, then drop anything outside `[A-Za-z0-9_]`.
pub fn clean_column_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let cleaned = RE_PERCENT_SIGN
        .replace_all(trimmed, "Percent")
        .replace(' ', "_")
        .replace('.', "")
        .replace('-', "_");
    RE_NON_IDENTIFIER.replace_all(&cleaned, "").into_owned()
}

/// Clean every header label and disambiguate duplicates
///
/// The first occurrence of a cleaned name is kept as is; later occurrences
/// get `_1`, `_2`, ... appended. The result has the same length and order as
/// the input and every name in it is unique.
pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut names = Vec::with_capacity(raw.len());

    for label in raw {
        let base = clean_column_name(label.as_ref());

        let name = if !counters.contains_key(&base) && !used.contains(&base) {
            counters.insert(base.clone(), 0);
            base
        } else {
            // A raw header can itself look like a generated suffix, so keep
            // counting until the candidate is free.
            let counter = counters.entry(base.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{}_{}", base, counter);
                if !used.contains(&candidate) {
                    break candidate;
                }
            }
        };

        used.insert(name.clone());
        names.push(name);
    }

    names
}
