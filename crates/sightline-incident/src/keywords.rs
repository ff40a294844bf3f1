//! Keyword extraction and check mapping

use serde::Serialize;

/// Words recognized in incident descriptions
pub const VOCABULARY: &[&str] = &[
    "cpu", "memory", "latency", "error", "timeout", "slow", "high", "spike", "service", "database",
];

struct CheckMapping {
    keyword: &'static str,
    metric: &'static str,
}

const CHECK_MAP: &[CheckMapping] = &[
    CheckMapping {
        keyword: "cpu",
        metric: "cpu_usage_percent",
    },
    CheckMapping {
        keyword: "memory",
        metric: "memory_usage_bytes",
    },
    CheckMapping {
        keyword: "latency",
        metric: "http_request_duration_seconds",
    },
];

/// A metric to correlate from, chosen by a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Check {
    pub keyword: &'static str,
    pub metric: &'static str,
}

/// Vocabulary words present in `description`, deduplicated, in order of
/// first appearance. Matching is on whole lowercase tokens.
pub fn extract_keywords(description: &str) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = Vec::new();
    for token in description
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        if let Some(word) = VOCABULARY.iter().find(|w| **w == token) {
            if !found.contains(word) {
                found.push(*word);
            }
        }
    }
    found
}

/// Checks for the keywords that have one; the rest are skipped
pub fn check_metrics(keywords: &[&str]) -> Vec<Check> {
    keywords
        .iter()
        .filter_map(|k| {
            CHECK_MAP.iter().find(|m| m.keyword == *k).map(|m| Check {
                keyword: m.keyword,
                metric: m.metric,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords("High cpu and memory usage");
        assert_eq!(keywords, vec!["high", "cpu", "memory"]);
    }

    #[test]
    fn test_check_metrics_for_cpu_and_memory() {
        let checks = check_metrics(&extract_keywords("High cpu and memory usage"));
        let keywords: HashSet<_> = checks.iter().map(|p| p.keyword).collect();
        assert_eq!(keywords, HashSet::from(["cpu", "memory"]));
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].metric, "cpu_usage_percent");
    }

    #[test]
    fn test_dedupe_and_punctuation() {
        let keywords = extract_keywords("Latency spike! latency, LATENCY; database-timeout");
        assert_eq!(keywords, vec!["latency", "spike", "database", "timeout"]);
        assert_eq!(check_metrics(&keywords).len(), 1);
    }

    #[test]
    fn test_no_partial_matches() {
        assert!(extract_keywords("cpus highly memorable").is_empty());
        assert!(check_metrics(&[]).is_empty());
    }
}
