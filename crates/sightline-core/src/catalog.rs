//! Category/scope query catalog and namespace injection

use crate::error::InputError;
use crate::types::{MetricCategory, Scope};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

struct CategoryQueries {
    category: &'static str,
    queries: &'static [(&'static str, &'static str)],
}

const CLUSTER_WIDE_CATALOG: &[CategoryQueries] = &[
    CategoryQueries {
        category: "Fleet Overview",
        queries: &[
            ("Total Pods Running", r#"sum(kube_pod_status_phase{phase="Running"})"#),
            ("Total Pods Failed", r#"sum(kube_pod_status_phase{phase="Failed"})"#),
            (
                "Cluster CPU Usage (%)",
                r#"100 * (1 - avg(rate(node_cpu_seconds_total{mode="idle"}[5m])))"#,
            ),
            (
                "Cluster Memory Usage (%)",
                r#"100 * (1 - sum(node_memory_MemAvailable_bytes{}) / sum(node_memory_MemTotal_bytes{}))"#,
            ),
            ("GPU Utilization (%)", r#"avg(DCGM_FI_DEV_GPU_UTIL{})"#),
            (
                "Nodes Ready",
                r#"sum(kube_node_status_condition{condition="Ready",status="true"})"#,
            ),
        ],
    },
    CategoryQueries {
        category: "Workloads & Pods",
        queries: &[
            ("Pods Running", r#"sum(kube_pod_status_phase{phase="Running"})"#),
            ("Pods Pending", r#"sum(kube_pod_status_phase{phase="Pending"})"#),
            ("Pods Failed", r#"sum(kube_pod_status_phase{phase="Failed"})"#),
            (
                "Pod Restarts (Rate)",
                r#"sum(rate(kube_pod_container_status_restarts_total{}[5m]))"#,
            ),
            (
                "Container CPU Usage",
                r#"sum(rate(container_cpu_usage_seconds_total{container!=""}[5m]))"#,
            ),
            (
                "Container Memory Usage",
                r#"sum(container_memory_working_set_bytes{container!=""})"#,
            ),
        ],
    },
    CategoryQueries {
        category: "GPU & Accelerators",
        queries: &[
            ("GPU Utilization (%)", r#"avg(DCGM_FI_DEV_GPU_UTIL{})"#),
            (
                "GPU Memory Used (%)",
                r#"100 * sum(DCGM_FI_DEV_FB_USED{}) / (sum(DCGM_FI_DEV_FB_USED{}) + sum(DCGM_FI_DEV_FB_FREE{}))"#,
            ),
            ("GPU Temperature (°C)", r#"avg(DCGM_FI_DEV_GPU_TEMP{})"#),
            ("GPU Power Usage (Watts)", r#"avg(DCGM_FI_DEV_POWER_USAGE{})"#),
            (
                "GPU Total Energy (Joules)",
                r#"sum(DCGM_FI_DEV_TOTAL_ENERGY_CONSUMPTION{}) / 1000"#,
            ),
            ("GPU Memory Clock (MHz)", r#"avg(DCGM_FI_DEV_MEM_CLOCK{})"#),
        ],
    },
    CategoryQueries {
        category: "Storage & Networking",
        queries: &[
            ("PV Available Space", r#"sum(kubelet_volume_stats_available_bytes{})"#),
            (
                "PVC Bound",
                r#"sum(kube_persistentvolumeclaim_status_phase{phase="Bound"})"#,
            ),
            (
                "Storage I/O Rate",
                r#"sum(rate(container_fs_reads_bytes_total{}[5m])) + sum(rate(container_fs_writes_bytes_total{}[5m]))"#,
            ),
            (
                "Network Receive Rate",
                r#"sum(rate(container_network_receive_bytes_total{}[5m]))"#,
            ),
            (
                "Network Transmit Rate",
                r#"sum(rate(container_network_transmit_bytes_total{}[5m]))"#,
            ),
            (
                "Network Errors",
                r#"sum(rate(container_network_receive_errors_total{}[5m])) + sum(rate(container_network_transmit_errors_total{}[5m]))"#,
            ),
        ],
    },
    CategoryQueries {
        category: "Application Services",
        queries: &[
            ("HTTP Request Rate", r#"sum(rate(http_requests_total{}[5m]))"#),
            (
                "HTTP Error Rate (%)",
                r#"100 * sum(rate(http_requests_total{code=~"5.."}[5m])) / sum(rate(http_requests_total{}[5m]))"#,
            ),
            (
                "HTTP P95 Latency",
                r#"histogram_quantile(0.95, sum(rate(http_request_duration_seconds_bucket{}[5m])) by (le))"#,
            ),
            ("Services Available", r#"count(kube_service_info{})"#),
            (
                "Ingress Request Rate",
                r#"sum(rate(haproxy_frontend_http_requests_total{}[5m]))"#,
            ),
            ("Load Balancer Backends", r#"sum(haproxy_backend_up{})"#),
        ],
    },
];

// Queries here aggregate per workload rather than per cluster. Categories
// without an entry fall back to the cluster-wide table.
const NAMESPACE_CATALOG: &[CategoryQueries] = &[
    CategoryQueries {
        category: "Workloads & Pods",
        queries: &[
            (
                "Pods Running",
                r#"sum by (pod) (kube_pod_status_phase{phase="Running"})"#,
            ),
            (
                "Pods Pending",
                r#"sum by (pod) (kube_pod_status_phase{phase="Pending"})"#,
            ),
            (
                "Pods Failed",
                r#"sum by (pod) (kube_pod_status_phase{phase="Failed"})"#,
            ),
            (
                "Pod Restarts (Rate)",
                r#"sum by (pod) (rate(kube_pod_container_status_restarts_total{}[5m]))"#,
            ),
            (
                "Container CPU Usage",
                r#"sum by (pod) (rate(container_cpu_usage_seconds_total{container!=""}[5m]))"#,
            ),
            (
                "Container Memory Usage",
                r#"sum by (pod) (container_memory_working_set_bytes{container!=""})"#,
            ),
        ],
    },
    CategoryQueries {
        category: "Storage & Networking",
        queries: &[
            (
                "PV Claims Bound",
                r#"sum(kube_persistentvolumeclaim_status_phase{phase="Bound"})"#,
            ),
            (
                "PV Claims Pending",
                r#"sum(kube_persistentvolumeclaim_status_phase{phase="Pending"})"#,
            ),
            (
                "Container Network Receive",
                r#"sum by (pod) (rate(container_network_receive_bytes_total{}[5m]))"#,
            ),
            (
                "Container Network Transmit",
                r#"sum by (pod) (rate(container_network_transmit_bytes_total{}[5m]))"#,
            ),
            (
                "Network Errors",
                r#"sum by (pod) (rate(container_network_receive_errors_total{}[5m]))"#,
            ),
            (
                "Filesystem Usage",
                r#"sum by (pod) (container_fs_usage_bytes{container!=""})"#,
            ),
        ],
    },
    CategoryQueries {
        category: "Application Services",
        queries: &[
            ("HTTP Request Rate", r#"sum(rate(http_requests_total{}[5m]))"#),
            (
                "HTTP Error Rate (%)",
                r#"100 * sum(rate(http_requests_total{code=~"5.."}[5m])) / sum(rate(http_requests_total{}[5m]))"#,
            ),
            (
                "Service Endpoints",
                r#"sum(kube_endpoint_address_available{})"#,
            ),
            (
                "Container Processes",
                r#"sum by (pod) (container_processes{container!=""})"#,
            ),
            (
                "Container File Descriptors",
                r#"sum by (pod) (container_file_descriptors{container!=""})"#,
            ),
            (
                "Container Threads",
                r#"sum by (pod) (container_threads{container!=""})"#,
            ),
        ],
    },
];

/// One labelled query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuery {
    pub label: String,
    pub query: String,
}

/// Ordered label → query mapping selected by category and scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySet {
    pub category: String,
    pub entries: Vec<NamedQuery>,
    /// Set when a namespace lookup fell back to the cluster-wide table
    pub degraded_scope: bool,
}

impl QuerySet {
    fn from_table(table: &CategoryQueries, degraded_scope: bool) -> Self {
        Self {
            category: table.category.to_string(),
            entries: table
                .queries
                .iter()
                .map(|(label, query)| NamedQuery {
                    label: label.to_string(),
                    query: query.to_string(),
                })
                .collect(),
            degraded_scope,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.query.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this set with `namespace` injected into every query
    pub fn with_namespace(&self, namespace: &str) -> Self {
        Self {
            category: self.category.clone(),
            entries: self
                .entries
                .iter()
                .map(|e| NamedQuery {
                    label: e.label.clone(),
                    query: inject_namespace(&e.query, namespace),
                })
                .collect(),
            degraded_scope: self.degraded_scope,
        }
    }
}

/// Static mapping from `(category, scope)` to the queries to issue
pub struct ScopeCatalog {
    cluster_wide: &'static [CategoryQueries],
    namespaced: &'static [CategoryQueries],
}

impl ScopeCatalog {
    pub fn standard() -> Self {
        Self {
            cluster_wide: CLUSTER_WIDE_CATALOG,
            namespaced: NAMESPACE_CATALOG,
        }
    }

    /// Resolve the query set for a category under a scope.
    ///
    /// Namespace-scoped lookups of cluster-only categories return the
    /// cluster-wide table with `degraded_scope` set. Queries are returned
    /// as catalogued; callers inject the namespace before issuing them.
    pub fn lookup(&self, category: &MetricCategory, scope: &Scope) -> Result<QuerySet, InputError> {
        let name = category.as_str();
        if let Scope::NamespaceScoped { namespace } = scope {
            if let Some(table) = find(self.namespaced, name) {
                return Ok(QuerySet::from_table(table, false));
            }
            if let Some(table) = find(self.cluster_wide, name) {
                debug!(
                    category = name,
                    namespace = namespace.as_str(),
                    "No namespace-specific queries, using cluster-wide set"
                );
                return Ok(QuerySet::from_table(table, true));
            }
        } else if let Some(table) = find(self.cluster_wide, name) {
            return Ok(QuerySet::from_table(table, false));
        }

        Err(InputError::UnknownCategory {
            category: name.to_string(),
            scope: scope.as_str().to_string(),
        })
    }

    pub fn cluster_categories(&self) -> Vec<&'static str> {
        self.cluster_wide.iter().map(|c| c.category).collect()
    }

    /// Categories with dedicated namespace-scoped queries
    pub fn namespace_categories(&self) -> Vec<&'static str> {
        self.namespaced.iter().map(|c| c.category).collect()
    }
}

impl Default for ScopeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn find<'a>(tables: &'a [CategoryQueries], category: &str) -> Option<&'a CategoryQueries> {
    tables.iter().find(|t| t.category == category)
}

fn namespace_matcher() -> &'static Regex {
    static MATCHER: OnceLock<Regex> = OnceLock::new();
    MATCHER.get_or_init(|| {
        Regex::new(r"(?:^|[\s,])namespace\s*(?:=~|!~|!=|=)").expect("static regex compiles")
    })
}

/// PromQL words that are never metric names
const KEYWORDS: &[&str] = &[
    "by", "without", "on", "ignoring", "group_left", "group_right", "bool", "and", "or",
    "unless", "offset", "atan2", "inf", "nan",
];

/// Keywords whose parenthesised list holds label names, not selectors
const GROUPING_KEYWORDS: &[&str] = &["by", "without", "on", "ignoring", "group_left", "group_right"];

/// Constrain a PromQL query to `namespace`.
///
/// Every selector block without a namespace matcher gets
/// `namespace="<ns>"` as its first label, and every bare metric name gets
/// a `{namespace="<ns>"}` block. String literals, range brackets and
/// grouping label lists are left alone. Idempotent.
pub fn inject_namespace(query: &str, namespace: &str) -> String {
    let namespace = namespace.trim();
    if namespace.is_empty() {
        return query.to_string();
    }
    let label = format!(
        "namespace=\"{}\"",
        namespace.replace('\\', "\\\\").replace('"', "\\\"")
    );

    let bytes = query.as_bytes();
    let mut out = String::with_capacity(query.len() + label.len() * 2);
    // Bytes of `query` already copied to `out`
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => i = string_end(bytes, i),
            b'[' => i = skip_past(bytes, i, b']'),
            b'{' => {
                let body_start = i + 1;
                let close = body_start + selector_end(&query[body_start..]);
                let body = &query[body_start..close];
                if !namespace_matcher().is_match(body) {
                    out.push_str(&query[copied..body_start]);
                    out.push_str(&label);
                    if !body.trim().is_empty() {
                        out.push_str(", ");
                    }
                    copied = body_start;
                }
                i = close + 1;
            }
            b if b.is_ascii_digit() => i = word_end(bytes, i),
            b if b.is_ascii_alphabetic() || b == b'_' || b == b':' => {
                let end = word_end(bytes, i);
                let word = &query[i..end];
                match next_significant(bytes, end) {
                    Some((open, b'(')) if is_one_of(word, GROUPING_KEYWORDS) => {
                        i = skip_past(bytes, open, b')');
                    }
                    Some((_, b'(' | b'{')) => i = end,
                    _ if is_one_of(word, KEYWORDS) => i = end,
                    // `sum by (pod) (...)`
                    Some((next, _)) if is_one_of(&query[next..word_end(bytes, next)], &["by", "without"]) => {
                        i = end
                    }
                    _ => {
                        out.push_str(&query[copied..end]);
                        out.push('{');
                        out.push_str(&label);
                        out.push('}');
                        copied = end;
                        i = end;
                    }
                }
            }
            _ => i += 1,
        }
    }
    out.push_str(&query[copied.min(query.len())..]);
    out
}

fn is_one_of(word: &str, words: &[&str]) -> bool {
    words.iter().any(|w| w.eq_ignore_ascii_case(word))
}

/// End of an identifier, number or duration starting at `start`
fn word_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b':') {
        i += 1;
    }
    i
}

/// Index and value of the first non-whitespace byte at or after `from`
fn next_significant(bytes: &[u8], from: usize) -> Option<(usize, u8)> {
    bytes[from..]
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|offset| (from + offset, bytes[from + offset]))
}

/// Index just past the first `close` after `open`
fn skip_past(bytes: &[u8], open: usize, close: u8) -> usize {
    bytes[open + 1..]
        .iter()
        .position(|&b| b == close)
        .map_or(bytes.len(), |offset| open + offset + 2)
}

/// Index just past the string literal opening at `start`
fn string_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote != b'`' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Byte offset of the `}` closing a selector body, skipping quoted values
fn selector_end(body: &str) -> usize {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return i,
            _ => {}
        }
    }
    body.len()
}
