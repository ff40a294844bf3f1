//! Request scope and metric category

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CLUSTER_WIDE: &str = "cluster_wide";
pub const NAMESPACE_SCOPED: &str = "namespace_scoped";

/// Whether an analysis covers the whole cluster or a single namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Scope {
    ClusterWide,
    NamespaceScoped { namespace: String },
}

impl Scope {
    /// Build a scope from its wire name and an optional namespace.
    ///
    /// The namespace is ignored for `cluster_wide` and mandatory for
    /// `namespace_scoped`.
    pub fn from_parts(scope: &str, namespace: Option<&str>) -> Result<Self, InputError> {
        match scope.trim() {
            CLUSTER_WIDE => Ok(Scope::ClusterWide),
            // The dashboard historically sent "namespace_specific"
            NAMESPACE_SCOPED | "namespace_specific" => {
                Self::namespaced(namespace.unwrap_or_default())
            }
            other => Err(InputError::InvalidScope(format!(
                "'{}'; use '{}' or '{}'",
                other, CLUSTER_WIDE, NAMESPACE_SCOPED
            ))),
        }
    }

    pub fn namespaced(namespace: &str) -> Result<Self, InputError> {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return Err(InputError::InvalidScope(
                "namespace is required when scope is 'namespace_scoped'".to_string(),
            ));
        }
        Ok(Scope::NamespaceScoped {
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Scope::ClusterWide => None,
            Scope::NamespaceScoped { namespace } => Some(namespace),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::ClusterWide => CLUSTER_WIDE,
            Scope::NamespaceScoped { .. } => NAMESPACE_SCOPED,
        }
    }

    /// Human-readable description used in prompts and headers
    pub fn describe(&self) -> String {
        match self {
            Scope::ClusterWide => "Cluster Wide".to_string(),
            Scope::NamespaceScoped { namespace } => format!("Namespace Scoped ({})", namespace),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::ClusterWide => write!(f, "{}", CLUSTER_WIDE),
            Scope::NamespaceScoped { namespace } => {
                write!(f, "{} (namespace={})", NAMESPACE_SCOPED, namespace)
            }
        }
    }
}

/// Opaque category label used as a key into the scope catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricCategory(String);

impl MetricCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricCategory {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
