use super::print_json;
use sightline_core::ScopeCatalog;
use serde_json::json;

pub fn run() -> anyhow::Result<()> {
    let catalog = ScopeCatalog::standard();
    print_json(&json!({
        "cluster_wide": catalog.cluster_categories(),
        "namespace_scoped": catalog.namespace_categories(),
    }))
}
