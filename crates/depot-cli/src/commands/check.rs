//! Check command - validate configuration and show connectors

use console::style;
use std::path::Path;

use depot_proxy::Policies;

use super::load_config;
use crate::error::Result;

pub fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!(
        "{} {}",
        style("✓").green().bold(),
        style(config_path.display()).bold()
    );
    println!(
        "  failure cache TTL: {}s",
        config.failure_cache_ttl.as_secs()
    );

    for managed in &config.managed_repositories {
        println!();
        println!(
            "{} ({}, {})",
            style(&managed.id).cyan().bold(),
            managed.layout,
            managed.location.display()
        );

        let connectors = config.connectors_for(&managed.id);
        if connectors.is_empty() {
            println!("  {}", style("no proxy connectors").dim());
            continue;
        }
        for resolved in connectors {
            println!(
                "  {:>3}. {} {} ({})",
                resolved.connector.order,
                style(&resolved.remote.id).bold(),
                resolved.remote.url,
                resolved.remote.layout
            );
            println!(
                "       {} timeout {}s",
                style(describe(resolved.policies())).dim(),
                resolved.timeout().as_secs()
            );
        }
    }

    Ok(())
}

fn describe(policies: &Policies) -> String {
    format!(
        "checksum={:?} releases={:?} snapshots={:?} cache-failures={:?}",
        policies.checksum, policies.releases, policies.snapshots, policies.cache_failures
    )
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_defaults() {
        insta::assert_snapshot!(
            describe(&Policies::default()),
            @"checksum=fix releases=once snapshots=daily cache-failures=ignore"
        );
    }
}
