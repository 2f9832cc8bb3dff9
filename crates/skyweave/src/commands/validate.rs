use crate::manifest::Manifest;
use colored::Colorize;
use std::path::Path;

pub async fn handle(config: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "Validating manifest...".blue());

    let (path, manifest) = Manifest::load(config)?;
    println!("Manifest: {}", path.display().to_string().cyan());

    let composed = manifest.compose()?;

    println!("{}", "✓ Manifest is valid".green().bold());
    println!();
    println!("Summary:");
    println!(
        "  Provider: {} ({})",
        manifest.provider.region.cyan(),
        manifest.provider.account
    );
    for (name, api) in &composed.apis {
        println!(
            "  API {}: {} endpoints, {} resources, fingerprint {}",
            name.cyan(),
            api.endpoints.len(),
            api.tree.len(),
            &api.fingerprint.as_str()[..12]
        );
    }
    for name in composed.functions.keys() {
        println!("  Function {}", name.cyan());
    }
    for name in composed.buckets.keys() {
        println!("  Bucket {}", name.cyan());
    }
    for name in composed.distributions.keys() {
        println!("  Distribution {}", name.cyan());
    }
    println!(
        "  {} resources in {} creation waves",
        composed.graph.len(),
        composed.graph.creation_waves().len()
    );

    Ok(())
}
