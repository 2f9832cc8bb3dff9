use crate::manifest::Manifest;
use colored::Colorize;
use skyweave_cloud::{ApplyEngine, DryRunEngine};
use std::path::Path;

pub async fn handle(config: Option<&Path>) -> anyhow::Result<()> {
    let (_, manifest) = Manifest::load(config)?;
    let composed = manifest.compose()?;

    let engine = DryRunEngine::new();
    println!("{}", format!("Applying with the {} engine...", engine.name()).blue());

    let plan = engine.plan(&composed.graph).await?;
    let result = engine.apply(&plan).await?;

    for success in &result.succeeded {
        println!("  {} {}", "✓".green(), success.message);
    }
    for failure in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.action_id,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !result.is_success() {
        anyhow::bail!("{} of {} actions failed", result.failed.len(), plan.actions.len());
    }
    println!(
        "{}",
        format!("✓ {} actions in {}ms", result.succeeded.len(), result.duration_ms)
            .green()
            .bold()
    );
    Ok(())
}
