use crate::manifest::Manifest;
use colored::Colorize;
use skyweave_cloud::{ApplyEngine, DryRunEngine, Plan};
use std::path::Path;

pub async fn handle(config: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let (_, manifest) = Manifest::load(config)?;
    let composed = manifest.compose()?;

    let engine = DryRunEngine::new();
    let plan = engine.plan(&composed.graph).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "No resources declared".dimmed());
        return;
    }

    let mut current_wave = None;
    for action in &plan.actions {
        let wave = action.details.get("wave").and_then(|w| w.as_u64());
        if wave != current_wave {
            current_wave = wave;
            if let Some(wave) = wave {
                println!("{}", format!("wave {}", wave).bold());
            }
        }
        println!("  {} {}", "+".green(), action.resource_id);
    }
    println!();
    println!("Plan: {}", plan.summary());
}
