use crate::manifest::Manifest;
use std::path::Path;

pub async fn handle(config: Option<&Path>) -> anyhow::Result<()> {
    let (_, manifest) = Manifest::load(config)?;
    let composed = manifest.compose()?;
    println!("{}", serde_json::to_string_pretty(&composed.outputs())?);
    Ok(())
}
