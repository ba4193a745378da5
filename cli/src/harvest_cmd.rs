//! File-driven harvest runs.
//!
//! Loads raw candidates from a JSON file, groups them by platform behind
//! mock discovery collaborators, and runs the full pipeline against an
//! in-memory store. Useful for exercising extraction, dedup, and scoring
//! on captured payloads without touching platform APIs.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use skillet_core::{
    create_provider_from_env, AiExtractor, Discovery, HarvestConfig, HarvestOrchestrator,
    LocalExtractor, MemoryStore, MockDiscovery, Platform, RawCandidate, RecipeExtractor,
};

pub async fn run(
    candidates_file: &str,
    platforms: &[String],
    limit: usize,
    min_quality: Option<f64>,
    use_ai: bool,
) -> Result<()> {
    let content = fs::read_to_string(candidates_file)
        .with_context(|| format!("Failed to read candidates from {candidates_file}"))?;
    let candidates: Vec<RawCandidate> =
        serde_json::from_str(&content).context("Failed to parse candidates JSON")?;

    let selected = parse_platforms(platforms)?;

    // One mock discoverer per platform present in the file
    let mut by_platform: BTreeMap<Platform, Vec<RawCandidate>> = BTreeMap::new();
    for candidate in candidates {
        by_platform
            .entry(candidate.platform)
            .or_default()
            .push(candidate);
    }
    let discoverers: Vec<Arc<dyn Discovery>> = by_platform
        .into_iter()
        .map(|(platform, candidates)| {
            Arc::new(MockDiscovery::with_candidates(platform, candidates)) as Arc<dyn Discovery>
        })
        .collect();

    let extractor: Arc<dyn RecipeExtractor> = if use_ai {
        let provider = create_provider_from_env().context("Failed to configure LLM provider")?;
        Arc::new(AiExtractor::new(Arc::from(provider)))
    } else {
        Arc::new(LocalExtractor::new())
    };

    let mut config = HarvestConfig::from_env();
    if let Some(min_quality) = min_quality {
        config.min_quality_score = min_quality;
    }

    let store = Arc::new(MemoryStore::new());
    let orchestrator = HarvestOrchestrator::new(discoverers, extractor, store.clone(), config);

    let run = orchestrator
        .run_harvest(selected.as_deref(), limit)
        .await
        .context("Harvest run rejected")?;

    println!("Harvest Run {}", run.run_id);
    println!("================");
    println!("Status: {:?}", run.status);
    if let Some(duration) = run.duration_seconds() {
        println!("Duration: {duration:.1}s");
    }
    println!();
    println!("Discovered: {}", run.total_discovered);
    for (platform, count) in &run.discovered {
        println!("  {platform}: {count}");
    }
    println!("Extracted: {}", run.total_extracted);
    println!("Validation rejected: {}", run.validation_rejected);
    println!("Duplicates found: {}", run.duplicates_found);
    println!(
        "Quality: {} passed, {} failed",
        run.quality_passed, run.quality_failed
    );
    println!("Stored: {}", run.stored);
    for (platform, errors) in &run.errors {
        println!("Errors ({platform}):");
        for error in errors {
            println!("  - {error}");
        }
    }

    println!();
    println!("Stored recipes (ranked):");
    for recipe in store.all().await {
        println!(
            "  [{:>5.1}] {} ({})",
            recipe.virality_score.unwrap_or(0.0),
            recipe.title,
            recipe.platform
        );
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}

fn parse_platforms(names: &[String]) -> Result<Option<Vec<Platform>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut platforms = Vec::new();
    for name in names {
        match Platform::from_str(name) {
            Some(platform) => platforms.push(platform),
            None => bail!("Unknown platform: {name}"),
        }
    }
    Ok(Some(platforms))
}
