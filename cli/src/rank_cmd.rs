//! Offline scoring over recipe dumps.

use std::fs;

use anyhow::{Context, Result};

use skillet_core::{score_and_rank, score_recipe, validate_recipe, Recipe};

fn load_recipes(file: &str) -> Result<Vec<Recipe>> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read recipes from {file}"))?;
    serde_json::from_str(&content).context("Failed to parse recipes JSON")
}

/// Score every recipe and print them best-first.
pub fn rank(file: &str) -> Result<()> {
    let recipes = load_recipes(file)?;
    let total = recipes.len();
    let ranked = score_and_rank(recipes);

    println!("{total} recipes, best first:");
    for (position, recipe) in ranked.iter().enumerate() {
        println!(
            "{:>3}. [{:>5.1}] {} ({})",
            position + 1,
            recipe.virality_score.unwrap_or(0.0),
            recipe.title,
            recipe.platform
        );
    }
    Ok(())
}

/// Run the validation gate and quality scorer over each recipe.
pub fn check(file: &str) -> Result<()> {
    let recipes = load_recipes(file)?;

    let mut valid = 0usize;
    for recipe in &recipes {
        let validation = validate_recipe(recipe);
        let quality = score_recipe(recipe);

        let verdict = match &validation.reason {
            None => {
                valid += 1;
                "ok".to_string()
            }
            Some(reason) => format!("rejected: {reason}"),
        };
        println!(
            "[quality {:.2} {:?}] {} -> {}",
            quality.score, quality.status, recipe.title, verdict
        );
        for warning in &quality.warnings {
            println!("    warning: {warning}");
        }
    }

    println!();
    println!("{valid}/{} recipes pass the validation gate", recipes.len());
    Ok(())
}
