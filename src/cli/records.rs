//! Show and clear stored results

use super::predict::styled_category;
use super::AppContext;
use anyhow::{Context, Result};
use console::style;
use riskcast::models::ModelName;
use riskcast::risk::RiskSummary;

fn selected(model: Option<ModelName>) -> Vec<ModelName> {
    model.map_or_else(|| ModelName::ALL.to_vec(), |m| vec![m])
}

pub fn show(ctx: &AppContext, model: Option<ModelName>, json: bool) -> Result<()> {
    let thresholds = ctx.config.heart_thresholds()?;

    if json {
        let summary = ctx.store.summary().context("Failed to read stored results")?;
        let value = match model {
            Some(m) => serde_json::to_value(summary.get(m))?,
            None => serde_json::to_value(&summary)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for m in selected(model) {
        let record = ctx
            .store
            .load(m)
            .with_context(|| format!("Failed to read stored {m} result"))?;
        println!("\n{}", style(m.title()).bold());
        let Some(record) = record else {
            println!("  {}", style("No stored result").dim());
            continue;
        };

        let summary = RiskSummary::from_result(&record.result, &thresholds);
        println!("  Category:    {}", styled_category(summary.category));
        println!("  Probability: {}%", style(summary.percent()).cyan());
        println!(
            "  Saved:       {}",
            style(record.saved_at.format("%Y-%m-%d %H:%M UTC")).dim()
        );
        for (name, value) in record.inputs.iter() {
            println!("    {:<20} {}", style(name).dim(), value);
        }
    }
    Ok(())
}

pub fn clear(ctx: &AppContext, model: Option<ModelName>) -> Result<()> {
    for m in selected(model) {
        let removed = ctx
            .store
            .clear(m)
            .with_context(|| format!("Failed to clear stored {m} result"))?;
        if removed {
            println!("{} Cleared {} result", style("✓").green(), m);
        } else {
            println!("{} No stored {} result", style("·").dim(), m);
        }
    }
    Ok(())
}
