//! Predict and project commands

use super::{read_features, spinner, AppContext};
use anyhow::{Context, Result};
use console::style;
use riskcast::advice::{generate_health_advice, key_factors, KeyFactor};
use riskcast::features::{FeatureMap, FeatureVector};
use riskcast::inference::{run_inference, InferenceResult};
use riskcast::models::ModelName;
use riskcast::projection::{project, Projection};
use riskcast::risk::{RiskCategory, RiskSummary, Tone};
use riskcast::store::PredictionRecord;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PredictOutput<'a> {
    model: ModelName,
    category: Option<RiskCategory>,
    probability_percent: String,
    result: &'a InferenceResult,
    defaults_used: Vec<&'static str>,
    projection: Option<&'a Projection>,
    advice: Vec<String>,
    key_factors: Vec<KeyFactor>,
}

pub fn run(
    ctx: &AppContext,
    model: ModelName,
    input: &Path,
    save: bool,
    with_projection: bool,
    json: bool,
) -> Result<()> {
    let thresholds = ctx.config.heart_thresholds()?;
    let engine = ctx.config.scoring_engine();
    let features = read_features(model, input)?;

    let pb = spinner(&format!("Scoring {} model...", model), json);
    let vector = FeatureVector::assemble(model, &features)?;
    let result = run_inference(&engine, &vector)
        .with_context(|| format!("{} prediction failed", model.title()))?;

    let projection = if with_projection {
        pb.set_message("Projecting risk +5 and +10 years...");
        Some(project(&engine, model, &vector.features)?)
    } else {
        None
    };
    pb.finish_and_clear();

    let summary = RiskSummary::from_result(&result, &thresholds);
    tracing::info!(
        "{} prediction: {} ({}%)",
        model,
        summary.category.map_or("uncategorised", |c| c.as_str()),
        summary.percent()
    );

    if save {
        // Keep the answers as entered so a reload re-signals any default
        let record = PredictionRecord::new(features, result.clone());
        ctx.store
            .save(&record)
            .with_context(|| format!("Failed to store {} result", model))?;
    }

    let advice = generate_health_advice(&vector.features, model, summary.category);
    let factors = key_factors(&vector.features, model);

    if json {
        let output = PredictOutput {
            model,
            category: summary.category,
            probability_percent: summary.percent(),
            result: &result,
            defaults_used: vector.defaults_used.iter().map(|d| d.feature).collect(),
            projection: projection.as_ref(),
            advice,
            key_factors: factors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_summary(&summary);
    for default in &vector.defaults_used {
        println!(
            "  {} No {} supplied; assumed {} for this estimate",
            style("!").yellow().bold(),
            default.feature,
            style(default.value).yellow()
        );
    }
    if let Some(projection) = &projection {
        print_projection(projection);
    }
    print_advice(&advice, &factors);
    if save {
        println!(
            "\n  {}",
            style(format!("Saved to {}", ctx.store.dir().display())).dim()
        );
    }
    Ok(())
}

/// Projection from a questionnaire, or from the last stored inputs
pub fn run_projection(
    ctx: &AppContext,
    model: ModelName,
    input: Option<&Path>,
    json: bool,
) -> Result<()> {
    let inputs: FeatureMap = match input {
        Some(path) => read_features(model, path)?,
        None => ctx.require_record(model)?.inputs,
    };

    let vector = FeatureVector::assemble(model, &inputs)?;
    if !json {
        for default in &vector.defaults_used {
            println!(
                "  {} No {} supplied; assumed {} for this estimate",
                style("!").yellow().bold(),
                default.feature,
                style(default.value).yellow()
            );
        }
    }

    let engine = ctx.config.scoring_engine();
    let pb = spinner("Projecting risk...", json);
    let projection = project(&engine, model, &inputs)?;
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
    } else {
        print_projection(&projection);
    }
    Ok(())
}

pub(crate) fn styled_category(category: Option<RiskCategory>) -> String {
    match category {
        Some(c) => match c.tone() {
            Tone::Good => style(c.as_str()).green().bold().to_string(),
            Tone::Caution => style(c.as_str()).yellow().bold().to_string(),
            Tone::Alert => style(c.as_str()).red().bold().to_string(),
        },
        None => style("Unknown").dim().to_string(),
    }
}

pub(crate) fn print_summary(summary: &RiskSummary) {
    println!("\n{}\n", style(summary.model.title()).bold().underlined());
    println!(
        "  Category:    {}",
        styled_category(summary.category)
    );
    println!("  Probability: {}%", style(summary.percent()).cyan());
    match summary.category {
        Some(category) => println!("\n  {}", category.headline()),
        None => println!(
            "\n  {}",
            style("The model returned no usable class probabilities.").yellow()
        ),
    }
}

fn print_projection(projection: &Projection) {
    println!("\n{}", style("Risk over time").bold());
    for point in &projection.points {
        match point.risk_percent {
            Some(risk) => println!("  {:<10} {:>5.1}%", point.label, risk),
            None => println!("  {:<10} {}", point.label, style("unavailable").red()),
        }
    }
    if !projection.is_complete() {
        println!(
            "  {}",
            style("Some points could not be scored; see the warnings above.").dim()
        );
    }
}

pub(crate) fn print_advice(advice: &[String], factors: &[KeyFactor]) {
    println!("\n{}", style("Advice").bold());
    for tip in advice {
        println!("  • {}", tip);
    }
    if !factors.is_empty() {
        println!("\n{}", style("Key factors affecting your risk").bold());
        for factor in factors {
            println!("  • {}", factor.message);
        }
    }
}
