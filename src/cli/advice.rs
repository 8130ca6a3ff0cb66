//! Advice and plan commands

use super::predict::{print_advice, print_summary};
use super::{spinner, AppContext};
use anyhow::{Context, Result};
use console::style;
use riskcast::advice::{generate_health_advice, key_factors, AiClient, HealthCoach};
use riskcast::models::ModelName;
use riskcast::risk::RiskSummary;

pub fn run(ctx: &AppContext, model: ModelName, json: bool) -> Result<()> {
    let record = ctx.require_record(model)?;
    let summary = RiskSummary::from_result(&record.result, &ctx.config.heart_thresholds()?);

    let advice = generate_health_advice(&record.inputs, model, summary.category);
    let factors = key_factors(&record.inputs, model);

    if json {
        let output = serde_json::json!({
            "model": model,
            "category": summary.category,
            "advice": advice,
            "key_factors": factors,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_summary(&summary);
    print_advice(&advice, &factors);
    Ok(())
}

/// Build the coach from config; fails early when no API key is available.
pub(crate) fn coach(ctx: &AppContext) -> Result<HealthCoach<AiClient>> {
    let ai = ctx.config.ai_config()?;
    let key = ctx.config.api_key(ai.backend);
    let client = AiClient::from_config(ai, key)?;
    Ok(HealthCoach::new(client)
        .with_limits(ctx.config.plan_max_tokens(), ctx.config.chat_max_tokens()))
}

pub fn run_plan(ctx: &AppContext, model: ModelName) -> Result<()> {
    let record = ctx.require_record(model)?;
    let summary = RiskSummary::from_result(&record.result, &ctx.config.heart_thresholds()?);
    let coach = coach(ctx)?;

    let pb = spinner("Writing your plan...", false);
    let plan = coach.plan(&record.inputs, &record.result, summary.category);
    pb.finish_and_clear();
    let plan = plan.context("Unable to generate plan. Please try again.")?;

    print_summary(&summary);
    println!("\n{}\n", style("Your personalised plan").bold());
    println!("{}", plan);
    println!(
        "\n{}",
        style("This plan is general lifestyle guidance, not medical advice.").dim()
    );
    Ok(())
}
