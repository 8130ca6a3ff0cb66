//! Chat command - talk to the health coach about stored results

use super::advice::coach;
use super::{spinner, AppContext};
use anyhow::{Context, Result};
use console::style;
use riskcast::advice::{chat_context, ChatSession};
use std::io::{BufRead, Write};

pub fn run(ctx: &AppContext, message: Option<String>) -> Result<()> {
    let coach = coach(ctx)?;
    let summary = ctx
        .store
        .summary()
        .context("Failed to read stored results")?;
    let context = chat_context(&summary, &ctx.config.heart_thresholds()?);
    let mut session = ChatSession::new();

    if let Some(message) = message {
        let reply = coach.chat(&mut session, &context, &message)?;
        println!("{}", reply);
        return Ok(());
    }

    println!(
        "\n{} Health coach ready. {}\n",
        style("💬").bold(),
        style("Type 'exit' to quit, '/clear' to forget the conversation.").dim()
    );
    if summary.is_empty() {
        println!(
            "  {}\n",
            style("No stored results yet; answers will be general.").dim()
        );
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", style("you ›").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let text = line.trim();
        match text {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                session.clear();
                println!("  {}", style("Conversation cleared.").dim());
                continue;
            }
            _ => {}
        }

        let pb = spinner("Thinking...", false);
        let reply = coach.chat(&mut session, &context, text);
        pb.finish_and_clear();

        match reply {
            Ok(reply) => println!("{} {}\n", style("coach ›").green().bold(), reply),
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                println!(
                    "{} {}\n",
                    style("coach ›").red().bold(),
                    style(format!(
                        "Sorry, I'm having trouble right now ({e}). Please try again."
                    ))
                    .red()
                );
            }
        }
    }
    Ok(())
}
