//! Init command - create the user config file

use anyhow::Result;
use console::style;
use riskcast::config::UserConfig;

/// Run the init command
pub fn run() -> Result<()> {
    println!("\n{} Initializing riskcast\n", style("🩺").bold());

    let (config_path, created) = UserConfig::init_user_config()?;
    if created {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }

    let config = UserConfig::load()?;
    println!("\n{}", style("Models").bold());
    println!("  Put the exported model files in:");
    println!("    {}", style(config.models_dir().display()).cyan());
    println!("  Expected files:");
    for model in riskcast::models::ModelName::ALL {
        let path = config.model_path(model);
        let mark = if path.exists() {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("    {} {}", mark, path.display());
    }

    println!("\n{}", style("Next steps").bold());
    println!("  riskcast predict heart -i heart.toml");
    println!("  riskcast advice heart");
    Ok(())
}
