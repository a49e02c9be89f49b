use std::path::Path;
use crate::cli::commands::StagesArgs;
use crate::config::credentials::mask_token;
use crate::config::load_or_default;
use crate::errors::TrackerError;
use crate::pipeline::Reconciler;
use crate::utils::formatting::format_remaining;

pub async fn handle_stages(args: StagesArgs) -> Result<(), TrackerError> {
    let config = load_or_default(args.config.as_deref().map(Path::new)).await?;
    let reconciler = Reconciler::new(config.stages())?;

    println!(
        "Endpoint: {}{} (token: {})",
        config.endpoint.base_url.trim_end_matches('/'),
        config.endpoint.status_path,
        config
            .endpoint
            .resolved_token()
            .map(|t| mask_token(&t))
            .unwrap_or_else(|| "none".to_string()),
    );
    println!("Poll interval: {}ms", config.polling.interval_ms);
    println!();

    let total: u64 = reconciler.stages().iter().map(|s| s.estimated_secs).sum();
    for (i, stage) in reconciler.stages().iter().enumerate() {
        println!(
            "{:>2}. {:<28} [{}] {}",
            i + 1,
            stage.name,
            stage.icon,
            format_remaining(stage.estimated_secs)
        );
        if !stage.description.is_empty() {
            println!("    {}", stage.description);
        }
    }
    println!();
    println!("Estimated total: {}", format_remaining(total));

    Ok(())
}
