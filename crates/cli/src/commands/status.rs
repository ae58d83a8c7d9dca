//! `askrelay status` — Show resolved configuration.

use askrelay_config::AppConfig;
use std::path::Path;

pub fn run(config: &AppConfig, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🛰️  AskRelay Status");
    println!("==================");
    println!("  Config file:  {}", config_path.display());
    println!(
        "  Mode:         {}",
        if config.has_llm_key() { "llm" } else { "echo" }
    );
    println!("  LLM endpoint: {}", config.llm.base_url);
    println!("  Model:        {}", config.llm.model);
    println!("  Temperature:  {}", config.llm.temperature);
    println!("  Max tokens:   {}", config.llm.max_tokens);
    println!(
        "  Audit:        {} ({})",
        config.audit.backend,
        if config.audit.is_configured() { "configured" } else { "not configured" }
    );
    println!("  Audit table:  {}", config.audit.table);
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Public dir:   {}", config.gateway.public_dir.display());
    println!("  Logging:      {} ({})", config.logging.level, config.logging.format);

    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, using defaults and environment");
    }

    Ok(())
}
