//! `askrelay serve` — Start the HTTP server.

use askrelay_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🛰️  AskRelay");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Mode:      {}",
        if config.has_llm_key() { "llm" } else { "echo" }
    );

    askrelay_gateway::start(config).await?;

    Ok(())
}
