//! `askrelay doctor` — Diagnose configuration and upstream reachability.

use askrelay_config::{AppConfig, ConfigError};
use std::path::Path;

pub async fn run(
    config: Result<AppConfig, ConfigError>,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 AskRelay Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ⚠️  No config file at {}, using defaults", config_path.display());
    }

    let config = match config {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    // LLM upstream
    if config.has_llm_key() {
        match askrelay_providers::build_from_config(&config) {
            Ok(completion) => {
                if completion.health_check().await {
                    println!(
                        "  ✅ LLM endpoint reachable ({}, model {})",
                        completion.provider_name(),
                        config.llm.model
                    );
                } else {
                    println!(
                        "  ❌ LLM endpoint {} unreachable or key rejected; chat will answer with echo",
                        config.llm.base_url
                    );
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  ❌ LLM client could not be built: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  No LLM API key, chat answers in echo mode (set OPENAI_API_KEY)");
    }

    // Audit store
    match askrelay_audit::build_from_config(&config.audit) {
        Ok(Some(sink)) => match sink.recent_messages(1).await {
            Ok(_) => println!("  ✅ Audit store readable ({})", sink.name()),
            Err(e) => {
                println!("  ❌ Audit store query failed: {e}");
                issues += 1;
            }
        },
        Ok(None) => {
            println!(
                "  ⚠️  Audit store not configured, /proof/messages will report supabase_not_configured"
            );
        }
        Err(e) => {
            println!("  ❌ Audit store could not be built: {e}");
            issues += 1;
        }
    }

    // Static files
    if config.gateway.public_dir.is_dir() {
        println!(
            "  ✅ Public directory {} exists",
            config.gateway.public_dir.display()
        );
    } else {
        println!(
            "  ⚠️  Public directory {} missing, unrouted paths return 404",
            config.gateway.public_dir.display()
        );
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
