//! `askrelay check` — Smoke-test a running server.
//!
//! Exercises healthz, chat, history, the audit proof, mode and version in
//! turn, printing one line per check and a PASS/FAIL summary. Exits with an
//! error when any check fails.

use askrelay_config::AppConfig;
use serde_json::{Value, json};
use std::time::Duration;

/// Session identifier used by the chat and history checks.
const CHECK_SESSION: &str = "report-123";

/// Outcome of one smoke check.
#[derive(Debug)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
}

pub async fn run(
    config: &AppConfig,
    base_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = base_url.unwrap_or_else(|| format!("http://localhost:{}", config.gateway.port));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.llm.timeout_secs + 10))
        .build()?;

    println!("🔎 AskRelay smoke check against {base_url}\n");
    let results = run_checks(&client, base_url.trim_end_matches('/')).await;

    let summary = results
        .iter()
        .map(|r| format!("{} {}", r.name, if r.passed { "PASS" } else { "FAIL" }))
        .collect::<Vec<_>>()
        .join(", ");
    println!("\nSUMMARY → {summary}");

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        return Err(format!("{failed} check(s) failed").into());
    }
    Ok(())
}

/// Run every check in order. Each failure is reported and does not stop
/// the remaining checks.
pub async fn run_checks(client: &reqwest::Client, base: &str) -> Vec<CheckResult> {
    let checks = [
        ("health", "HEALTHZ", healthz(client, base).await),
        ("chat", "CHAT", chat(client, base).await),
        ("history", "HISTORY", history(client, base).await),
        ("storage", "STORAGE", storage(client, base).await),
        ("mode", "MODE", mode(client, base).await),
        ("version", "VERSION", version(client, base).await),
    ];

    checks
        .into_iter()
        .map(|(name, label, outcome)| {
            match &outcome {
                Ok(line) => println!("{label}: {line}"),
                Err(e) => println!("{label}: ERROR - {e}"),
            }
            CheckResult {
                name,
                passed: outcome.is_ok(),
            }
        })
        .collect()
}

async fn get_json(client: &reqwest::Client, url: &str) -> Result<(bool, Value), String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    let ok = response.status().is_success();
    let body = response.json::<Value>().await.map_err(|e| e.to_string())?;
    Ok((ok, body))
}

async fn healthz(client: &reqwest::Client, base: &str) -> Result<String, String> {
    let response = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let ok = response.status().is_success();
    let text = response.text().await.map_err(|e| e.to_string())?;
    if ok && text.starts_with("ok") {
        Ok(text)
    } else {
        Err(text)
    }
}

async fn chat(client: &reqwest::Client, base: &str) -> Result<String, String> {
    let response = client
        .post(format!("{base}/api/chat"))
        .json(&json!({ "question": "usage check", "session_identifier": CHECK_SESSION }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let ok = response.status().is_success();
    let body = response.json::<Value>().await.map_err(|e| e.to_string())?;

    let Some(answer) = body["answer"].as_str().filter(|_| ok) else {
        return Err(body.to_string());
    };

    let mut line: String = answer.chars().take(120).collect();
    if let Some(usage) = body.get("usage") {
        line.push_str(&format!(
            " (tokens_in={}, tokens_out={})",
            usage["tokens_in"], usage["tokens_out"]
        ));
    }
    if let Some(mode) = body["mode"].as_str() {
        line.push_str(&format!(" [mode {mode}]"));
    }
    Ok(line)
}

async fn history(client: &reqwest::Client, base: &str) -> Result<String, String> {
    let (ok, body) = get_json(
        client,
        &format!("{base}/api/history?session_identifier={CHECK_SESSION}"),
    )
    .await?;
    match body["count"].as_u64() {
        Some(count) if ok => Ok(format!("count={count}")),
        _ => Err(body.to_string()),
    }
}

async fn storage(client: &reqwest::Client, base: &str) -> Result<String, String> {
    let (ok, body) = get_json(client, &format!("{base}/proof/messages?limit=5")).await?;
    if ok && body["ok"] == Value::Bool(true) {
        Ok(body["rows"].to_string())
    } else {
        Err(body.to_string())
    }
}

async fn mode(client: &reqwest::Client, base: &str) -> Result<String, String> {
    let (ok, body) = get_json(client, &format!("{base}/mode")).await?;
    if ok {
        Ok(format!("openai={}", body["openai"]))
    } else {
        Err(body.to_string())
    }
}

async fn version(client: &reqwest::Client, base: &str) -> Result<String, String> {
    let (ok, body) = get_json(client, &format!("{base}/version")).await?;
    if ok {
        Ok(body.to_string())
    } else {
        Err(body.to_string())
    }
}
