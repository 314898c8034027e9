use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use resume_scout::{AppConfig, ChatEngine, RobotaUaClient, WorkUaClient};

/// Conversation id for the single terminal session.
const TERMINAL_CHAT_ID: i64 = 0;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("Connecting to Robota.ua");
    let robota_ua = RobotaUaClient::connect(config.robota_ua, config.similarity_threshold).await?;
    info!("Connecting to Work.ua");
    let work_ua = WorkUaClient::connect(config.work_ua, config.similarity_threshold).await?;

    let engine = ChatEngine::new(work_ua, robota_ua, &config.chat);

    // Terminal front end: inline-keyboard buttons are printed as
    // `[data] label` rows and selected by typing the data back.
    println!("{}", engine.handle_message(TERMINAL_CHAT_ID, "/start").await.text);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let reply = if input.starts_with("salary_") || input.starts_with("experience_") {
            engine.handle_callback(TERMINAL_CHAT_ID, input).await
        } else {
            engine.handle_message(TERMINAL_CHAT_ID, input).await
        };

        println!("{}", reply.text);
        if let Some(keyboard) = &reply.keyboard {
            for row in &keyboard.rows {
                for button in row {
                    println!("  [{}] {}", button.data, button.label);
                }
            }
        }

        if input == "/stop" {
            break;
        }
    }

    Ok(())
}
