//! Airdesk 命令行演示
//!
//! 入口：初始化日志、加载配置、组装引擎，然后从 stdin 逐行读取用户消息，
//! 每个事件以一行 JSON 输出到 stdout。`/state` 输出会话快照，`/quit` 退出。

use std::sync::Arc;

use anyhow::Context;
use airdesk::config::load_config;
use airdesk::core::{AirlineDesk, Engine, MemoryConversationStore};
use airdesk::llm::create_model;
use airdesk::observability;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;
    let model = create_model(&cfg.llm);
    let engine = Engine::airline(&cfg, model).context("Invalid specialist configuration")?;
    let desk = AirlineDesk::new(engine, Arc::new(MemoryConversationStore::new()));

    let snapshot = desk.bootstrap().await;
    let conversation_id = snapshot.conversation_id.clone();
    tracing::info!(conversation_id = %conversation_id, agent = %snapshot.current_agent, "Conversation started");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "/quit" => break,
            "/state" => {
                let snapshot = desk.snapshot(&conversation_id).await?;
                let json = serde_json::to_string_pretty(&snapshot)?;
                stdout.write_all(format!("{json}\n").as_bytes()).await?;
            }
            message => match desk.submit(Some(conversation_id.as_str()), message).await {
                Ok(response) => {
                    for event in &response.events {
                        let json = serde_json::to_string(event)?;
                        stdout.write_all(format!("{json}\n").as_bytes()).await?;
                    }
                    for reply in &response.messages {
                        stdout
                            .write_all(format!("[{}] {reply}\n", response.current_agent).as_bytes())
                            .await?;
                    }
                }
                Err(e) => {
                    let action = desk.recover(&e);
                    stdout
                        .write_all(format!("{}\n", action.user_message()).as_bytes())
                        .await?;
                }
            },
        }
        stdout.flush().await?;
    }

    Ok(())
}
