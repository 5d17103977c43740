//! services/advisor/src/bin/advisor.rs

use advisor_lib::{
    adapters::HttpAdvisoryAdapter,
    config::Config,
    error::AppError,
    shell::{
        handle_intent,
        protocol::Intent,
        state::{AppState, Navigator},
        view::{self, StreamPrinter},
        Reply,
    },
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const REFRESH_INTERVAL: Duration = Duration::from_millis(80);

/// An answer being printed while it streams in.
struct Streaming {
    task: JoinHandle<()>,
    placeholder: Uuid,
    printer: StreamPrinter,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Questions go to {}", config.ask_url());

    // --- 2. Initialize the Advisory Adapter ---
    let client = reqwest::Client::builder()
        .connect_timeout(config.request_timeout)
        .build()?;
    let advisor = Arc::new(HttpAdvisoryAdapter::new(client, config.backend_url.clone()));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(advisor));
    let mut nav = Navigator::new();

    if let Reply::Screen(text) = handle_intent(&app_state, &mut nav, Intent::Show).await {
        println!("{}", text);
    }
    println!("输入 /help 查看帮助");

    // --- 4. Main Input Loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    let mut streaming: Option<Streaming> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed.");
                    break;
                };
                let intent = match Intent::parse(&line, nav.tab()) {
                    Ok(intent) => intent,
                    Err(e) => {
                        println!("💬 {}", e);
                        continue;
                    }
                };
                match handle_intent(&app_state, &mut nav, intent).await {
                    Reply::Screen(text) => println!("{}", text),
                    Reply::Notice(text) => println!("💬 {}", text),
                    Reply::Streaming { task, placeholder } => {
                        print!("🤖 ");
                        std::io::stdout().flush()?;
                        streaming = Some(Streaming {
                            task,
                            placeholder,
                            printer: StreamPrinter::new(),
                        });
                    }
                    Reply::Idle => {}
                    Reply::Quit => break,
                }
            }
            _ = ticker.tick(), if streaming.is_some() => {
                if let Some(mut current) = streaming.take() {
                    let finished = current.task.is_finished();
                    let content = {
                        let transcript = app_state.transcript.lock().await;
                        transcript
                            .get(current.placeholder)
                            .map(|m| m.content().to_string())
                            .unwrap_or_default()
                    };
                    if let Some(text) = current.printer.update(&content) {
                        print!("{}", text);
                        std::io::stdout().flush()?;
                    }
                    if finished {
                        current
                            .task
                            .await
                            .map_err(|e| AppError::Internal(format!("ask task failed: {}", e)))?;
                        println!();
                        println!("{}", view::nav_bar(nav.tab()));
                    } else {
                        streaming = Some(current);
                    }
                }
            }
        }
    }

    if let Some(current) = streaming {
        current.task.abort();
    }
    info!("Goodbye.");
    Ok(())
}
