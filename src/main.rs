use std::io::{stdin, stdout, Write};

use chain::Chain;
use clap::Parser;
use config::Config;
use dotenvy::dotenv;
use session::Session;
use text_to_sql_chain::TextToSqlChain;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod chain;
mod config;
mod error;
mod executor;
mod llm;
mod prompt;
mod render;
mod response;
mod schema;
mod session;
mod text_to_sql_chain;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let processor = TextToSqlChain::initialize(&config).await?;
    let mut session = Session::new();

    println!("SQL Bot - a SQL chatbot");
    print_history(&session);

    loop {
        print!("> ");
        stdout().flush()?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                print_history(&session);
                continue;
            }
            _ => {}
        }

        match processor.run(&mut session, input.to_string()).await {
            Ok(replies) => {
                for reply in &replies {
                    println!("{}", render::render(reply, config.chart_width));
                }
            }
            Err(e) => {
                error!(error = %e, "request failed");
                println!("Request failed: {e}");
            }
        }
    }

    Ok(())
}

fn print_history(session: &Session) {
    for message in session.messages() {
        println!("[{}] {}", message.role, message.content);
    }
}
