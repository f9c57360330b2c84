//! Interactive chat loop
//!
//! Generic over its input and output so tests can drive it with byte buffers.

use colored::*;
use log::{error, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::Agent;

/// Read user lines until `quit`, `exit` or end of input, answering each one
pub async fn run<R, W>(agent: &Agent, input: R, output: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let banner = format!("Map Assistant (model: {})\n", agent.model());
    output.write_all(banner.bold().to_string().as_bytes()).await?;
    output.write_all(b"Type 'quit' or 'exit' to stop.\n\n").await?;

    let mut lines = input.lines();
    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\nExiting.\n").await?;
            break;
        };

        let message = line.trim();
        if message.eq_ignore_ascii_case("quit") || message.eq_ignore_ascii_case("exit") {
            output.write_all(b"Goodbye.\n").await?;
            break;
        }
        if message.is_empty() {
            continue;
        }

        match agent.handle_turn(message).await {
            Ok(answer) => {
                let block = format!("\n{}\n\n{}\n\n---\n\n", "Assistant:".green().bold(), answer);
                output.write_all(block.as_bytes()).await?;
            }
            Err(e) => {
                error!("Turn failed: {}", e);
                let block = format!("\n{} {}\n\n---\n\n", "Error:".red().bold(), e);
                output.write_all(block.as_bytes()).await?;
            }
        }
    }

    output.flush().await?;
    info!("Chat session ended");
    Ok(())
}
