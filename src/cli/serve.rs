//! `todo-reminder serve`: line-delimited JSON tool calls over stdio

use anyhow::Result;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::tools::{dispatch, ToolCall, ToolFacade, ToolOutput};

pub async fn run(facade: &ToolFacade) -> Result<()> {
    info!("Serving tool calls on stdio");
    serve_lines(facade, BufReader::new(io::stdin()), io::stdout()).await
}

/// Answer each non-blank input line with exactly one output line.
pub async fn serve_lines<R, W>(facade: &ToolFacade, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<ToolCall>(line) {
            Ok(call) => {
                debug!("Tool call: {}", call.tool);
                dispatch(facade, call).await
            }
            Err(e) => ToolOutput::Error {
                message: format!("Malformed tool call: {}", e),
            },
        };

        let mut response = serde_json::to_string(&output)?;
        response.push('\n');
        writer.write_all(response.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
