//! Newline-delimited JSON-RPC over stdin/stdout
//!
//! The whole stream is one implicit session: frames are processed in order and
//! the session is closed when the input ends.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::mcp::rpc::{json_rpc_error, PARSE_ERROR};
use crate::mcp::session::Session;
use crate::AppState;

pub async fn serve_lines<R, W>(state: &AppState, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let session = Session::new();
    info!(session_id = %session.id(), "stdio session opened");

    let mut frame_bytes = Vec::new();
    loop {
        frame_bytes.clear();
        if reader.read_until(b'\n', &mut frame_bytes).await? == 0 {
            break;
        }

        let Some(response) = answer_frame(state, &session, &frame_bytes).await? else {
            continue;
        };

        let mut frame = serde_json::to_vec(&response)?;
        frame.push(b'\n');
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }

    session.close().await.map_err(io::Error::other)?;
    info!(session_id = %session.id(), "stdio session closed");
    Ok(())
}

/// Frames that are not UTF-8 JSON are answered with a parse error and the
/// stream keeps going. Blank frames are skipped.
async fn answer_frame(
    state: &AppState,
    session: &Session,
    frame: &[u8],
) -> io::Result<Option<Value>> {
    let payload = std::str::from_utf8(frame)
        .map_err(|err| err.to_string())
        .and_then(|text| {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            serde_json::from_str::<Value>(text)
                .map(Some)
                .map_err(|err| err.to_string())
        });

    match payload {
        Ok(None) => Ok(None),
        Ok(Some(payload)) => session
            .process(state, payload)
            .await
            .map_err(io::Error::other),
        Err(err) => {
            debug!(error = %err, "unparseable stdio frame");
            Ok(Some(json_rpc_error(None, PARSE_ERROR, "Parse error")))
        }
    }
}

pub async fn serve_stdio(state: &AppState) -> io::Result<()> {
    serve_lines(state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
