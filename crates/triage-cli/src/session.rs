//! Line-at-a-time request loop

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use triage_router::{Orchestrator, Outcome};

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

/// Run one request and render the printed line
///
/// Errors are rendered rather than returned so the loop can accept the
/// next request.
pub async fn process_line(orchestrator: &Orchestrator, input: &str) -> String {
    match orchestrator.run_line(input).await {
        Ok(Outcome::Completed { response, .. }) => {
            format!("[{}] {}", response.handled_by, response.text)
        }
        Ok(Outcome::Rejected { verdict, .. }) => format!("[rejected] {}", verdict.reason),
        Err(e) => format!("[error] {}", e),
    }
}

/// Read requests from `input` until EOF or an exit command
///
/// Requests are processed strictly in order. Returns the number processed.
pub async fn run<R, W>(
    orchestrator: &Orchestrator,
    input: R,
    output: &mut W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut processed = 0;

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line.to_ascii_lowercase().as_str()) {
            break;
        }

        let rendered = process_line(orchestrator, line).await;
        writeln!(output, "{}", rendered)?;
        processed += 1;
    }

    Ok(processed)
}
