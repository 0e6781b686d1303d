//! Line-driven editing session. Every accepted command recomputes and
//! re-renders the whole report from the current inputs.

use super::alloc::{self, AllocRequest};
use super::ui;
use crate::core::allocation::{self, AllocationInput};
use crate::core::analytics::ReportSettings;
use crate::core::config;
use crate::core::{QuoteProvider, Symbol};
use anyhow::{Context, Result, anyhow};
use std::io::{BufRead, Write};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Set(Symbol, f64),
    Amount(f64),
    Show,
    Reset,
    Help,
    Quit,
}

const HELP: &str = "Commands:
  SYMBOL=PERCENT   set a fund's allocation, e.g. BND=35
  amount=VALUE     set the total investment amount
  show             redisplay the report
  reset            set every allocation to 0%
  help             show this message
  quit             leave the session";

pub fn parse_command(line: &str) -> Result<SessionCommand> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" | "show" => return Ok(SessionCommand::Show),
        "reset" => return Ok(SessionCommand::Reset),
        "help" | "?" => return Ok(SessionCommand::Help),
        "quit" | "exit" | "q" => return Ok(SessionCommand::Quit),
        _ => {}
    }

    if let Some((key, value)) = line.split_once('=') {
        if key.trim().eq_ignore_ascii_case("amount") {
            let amount: f64 = value
                .trim()
                .trim_start_matches('$')
                .replace(',', "")
                .parse()
                .with_context(|| format!("Invalid amount: '{}'", value.trim()))?;
            config::check_investment_amount(amount)?;
            return Ok(SessionCommand::Amount(amount));
        }
        let (symbol, percent) = allocation::parse_assignment(line)?;
        return Ok(SessionCommand::Set(symbol, percent));
    }

    Err(anyhow!("Unrecognized command: '{line}'. Type 'help' for usage."))
}

/// Applies one command to the session state. Returns `false` on quit.
fn apply(request: &mut AllocRequest, command: &SessionCommand) -> Result<bool> {
    match command {
        SessionCommand::Set(symbol, percent) => request.allocation.set(*symbol, *percent)?,
        SessionCommand::Amount(amount) => request.investment_amount = *amount,
        SessionCommand::Reset => request.allocation = AllocationInput::empty(),
        SessionCommand::Quit => return Ok(false),
        SessionCommand::Show | SessionCommand::Help => {}
    }
    Ok(true)
}

/// Runs the session until `quit` or end of input and returns the final
/// inputs.
pub async fn run<R: BufRead>(
    input: R,
    mut request: AllocRequest,
    provider: &(dyn QuoteProvider + Send + Sync),
    settings: &ReportSettings,
) -> Result<AllocRequest> {
    println!("{HELP}");
    println!("{}", render(&request, provider, settings).await);
    prompt()?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} {e}", ui::style_text("Error:", ui::StyleType::Warning));
                prompt()?;
                continue;
            }
        };
        debug!(?command, "Session command");

        match apply(&mut request, &command) {
            Ok(true) if command == SessionCommand::Help => println!("{HELP}"),
            Ok(true) => println!("{}", render(&request, provider, settings).await),
            Ok(false) => break,
            Err(e) => println!("{} {e}", ui::style_text("Error:", ui::StyleType::Warning)),
        }
        prompt()?;
    }

    Ok(request)
}

async fn render(
    request: &AllocRequest,
    provider: &(dyn QuoteProvider + Send + Sync),
    settings: &ReportSettings,
) -> String {
    let report = alloc::build_report(request, provider, settings, false).await;
    format!("\n{}\n{}", ui::separator(), report.display_full())
}

fn prompt() -> Result<()> {
    print!("\n> ");
    std::io::stdout()
        .flush()
        .context("Failed to write prompt")
}
