//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use super::stream::{report_outcome, stream_answer};
use tokstream_application::SearchService;
use tokstream_core::Exchange;
use tokstream_infrastructure::AppConfig;

const COMMANDS: [&str; 5] = ["/history", "/delete", "/clear", "/help", "/exit"];

/// Completion, highlighting and hints for slash commands.
#[derive(Clone, Default)]
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ChatHelper {}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Query(&'a str),
    History,
    /// 1-based position as listed by `/history`; `None` if not a number.
    Delete(Option<usize>),
    Clear,
    Help,
    Exit,
    Unknown(&'a str),
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/history" => Input::History,
        "/clear" => Input::Clear,
        "/help" => Input::Help,
        "/exit" | "/quit" | "exit" | "quit" => Input::Exit,
        cmd => match cmd.strip_prefix("/delete") {
            Some(arg) if arg.is_empty() || arg.starts_with(char::is_whitespace) => {
                Input::Delete(arg.trim().parse::<usize>().ok().filter(|n| *n > 0))
            }
            _ if cmd.starts_with('/') => Input::Unknown(cmd),
            _ => Input::Query(cmd),
        },
    }
}

fn print_help() {
    println!("{}", "Type a question to stream an answer.".bright_black());
    println!(
        "{}",
        "/history shows past exchanges, /delete N forgets one, /clear forgets all.".bright_black()
    );
    println!(
        "{}",
        "Ctrl-C while an answer streams stops it and keeps the partial text.".bright_black()
    );
    println!("{}", "/exit quits.".bright_black());
}

async fn print_history(service: &SearchService) {
    let exchanges = service.conversation().exchanges().await;
    if exchanges.is_empty() {
        println!("{}", "(no history)".bright_black());
        return;
    }
    // Oldest first reads better in a terminal.
    for (index, exchange) in exchanges.iter().rev().enumerate() {
        println!(
            "{}",
            format!("[{}] {}", index + 1, exchange.query.content).green()
        );
        match &exchange.answer {
            Some(answer) => {
                for line in answer.content.lines() {
                    println!("    {}", line.bright_blue());
                }
            }
            None => println!("    {}", "(no answer)".bright_black()),
        }
    }
}

/// Removes the exchange listed at `position` by `/history`.
async fn delete_exchange(service: &SearchService, position: usize) -> Option<Exchange> {
    let mut exchanges = service.conversation().exchanges().await;
    // `exchanges` is newest first; `/history` numbers oldest first.
    let index = exchanges.len().checked_sub(position)?;
    let exchange = exchanges.remove(index);
    service
        .conversation()
        .remove_exchange(&exchange)
        .await
        .then_some(exchange)
}

/// Runs the REPL until `/exit` or EOF.
pub async fn run(config: &AppConfig) -> Result<()> {
    let service = SearchService::from_config(config);

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!("{}", "=== tokstream chat ===".bright_magenta().bold());
    println!(
        "{}",
        format!("backend: {}. Type /help for commands.", service.backend_name()).bright_black()
    );
    println!();

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /exit to quit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        match parse_input(&line) {
            Input::Blank => continue,
            Input::Exit => break,
            Input::Help => print_help(),
            Input::History => print_history(&service).await,
            Input::Delete(Some(position)) => match delete_exchange(&service, position).await {
                Some(exchange) => println!(
                    "{}",
                    format!("Deleted: {}", exchange.query.content).bright_black()
                ),
                None => println!("{}", format!("No history entry {position}.").yellow()),
            },
            Input::Delete(None) => {
                println!("{}", "Usage: /delete N (see /history)".yellow());
            }
            Input::Clear => {
                service.conversation().clear().await;
                println!("{}", "History cleared.".bright_black());
            }
            Input::Unknown(cmd) => {
                println!("{}", format!("Unknown command: {cmd}").yellow());
            }
            Input::Query(query) => {
                let _ = rl.add_history_entry(query);
                match stream_answer(&service, query, true).await {
                    Ok(session) => {
                        report_outcome(&session);
                    }
                    Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                }
                println!();
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
