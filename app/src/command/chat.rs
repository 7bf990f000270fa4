//! Conversation with the mentor, one message or an interactive loop.
//!
//! The loop is a thin presentation layer: it collects input, shows a waiting
//! line while the reply is pending, prints replies and the running summary, and
//! keeps its own display history. The bounded memory lives in the session.

use std::io::Write;

use mentor_config::Config;
use mentor_conversation::{ConversationSession, SessionError, TurnReply};
use rand::seq::IndexedRandom;
use tracing::info;

use super::build_session;

const WAITING_MESSAGES: &[&str] = &[
    "Let me put on my thinking cap...",
    "Don't forget to breathe!",
    "This will only be a moment...",
    "Summoning the chatbot spirits...",
    "Doing some mental gymnastics...",
    "I'm on it! Give me a sec...",
    "I'm in deep thought, hang tight...",
    "Searching for my feelings and needs...",
];

const INTRO: &str = "This mini-app helps you practice CBT by identifying cognitive distortions in a thought and offers gentler rephrasing. You can also ask it for appropriate DBT skills for something you are dealing with. We do not store any information from your chats or any identifying information.";

const INPUT_LABEL: &str = "What thought would you like to look at or what situation do you need to think through what skills are appropriate for?";

const HELP: &str = "Commands: /new (start a new chat), /summary, /history, /exit";

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Optional model override
    pub model: Option<String>,
    /// Optional history budget override
    pub token_budget: Option<usize>,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let mut session = build_session(&config, input.model, input.token_budget)?;

        if let Some(msg) = input.message {
            let outcome = session.handle_turn(&msg).await.or_else(recover_reply)?;
            println!("{}", outcome.reply);
            return Ok(());
        }

        run_interactive(&mut session).await
    }
}

/// Keep the reply of an exchange whose summarization failed.
fn recover_reply(err: SessionError) -> Result<TurnReply, SessionError> {
    match err {
        SessionError::CompressionFailed { reply, source } => {
            eprintln!("(summary not updated: {source})");
            Ok(reply)
        }
        other => Err(other),
    }
}

fn waiting_message() -> &'static str {
    WAITING_MESSAGES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("Thinking...")
}

/// Interactive loop. Errors from a turn are shown and the loop continues,
/// so the same input can be retried.
async fn run_interactive(session: &mut ConversationSession) -> anyhow::Result<()> {
    println!("=== CBT/DBT Practice Mentor ===\n");
    println!("{INTRO}\n");
    println!("{HELP}\n");
    println!("{INPUT_LABEL}");

    // Display-only log of (input, reply); the session's memory is bounded,
    // this is not.
    let mut display_history: Vec<(String, String)> = Vec::new();

    loop {
        print!("\n🧐 > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            "/exit" | "/quit" | "exit" | "quit" => break,
            "/new" => {
                session.reset();
                display_history.clear();
                println!("Started a new chat.");
                continue;
            }
            "/summary" => {
                print_summary(session);
                continue;
            }
            "/history" => {
                print_history(&display_history);
                continue;
            }
            "/help" => {
                println!("{HELP}");
                continue;
            }
            _ => {}
        }

        println!("{}", waiting_message());

        match session.handle_turn(input).await.or_else(recover_reply) {
            Ok(outcome) => {
                println!("\n🤖 {}", outcome.reply);
                display_history.push((input.to_string(), outcome.reply));
            }
            Err(e) => {
                eprintln!("Error: {e}");
                eprintln!("Nothing was saved; you can send the same message again.");
            }
        }
    }

    info!(
        "Conversation ended after {} exchanges",
        session.turn_count()
    );
    Ok(())
}

fn print_summary(session: &ConversationSession) {
    let stats = session.memory().stats();
    println!("--- Chat Summary ---");
    println!(
        "Session {} (started {})",
        session.id(),
        session.started_at().format("%Y-%m-%d %H:%M UTC")
    );
    println!("{}", session.summary());
    println!(
        "({} recent turns, ~{}/{} tokens, {} compressions)",
        stats.turns, stats.estimated_tokens, stats.token_budget, stats.compressions
    );
}

/// Newest exchange first.
fn print_history(history: &[(String, String)]) {
    if history.is_empty() {
        println!("No messages yet.");
        return;
    }
    println!("--- Conversation History ---");
    for (input, reply) in history.iter().rev() {
        println!("🤖 {reply}");
        println!("🧐 {input}\n");
    }
}
