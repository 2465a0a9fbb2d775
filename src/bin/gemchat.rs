//! Interactive chat application for conversing with Gemini.
//!
//! This binary provides a streaming REPL over saved conversations.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! gemchat
//!
//! # Specify a model
//! gemchat --model pro
//!
//! # Keep sessions somewhere else and skip web search
//! gemchat --data-dir /tmp/chats --no-search
//!
//! # Read settings from a file
//! gemchat --config ~/.config/gemchat.yaml
//! ```
//!
//! Ctrl+C while a response streams stops it and keeps what arrived.  Type
//! `/help` for the list of commands.

use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gemchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatOrchestrator, NoticeKind, PlainTextRenderer, Renderer,
    SUGGESTIONS, SendOutcome, SessionRef, help_text, parse_command, suggestion,
};
use gemchat::{FileStorage, Gemini, InlineImage, KnownModel, Model, SessionId, SessionStore};

/// Main entry point for the gemchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("gemchat [OPTIONS]");
    let config = ChatConfig::resolve(args)?;

    let filter = if config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = Gemini::new(config.api_key.clone())?;
    let storage = FileStorage::new(&config.data_dir);
    tracing::info!(dir = %storage.dir().display(), "using session storage");
    let store = SessionStore::load(storage);
    let mut chat = ChatOrchestrator::new(client, store, &config);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    // The handler cancels whichever send is current.
    let cancel = Arc::new(Mutex::new(CancellationToken::new()));
    let cancel_clone = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if let Ok(token) = cancel_clone.lock() {
            token.cancel();
        }
    })?;

    let mut pending_image: Option<String> = None;

    println!("Gemini Chat (model: {})", chat.state().current_model());
    if let Some(session) = chat.active_session() {
        println!("Continuing \"{}\"", session.title);
    } else {
        print_suggestions();
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let gated = chat.state().needs_credential();
        if gated {
            renderer.print_info("An API key is required. Paste it below, or /quit.");
        }
        let prompt = if gated { "API key: " } else { "You: " };

        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if let Some(cmd) = parse_command(line) {
                    let _ = rl.add_history_entry(line);
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::New => {
                            chat.new_chat(&mut renderer);
                            pending_image = None;
                            renderer.print_info("Started a new conversation.");
                        }
                        ChatCommand::Sessions => print_sessions(&chat),
                        ChatCommand::Switch(target) => match resolve(&chat, &target) {
                            Some(id) if chat.select_session(&id) => {
                                if let Some(session) = chat.active_session() {
                                    renderer.print_info(&format!(
                                        "Switched to \"{}\"",
                                        session.title
                                    ));
                                }
                            }
                            _ => renderer.print_error("No such session."),
                        },
                        ChatCommand::Delete(target) => {
                            let id = match target {
                                Some(target) => resolve(&chat, &target),
                                None => chat.state().store().active_id().cloned(),
                            };
                            match id {
                                Some(id) if chat.delete_session(&id, &mut renderer) => {
                                    renderer.print_info("Session deleted.");
                                }
                                _ => renderer.print_error("No such session."),
                            }
                        }
                        ChatCommand::Model(None) => print_models(chat.state().current_model()),
                        ChatCommand::Model(Some(name)) => {
                            let model = name
                                .parse()
                                .unwrap_or_else(|_| Model::Custom(name.clone()));
                            chat.set_model(model);
                            renderer.print_info(&format!(
                                "Model changed to: {}",
                                chat.state().current_model()
                            ));
                        }
                        ChatCommand::Search(on) => {
                            if chat.set_search_enabled(on) {
                                renderer.print_info(if on {
                                    "Web search enabled."
                                } else {
                                    "Web search disabled."
                                });
                            } else {
                                renderer.print_error("Web search is not available.");
                            }
                        }
                        ChatCommand::System(prompt) => {
                            chat.set_system_instruction(prompt);
                            match chat.state().system_instruction() {
                                Some(p) => renderer
                                    .print_info(&format!("System instruction set to: {}", p)),
                                None => renderer.print_info("System instruction cleared."),
                            }
                        }
                        ChatCommand::Image(path) => match InlineImage::from_path(&path) {
                            Ok(image) => {
                                renderer.print_info(&format!(
                                    "Attached {} ({} bytes) to the next message.",
                                    image.mime_type(),
                                    image.decoded_len()
                                ));
                                pending_image = Some(image.to_data_uri());
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Show => print_transcript(&chat),
                        ChatCommand::Dismiss => match chat.dismiss_notice() {
                            Some(_) => renderer.print_info("Notice dismissed."),
                            None => renderer.print_info("Nothing to dismiss."),
                        },
                        ChatCommand::Key(key) => connect(&mut chat, &key, &mut renderer),
                        ChatCommand::Suggest(None) => print_suggestions(),
                        ChatCommand::Suggest(Some(n)) => match suggestion(n) {
                            Some(prompt) => {
                                println!("You: {prompt}");
                                send(&mut chat, prompt, &mut pending_image, &cancel, &mut renderer)
                                    .await;
                            }
                            None => renderer.print_error("No such suggestion."),
                        },
                        ChatCommand::Stats => print_stats(&chat),
                        ChatCommand::Invalid(message) => renderer.print_error(&message),
                    }
                    continue;
                }

                if gated {
                    connect(&mut chat, line, &mut renderer);
                    continue;
                }

                let _ = rl.add_history_entry(line);
                send(&mut chat, line, &mut pending_image, &cancel, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Sends one message under a fresh cancellation token and settles the
/// pending attachment.
async fn send(
    chat: &mut ChatOrchestrator<Gemini>,
    text: &str,
    pending_image: &mut Option<String>,
    cancel: &Mutex<CancellationToken>,
    renderer: &mut PlainTextRenderer,
) {
    let token = CancellationToken::new();
    if let Ok(mut current) = cancel.lock() {
        *current = token.clone();
    }

    println!("Gemini:");
    let outcome = chat
        .send_message(text, pending_image.as_deref(), &token, renderer)
        .await;
    match outcome {
        SendOutcome::Completed(_) | SendOutcome::Cancelled(_) => {
            *pending_image = None;
        }
        SendOutcome::Failed(Some(_)) => {
            *pending_image = None;
            renderer.print_info("Partial answer kept. /dismiss clears the notice.");
        }
        SendOutcome::Failed(None) => {
            if chat
                .state()
                .notice()
                .is_some_and(|n| n.kind == NoticeKind::Attachment)
            {
                *pending_image = None;
            }
        }
        SendOutcome::Rejected => renderer.print_error("Nothing was sent."),
    }
}

fn print_suggestions() {
    println!("Try one of these with /suggest <n>:");
    for (idx, prompt) in SUGGESTIONS.iter().enumerate() {
        println!("  {}. {prompt}", idx + 1);
    }
}

fn connect(chat: &mut ChatOrchestrator<Gemini>, key: &str, renderer: &mut PlainTextRenderer) {
    if chat.provide_credential(key) {
        renderer.print_info("API key connected.");
    } else {
        renderer.print_error("That key is empty.");
    }
}

fn resolve(chat: &ChatOrchestrator<Gemini>, target: &SessionRef) -> Option<SessionId> {
    let sessions = chat.state().store().sessions();
    match target {
        SessionRef::Index(idx) => idx
            .checked_sub(1)
            .and_then(|i| sessions.get(i))
            .map(|s| s.id.clone()),
        SessionRef::Id(id) => sessions.iter().find(|s| &s.id == id).map(|s| s.id.clone()),
    }
}

fn print_sessions(chat: &ChatOrchestrator<Gemini>) {
    let store = chat.state().store();
    if store.is_empty() {
        println!("    (no saved conversations)");
        return;
    }
    let active = store.active_id();
    for (idx, session) in store.sessions().iter().enumerate() {
        let marker = if Some(&session.id) == active { "*" } else { " " };
        println!(
            "  {marker} {:>3}. {}  ({} messages, {}, {})",
            idx + 1,
            session.title,
            session.messages.len(),
            session.model,
            session.last_updated
        );
    }
}

fn print_models(current: &Model) {
    println!("    Known models:");
    for model in KnownModel::ALL {
        let marker = if *current == Model::Known(model) {
            "*"
        } else {
            " "
        };
        println!("    {marker} {:<10} {}", model.alias(), model.as_str());
    }
    if let Model::Custom(name) = current {
        println!("    * (custom) {name}");
    }
}

fn print_transcript(chat: &ChatOrchestrator<Gemini>) {
    let Some(session) = chat.active_session() else {
        println!("    (no active conversation)");
        return;
    };
    println!("    {} [{}]", session.title, session.id);
    for message in &session.messages {
        let who = if message.is_user() { "You" } else { "Gemini" };
        println!("\n{who} ({}):", message.timestamp);
        if let Some(image) = &message.image {
            println!("  [image: {}, {} bytes]", image.mime_type(), image.decoded_len());
        }
        println!("{}", message.content);
        for (idx, citation) in message.grounding_chunks.iter().enumerate() {
            println!("  [{}] {} {}", idx + 1, citation.title, citation.uri);
        }
    }
}

fn print_stats(chat: &ChatOrchestrator<Gemini>) {
    let stats = chat.stats();
    println!("    Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Sessions: {}", stats.sessions);
    match stats.active_title {
        Some(ref title) => println!(
            "      Active: {} ({} messages)",
            title, stats.active_messages
        ),
        None => println!("      Active: (none)"),
    }
    println!(
        "      Web search: {}",
        if stats.search_enabled { "on" } else { "off" }
    );
    match chat.state().system_instruction() {
        Some(prompt) => println!("      System instruction: {}", prompt),
        None => println!("      System instruction: (none)"),
    }
    if stats.needs_credential {
        println!("      API key: (missing)");
    }
    if let Some(notice) = chat.state().notice() {
        println!("      Notice: {}", notice);
    }
}
