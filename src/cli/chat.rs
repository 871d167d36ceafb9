use std::fs;
use std::path::Path;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::chat::{Session, Turn};
use crate::core::AppConfig;
use crate::export::speaker;
use crate::openai::OpenAiGateway;

const HELP: &str = "Commands:
  /image <path> [caption]  send a wound photo
  /export [path]           save the transcript as a PDF
  /history                 show the conversation so far
  /reset                   clear the conversation
  /quit                    exit";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    Image { path: &'a str, caption: &'a str },
    Export(Option<&'a str>),
    History,
    Reset,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match name {
        "image" if !rest.is_empty() => {
            let (path, caption) = rest
                .split_once(char::is_whitespace)
                .map(|(path, caption)| (path, caption.trim()))
                .unwrap_or((rest, ""));
            Input::Image { path, caption }
        }
        "export" => Input::Export(Some(rest).filter(|p| !p.is_empty())),
        "history" => Input::History,
        "reset" => Input::Reset,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(line),
    }
}

/// Renders a turn the way it is shown in the terminal
fn render_turn(turn: &Turn) -> String {
    format!("{}: {}", speaker(turn.role()), turn.lines().join("\n"))
}

pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::default();
    let gateway = OpenAiGateway::from_config(&config);
    let mut session = Session::new(&config.system_message);
    let mut rl = DefaultEditor::new()?;

    println!("Wound Care Chatbot. Type /help for commands.");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match parse_input(&line) {
                    Input::Message("") => {}
                    Input::Message(text) => {
                        println!("WoundBot is thinking...");
                        match session.submit(&gateway, text).await {
                            Ok(reply) => println!("WoundBot: {}", reply),
                            Err(err) => println!("Error: {}", err),
                        }
                    }
                    Input::Image { path, caption } => {
                        let upload = match fs::read(path) {
                            Ok(bytes) => bytes,
                            Err(err) => {
                                println!("Error: couldn't read {}: {}", path, err);
                                continue;
                            }
                        };
                        let file_name = Path::new(path).file_name().and_then(|n| n.to_str());
                        println!("WoundBot is thinking...");
                        match session
                            .submit_image(&gateway, caption, &upload, file_name)
                            .await
                        {
                            Ok(reply) => println!("WoundBot: {}", reply),
                            Err(err) => println!("Error: {}", err),
                        }
                    }
                    Input::Export(path) => {
                        let path = path.unwrap_or(&config.export_file_name);
                        match session.export(config.export_glyph_policy) {
                            Ok(pdf) => match fs::write(path, pdf) {
                                Ok(()) => println!("Saved transcript to {}", path),
                                Err(err) => println!("Error: couldn't write {}: {}", path, err),
                            },
                            Err(err) => println!("Error: {}", err),
                        }
                    }
                    Input::History => {
                        for turn in session.turns() {
                            println!("{}", render_turn(turn));
                        }
                    }
                    Input::Reset => {
                        session.reset();
                        println!("Conversation cleared.");
                    }
                    Input::Help => println!("{}", HELP),
                    Input::Quit => break,
                    Input::Unknown(cmd) => println!("Unknown command {}. Type /help.", cmd),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
