//! Interactive chat client for a search-capable chat backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on the default address
//! chatterbox-chat
//!
//! # Point at another backend and enable web search
//! chatterbox-chat --base-url http://10.0.0.5:5000 --search --show-thinking
//!
//! # Route backend traffic through a proxy
//! chatterbox-chat --enable-proxy --proxy-ip 10.0.0.1 --proxy-port 3128
//!
//! # Disable colors (useful for piping output)
//! chatterbox-chat --no-color
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG`.
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/new` - Start a new chat
//! - `/sessions`, `/switch <n>`, `/delete <n>` - Manage sessions
//! - `/search on|off`, `/thinking on|off` - Toggle options
//! - `/upload <path>...`, `/contexts`, `/forget <file>` - Manage context documents
//! - `/expand` - Expand or collapse the latest search results
//! - `/quit` - Exit the application

use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use chatterbox::chat::{ChatArgs, ChatCommand, ChatConfig, help_text, parse_command};
use chatterbox::render::SessionRow;
use chatterbox::{BackendClient, ChatApp, PlainTextRenderer, Renderer};

/// Main entry point for the chatterbox-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "chatterbox=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("chatterbox-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = BackendClient::with_options(config.base_url.clone(), Some(config.timeout))?;
    println!("Chatterbox (backend: {})", client.base_url());
    println!("Type /help for commands, /quit to exit\n");

    let app = ChatApp::new(client, PlainTextRenderer::with_color(use_color), config);
    app.start().await;
    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    if !run_command(&app, cmd).await {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                app.send_message(line).await;
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
                app.with_renderer(|r| r.print_error(&format!("Input error: {}", err)))
                    .await;
                break;
            }
        }
    }

    Ok(())
}

type App = ChatApp<BackendClient, PlainTextRenderer>;

/// Runs one command; returns false when the REPL should exit.
async fn run_command(app: &App, cmd: ChatCommand) -> bool {
    match cmd {
        ChatCommand::Quit => return false,
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::NewChat => app.start_new_chat().await,
        ChatCommand::Sessions => print_sessions(&app.sessions().await),
        ChatCommand::Switch(position) => match app.session_at(position).await {
            Some(id) => {
                if let Err(err) = app.switch_session(id).await {
                    tracing::debug!(error = %err, "switch raced a deletion");
                }
            }
            None => info(app, &format!("No session {position}; see /sessions")).await,
        },
        ChatCommand::Delete(position) => match app.session_at(position).await {
            Some(id) => app.delete_session(id).await,
            None => info(app, &format!("No session {position}; see /sessions")).await,
        },
        ChatCommand::Models => {
            let current = app.config().model();
            let catalog = app.model_catalog().await;
            if catalog.is_empty() {
                println!("    (no models loaded)");
            }
            for model in catalog {
                let marker = if Some(&model) == current.as_ref() {
                    "*"
                } else {
                    " "
                };
                println!("    {marker} {model}");
            }
        }
        ChatCommand::Model(model) => {
            let _ = app.switch_model(&model).await;
        }
        ChatCommand::Thinking(show) => {
            app.set_show_thinking(show);
            let text = if show {
                "Thinking output enabled."
            } else {
                "Thinking output hidden."
            };
            info(app, text).await;
        }
        ChatCommand::Search(search) => {
            app.set_search(search);
            let text = if search {
                "Web search enabled."
            } else {
                "Web search disabled."
            };
            info(app, text).await;
        }
        ChatCommand::Proxy(enabled) => {
            app.set_proxy_enabled(enabled).await;
            let text = if enabled {
                "Proxy enabled."
            } else {
                "Proxy disabled."
            };
            info(app, text).await;
        }
        ChatCommand::ProxyIp(host) => {
            app.set_proxy_host(&host);
            info(app, &format!("Proxy host set to {host}")).await;
        }
        ChatCommand::ProxyPort(port) => {
            app.set_proxy_port(&port);
            info(app, &format!("Proxy port set to {port}")).await;
        }
        ChatCommand::ProxyTest => {
            app.test_proxy().await;
        }
        ChatCommand::Upload(paths) => {
            app.upload_contexts(paths.as_slice()).await;
        }
        ChatCommand::Contexts => {
            if app.list_contexts().await.is_none() {
                info(app, "Could not load context files.").await;
            }
        }
        ChatCommand::Forget(filename) => {
            app.delete_context(&filename).await;
        }
        ChatCommand::Expand => {
            if app.toggle_last_collapsible().await.is_none() {
                info(app, "Nothing to expand.").await;
            }
        }
        ChatCommand::ShowConfig => print_config(app),
        ChatCommand::Invalid(message) => {
            app.with_renderer(|r| r.print_error(&message)).await;
        }
    }
    true
}

async fn info(app: &App, text: &str) {
    app.with_renderer(|r| r.print_info(text)).await;
}

fn print_sessions(rows: &[SessionRow]) {
    if rows.is_empty() {
        println!("    (no sessions)");
        return;
    }
    for (index, row) in rows.iter().enumerate() {
        let marker = if row.current { "*" } else { " " };
        println!("    {marker} {}. {}", index + 1, row.name);
    }
}

fn print_config(app: &App) {
    let config = app.config().snapshot();
    println!("    Current Configuration:");
    println!(
        "      Model: {}",
        config.model.as_deref().unwrap_or("(unknown)")
    );
    println!("      Thinking output: {}", on_off(config.show_thinking));
    println!("      Web search: {}", on_off(config.search));
    println!("      Proxy: {}", on_off(config.proxy.enabled));
    println!("      Proxy host: {}", describe(&config.proxy.host));
    println!("      Proxy port: {}", describe(&config.proxy.port));
    println!("      Timeout: {}", describe_timeout(config.timeout));
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn describe(value: &str) -> &str {
    if value.trim().is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn describe_timeout(timeout: Duration) -> String {
    format!("{}s", timeout.as_secs())
}
