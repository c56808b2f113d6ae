use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use client_core::{
    capabilities::{Exporter, MissingClipboard},
    ClientEvent, ClientOptions, EncrypterClient, HttpGateway, InMemorySessionStore, SubmitStatus,
};
use shared::{
    domain::{Method, OperationMode, Severity},
    protocol::StatsReply,
};

mod config;

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the text processing service")]
struct Args {
    /// Base URL of the processing service.
    #[arg(long)]
    server_url: Option<String>,
    /// Start with the periodic statistics refresh disabled.
    #[arg(long)]
    no_auto_refresh: bool,
}

/// Writes exported documents into the working directory.
struct FileExporter;

impl Exporter for FileExporter {
    fn save(&self, filename: &str, contents: &str) -> Result<()> {
        std::fs::write(filename, contents)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if args.no_auto_refresh {
        settings.auto_refresh = false;
    }

    let gateway = Arc::new(HttpGateway::new(&settings.server_url)?);
    let options = ClientOptions {
        stats_refresh_interval: Duration::from_secs(settings.stats_refresh_seconds),
        ..ClientOptions::default()
    };
    let client = EncrypterClient::new_with_dependencies(
        gateway,
        options,
        Arc::new(MissingClipboard),
        Arc::new(FileExporter),
        Arc::new(InMemorySessionStore::default()),
    );

    let uptime = Arc::new(std::sync::Mutex::new(String::from("00:00:00")));
    {
        let mut rx = client.subscribe_events();
        let uptime = Arc::clone(&uptime);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => print_event(&event, &uptime),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    client.start_session().await;
    if !settings.auto_refresh {
        client.set_auto_refresh(false).await;
    }

    println!(
        "Connected to {}. Type 'help' for commands.",
        settings.server_url
    );

    let mut secret = String::new();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "help" => print_help(),
            "mode" => match rest.parse::<OperationMode>() {
                Ok(mode) => {
                    if !client.set_mode(mode).await {
                        println!("[error] busy; try again once processing finishes");
                    }
                }
                Err(err) => println!("[error] {err}"),
            },
            "method" => match rest.parse::<Method>() {
                Ok(method) => {
                    if !client.set_method(method).await {
                        println!("[error] busy; try again once processing finishes");
                    }
                }
                Err(err) => println!("[error] {err}"),
            },
            "secret" => {
                secret = rest.to_string();
                client.secret_changed(secret.clone()).await;
            }
            "send" => {
                client.input_changed(rest.to_string()).await;
                if client.submit(rest, &secret).await == SubmitStatus::Busy {
                    println!("[error] a request is already in flight");
                }
            }
            "genkey" => {
                let length = rest.parse::<u32>().unwrap_or(settings.key_length);
                if let Ok(key) = client.generate_key(length, settings.include_symbols).await {
                    secret = key.key;
                }
            }
            "stats" => client.refresh_stats().await,
            "export" => {
                let _ = client.export_stats().await;
            }
            "clear-history" => {
                let _ = client.clear_history().await;
            }
            "copy" => {
                let _ = client.copy_result().await;
            }
            "auto" => match rest {
                "on" => client.set_auto_refresh(true).await,
                "off" => client.set_auto_refresh(false).await,
                _ => println!("[error] usage: auto on|off"),
            },
            "hide" => client.set_visibility(true).await,
            "show" => client.set_visibility(false).await,
            "uptime" => {
                if let Ok(guard) = uptime.lock() {
                    println!("session uptime: {guard}");
                }
            }
            "dismiss" => client.clear_notifications().await,
            "quit" | "exit" => break,
            other => println!("[error] unknown command '{other}'; type 'help'"),
        }
    }

    client.shutdown().await;
    Ok(())
}

fn print_event(event: &ClientEvent, uptime: &Arc<std::sync::Mutex<String>>) {
    match event {
        ClientEvent::Notification(note) => {
            let tag = match note.severity {
                Severity::Info => "info",
                Severity::Success => "ok",
                Severity::Error => "error",
            };
            println!("[{tag}] {}", note.text);
        }
        ClientEvent::ResultReady(outcome) => {
            println!(
                "result ({} {}, {} -> {} chars):",
                outcome.method, outcome.action, outcome.input_length, outcome.output_length
            );
            println!("{}", outcome.result);
        }
        ClientEvent::ProcessingChanged(true) => println!("processing..."),
        ClientEvent::KeyGenerated { key, .. } => println!("generated key: {key}"),
        ClientEvent::StatsUpdated(reply) => print_stats(reply),
        ClientEvent::StatsFailed(err) => println!("[error] statistics unavailable: {err}"),
        ClientEvent::CharacterCount { count, limit } => println!("{count} / {limit} characters"),
        ClientEvent::StrengthEvaluated(score) => {
            println!("password strength: {}/100 ({})", score.value, score.tier);
        }
        ClientEvent::UptimeTick(display) => {
            if let Ok(mut guard) = uptime.lock() {
                *guard = display.clone();
            }
        }
        ClientEvent::ProcessingChanged(false)
        | ClientEvent::ResultCleared
        | ClientEvent::NotificationDismissed(_) => {}
    }
}

fn print_stats(reply: &StatsReply) {
    match reply {
        StatsReply::Empty { message } => println!("stats: {message}"),
        StatsReply::Data(stats) => println!(
            "stats: {} ops, {} chars, avg {:.1}, success {:.0}%, most used {}, service uptime {}",
            stats.total_operations,
            stats.total_characters,
            stats.average_length,
            stats.success_rate,
            stats.most_used,
            stats.uptime
        ),
    }
}

fn print_help() {
    println!("commands:");
    println!("  mode encrypt|decrypt      select the transformation direction");
    println!("  method caesar|fernet|hash select the algorithm");
    println!("  secret <value>            set the password used for fernet");
    println!("  send <text>               submit the text for processing");
    println!("  genkey [length]           generate a secure key and use it as the secret");
    println!("  stats                     fetch service statistics now");
    println!("  export                    export statistics to a JSON file");
    println!("  clear-history             clear the service's operation history");
    println!("  copy                      copy the last result (if a clipboard exists)");
    println!("  auto on|off               toggle the periodic statistics refresh");
    println!("  hide / show               simulate losing and regaining visibility");
    println!("  uptime                    show the session uptime");
    println!("  dismiss                   clear visible notifications");
    println!("  quit                      exit");
}
