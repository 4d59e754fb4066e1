//! `cconnect-sms`: inspect SMS links and conversations from the command line

mod config;
mod diagnostics;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, DisplayConfig};
use cosmic_connect_sms::{
    linkify, messages_for_thread, now_millis, parse_uri, summarize_conversations, Message,
    NumberAddress, Packet, Separator, ThreadBuilder, ThreadEntry, TimeFormatter,
};
use diagnostics::{Cli, Command};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::info;

fn read_packet(input: &Path) -> Result<Packet> {
    let data = if input == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read packet from stdin")?;
        data
    } else {
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?
    };

    // Tolerate trailing blank lines from editors and shell pipelines
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);

    Packet::from_bytes(&data[..end]).context("Failed to decode packet")
}

fn read_messages(input: &Path) -> Result<Vec<Message>> {
    let packet = read_packet(input)?;
    packet
        .sms_messages()
        .context("Packet does not contain SMS messages")
}

fn render_body(body: &str, display: &DisplayConfig) -> String {
    if display.linkify {
        linkify(body)
    } else {
        body.to_string()
    }
}

fn print_threads(
    messages: &[Message],
    entries: &[ThreadEntry],
    formatter: &TimeFormatter,
    now: i64,
    display: &DisplayConfig,
) {
    for entry in entries {
        match entry {
            ThreadEntry::Thread(thread) => {
                println!("[{}]", thread.direction().as_str());
                for message in thread.messages(messages) {
                    let label = if display.short_times {
                        formatter.render_short(message.date, now)
                    } else {
                        formatter.render(message.date, now)
                    };
                    println!("  {:>20}  {}", label, render_body(&message.body, display));
                }
            }
            ThreadEntry::Separator(Separator::TimeGap { label, .. }) => {
                println!("--- {} ---", label);
            }
            ThreadEntry::Separator(Separator::Notice { index }) => {
                if let Some(notice) = messages.get(*index) {
                    println!("* {}", notice.body);
                }
            }
        }
    }
}

fn handle_command(command: &Command, config: &Config, config_path: &Path) -> Result<()> {
    match command {
        Command::ParseUri { uri, packet } => {
            let request = parse_uri(uri).map_err(|e| anyhow::anyhow!(e.user_message()))?;

            println!("Recipients:");
            for recipient in request.recipients() {
                match recipient.context_prefix() {
                    Some(prefix) => println!(
                        "  {} (context {}, number {})",
                        recipient,
                        prefix,
                        recipient.digits()
                    ),
                    None => println!("  {}", recipient),
                }
            }
            if let Some(body) = request.body() {
                println!("Body: {}", body);
            }
            println!("Canonical: {}", request);

            if *packet {
                let packet = request.to_packet();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&packet).context("Failed to serialize packet")?
                );
            }
            Ok(())
        }
        Command::Normalize { number } => {
            let address =
                NumberAddress::parse(number).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", address);
            Ok(())
        }
        Command::Linkify { text } => {
            println!("{}", linkify(text));
            Ok(())
        }
        Command::FormatTime {
            epoch_ms,
            now,
            short,
        } => {
            let formatter = TimeFormatter::local();
            let now = now.unwrap_or_else(now_millis);
            let label = if *short {
                formatter.render_short(*epoch_ms, now)
            } else {
                formatter.render(*epoch_ms, now)
            };
            println!("{}", label);
            Ok(())
        }
        Command::Threads {
            input,
            thread_id,
            now,
        } => {
            let all = read_messages(input)?;
            let messages = match thread_id {
                Some(id) => messages_for_thread(&all, *id),
                None => all,
            };
            info!("Threading {} messages", messages.len());

            let now = now.unwrap_or_else(now_millis);
            let formatter = TimeFormatter::local();
            let mut builder = ThreadBuilder::new(formatter.clone(), now)
                .with_break_threshold(config.threading.break_threshold());
            builder.extend(&messages);
            let entries = builder.finish();

            print_threads(&messages, &entries, &formatter, now, &config.display);
            Ok(())
        }
        Command::Conversations { input, limit, now } => {
            let messages = read_messages(input)?;
            let limit = limit.unwrap_or(config.display.max_conversations);
            let now = now.unwrap_or_else(now_millis);
            let formatter = TimeFormatter::local();

            for summary in summarize_conversations(&messages, limit) {
                println!(
                    "{}{:>6}  {:<18} {:>10}  {}",
                    if summary.unread { "*" } else { " " },
                    summary.thread_id,
                    summary.address,
                    formatter.render_short(summary.timestamp, now),
                    render_body(&summary.last_message, &config.display),
                );
            }
            Ok(())
        }
        Command::DumpConfig => {
            println!("# {}", config_path.display());
            print!(
                "{}",
                toml::to_string_pretty(config).context("Failed to serialize config")?
            );
            Ok(())
        }
        Command::InitConfig { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            Config::default().save_to(config_path)?;
            println!("Wrote {}", config_path.display());
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    diagnostics::init_logging(&cli).context("Failed to initialize logging")?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path).context("Failed to load configuration")?;

    handle_command(&cli.command, &config, &config_path)
}
