//! Command-line front end for smsgate
//!
//! - Resolve a DSN and show the transport tree it produces
//! - Send a text message to one or more recipients
//! - Send a message file (headers, blank line, body)

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use smsgate::{SmsGate, SmsSender, find_config_file};
use smsgate_common::{Message, Sms, logging};
use smsgate_transport::{SendError, SendResult, SentMessage, Transport};

/// Send SMS through configurable, failover-capable transports
#[derive(Parser, Debug)]
#[command(name = "smsgate")]
#[command(about = "Send SMS through configurable transports", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport DSN, replacing the configured one
    #[arg(short, long)]
    dsn: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the transport a DSN resolves to
    Resolve,
    /// Send a text message
    Send {
        /// Recipient phone number (repeatable)
        #[arg(long, required = true)]
        to: Vec<String>,

        /// Sender phone number
        #[arg(long)]
        from: Option<String>,

        /// Message body
        text: String,
    },
    /// Send a message file with `From`/`To` headers
    SendFile {
        /// Path to the message file
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.dsn)?;
    let sender = config.build()?;

    match cli.command {
        Commands::Resolve => {
            println!("{}", sender.transport().name());
            println!(
                "Sender required: {}",
                if sender.has_required_sender() { "yes" } else { "no" }
            );
        }
        Commands::Send { to, from, text } => {
            let mut sms = Sms::new().to(to).text(text);
            if let Some(from) = from {
                sms = sms.from(from);
            }
            cmd_send(&sender, &Message::from(sms))?;
        }
        Commands::SendFile { path } => {
            let content = std::fs::read(&path).map_err(|e| {
                anyhow::anyhow!("Failed to read message from {}: {e}", path.display())
            })?;
            cmd_send(&sender, &Message::from(Sms::parse(&content)?))?;
        }
    }

    Ok(())
}

/// An explicit `--config` wins, then a bare `--dsn`, then the usual locations
fn load_config(path: Option<&Path>, dsn: Option<String>) -> anyhow::Result<SmsGate> {
    let mut config = match (path, &dsn) {
        (Some(path), _) => SmsGate::load(path)?,
        (None, Some(dsn)) => find_config_file()
            .map_or_else(|_| Ok(SmsGate::new(dsn.as_str())), |path| SmsGate::load(&path))?,
        (None, None) => SmsGate::load(&find_config_file()?)?,
    };

    if let Some(dsn) = dsn {
        config.dsn = dsn;
    }

    Ok(config)
}

fn cmd_send(sender: &SmsSender, message: &Message) -> anyhow::Result<()> {
    match sender.send(message, None) {
        Ok(Some(sent)) => {
            print_sent(&sent);
            Ok(())
        }
        Ok(None) => {
            println!("No recipients, nothing was sent");
            Ok(())
        }
        Err(err) => {
            if let Some(result) = err.result() {
                print_result(result);
            }
            Err(report(err))
        }
    }
}

fn print_sent(sent: &SentMessage) {
    println!("Sent via {}", sent.result().transport());
    print_result(sent.result());
}

fn print_result(result: &SendResult) {
    for success in result.successes() {
        println!("  ok     {}", success.recipient());
    }

    for error in result.errors() {
        println!(
            "  failed {}: {} ({})",
            error.recipient(),
            error.message(),
            error.code()
        );
    }
}

fn report(err: SendError) -> anyhow::Error {
    if err.is_recoverable() {
        anyhow::anyhow!("Delivery failed: {err}")
    } else {
        anyhow::Error::new(err).context("Delivery aborted")
    }
}
