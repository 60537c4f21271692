//! Terminal front end for the mailbox controller.
//!
//! Provisions an address, prints the inbox whenever it changes, and reads commands
//! from stdin:
//! - `open <id>`: show a message's subject, render URLs and body
//! - `copy`: report the address as copied
//! - `release`: delete the address and start over with a new one
//! - `quit`
//!
//! Logs go to stderr; set `RUST_LOG=tempmail_client=debug` for request traces.

use clap::Parser;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempmail_client::{
    Address, Client, DetailView, MailRow, Mailbox, MailboxConfig, MailboxView, ToastEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tempmail-demo", about = "Watch a disposable inbox from the terminal")]
struct Cli {
    /// Base URL of the mailbox service
    #[arg(long, env = "TEMPMAIL_BASE_URL", default_value = "http://127.0.0.1:8888/")]
    base_url: String,

    /// Mail domain handled by the service
    #[arg(long, env = "TEMPMAIL_DOMAIN", default_value = "localhost")]
    domain: String,

    /// Proxy URL (optional)
    #[arg(long)]
    proxy: Option<String>,

    /// Inbox refresh interval in milliseconds
    #[arg(long, default_value_t = 1678)]
    interval_ms: u64,
}

#[derive(Default)]
struct TerminalView {
    // Last printed table, to skip reprinting an unchanged inbox on every poll.
    last: Mutex<Option<Vec<MailRow>>>,
}

impl MailboxView for TerminalView {
    fn show_address(&self, address: &Address) {
        println!("\n📬 Address: {}", address.mailbox);
        println!("   Feed:    {}", address.rss_url);
    }

    fn render_mail(&self, rows: &[MailRow]) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.as_deref() == Some(rows) {
            return;
        }
        println!("\n📥 {} message(s)", rows.len());
        for row in rows {
            println!(
                "   [{:>4}] {:<32} {:<40} {}",
                row.id, row.sender, row.subject, row.create_time
            );
        }
        *last = Some(rows.to_vec());
    }

    fn show_placeholder(&self, text: &str) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.as_ref().is_some_and(|rows| rows.is_empty()) {
            return;
        }
        println!("\n   {text}");
        *last = Some(Vec::new());
    }

    fn reset_newtab(&self) {}

    fn show_detail(&self, detail: &DetailView) {
        println!("\n{}", "-".repeat(50));
        println!("{}", detail.subject_label);
        println!("Frame:  {}", detail.frame_src);
        println!("Open:   {}", detail.newtab_href);
    }

    fn reload(&self) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = None;
        println!("\n🔄 Reloading...");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = Client::builder().base_url(&cli.base_url);
    if let Some(proxy) = &cli.proxy {
        builder = builder.proxy(proxy);
    }
    let client = builder.build()?;

    let config = MailboxConfig::new(&cli.domain).list_interval(Duration::from_millis(cli.interval_ms));
    let mut mailbox = Mailbox::new(client.clone(), Arc::new(TerminalView::default()), config);

    let mut toasts = mailbox.notifier().subscribe();
    let notifier = mailbox.notifier().clone();
    tokio::spawn(async move {
        while let Ok(event) = toasts.recv().await {
            if let ToastEvent::Shown { id, .. } = event {
                if let Some(entry) = notifier
                    .snapshot()
                    .into_iter()
                    .flat_map(|c| c.toasts)
                    .find(|e| e.toast.id == id)
                {
                    println!("\n🔔 {}: {}", entry.toast.config.heading, entry.toast.config.text);
                }
            }
        }
    });

    let mut identity = mailbox.start().await?;
    let domain = cli.domain.clone();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("open"), Some(id)) => match id.parse::<i64>() {
                Ok(id) => {
                    if mailbox.open_message(id).await.is_ok() {
                        match client.fetch_rendered(&identity, id).await {
                            Ok(html) => {
                                let preview: String = html.chars().take(500).collect();
                                println!("{preview}");
                            }
                            Err(e) => eprintln!("   ❌ Failed to fetch body: {e}"),
                        }
                    }
                }
                Err(_) => eprintln!("   usage: open <id>"),
            },
            (Some("copy"), _) => {
                mailbox.copy_succeeded(&format!("{identity}@{domain}"));
            }
            (Some("release"), _) => {
                mailbox.release().await;
                identity = mailbox.start().await?;
            }
            (Some("quit"), _) => break,
            (None, _) => {}
            _ => eprintln!("   commands: open <id> | copy | release | quit"),
        }
    }

    Ok(())
}
