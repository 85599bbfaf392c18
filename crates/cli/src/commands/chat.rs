// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat commands: join, say, listen, history

use std::fmt;

use anyhow::Result;
use hb_core::{Cursor, Message, MessageId};
use serde::Serialize;

use crate::client::{DaemonClient, Published};
use crate::output::{self, OutputFormat};

#[derive(clap::Args)]
pub struct SayArgs {
    /// Message text
    pub text: String,

    /// Identity to prefix the message with (as returned by `hb join`)
    #[arg(long = "as", value_name = "NAME")]
    pub author: Option<String>,

    /// Ask the daemon to answer with a redirect to this location
    #[arg(long)]
    pub next: Option<String>,
}

#[derive(clap::Args)]
pub struct ListenArgs {
    /// Id of the last message already seen
    #[arg(long)]
    pub cursor: Option<String>,

    /// Exit after the first batch of messages
    #[arg(long)]
    pub once: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct HistoryArgs {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

/// A message as printed by `listen` and `history`
#[derive(Serialize)]
#[serde(transparent)]
struct MessageLine(Message);

impl fmt::Display for MessageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.rendered)
    }
}

#[derive(Serialize)]
struct Identity {
    name: String,
    visitor: u64,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (visitor #{})", self.name, self.visitor)
    }
}

pub async fn join(client: &DaemonClient) -> Result<()> {
    let (name, visitor) = client.join().await?;
    output::print(&Identity { name, visitor }, OutputFormat::Text);
    Ok(())
}

pub async fn say(client: &DaemonClient, args: SayArgs) -> Result<()> {
    match client.publish(&args.text, args.author, args.next).await? {
        Published::Message(message) => println!("{}", message.id),
        Published::Redirect(location) => println!("Redirect: {}", location),
    }
    Ok(())
}

pub async fn history(client: &DaemonClient, args: HistoryArgs) -> Result<()> {
    let messages = client.history().await?;
    if messages.is_empty() && args.output == OutputFormat::Text {
        println!("No messages");
        return Ok(());
    }
    print_batch(messages, args.output);
    Ok(())
}

pub async fn listen(client: &DaemonClient, args: ListenArgs) -> Result<()> {
    let mut cursor = args.cursor.map(Cursor::at).unwrap_or_default();

    loop {
        let messages = tokio::select! {
            result = client.poll(&cursor) => result?,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };

        cursor = advance(cursor, &messages);
        print_batch(messages, args.output);

        if args.once {
            return Ok(());
        }
    }
}

/// The cursor for the next poll: the last id received, or unchanged if the batch was empty
fn advance(cursor: Cursor, batch: &[Message]) -> Cursor {
    match batch.last() {
        Some(message) => Cursor::At(message.id.clone()),
        None => cursor,
    }
}

fn print_batch(messages: Vec<Message>, format: OutputFormat) {
    let lines: Vec<MessageLine> = messages.into_iter().map(MessageLine).collect();
    output::print_list(&lines, format);
}
