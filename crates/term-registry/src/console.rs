//! Line-oriented operator console over a [`SessionRegistry`].
//!
//! Direct commands call registry operations. `busy` and `cwd` are sent
//! through the notification channel instead, so they take the same path as
//! reports from a real session layer.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use term_registry_core::SessionHandle;
use term_registry_session::{SessionEvent, SessionRegistry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::view;

const HELP: &str = "\
commands:
  new [caption]             start a session, optionally with a caption
  reconnect <session>       restart a known session
  rm <session>              forget a session
  retitle <session> <title> change a session's title
  busy <session> on|off     report child processes for a session
  cwd <session> <path>      report a working-directory change
  list                      show sessions in order
  json                      show sessions as JSON
  schema                    show the JSON schema of a list entry
  kill-all                  reap every session and clear the list
  help                      show this text
  quit                      exit

<session> is a handle, a caption, or a 0-based list index.";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a session, optionally named
    New(Option<String>),
    /// Restart a known session
    Reconnect(String),
    /// Forget a session
    Remove(String),
    /// Change a session's title
    Retitle(String, String),
    /// Report subprocess presence
    Busy(String, bool),
    /// Report a working-directory change
    Cwd(String, String),
    /// Plain-text list
    List,
    /// JSON list
    Json,
    /// JSON schema of a list entry
    Schema,
    /// Reap everything
    KillAll,
    /// Usage text
    Help,
    /// Exit the console
    Quit,
}

fn rest(words: &[&str]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn parse_switch(word: &str) -> anyhow::Result<bool> {
    match word {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("expected on/off, got '{other}'"),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = words.split_first().ok_or_else(|| anyhow!("empty command"))?;
        let session = || {
            args.first()
                .map(|s| s.to_string())
                .ok_or_else(|| anyhow!("'{name}' needs a session"))
        };

        let command = match *name {
            "new" => Command::New(rest(args)),
            "reconnect" => Command::Reconnect(session()?),
            "rm" | "remove" => Command::Remove(session()?),
            "retitle" => {
                let title = rest(&args[args.len().min(1)..]).unwrap_or_default();
                Command::Retitle(session()?, title)
            }
            "busy" => {
                let value = args.get(1).ok_or_else(|| anyhow!("'busy' needs on or off"))?;
                Command::Busy(session()?, parse_switch(value)?)
            }
            "cwd" => {
                let path = rest(&args[args.len().min(1)..])
                    .ok_or_else(|| anyhow!("'cwd' needs a path"))?;
                Command::Cwd(session()?, path)
            }
            "list" | "ls" => Command::List,
            "json" => Command::Json,
            "schema" => Command::Schema,
            "kill-all" => Command::KillAll,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(command)
    }
}

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text to show the operator
    Text(String),
    /// Stop reading commands
    Quit,
}

/// Executes console commands against a registry.
#[derive(Debug, Clone)]
pub struct Console {
    registry: SessionRegistry,
    events: mpsc::Sender<SessionEvent>,
}

impl Console {
    /// Create a console. `events` should feed the registry's event ingestion.
    pub fn new(registry: SessionRegistry, events: mpsc::Sender<SessionEvent>) -> Self {
        Self { registry, events }
    }

    /// The registry this console drives.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Resolve a handle, caption, or list index to a handle.
    ///
    /// Unresolvable tokens are returned as raw handles so the registry can
    /// report them as unknown.
    pub fn resolve(&self, token: &str) -> SessionHandle {
        let handle = SessionHandle::new(token);
        if self.registry.index_of(&handle).is_some() {
            return handle;
        }
        if let Some(found) = self.registry.handle_for_caption(token) {
            return found;
        }
        token
            .parse::<usize>()
            .ok()
            .and_then(|index| self.registry.handle_at(index))
            .unwrap_or(handle)
    }

    /// Execute one command.
    pub async fn execute(&self, command: Command) -> anyhow::Result<Reply> {
        debug!("Executing console command: {:?}", command);

        let text = match command {
            Command::New(None) => match self.registry.create_new() {
                Some(handle) => self.describe_created(&handle),
                None => bail!("sequence numbers exhausted"),
            },
            Command::New(Some(caption)) => match self.registry.create_named(&caption) {
                Some(handle) => self.describe_created(&handle),
                None if self.registry.is_caption_available(&caption) => {
                    bail!("sequence numbers exhausted")
                }
                None => bail!("caption '{caption}' is already in use"),
            },
            Command::Reconnect(token) => {
                let handle = self.resolve(&token);
                if !self.registry.reconnect(&handle) {
                    bail!("unknown session '{token}'");
                }
                format!("reconnecting {handle}")
            }
            Command::Remove(token) => {
                let handle = self.resolve(&token);
                if !self.registry.remove(&handle) {
                    bail!("unknown session '{token}'");
                }
                format!("removed {handle}")
            }
            Command::Retitle(token, title) => {
                let handle = self.resolve(&token);
                if self.registry.retitle(&handle, &title) {
                    format!("retitled {handle}")
                } else {
                    "title unchanged".to_string()
                }
            }
            Command::Busy(token, has_subprocesses) => {
                let handle = self.resolve(&token);
                self.notify(SessionEvent::SubprocessesChanged {
                    handle,
                    has_subprocesses,
                })
                .await?;
                "reported".to_string()
            }
            Command::Cwd(token, cwd) => {
                let handle = self.resolve(&token);
                self.notify(SessionEvent::WorkingDirectoryChanged { handle, cwd })
                    .await?;
                "reported".to_string()
            }
            Command::List => view::render_text(&view::entries(&self.registry.snapshot())),
            Command::Json => {
                serde_json::to_string_pretty(&view::entries(&self.registry.snapshot()))
                    .context("failed to serialize session list")?
            }
            Command::Schema => view::schema_json().context("failed to serialize schema")?,
            Command::KillAll => {
                let count = self.registry.terminate_all();
                format!("terminated {count} session(s)")
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };

        Ok(Reply::Text(text))
    }

    /// Read commands line by line until EOF or `quit`.
    ///
    /// Command errors are written to `output` and do not stop the loop.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let reply = match line.parse::<Command>() {
                Ok(command) => self.execute(command).await,
                Err(e) => Err(e),
            };

            let text = match reply {
                Ok(Reply::Quit) => break,
                Ok(Reply::Text(text)) => text,
                Err(e) => {
                    warn!("Command '{}' failed: {:#}", line, e);
                    format!("error: {e:#}")
                }
            };
            output.write_all(text.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok(())
    }

    async fn notify(&self, event: SessionEvent) -> anyhow::Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow!("event ingestion is not running"))
    }

    fn describe_created(&self, handle: &SessionHandle) -> String {
        let caption = self.registry.caption_of(handle).unwrap_or_default();
        format!("created {handle} '{caption}'")
    }
}
