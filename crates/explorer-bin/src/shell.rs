use std::io::Write;

use anyhow::Result;
use explorer_core::location;
use explorer_core::{FileExplorer, Listing};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::console::render_listing;

const HELP: &str = "\
commands:
  ls                      list the current directory (the root when collapsed)
  cd <name|location>      enter a directory by name or absolute location
  up                      go to the parent directory
  root                    go to the storage root
  hide                    stop browsing
  write <name> <text>     overwrite a file under the root (\\n for newlines)
  append <name> <text>    append a line to a file under the root
  read <name>             print a file under the root
  help                    show this help
  quit                    leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    List,
    Cd(String),
    Up,
    Root,
    Hide,
    Write {
        name: String,
        content: String,
        append: bool,
    },
    Read(String),
    Help,
    Quit,
}

/// Parse one line of shell input
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Empty);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim_start()),
        None => (line, ""),
    };

    let cmd = match verb {
        "ls" => ShellCommand::List,
        "cd" if rest.is_empty() => return Err("usage: cd <name|location>".to_string()),
        "cd" => ShellCommand::Cd(rest.to_string()),
        "up" => ShellCommand::Up,
        "root" => ShellCommand::Root,
        "hide" => ShellCommand::Hide,
        "write" | "append" => {
            let (name, content) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if name.is_empty() {
                return Err(format!("usage: {} <name> <text>", verb));
            }
            ShellCommand::Write {
                name: name.to_string(),
                content: content.replace("\\n", "\n"),
                append: verb == "append",
            }
        }
        "read" if rest.is_empty() => return Err("usage: read <name>".to_string()),
        "read" => ShellCommand::Read(rest.to_string()),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };
    Ok(cmd)
}

/// Absolute directory location for a `cd` argument.
///
/// Absolute locations pass through; a name is looked up among the listed
/// directories first and otherwise appended to the listed location.
pub fn cd_target(arg: &str, current: Option<&Listing>, root: &str) -> String {
    if arg.contains("://") {
        return arg.to_string();
    }
    if let Some(entry) = current.and_then(|l| {
        l.entries
            .iter()
            .find(|e| e.is_directory && e.name == arg)
    }) {
        return entry.location.clone();
    }
    let base = current.map(|l| l.location.as_str()).unwrap_or(root);
    location::join_dir(base, &[arg])
}

fn show(listing: Listing, last: &mut Option<Listing>) {
    print!("{}", render_listing(&listing));
    *last = Some(listing);
}

fn prompt(last: &Option<Listing>) {
    match last {
        Some(l) => print!("{}> ", l.breadcrumb.display_path()),
        None => print!("> "),
    }
    let _ = std::io::stdout().flush();
}

/// Interactive browsing session over stdin
pub async fn run(explorer: &mut FileExplorer) -> Result<()> {
    let root = explorer.navigator().root()?.location().to_string();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<Listing> = None;

    println!("storage root: {}  (type 'help' for commands)", root);
    prompt(&last);

    while let Some(line) = lines.next_line().await? {
        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                eprintln!("{}", msg);
                prompt(&last);
                continue;
            }
        };
        debug!("shell command: {:?}", cmd);

        let outcome = match cmd {
            ShellCommand::Empty => Ok(()),
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ShellCommand::List => {
                let result = match &last {
                    Some(l) => {
                        let target = l.location.clone();
                        explorer.change_path(&target).await
                    }
                    None => explorer.open_explorer().await,
                };
                result.map(|l| show(l, &mut last))
            }
            ShellCommand::Cd(arg) => {
                let target = cd_target(&arg, last.as_ref(), &root);
                explorer
                    .change_path(&target)
                    .await
                    .map(|l| show(l, &mut last))
            }
            ShellCommand::Up => {
                let up = last.as_ref().and_then(|l| l.breadcrumb.up.clone());
                match up {
                    Some(up) => explorer.change_path(&up).await.map(|l| show(l, &mut last)),
                    None => {
                        println!("already at the storage root");
                        Ok(())
                    }
                }
            }
            ShellCommand::Root => explorer
                .list_directory(None)
                .await
                .map(|l| show(l, &mut last)),
            ShellCommand::Hide => {
                explorer.close_explorer();
                last = None;
                Ok(())
            }
            ShellCommand::Write {
                name,
                content,
                append,
            } => explorer
                .write_file(&name, &content, append)
                .await
                .map(|report| {
                    println!("{} ({} bytes)", report.location, report.bytes_written);
                    if let Some(Ok(listing)) = report.relisted {
                        show(listing, &mut last);
                    }
                }),
            ShellCommand::Read(name) => explorer.read_file(&name).await.map(|content| {
                println!("{}", content);
            }),
        };

        if let Err(e) = outcome {
            eprintln!("error: {:#}", anyhow::Error::from(e));
        }
        prompt(&last);
    }

    explorer.close_explorer();
    Ok(())
}
