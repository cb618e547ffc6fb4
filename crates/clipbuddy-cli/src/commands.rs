use crate::cli::{Clipbuddy, Commands};
use crate::logging::{init_file_logging, init_stderr_logging};
use clipbuddy_core::{
    codec, Applied, BuddyError, Config, CsvImport, GroupRef, ImportMode, MessageEntry, Mutation,
    Result, SnippetHub, Store, ViewKind,
};
use clipbuddy_daemon::{
    read_pid, running_instance, start_hotkey_listener, verify_process_running, Hotkey,
    InstanceLock,
};
use clipbuddy_ui::{run_app, AppEvent, AppOptions};
use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::sync::mpsc;

pub fn handle_command(args: Clipbuddy) -> Result<()> {
    let mut config = match args.data_dir {
        Some(dir) => Config::with_data_dir(dir),
        None => Config::from_env(),
    };

    match args.commands {
        None => run_interactive(&config, None, true),
        Some(Commands::Run {
            popup_hotkey,
            manager_hotkey,
            no_hotkeys,
        }) => {
            if let Some(hotkey) = popup_hotkey {
                config.popup_hotkey = hotkey;
            }
            if let Some(hotkey) = manager_hotkey {
                config.manager_hotkey = hotkey;
            }
            run_interactive(&config, None, !no_hotkeys)
        }
        Some(Commands::Popup) => run_interactive(&config, Some(ViewKind::QuickPaste), false),
        Some(Commands::Manage) => run_interactive(&config, Some(ViewKind::Manager), false),
        Some(command) => {
            init_stderr_logging();
            run_one_shot(command, &config, &mut io::stdout().lock(), &mut io::stdin().lock())
        }
    }
}

/// Run the terminal views until they are closed.
///
/// With `open_on_start` set the app exits once that view closes; otherwise it
/// stays up and listens for the global shortcuts when `hotkeys` is on.
fn run_interactive(config: &Config, open_on_start: Option<ViewKind>, hotkeys: bool) -> Result<()> {
    config.ensure_data_dir()?;
    init_file_logging(&config.log_path());

    let _lock = InstanceLock::acquire(config.pid_path())?;
    let store = Store::open(config.db_path())?;
    tracing::info!(
        "clipbuddy {} started with {} groups from {}",
        env!("CARGO_PKG_VERSION"),
        store.groups().len(),
        config.db_path().display()
    );

    let (sender, events) = mpsc::channel();
    if hotkeys {
        let bindings = vec![
            (Hotkey::parse(&config.popup_hotkey)?, ViewKind::QuickPaste),
            (Hotkey::parse(&config.manager_hotkey)?, ViewKind::Manager),
        ];
        let hotkey_sender = sender.clone();
        start_hotkey_listener(bindings, move |kind| {
            let _ = hotkey_sender.send(AppEvent::Open(kind));
        });
    }

    let options = AppOptions {
        popup_hotkey: config.popup_hotkey.clone(),
        manager_hotkey: config.manager_hotkey.clone(),
        open_on_start,
        exit_when_closed: open_on_start.is_some(),
    };
    let result = run_app(SnippetHub::new(store), sender, events, options);
    tracing::info!("clipbuddy stopped");
    result
}

/// Run a non-interactive command, writing its report to `out`.
///
/// `input` supplies confirmations and `-` message texts.
pub fn run_one_shot<W: Write, R: BufRead>(
    command: Commands,
    config: &Config,
    out: &mut W,
    input: &mut R,
) -> Result<()> {
    match command {
        Commands::Path => {
            writeln!(out, "{}", config.db_path().display())?;
            return Ok(());
        }
        Commands::Status => return show_status(config, out),
        _ => {}
    }

    // A running instance would overwrite the file with its own copy on its next save
    if command.is_mutation() {
        if let Some(pid) = running_instance(&config.pid_path()) {
            return Err(BuddyError::AlreadyRunning(pid));
        }
    }

    config.ensure_data_dir()?;
    let mut hub = SnippetHub::new(Store::open(config.db_path())?);
    execute(command, &mut hub, out, input)
}

fn execute<W: Write, R: BufRead>(
    command: Commands,
    hub: &mut SnippetHub,
    out: &mut W,
    input: &mut R,
) -> Result<()> {
    match command {
        Commands::Groups => list_groups(hub.store(), out),
        Commands::Messages { group, query } => list_messages(
            hub.store(),
            group.as_deref(),
            query.as_deref().unwrap_or(""),
            out,
        ),
        Commands::AddGroup { name } => {
            if let Applied::GroupAdded(name) = hub.commit(Mutation::AddGroup(name))? {
                writeln!(out, "Group '{}' added", name)?;
            }
            Ok(())
        }
        Commands::RenameGroup { old, new } => {
            let mutation = Mutation::RenameGroup {
                from: old.clone(),
                to: new,
            };
            match hub.commit(mutation)? {
                Applied::GroupRenamed { to, .. } => {
                    writeln!(out, "Group '{}' renamed to '{}'", old, to)?
                }
                _ => writeln!(out, "Group '{}' unchanged", old)?,
            }
            Ok(())
        }
        Commands::DeleteGroup { name, yes } => delete_group(hub, &name, yes, out, input),
        Commands::AddMessage {
            group,
            text,
            allow_duplicate,
        } => {
            let text = read_text(text, input)?;
            if !allow_duplicate && hub.store().contains_message(&group, &text) {
                return Err(BuddyError::Validation(format!(
                    "group '{}' already holds this message; pass --allow-duplicate to add it anyway",
                    group
                )));
            }
            match hub.commit(Mutation::AddMessage {
                group: group.clone(),
                text,
            })? {
                Applied::MessageAdded { position, .. } => {
                    writeln!(out, "Message added to '{}' at position {}", group, position + 1)?
                }
                _ => writeln!(out, "Message added to '{}'", group)?,
            }
            Ok(())
        }
        Commands::EditMessage {
            group,
            position,
            text,
        } => {
            let text = read_text(text, input)?;
            let entry = entry_at(hub.store(), &group, position)?;
            hub.commit(Mutation::EditMessage { entry, text })?;
            writeln!(out, "Message {} of '{}' updated", position, group)?;
            Ok(())
        }
        Commands::DeleteMessage { group, position } => {
            let entry = entry_at(hub.store(), &group, position)?;
            hub.commit(Mutation::DeleteMessage(entry))?;
            writeln!(out, "Message {} of '{}' deleted", position, group)?;
            Ok(())
        }
        Commands::Export { path } => {
            hub.store().export_csv(&path)?;
            writeln!(
                out,
                "Wrote {} messages to {}",
                hub.store().message_count(),
                path.display()
            )?;
            Ok(())
        }
        Commands::Import {
            path,
            replace,
            allow_partial,
        } => import(hub, &path, replace, allow_partial, out),
        Commands::Run { .. } | Commands::Popup | Commands::Manage => Err(BuddyError::Other(
            "interactive commands need a terminal".to_string(),
        )),
        Commands::Status | Commands::Path => Ok(()),
    }
}

fn show_status<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    let db_path = config.db_path();
    writeln!(out, "Data directory: {}", config.data_dir.display())?;
    match codec::read_file(&db_path)? {
        Some(groups) => {
            let messages: usize = groups.values().map(Vec::len).sum();
            writeln!(out, "Snippets file: {}", db_path.display())?;
            writeln!(out, "{} groups, {} messages", groups.len(), messages)?;
        }
        None => writeln!(
            out,
            "Snippets file: {} (created on first run)",
            db_path.display()
        )?,
    }

    let pid_path = config.pid_path();
    match read_pid(&pid_path) {
        Some(pid) if verify_process_running(pid) => {
            writeln!(out, "clipbuddy is running with PID {}", pid)?
        }
        Some(pid) => {
            writeln!(
                out,
                "PID file {} names process {}, which is not running",
                pid_path.display(),
                pid
            )?;
            writeln!(out, "It will be replaced the next time clipbuddy starts")?;
        }
        None => writeln!(out, "clipbuddy is not running")?,
    }
    Ok(())
}

fn list_groups<W: Write>(store: &Store, out: &mut W) -> Result<()> {
    for group in store.list_groups() {
        let count = match &group {
            GroupRef::All => store.message_count(),
            GroupRef::Real(name) => store.group(name).map_or(0, <[String]>::len),
        };
        writeln!(out, "{} ({})", group, count)?;
    }
    Ok(())
}

fn list_messages<W: Write>(
    store: &Store,
    group: Option<&str>,
    query: &str,
    out: &mut W,
) -> Result<()> {
    let group = group.map(GroupRef::parse).unwrap_or_default();
    if let GroupRef::Real(name) = &group {
        if !store.has_group(name) {
            return Err(BuddyError::GroupNotFound(name.clone()));
        }
    }

    let entries = store.list_messages(&group, query);
    if entries.is_empty() {
        writeln!(out, "No messages found")?;
    }
    for entry in entries {
        writeln!(out, "{:>3}. {}", entry.position + 1, entry.display())?;
    }
    Ok(())
}

fn delete_group<W: Write, R: BufRead>(
    hub: &mut SnippetHub,
    name: &str,
    yes: bool,
    out: &mut W,
    input: &mut R,
) -> Result<()> {
    if let Some(messages) = hub.store().group(name) {
        if !yes {
            write!(
                out,
                "Delete group '{}' and its {} messages? [y/N] ",
                name,
                messages.len()
            )?;
            out.flush()?;
            let mut answer = String::new();
            input.read_line(&mut answer)?;
            if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                writeln!(out, "Operation canceled.")?;
                return Ok(());
            }
        }
    }

    match hub.commit(Mutation::DeleteGroup(name.to_string()))? {
        Applied::GroupDeleted { existed: false, .. } => {
            writeln!(out, "Group '{}' does not exist, nothing deleted", name)?
        }
        _ => writeln!(out, "Group '{}' deleted", name)?,
    }
    Ok(())
}

fn import<W: Write>(
    hub: &mut SnippetHub,
    path: &Path,
    replace: bool,
    allow_partial: bool,
    out: &mut W,
) -> Result<()> {
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };
    let import = hub.store().read_import(path, mode)?;
    let summary = import.summary();
    let CsvImport { groups, error, .. } = import;

    if let Some(err) = error {
        if !allow_partial {
            writeln!(out, "Nothing was imported ({} before the error)", summary)?;
            return Err(err);
        }
        writeln!(out, "Keeping the rows read before the error: {}", err)?;
    }

    hub.commit(Mutation::ReplaceAll(groups))?;
    writeln!(out, "Imported {}: {}", path.display(), summary)?;
    Ok(())
}

/// `-` reads the whole of `input`, minus one trailing line break.
fn read_text<R: BufRead>(text: String, input: &mut R) -> Result<String> {
    if text != "-" {
        return Ok(text);
    }
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

/// The message at a 1-based `position` of a real group.
fn entry_at(store: &Store, group: &str, position: usize) -> Result<MessageEntry> {
    let messages = store
        .group(group)
        .ok_or_else(|| BuddyError::GroupNotFound(group.to_string()))?;
    position
        .checked_sub(1)
        .and_then(|index| {
            messages
                .get(index)
                .map(|text| MessageEntry::new(group, index, text.clone()))
        })
        .ok_or(BuddyError::MessageIndex {
            group: group.to_string(),
            index: position,
            len: messages.len(),
        })
}
