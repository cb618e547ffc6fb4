use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author = "Gokul <@bahdotsh>",
    version = env!("CARGO_PKG_VERSION"),
    about = "clipbuddy - grouped text snippets, one shortcut away",
    long_about = "clipbuddy keeps short messages in named groups and pastes them into whatever window you were typing in."
)]
pub struct Clipbuddy {
    #[clap(
        long,
        global = true,
        value_name = "DIR",
        help = "Directory holding snippets.json (default: platform data dir, or $CLIPBUDDY_HOME)"
    )]
    pub data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub commands: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive application with global shortcuts
    Run {
        #[clap(long, value_name = "CHORD", help = "Shortcut that opens quick paste")]
        popup_hotkey: Option<String>,

        #[clap(long, value_name = "CHORD", help = "Shortcut that opens the manager")]
        manager_hotkey: Option<String>,

        #[clap(long, help = "Do not listen for global shortcuts")]
        no_hotkeys: bool,
    },
    /// Open quick paste once and exit when it closes
    Popup,
    /// Open the manager once and exit when it closes
    Manage,
    /// Show the data location, counts and whether clipbuddy is running
    Status,
    /// List groups with their message counts
    Groups,
    /// List messages, optionally filtered
    Messages {
        #[clap(long, short, help = "Group to list (default: every group)")]
        group: Option<String>,

        #[clap(long, short, help = "Only messages containing this text")]
        query: Option<String>,
    },
    /// Create an empty group
    AddGroup { name: String },
    /// Rename a group, keeping its messages
    RenameGroup { old: String, new: String },
    /// Delete a group and all of its messages
    DeleteGroup {
        name: String,

        #[clap(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
    /// Append a message to a group
    AddMessage {
        #[clap(long, short, help = "Target group")]
        group: String,

        #[clap(long, short, help = "Message text; '-' reads it from stdin")]
        text: String,

        #[clap(long, help = "Add even if the group already holds the same text")]
        allow_duplicate: bool,
    },
    /// Replace the text of a message
    EditMessage {
        #[clap(long, short, help = "Group holding the message")]
        group: String,

        #[clap(long, short, help = "Position as shown by 'messages', starting at 1")]
        position: usize,

        #[clap(long, short, help = "New text; '-' reads it from stdin")]
        text: String,
    },
    /// Delete a message
    DeleteMessage {
        #[clap(long, short, help = "Group holding the message")]
        group: String,

        #[clap(long, short, help = "Position as shown by 'messages', starting at 1")]
        position: usize,
    },
    /// Write every message to a CSV file with group,message columns
    Export { path: PathBuf },
    /// Read messages from a CSV file with group,message columns
    Import {
        path: PathBuf,

        #[clap(long, help = "Discard existing groups instead of merging")]
        replace: bool,

        #[clap(long, help = "Keep the rows read before an error")]
        allow_partial: bool,
    },
    /// Print the path of the snippets file
    Path,
}

impl Commands {
    /// Commands that take over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Commands::Run { .. } | Commands::Popup | Commands::Manage)
    }

    /// Commands that write to the snippets file.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Commands::AddGroup { .. }
                | Commands::RenameGroup { .. }
                | Commands::DeleteGroup { .. }
                | Commands::AddMessage { .. }
                | Commands::EditMessage { .. }
                | Commands::DeleteMessage { .. }
                | Commands::Import { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Clipbuddy::command().debug_assert();
    }

    #[test]
    fn parses_message_commands() {
        let cli = Clipbuddy::parse_from([
            "clipbuddy",
            "--data-dir",
            "/tmp/buddy",
            "edit-message",
            "--group",
            "General",
            "--position",
            "2",
            "--text",
            "Hola",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/buddy")));
        match cli.commands {
            Some(Commands::EditMessage {
                group,
                position,
                text,
            }) => {
                assert_eq!(group, "General");
                assert_eq!(position, 2);
                assert_eq!(text, "Hola");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Clipbuddy::parse_from(["clipbuddy"]);
        assert!(cli.commands.is_none());

        let cli = Clipbuddy::parse_from(["clipbuddy", "import", "in.csv", "--replace"]);
        let command = cli.commands.unwrap();
        assert!(command.is_mutation());
        assert!(!command.is_interactive());
    }
}
