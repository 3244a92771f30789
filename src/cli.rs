//! CLI - Command Line Interface for flixtui
//!
//! Every account action the TUI offers is scriptable. With `--json` (or when
//! stdout is not a terminal) output is a JSON envelope.
//!
//! # Examples
//!
//! ```bash
//! flixtui login --email neo@matrix.io --password hunter22
//! flixtui list my-list --json
//! flixtui add my-list 414906
//! flixtui subscribe premium
//! flixtui state show
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{ListKind, MediaType};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments or rejected form input
    InvalidArgs = 2,
    /// Network or backend error
    NetworkError = 3,
    /// Provider rejected the credentials
    AuthFailed = 4,
    /// Command needs a signed-in user
    NotSignedIn = 5,
    /// Movie or plan not found
    NotFound = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// flixtui - terminal client for a Netflix-style catalogue
///
/// Run without arguments to launch the interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "flixtui",
    version,
    about = "Terminal client for a Netflix-style streaming catalogue",
    long_about = "Browse titles, keep My List and Liked in sync, and manage \
                  your account and plan from the terminal.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  flixtui                                   Launch interactive TUI\n\
                  flixtui login -e me@mail.com -p secret    Sign in\n\
                  flixtui list liked --json                 Print liked titles\n\
                  flixtui subscribe standard                Pick a plan"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Use in-process backends instead of Firebase (nothing leaves the machine)
    #[arg(long, global = true)]
    pub offline: bool,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with email and password
    Login(CredentialsCmd),

    /// Create an account
    Signup(SignupCmd),

    /// Sign out and clear local state
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Print a saved list
    #[command(visible_alias = "ls")]
    List(ListCmd),

    /// Add a title to a list
    Add(ListEntryCmd),

    /// Remove a title from a list
    #[command(visible_alias = "rm")]
    Remove(ListEntryCmd),

    /// Show details, genres and trailer for a title
    #[command(visible_alias = "i")]
    Movie(MovieCmd),

    /// List subscription plans
    Plans,

    /// Subscribe to (or change to) a plan
    Subscribe(SubscribeCmd),

    /// Change the account email
    ChangeEmail(ChangeEmailCmd),

    /// Change the account password
    ChangePassword(ChangePasswordCmd),

    /// Inspect or reset the persisted client state
    State(StateCmd),
}

/// Email and password
#[derive(Args, Debug)]
pub struct CredentialsCmd {
    #[arg(long, short = 'e')]
    pub email: String,

    #[arg(long, short = 'p')]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct SignupCmd {
    #[command(flatten)]
    pub credentials: CredentialsCmd,

    /// Password confirmation (defaults to --password)
    #[arg(long, short = 'r')]
    pub repeat: Option<String>,
}

impl SignupCmd {
    pub fn repeat(&self) -> &str {
        self.repeat
            .as_deref()
            .unwrap_or(&self.credentials.password)
    }
}

/// List selector accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListArg {
    /// Saved titles
    #[value(name = "my-list", alias = "mylist")]
    MyList,
    /// Liked titles
    Liked,
}

impl From<ListArg> for ListKind {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::MyList => ListKind::MyList,
            ListArg::Liked => ListKind::Liked,
        }
    }
}

/// Media type accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaTypeArg {
    #[default]
    Movie,
    Tv,
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Movie => MediaType::Movie,
            MediaTypeArg::Tv => MediaType::Tv,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListCmd {
    #[arg(value_enum)]
    pub list: ListArg,
}

#[derive(Args, Debug)]
pub struct ListEntryCmd {
    #[arg(value_enum)]
    pub list: ListArg,

    /// TMDB id of the title
    pub id: u64,

    /// Whether the id is a movie or a TV show
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeArg,

    /// Title to store when the metadata API is not configured
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args, Debug)]
pub struct MovieCmd {
    /// TMDB id of the title
    pub id: u64,

    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeArg,
}

#[derive(Args, Debug)]
pub struct SubscribeCmd {
    /// Plan id or name (basic, standard, premium)
    pub plan: String,
}

#[derive(Args, Debug)]
pub struct ChangeEmailCmd {
    /// Current password, to re-authenticate
    #[arg(long, short = 'p')]
    pub password: String,

    #[arg(long, short = 'n')]
    pub new_email: String,
}

#[derive(Args, Debug)]
pub struct ChangePasswordCmd {
    /// Current password, to re-authenticate
    #[arg(long, short = 'p')]
    pub password: String,

    #[arg(long, short = 'n')]
    pub new_password: String,

    /// Confirmation (defaults to --new-password)
    #[arg(long, short = 'r')]
    pub repeat: Option<String>,
}

impl ChangePasswordCmd {
    pub fn repeat(&self) -> &str {
        self.repeat.as_deref().unwrap_or(&self.new_password)
    }
}

#[derive(Args, Debug)]
pub struct StateCmd {
    #[command(subcommand)]
    pub action: StateAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    /// Print the persisted store
    Show,
    /// Reset every slice to its default
    Reset,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Confirmation message response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusOk {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            status: "ok".into(),
            message: Some(message.into()),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print plain lines for humans, or `data` as JSON
    pub fn print_lines<T: Serialize>(&self, data: T, lines: &[String]) -> anyhow::Result<()> {
        if self.json {
            return self.print(data);
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_tui_mode() {
        let cli = Cli::parse_from(["flixtui"]);
        assert!(!cli.is_cli_mode());
        assert!(!cli.offline);
    }

    #[test]
    fn test_login_command() {
        let cli = Cli::parse_from(["flixtui", "login", "-e", "neo@matrix.io", "-p", "hunter22"]);
        match cli.command {
            Some(Command::Login(cmd)) => {
                assert_eq!(cmd.email, "neo@matrix.io");
                assert_eq!(cmd.password, "hunter22");
            }
            other => panic!("Expected Login command, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["flixtui", "whoami", "--json", "--quiet", "--offline"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(cli.offline);
    }

    #[test]
    fn test_list_entry_command() {
        let cli = Cli::parse_from(["flixtui", "add", "liked", "1399", "-t", "tv"]);
        match cli.command {
            Some(Command::Add(cmd)) => {
                assert_eq!(ListKind::from(cmd.list), ListKind::Liked);
                assert_eq!(cmd.id, 1399);
                assert_eq!(MediaType::from(cmd.media_type), MediaType::Tv);
            }
            other => panic!("Expected Add command, got {:?}", other),
        }
        assert!(Cli::try_parse_from(["flixtui", "list", "watchlist"]).is_err());
    }

    #[test]
    fn test_repeat_defaults_to_password() {
        let cli = Cli::parse_from(["flixtui", "signup", "-e", "a@b.co", "-p", "secret1"]);
        let Some(Command::Signup(cmd)) = cli.command else {
            panic!("Expected Signup command");
        };
        assert_eq!(cmd.repeat(), "secret1");

        let cli = Cli::parse_from([
            "flixtui",
            "change-password",
            "-p",
            "old",
            "-n",
            "new-secret",
            "-r",
            "other",
        ]);
        let Some(Command::ChangePassword(cmd)) = cli.command else {
            panic!("Expected ChangePassword command");
        };
        assert_eq!(cmd.repeat(), "other");
    }

    #[test]
    fn test_state_subcommands() {
        let cli = Cli::parse_from(["flixtui", "state", "reset"]);
        assert!(matches!(
            cli.command,
            Some(Command::State(StateCmd {
                action: StateAction::Reset
            }))
        ));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NotSignedIn), 5);
    }
}
