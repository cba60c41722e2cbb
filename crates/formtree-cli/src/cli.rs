//! Command-line interface for `formtree`.
//!
//! # Examples
//!
//! ```bash
//! # Print every record of a tree document
//! formtree walk form.json
//!
//! # Add two workers, drop the first, and print the submission
//! formtree submit form.json --add workers --add workers --remove workers:0
//!
//! # Switch the second worker's tabs and render YAML
//! formtree yaml form.json --add workers --add workers --tab workers.1=advanced
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

/// Walk, edit, and assemble configuration form trees.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "formtree",
    author,
    version,
    about = "Walk, edit, and assemble configuration form trees"
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "FORMTREE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print records as a JSON array of [path, label, value]
    Walk {
        #[command(flatten)]
        input: Input,

        /// Print records last declared first
        #[arg(long)]
        reverse: bool,

        /// Skip records under unselected tab panes
        #[arg(long)]
        active_only: bool,
    },

    /// Print the nested submission as JSON
    Submit(Input),

    /// Print the submission as a YAML document
    Yaml(Input),

    /// Print the prefill payload for the configured target
    Prefill(Input),

    /// Render YAML and write it under the configured file name
    Save {
        #[command(flatten)]
        input: Input,

        /// Directory to write into
        #[arg(long, short = 'o', default_value = ".")]
        dir: PathBuf,
    },

    /// Post the submission to a backend's check endpoint
    #[cfg(feature = "http")]
    Check {
        #[command(flatten)]
        input: Input,

        /// Base URL of the backend
        #[arg(long)]
        url: String,
    },
}

/// A tree document and the edits applied to it before output.
#[derive(Args, Debug, Clone)]
pub struct Input {
    /// Tree document (JSON)
    pub tree: PathBuf,

    /// Append an item to the list section at this path
    #[arg(long = "add", value_name = "SECTION_PATH")]
    pub add: Vec<String>,

    /// Remove item INDEX of the list section at SECTION_PATH
    #[arg(long = "remove", value_name = "SECTION_PATH:INDEX", value_parser = parse_remove)]
    pub remove: Vec<RemoveEdit>,

    /// Select the tab KEY of the group enclosed by GROUP_PATH
    #[arg(long = "tab", value_name = "GROUP_PATH=KEY", value_parser = parse_tab)]
    pub tab: Vec<TabEdit>,
}

/// A `--remove` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveEdit {
    /// Path of the list section.
    pub section: String,
    /// Index of the item to remove.
    pub index: usize,
}

/// A `--tab` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEdit {
    /// Path enclosing the tab group.
    pub group: String,
    /// Key of the button to select.
    pub key: String,
}

fn parse_remove(arg: &str) -> Result<RemoveEdit, String> {
    let (section, index) = arg
        .rsplit_once(':')
        .ok_or_else(|| format!("expected SECTION_PATH:INDEX, got {arg:?}"))?;
    let index = index
        .parse()
        .map_err(|_| format!("invalid item index {index:?}"))?;
    Ok(RemoveEdit {
        section: section.to_string(),
        index,
    })
}

fn parse_tab(arg: &str) -> Result<TabEdit, String> {
    let (group, key) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected GROUP_PATH=KEY, got {arg:?}"))?;
    if key.is_empty() {
        return Err(format!("missing tab key in {arg:?}"));
    }
    Ok(TabEdit {
        group: group.to_string(),
        key: key.to_string(),
    })
}

impl Cli {
    /// Parse command line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get log level based on verbosity.
    #[must_use]
    pub const fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Returns the input of any subcommand.
    pub fn input(&self) -> &Input {
        match &self.command {
            Command::Walk { input, .. } | Command::Save { input, .. } => input,
            Command::Submit(input) | Command::Yaml(input) | Command::Prefill(input) => input,
            #[cfg(feature = "http")]
            Command::Check { input, .. } => input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_walk_flags() {
        let cli = Cli::try_parse_from(["formtree", "walk", "f.json", "--reverse"]).unwrap();
        match cli.command {
            Command::Walk {
                reverse,
                active_only,
                ..
            } => {
                assert!(reverse);
                assert!(!active_only);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_repeated_edits() {
        let cli = Cli::try_parse_from([
            "formtree",
            "submit",
            "f.json",
            "--add",
            "workers",
            "--add",
            "workers",
            "--remove",
            "workers:0",
            "--tab",
            "workers.0=advanced",
        ])
        .unwrap();
        let input = cli.input();
        assert_eq!(input.add, vec!["workers", "workers"]);
        assert_eq!(
            input.remove,
            vec![RemoveEdit {
                section: "workers".into(),
                index: 0
            }]
        );
        assert_eq!(input.tab[0].group, "workers.0");
        assert_eq!(input.tab[0].key, "advanced");
    }

    #[test]
    fn top_level_tab_group_has_empty_path() {
        assert_eq!(
            parse_tab("=info").unwrap(),
            TabEdit {
                group: String::new(),
                key: "info".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_edits() {
        assert!(parse_remove("workers").is_err());
        assert!(parse_remove("workers:x").is_err());
        assert!(parse_tab("workers").is_err());
        assert!(parse_tab("workers=").is_err());
    }

    #[test]
    fn parses_verbose() {
        let cli = Cli::try_parse_from(["formtree", "yaml", "f.json"]).unwrap();
        assert_eq!(cli.log_level(), Level::WARN);

        let cli = Cli::try_parse_from(["formtree", "-vv", "yaml", "f.json"]).unwrap();
        assert_eq!(cli.log_level(), Level::DEBUG);

        let cli = Cli::try_parse_from(["formtree", "yaml", "f.json", "-vvv"]).unwrap();
        assert_eq!(cli.log_level(), Level::TRACE);
    }
}
