//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Import, browse and export SVG icon collections
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: iconshelf.toml, searched upward from cwd)
    #[arg(short = 'C', long, default_value = "iconshelf.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Storage directory, overrides `[storage] root`
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub storage: Option<PathBuf>,

    /// Print debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List every icon in storage
    #[command(visible_alias = "l")]
    List {
        #[command(flatten)]
        args: ListArgs,
    },

    /// Copy a folder of icons into storage
    #[command(visible_alias = "i")]
    Import {
        /// Folder to import; prompts when omitted
        #[arg(value_hint = clap::ValueHint::DirPath)]
        source: Option<PathBuf>,
    },

    /// Save an icon's normalized SVG to a file
    #[command(visible_alias = "e")]
    Export {
        /// Icon path or `author/name`
        selector: String,

        /// Target file; prompts when omitted
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,

        /// Overwrite an existing target without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Start dragging an icon file out of storage
    #[command(visible_alias = "d")]
    Drag {
        /// Icon path or `author/name`
        selector: String,
    },

    /// Serve JSON requests on stdin, answer with JSON events on stdout
    Bridge,
}

/// List command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Print records as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(short, long, requires = "json")]
    pub pretty: bool,

    /// Only show icons by this author (folder name)
    #[arg(short, long)]
    pub author: Option<String>,
}
