//! CLI argument definitions
//!
//! All Clap derive structs for `scopecfg` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Load, merge and validate microscope hardware configuration files.
#[derive(Parser, Debug)]
#[command(name = "scopecfg", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "SCOPECFG_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration files and report every issue.
    Validate(ValidateArgs),

    /// Print the merged configuration.
    Show(ShowArgs),

    /// Print the declared or derived hardware inventory.
    Inventory(InventoryArgs),

    /// List the configured microscopes.
    Microscopes(MicroscopesArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Configuration files shared by every loading command.
#[derive(Args, Debug)]
pub struct ConfigFiles {
    /// Configuration files, merged in order; later files override earlier ones.
    #[arg(required = true, num_args = 1.., env = "SCOPECFG_CONFIG")]
    pub files: Vec<PathBuf>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Files to load.
    #[command(flatten)]
    pub config: ConfigFiles,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,

    /// Write Prometheus text metrics to this file.
    #[arg(long, value_name = "FILE")]
    pub metrics_out: Option<PathBuf>,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Files to load.
    #[command(flatten)]
    pub config: ConfigFiles,

    /// Print only this microscope.
    #[arg(short, long)]
    pub microscope: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "yaml")]
    pub format: ShowFormat,
}

/// Arguments for `inventory`.
#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// Files to load.
    #[command(flatten)]
    pub config: ConfigFiles,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `microscopes`.
#[derive(Args, Debug)]
pub struct MicroscopesArgs {
    /// Files to load.
    #[command(flatten)]
    pub config: ConfigFiles,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Value Enums
// ============================================================================

/// Color output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal support.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ShowFormat {
    /// YAML document.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_validate_multiple_files() {
        let cli =
            Cli::try_parse_from(["scopecfg", "validate", "base.yaml", "site.yaml", "--strict"])
                .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("Expected ValidateArgs");
        };
        assert_eq!(args.config.files.len(), 2);
        assert!(args.strict);
        assert_eq!(args.format, OutputFormat::Human);
        assert!(args.metrics_out.is_none());
    }

    #[test]
    fn test_show_defaults_to_yaml() {
        let cli = Cli::try_parse_from(["scopecfg", "show", "c.yaml", "-m", "Mesoscale"]).unwrap();
        let Commands::Show(args) = cli.command else {
            panic!("Expected ShowArgs");
        };
        assert_eq!(args.format, ShowFormat::Yaml);
        assert_eq!(args.microscope.as_deref(), Some("Mesoscale"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scopecfg",
            "inventory",
            "c.yaml",
            "-vv",
            "--color",
            "never",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["scopecfg", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["scopecfg", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
