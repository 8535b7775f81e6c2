mod action;
mod cmd;
mod command;
mod config;
mod gpg;
mod ui;
mod util;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cmd::{build_command, VaultContext, VaultOptions};
use command::CommandKind;
use config::Config;
use ui::UX;

/// Manage vaults backed by encrypted ZFS datasets.
#[derive(Debug, Parser)]
#[command(name = "zvault", version, about)]
struct Cli {
    /// Config file (TOML or YAML); defaults to ~/.config/zvault/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Verb,
}

#[derive(Debug, Args)]
struct PathArg {
    /// Vault path, relative to the user's home directory
    vault_path: PathBuf,
}

#[derive(Debug, Args)]
struct GpgArg {
    /// GPG key used to protect the ZFS key or passphrase
    #[arg(short = 'g', long = "gpg-key", value_name = "key_id")]
    gpg_key: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Verb {
    /// Create a vault: mount point plus GPG-sealed key file
    Create {
        #[command(flatten)]
        path: PathArg,
        #[command(flatten)]
        gpg: GpgArg,
        /// Parent dataset in which the vault will be created
        #[arg(short, long, value_name = "parent_dataset")]
        parent: Option<String>,
    },
    /// Destroy a vault
    Destroy {
        #[command(flatten)]
        path: PathArg,
        /// Force the removal of the vault, even when files are in use
        #[arg(short, long)]
        force: bool,
    },
    /// Lock a vault
    Lock {
        #[command(flatten)]
        path: PathArg,
    },
    /// Unlock a vault
    Unlock {
        #[command(flatten)]
        path: PathArg,
        #[command(flatten)]
        gpg: GpgArg,
    },
}

impl Verb {
    fn into_parts(self) -> (CommandKind, VaultOptions) {
        match self {
            Verb::Create { path, gpg, parent } => (
                CommandKind::Create,
                VaultOptions {
                    vault_path: path.vault_path,
                    gpg_key: gpg.gpg_key,
                    parent,
                    force: false,
                },
            ),
            Verb::Destroy { path, force } => (
                CommandKind::Destroy,
                VaultOptions {
                    vault_path: path.vault_path,
                    force,
                    ..VaultOptions::default()
                },
            ),
            Verb::Lock { path } => (
                CommandKind::Lock,
                VaultOptions {
                    vault_path: path.vault_path,
                    ..VaultOptions::default()
                },
            ),
            Verb::Unlock { path, gpg } => (
                CommandKind::Unlock,
                VaultOptions {
                    vault_path: path.vault_path,
                    gpg_key: gpg.gpg_key,
                    ..VaultOptions::default()
                },
            ),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli, ui: &UX) -> Result<u8> {
    let cfg = Config::resolve(cli.config.as_deref()).context("load configuration")?;
    let ctx = VaultContext::from_config(cfg)?;
    let (kind, opts) = cli.command.into_parts();

    let mut command = build_command(kind, &opts, &ctx)
        .with_context(|| format!("prepare {kind} for {}", opts.vault_path.display()))?;
    ui.info(&format!(
        "{} {} ({} step(s))",
        kind,
        opts.vault_path.display(),
        command.actions().len()
    ));

    command.execute();
    let report = command.report();
    ui.report(&report);
    Ok(report.exit_code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ui = UX::new(cli.quiet);

    match run(cli, &ui) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            ui.error(&format!("{err:#}"));
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_flags_map_onto_options() {
        let cli = Cli::parse_from(["zvault", "create", "vaults/tax", "-g", "ABCD1234", "-p", "tank/home"]);
        let (kind, opts) = cli.command.into_parts();
        assert_eq!(kind, CommandKind::Create);
        assert_eq!(opts.vault_path, PathBuf::from("vaults/tax"));
        assert_eq!(opts.gpg_key.as_deref(), Some("ABCD1234"));
        assert_eq!(opts.parent.as_deref(), Some("tank/home"));
        assert!(!opts.force);
    }

    #[test]
    fn destroy_accepts_force() {
        let cli = Cli::parse_from(["zvault", "-v", "destroy", "--force", "tax"]);
        assert_eq!(cli.verbose, 1);
        let (kind, opts) = cli.command.into_parts();
        assert_eq!(kind, CommandKind::Destroy);
        assert!(opts.force);
    }

    #[test]
    fn lock_rejects_gpg_key() {
        assert!(Cli::try_parse_from(["zvault", "lock", "tax", "--gpg-key", "X"]).is_err());
        assert!(Cli::try_parse_from(["zvault", "unlock", "tax", "--gpg-key", "X"]).is_ok());
    }
}
