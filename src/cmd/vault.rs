// ============================================================================
// src/cmd/vault.rs – Build the action list for each vault verb
// ============================================================================

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::action::{
    Action, ChangeOwnership, ChangePermissions, CreateEncryptedKeyFile, CreateMountPoint,
    LogAction,
};
use crate::command::{Command, CommandKind};
use crate::config::Config;
use crate::gpg::{Encryptor, GpgEncryptor};
use crate::util::audit::AuditTrail;
use crate::util::paths::{key_file_for, resolve_vault_path};

const MOUNT_POINT_MODE: u32 = 0o700;
const SEALED_KEY_MODE: u32 = 0o400;

/// Validated options handed over by the CLI layer.
#[derive(Debug, Clone, Default)]
pub struct VaultOptions {
    pub vault_path: PathBuf,
    pub gpg_key: Option<String>,
    pub parent: Option<String>,
    pub force: bool,
}

/// Everything a command needs besides its options.
#[derive(Debug, Clone)]
pub struct VaultContext {
    pub config: Config,
    pub base_dir: PathBuf,
    pub encryptor: Rc<dyn Encryptor>,
}

impl VaultContext {
    pub fn from_config(config: Config) -> Result<Self> {
        let base_dir = match &config.vaults.base_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?,
        };
        let encryptor: Rc<dyn Encryptor> = Rc::new(GpgEncryptor::from_config(&config.gpg));
        Ok(Self {
            config,
            base_dir,
            encryptor,
        })
    }

    fn mount_point(&self, opts: &VaultOptions) -> Result<PathBuf> {
        resolve_vault_path(&self.base_dir, &opts.vault_path)
    }

    fn recipient<'a>(&'a self, opts: &'a VaultOptions) -> Option<&'a str> {
        opts.gpg_key
            .as_deref()
            .or(self.config.gpg.default_recipient.as_deref())
    }

    fn audit(&self) -> AuditTrail {
        AuditTrail::new(self.config.audit.path.clone())
    }
}

/// Build a ready-to-execute command for `kind`. Fails only on invalid input;
/// nothing on the system is touched here.
pub fn build_command(kind: CommandKind, opts: &VaultOptions, ctx: &VaultContext) -> Result<Command> {
    let mount = ctx.mount_point(opts)?;
    let mut cmd = Command::new(kind).with_audit(ctx.audit());

    match kind {
        CommandKind::Create => build_create(&mut cmd, &mount, opts, ctx)?,
        CommandKind::Destroy => cmd.add_action(Action::new(LogAction::new(format!(
            "destroy {}{}",
            mount.display(),
            if opts.force { " (forced)" } else { "" }
        )))),
        CommandKind::Lock => {
            cmd.add_action(Action::new(LogAction::new(format!("lock {}", mount.display()))))
        }
        CommandKind::Unlock => cmd.add_action(Action::new(LogAction::new(format!(
            "unlock {} with key {}",
            mount.display(),
            ctx.recipient(opts).unwrap_or("<unset>")
        )))),
    }
    Ok(cmd)
}

fn build_create(cmd: &mut Command, mount: &Path, opts: &VaultOptions, ctx: &VaultContext) -> Result<()> {
    let recipient = ctx.recipient(opts).ok_or_else(|| {
        anyhow!("create needs a recipient: pass --gpg-key or set gpg.default_recipient")
    })?;
    let key_file = key_file_for(mount, ctx.encryptor.extension())?;

    cmd.add_action(Action::new(CreateMountPoint::new(mount, MOUNT_POINT_MODE)));

    let vaults = &ctx.config.vaults;
    if let (Some(owner), Some(group)) = (&vaults.owner, &vaults.group) {
        cmd.add_action(Action::new(ChangeOwnership::new(
            mount,
            owner,
            group,
            ctx.config.elevation.elevation(),
        )));
    }

    cmd.add_action(Action::new(CreateEncryptedKeyFile::new(
        &key_file,
        recipient,
        Rc::clone(&ctx.encryptor),
    )));
    cmd.add_action(Action::new(ChangePermissions::new(&key_file, SEALED_KEY_MODE)));
    cmd.add_action(Action::new(LogAction::new(match &opts.parent {
        Some(parent) => format!("create dataset for {} under {}", mount.display(), parent),
        None => format!("create dataset for {}", mount.display()),
    })));
    Ok(())
}
