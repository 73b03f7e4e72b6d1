//! Command handlers: build the engine, drive it, render status.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use telerc_config::{Config, FsTargetStore, TvProfile};
use telerc_core::{
    CredentialStore, FsCredentialStore, RemoteClient, RemoteEngine, SessionStatus, TargetDevice,
    TargetStore, WakeService,
};

use crate::cli::{GlobalOpts, PairArgs, SendArgs, TvAddArgs, TvCommand};
use crate::error::CliError;

/// How long `send` waits for the session before giving up. Generous:
/// a wake-from-standby TV needs the post-wake delay plus boot time.
const CONNECT_DEADLINE: Duration = Duration::from_secs(90);

fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(Config::load(global.config.as_deref())?)
}

fn build_engine(config: &Config) -> RemoteEngine {
    let engine_config = config.engine_config();
    let transport = Arc::new(RemoteClient::new(
        config.transport_config(),
        engine_config.client_name.clone(),
    ));
    let credentials = Arc::new(FsCredentialStore::new(telerc_config::credential_path()));
    let targets = Arc::new(FsTargetStore::new(telerc_config::active_target_path()));
    RemoteEngine::new(engine_config, transport, credentials, targets)
}

// ── pair ─────────────────────────────────────────────────────────────

pub async fn pair(args: PairArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = load_config(global)?;
    let target = {
        let mut tv = TargetDevice::new(args.address.clone());
        if let Some(ref name) = args.name {
            tv = tv.with_name(name.clone());
        }
        if let Some(ref mac) = args.mac {
            tv = tv.with_hardware_address(mac.clone());
        }
        tv
    };

    let engine = build_engine(&config);
    let mut status = engine.status();
    engine.set_target(target.clone()).await;

    loop {
        let current = status.borrow_and_update().clone();
        match &current {
            SessionStatus::Connected { device_name, .. } => {
                println!("Apparié et connecté à {device_name}.");
                break;
            }
            SessionStatus::ConnectionError { message } => {
                engine.shutdown().await;
                return Err(CliError::PairingFailed {
                    message: message.clone(),
                });
            }
            SessionStatus::Pairing {
                message,
                pin_entry_visible,
            } => {
                eprintln!("{message}");
                // Prompt only when the buffer is empty: a submitted PIN
                // stays in the buffer until accepted or rejected, and a
                // rejection clears it — which re-arms the prompt.
                if *pin_entry_visible && engine.pin().borrow().is_empty() {
                    let pin = prompt_pin().await?;
                    engine.submit_pin(pin).await;
                }
            }
            other => {
                let message = other.message();
                if !message.is_empty() {
                    eprintln!("{message}");
                }
            }
        }
        if status.changed().await.is_err() {
            return Err(CliError::Other("engine stopped unexpectedly".into()));
        }
    }

    // Remember the TV for future invocations.
    let profile_name = args
        .profile
        .or(args.name.clone())
        .unwrap_or_else(|| args.address.clone());
    config.upsert_tv(
        &profile_name,
        TvProfile {
            address: target.address.clone(),
            name: target.name.clone(),
            hardware_address: target.hardware_address.clone(),
        },
    );
    config.save(global.config.as_deref())?;
    println!("TV enregistrée sous '{profile_name}'.");

    engine.shutdown().await;
    Ok(())
}

async fn prompt_pin() -> Result<String, CliError> {
    tokio::task::spawn_blocking(|| {
        dialoguer::Input::<String>::new()
            .with_prompt("PIN affiché sur la TV")
            .interact_text()
    })
    .await
    .map_err(|e| CliError::Other(format!("prompt task failed: {e}")))?
    .map_err(|e| CliError::Other(format!("PIN prompt failed: {e}")))
}

// ── send ─────────────────────────────────────────────────────────────

pub async fn send(args: SendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config(global)?;
    let target = config.resolve_tv(global.tv.as_deref())?;

    let credentials = FsCredentialStore::new(telerc_config::credential_path());
    if !credentials.exists() {
        return Err(CliError::NotPaired);
    }

    let engine = build_engine(&config);
    let mut status = engine.status();
    engine.set_target(target).await;

    let deadline = tokio::time::sleep(CONNECT_DEADLINE);
    tokio::pin!(deadline);
    loop {
        let current = status.borrow_and_update().clone();
        match &current {
            SessionStatus::Connected { .. } => break,
            SessionStatus::ConnectionError { message } => {
                engine.shutdown().await;
                return Err(CliError::ConnectionFailed {
                    message: message.clone(),
                });
            }
            other => debug!(status = %other, "waiting for session"),
        }
        tokio::select! {
            () = &mut deadline => {
                engine.shutdown().await;
                return Err(CliError::ConnectionFailed {
                    message: "délai de connexion dépassé".into(),
                });
            }
            changed = status.changed() => {
                if changed.is_err() {
                    return Err(CliError::Other("engine stopped unexpectedly".into()));
                }
            }
        }
    }

    engine.send_key(args.key);
    println!("Touche '{}' envoyée.", args.key);

    // Dispatch is fire-and-forget; give it a beat before tearing down.
    tokio::time::sleep(Duration::from_millis(300)).await;
    engine.shutdown().await;
    Ok(())
}

// ── wake ─────────────────────────────────────────────────────────────

pub async fn wake(global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config(global)?;
    let target = config.resolve_tv(global.tv.as_deref())?;
    let Some(mac) = target.hardware_address.as_deref() else {
        return Err(CliError::Validation {
            field: "hardware_address".into(),
            reason: format!("no hardware address configured for {target}"),
        });
    };

    let wake = WakeService::new(config.engine_config().wake_broadcast_override);
    wake.send_wake(mac).await?;
    println!("Paquet WoL envoyé à {mac}.");
    Ok(())
}

// ── status ───────────────────────────────────────────────────────────

pub fn status(global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config(global)?;

    let credentials = FsCredentialStore::new(telerc_config::credential_path());
    let paired = if credentials.exists() { "oui" } else { "non" };
    println!("Appairé: {paired}");

    let store = FsTargetStore::new(telerc_config::active_target_path());
    match store.active() {
        Some(tv) => println!("TV active: {tv}"),
        None => println!("TV active: aucune"),
    }

    match config.resolve_tv(global.tv.as_deref()) {
        Ok(tv) => println!("TV par défaut: {tv}"),
        Err(_) => println!("TV par défaut: aucune"),
    }
    Ok(())
}

// ── unpair ───────────────────────────────────────────────────────────

pub fn unpair() -> Result<(), CliError> {
    let credentials = FsCredentialStore::new(telerc_config::credential_path());
    credentials.delete()?;
    let store = FsTargetStore::new(telerc_config::active_target_path());
    store.set_active(None)?;
    println!("Appairage oublié.");
    Ok(())
}

// ── tv ───────────────────────────────────────────────────────────────

pub fn tv(command: TvCommand, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = load_config(global)?;
    match command {
        TvCommand::List => {
            if config.tvs.is_empty() {
                println!("Aucune TV configurée.");
                return Ok(());
            }
            for (name, profile) in &config.tvs {
                let marker = if config.default_tv.as_deref() == Some(name) {
                    "*"
                } else {
                    " "
                };
                let mac = profile.hardware_address.as_deref().unwrap_or("-");
                println!("{marker} {name}  {}  {mac}", profile.address);
            }
            Ok(())
        }
        TvCommand::Add(TvAddArgs {
            name,
            address,
            display_name,
            mac,
        }) => {
            config.upsert_tv(
                &name,
                TvProfile {
                    address,
                    name: display_name,
                    hardware_address: mac,
                },
            );
            config.save(global.config.as_deref())?;
            println!("TV '{name}' enregistrée.");
            Ok(())
        }
        TvCommand::Remove { name } => {
            config.remove_tv(&name)?;
            config.save(global.config.as_deref())?;
            println!("TV '{name}' supprimée.");
            Ok(())
        }
        TvCommand::Use { name } => {
            if !config.tvs.contains_key(&name) {
                return Err(CliError::UnknownTv { name });
            }
            config.default_tv = Some(name.clone());
            config.save(global.config.as_deref())?;
            println!("TV par défaut: '{name}'.");
            Ok(())
        }
    }
}
