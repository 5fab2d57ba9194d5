//! CLI command handlers.
//!
//! Every handler loads the held stream from the state file, acts through a
//! [`StreamResource`], and writes back whatever the resource holds afterwards,
//! including after a failed apply.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use audit_stream_client::{ClientConfig, StreamClient};
use audit_stream_core::files;
use audit_stream_reconciler::{
    ReconciledState, StreamController, StreamDeclaration, StreamResource, TracingStreamApi,
};
use tracing::info;

use crate::cli::{Commands, FileArgs};
use crate::state;

/// Execute a CLI command and print its report.
///
/// # Errors
///
/// Returns any error from loading files or from the remote service.
pub async fn execute_command(command: Commands, files: &FileArgs) -> Result<()> {
    let report = run(command, files).await?;
    println!("{report}");
    Ok(())
}

/// Execute a CLI command and return its report.
///
/// # Errors
///
/// Returns any error from loading files or from the remote service.
pub async fn run(command: Commands, files: &FileArgs) -> Result<String> {
    match command {
        Commands::Plan => cmd_plan(files),
        Commands::Apply => cmd_apply(files).await,
        Commands::Refresh => cmd_refresh(files).await,
        Commands::Destroy => cmd_destroy(files).await,
        Commands::Import { id } => cmd_import(files, &id).await,
        Commands::SigningKey { scope } => cmd_signing_key(files, &scope).await,
    }
}

fn cmd_plan(files: &FileArgs) -> Result<String> {
    let declaration = load_declaration(&files.config)?;
    let resource = open_resource(files)?;

    let action = resource.plan(&declaration)?;
    Ok(format!("Plan: {}", action.description()))
}

async fn cmd_apply(files: &FileArgs) -> Result<String> {
    let declaration = load_declaration(&files.config)?;
    let mut resource = open_resource(files)?;

    let result = resource.apply(&declaration).await;
    state::save(&files.state, resource.state())?;
    let action = result.context("Apply failed")?;

    info!(action = %action.description(), "Apply complete");
    Ok(format!(
        "Applied: {}\n{}",
        action.description(),
        describe(resource.state())
    ))
}

async fn cmd_refresh(files: &FileArgs) -> Result<String> {
    let mut resource = open_resource(files)?;
    if resource.state().is_none() {
        return Ok("No stream is managed".to_string());
    }

    let present = resource.refresh().await.context("Refresh failed")?;
    state::save(&files.state, resource.state())?;

    if present {
        Ok(describe(resource.state()))
    } else {
        Ok("Stream no longer exists remotely; forgotten".to_string())
    }
}

async fn cmd_destroy(files: &FileArgs) -> Result<String> {
    let mut resource = open_resource(files)?;
    let Some(identity) = resource.state().map(|s| s.identity.clone()) else {
        return Ok("No stream is managed".to_string());
    };

    resource.destroy().await.context("Destroy failed")?;
    state::save(&files.state, resource.state())?;
    Ok(format!("Destroyed {identity}"))
}

async fn cmd_import(files: &FileArgs, id: &str) -> Result<String> {
    let mut resource = open_resource(files)?;

    resource
        .import(id)
        .await
        .with_context(|| format!("Failed to import {id}"))?;
    state::save(&files.state, resource.state())?;

    Ok(format!(
        "Imported {id}; the next apply will rewrite the vendor config\n{}",
        describe(resource.state())
    ))
}

async fn cmd_signing_key(files: &FileArgs, scope: &str) -> Result<String> {
    let key = build_controller(files)?
        .signing_key(scope)
        .await
        .with_context(|| format!("Failed to fetch signing key for {scope}"))?;
    Ok(format!("key_id: {}\nkey: {}", key.key_id, key.key))
}

fn load_declaration(path: &Path) -> Result<StreamDeclaration> {
    files::load_document(path)
        .with_context(|| format!("Failed to load declaration from {}", path.display()))
}

fn load_client_config(files: &FileArgs) -> Result<ClientConfig> {
    match files.client_config {
        Some(ref path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load client config from {}", path.display())),
        None => ClientConfig::from_env().context("Invalid client configuration in environment"),
    }
}

fn build_controller(files: &FileArgs) -> Result<StreamController> {
    let client = StreamClient::with_config(load_client_config(files)?)
        .context("Failed to build stream client")?;
    Ok(StreamController::new(Arc::new(TracingStreamApi::new(
        client,
    ))))
}

fn open_resource(files: &FileArgs) -> Result<StreamResource> {
    let controller = build_controller(files)?;
    let held = state::load(&files.state)?;
    Ok(StreamResource::new(controller, held))
}

fn describe(state: Option<&ReconciledState>) -> String {
    match state {
        Some(state) => {
            let vendor = state
                .vendor_config()
                .map_or_else(|| "<not known>".to_string(), |v| v.summary());
            format!(
                "Stream {} enabled={} details={:?} vendor={}",
                state.identity,
                state.enabled(),
                state.summary(),
                vendor
            )
        }
        None => "No stream is managed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_stream_reconciler::{
        BlobDestination, CarriedFields, ObservedStreamState, StreamIdentity, VendorConfig,
    };

    #[test]
    fn test_describe_hides_secret() -> Result<()> {
        let state = ReconciledState::reconcile(
            StreamIdentity::new("acme", 7)?,
            ObservedStreamState::new(7, false, "c1"),
            CarriedFields::new(Some(VendorConfig::BlobDestination(BlobDestination::new(
                "c1",
                "k1",
                "very-secret",
            )))),
        );

        let text = describe(Some(&state));
        assert!(text.contains("acme:7"));
        assert!(text.contains("enabled=false"));
        assert!(!text.contains("very-secret"));
        Ok(())
    }

    #[test]
    fn test_describe_imported_state() -> Result<()> {
        let state = ReconciledState::reconcile(
            StreamIdentity::new("acme", 7)?,
            ObservedStreamState::new(7, true, ""),
            CarriedFields::default(),
        );
        assert!(describe(Some(&state)).contains("vendor=<not known>"));
        Ok(())
    }
}
