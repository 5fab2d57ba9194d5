//! One managed stream as a declarative tool sees it.
//!
//! [`StreamResource`] owns the stored [`ReconciledState`] and the lifecycle
//! phase, plans whole-resource actions, and applies them through a
//! [`StreamController`]. Forget-on-absent, replace-on-scope-change, and
//! idempotent destroy live here rather than in the controller.

use tracing::{debug, info, warn};

use crate::controller::StreamController;
use crate::declaration::StreamDeclaration;
use crate::error::{Error, Result};
use crate::identity::StreamIdentity;
use crate::types::{
    CarriedFields, ObservedStreamState, ReadOutcome, ReconciledState, StreamAction, StreamPhase,
};
use crate::vendor;

/// A single stream instance and its stored state.
pub struct StreamResource {
    controller: StreamController,
    state: Option<ReconciledState>,
    phase: StreamPhase,
}

impl StreamResource {
    /// Wrap previously stored state (or none).
    pub fn new(controller: StreamController, state: Option<ReconciledState>) -> Self {
        let phase = if state.is_some() {
            StreamPhase::Present
        } else {
            StreamPhase::Absent
        };
        Self {
            controller,
            state,
            phase,
        }
    }

    /// Current stored state.
    pub const fn state(&self) -> Option<&ReconciledState> {
        self.state.as_ref()
    }

    /// Consume the resource, returning its stored state.
    pub fn into_state(self) -> Option<ReconciledState> {
        self.state
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> StreamPhase {
        self.phase
    }

    fn transition(&mut self, next: StreamPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(Error::invalid_transition(self.phase, next));
        }
        debug!(from = %self.phase, to = %next, "Stream phase change");
        self.phase = next;
        Ok(())
    }

    /// Work out what applying `declaration` would do.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if the declaration is invalid.
    pub fn plan(&self, declaration: &StreamDeclaration) -> Result<StreamAction> {
        declaration.validate()?;

        let Some(state) = self.state.as_ref() else {
            return Ok(StreamAction::Create {
                scope: declaration.scope.clone(),
            });
        };

        if state.scope() != declaration.scope {
            return Ok(StreamAction::Replace {
                identity: state.identity.clone(),
                new_scope: declaration.scope.clone(),
            });
        }

        let enabled_to = declaration.effective_enabled();
        let declared_vendor =
            vendor::build(declaration, enabled_to).map(|config| config.vendor);
        let vendor_changed = declared_vendor.as_ref() != state.vendor_config();

        if vendor_changed || state.enabled() != enabled_to {
            Ok(StreamAction::Update {
                identity: state.identity.clone(),
                enabled_from: state.enabled(),
                enabled_to,
                vendor_changed,
            })
        } else {
            Ok(StreamAction::NoOp)
        }
    }

    /// Converge the stream on `declaration`.
    ///
    /// # Errors
    ///
    /// Any error from planning or from the controller. On failure the stored
    /// state reflects whatever is known to exist remotely.
    pub async fn apply(&mut self, declaration: &StreamDeclaration) -> Result<StreamAction> {
        let action = self.plan(declaration)?;
        info!(action = %action.description(), "Applying stream plan");

        match &action {
            StreamAction::NoOp => {}
            StreamAction::Create { .. } => self.create(declaration).await?,
            StreamAction::Update { identity, .. } => {
                let identity = identity.clone();
                self.update(&identity, declaration).await?;
            }
            StreamAction::Replace { .. } => {
                self.destroy().await?;
                self.create(declaration).await?;
            }
        }

        Ok(action)
    }

    async fn create(&mut self, declaration: &StreamDeclaration) -> Result<()> {
        self.transition(StreamPhase::Creating)?;

        let identity = match self.controller.create(declaration).await {
            Ok(identity) => identity,
            Err(e) => {
                self.transition(StreamPhase::Absent)?;
                return Err(e);
            }
        };

        let written = vendor::build(declaration, declaration.effective_enabled());
        let carried = written.as_ref().map(|config| config.vendor.clone());

        match self.controller.read(&identity, carried.clone()).await {
            Ok(ReadOutcome::Present(state)) => {
                self.state = Some(state);
                self.transition(StreamPhase::Present)
            }
            Ok(ReadOutcome::Absent) => {
                self.state = None;
                self.transition(StreamPhase::Absent)?;
                Err(Error::remote_not_found("get_stream", identity.compose()))
            }
            Err(e) => {
                // The stream exists remotely; keep what we wrote so it is not orphaned.
                warn!(identity = %identity, error = %e, "Read after create failed");
                let observed = ObservedStreamState::new(
                    identity.stream_id(),
                    declaration.effective_enabled(),
                    String::new(),
                );
                self.state = Some(ReconciledState::reconcile(
                    identity,
                    observed,
                    CarriedFields::new(carried),
                ));
                self.transition(StreamPhase::Present)?;
                Err(e)
            }
        }
    }

    async fn update(
        &mut self,
        identity: &StreamIdentity,
        declaration: &StreamDeclaration,
    ) -> Result<()> {
        self.transition(StreamPhase::Updating)?;

        let written = match self.controller.write(identity, declaration).await {
            Ok(config) => config,
            Err(e) if e.is_not_found() => {
                warn!(identity = %identity, "Stream vanished during update, forgetting it");
                self.state = None;
                self.transition(StreamPhase::Absent)?;
                return Err(e);
            }
            Err(e) => {
                self.transition(StreamPhase::Present)?;
                return Err(e);
            }
        };

        match self
            .controller
            .read_back(identity, written.vendor.clone())
            .await
        {
            Ok(state) => {
                self.state = Some(state);
                self.transition(StreamPhase::Present)
            }
            Err(e) if e.is_not_found() => {
                warn!(identity = %identity, "Stream vanished after update, forgetting it");
                self.state = None;
                self.transition(StreamPhase::Absent)?;
                Err(e)
            }
            Err(e) => {
                // The remote holds the new config; the stored state must too.
                warn!(identity = %identity, error = %e, "Read after update failed");
                let mut observed = match self.state.as_ref() {
                    Some(held) => held.observed.clone(),
                    None => ObservedStreamState::new(identity.stream_id(), written.enabled, ""),
                };
                observed.enabled = written.enabled;
                self.state = Some(ReconciledState::reconcile(
                    identity.clone(),
                    observed,
                    CarriedFields::new(Some(written.vendor)),
                ));
                self.transition(StreamPhase::Present)?;
                Err(e)
            }
        }
    }

    /// Re-read the stream. Returns whether it still exists.
    ///
    /// A stream deleted out-of-band is forgotten, not reported as an error.
    ///
    /// # Errors
    ///
    /// Remote failures other than not-found.
    pub async fn refresh(&mut self) -> Result<bool> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };

        let identity = state.identity.clone();
        let carried = state.carried.vendor_config.clone();

        match self.controller.read(&identity, carried).await? {
            ReadOutcome::Present(state) => {
                self.state = Some(state);
                Ok(true)
            }
            ReadOutcome::Absent => {
                self.state = None;
                self.transition(StreamPhase::Absent)?;
                Ok(false)
            }
        }
    }

    /// Delete the stream. A stream that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Remote failures other than not-found; the state is kept in that case.
    pub async fn destroy(&mut self) -> Result<()> {
        let Some(identity) = self.state.as_ref().map(|s| s.identity.clone()) else {
            return Ok(());
        };

        self.transition(StreamPhase::Deleting)?;

        match self.controller.delete(&identity).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                info!(identity = %identity, "Stream already deleted remotely");
            }
            Err(e) => {
                self.transition(StreamPhase::Present)?;
                return Err(e);
            }
        }

        self.state = None;
        self.transition(StreamPhase::Absent)
    }

    /// Adopt an existing stream by identity string.
    ///
    /// Only observable fields are populated; the vendor config stays empty
    /// because the remote never returns it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if a stream is already held,
    /// [`Error::MalformedIdentity`] for a corrupt id,
    /// [`Error::RemoteNotFound`] if the stream does not exist.
    pub async fn import(&mut self, id: &str) -> Result<&ReconciledState> {
        if let Some(held) = self.state.as_ref() {
            return Err(Error::invalid_configuration(format!(
                "stream {} is already managed",
                held.identity
            )));
        }

        let identity = StreamIdentity::decompose(id)?;
        match self.controller.read(&identity, None).await? {
            ReadOutcome::Present(state) => {
                info!(
                    identity = %identity,
                    "Imported stream; vendor config is not readable remotely"
                );
                self.transition(StreamPhase::Present)?;
                let state: &ReconciledState = self.state.insert(state);
                Ok(state)
            }
            ReadOutcome::Absent => Err(Error::remote_not_found("import", identity.compose())),
        }
    }
}
