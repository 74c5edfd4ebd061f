//! Built-in proposal handlers.

use crate::error::HandlerError;
use crate::router::Handler;
use agora_store::ParamStore;
use agora_types::proposal::{PARAMS_ROUTE, TEXT_ROUTE};
use agora_types::ProposalContent;
use std::collections::{BTreeMap, BTreeSet};

/// Handler for signal-only text proposals. Passing has no on-chain effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextProposalHandler;

impl Handler for TextProposalHandler {
    fn handle(
        &self,
        _params: &dyn ParamStore,
        content: &ProposalContent,
    ) -> Result<(), HandlerError> {
        match content {
            ProposalContent::Text { .. } => Ok(()),
            _ => Err(HandlerError::UnsupportedContent { route: TEXT_ROUTE }),
        }
    }
}

/// Handler that writes parameter changes into the block's [`ParamStore`].
///
/// Only keys registered with [`ParamChangeHandler::with_subspace`] may be
/// changed. Every change is checked before any is written, and the changes
/// are applied with one [`ParamStore::set_params`] call, so a failed proposal
/// leaves the parameters untouched.
#[derive(Clone, Debug, Default)]
pub struct ParamChangeHandler {
    allowed: BTreeMap<String, BTreeSet<String>>,
}

impl ParamChangeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `keys` under `subspace` to be changed by governance.
    pub fn with_subspace(mut self, subspace: &str, keys: &[&str]) -> Self {
        self.allowed
            .entry(subspace.to_string())
            .or_default()
            .extend(keys.iter().map(|k| k.to_string()));
        self
    }

    fn is_allowed(&self, subspace: &str, key: &str) -> bool {
        self.allowed
            .get(subspace)
            .is_some_and(|keys| keys.contains(key))
    }
}

impl Handler for ParamChangeHandler {
    fn handle(
        &self,
        params: &dyn ParamStore,
        content: &ProposalContent,
    ) -> Result<(), HandlerError> {
        let ProposalContent::ParameterChange { changes, .. } = content else {
            return Err(HandlerError::UnsupportedContent {
                route: PARAMS_ROUTE,
            });
        };
        if let Some(bad) = changes
            .iter()
            .find(|c| !self.is_allowed(&c.subspace, &c.key))
        {
            return Err(HandlerError::UnknownParam {
                subspace: bad.subspace.clone(),
                key: bad.key.clone(),
            });
        }
        params
            .set_params(changes)
            .map_err(|e| HandlerError::Store(e.to_string()))?;
        for change in changes {
            tracing::debug!(
                subspace = %change.subspace,
                key = %change.key,
                value = %change.value,
                "governance parameter updated"
            );
        }
        Ok(())
    }
}
