//! Proposal effect dispatch.
//!
//! A [`Router`] maps route names to the handler that applies a passed
//! proposal's effect. Routes are registered once at startup; the resolution
//! engine only looks them up.

use crate::error::{GovernanceError, HandlerError};
use agora_store::ParamStore;
use agora_types::ProposalContent;
use std::collections::BTreeMap;

/// Applies the on-chain effect of a passed proposal.
///
/// `params` is the parameter view of the block being resolved; writes made
/// through it commit or roll back together with the rest of the block.
pub trait Handler {
    fn handle(&self, params: &dyn ParamStore, content: &ProposalContent)
        -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&dyn ParamStore, &ProposalContent) -> Result<(), HandlerError>,
{
    fn handle(
        &self,
        params: &dyn ParamStore,
        content: &ProposalContent,
    ) -> Result<(), HandlerError> {
        self(params, content)
    }
}

/// Registry of route name → handler.
#[derive(Default)]
pub struct Router {
    routes: BTreeMap<String, Box<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `route`. Route names must be non-empty and
    /// alphanumeric, and each may be registered only once.
    pub fn add_route(
        mut self,
        route: &str,
        handler: impl Handler + 'static,
    ) -> Result<Self, GovernanceError> {
        if route.is_empty() || !route.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GovernanceError::InvalidRoute(route.to_string()));
        }
        if self.routes.contains_key(route) {
            return Err(GovernanceError::DuplicateRoute(route.to_string()));
        }
        self.routes.insert(route.to_string(), Box::new(handler));
        Ok(self)
    }

    pub fn has_route(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    pub fn route(&self, route: &str) -> Option<&dyn Handler> {
        self.routes.get(route).map(|h| h.as_ref())
    }

    /// Registered route names, sorted.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
