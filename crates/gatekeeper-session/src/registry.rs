//! Startup-time selection of the identity resolver.
//!
//! A deployment may link several resolvers (a fixed development one, an
//! LDAP one, ...). Each is registered with a priority and the registry
//! picks exactly one when the process starts.

use std::sync::Arc;

use crate::{IdentityResolver, RegistryError};

struct Candidate {
    priority: i32,
    name: String,
    resolver: Arc<dyn IdentityResolver>,
}

/// Collects resolver candidates and chooses the highest-priority one.
#[derive(Default)]
pub struct ResolverRegistry {
    candidates: Vec<Candidate>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate. Registration order does not affect selection.
    pub fn register(
        &mut self,
        priority: i32,
        name: impl Into<String>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> &mut Self {
        self.candidates.push(Candidate {
            priority,
            name: name.into(),
            resolver,
        });
        self
    }

    /// Picks the resolver with the highest priority.
    ///
    /// # Errors
    /// - [`RegistryError::NoImplementation`]: nothing registered
    /// - [`RegistryError::AmbiguousPriority`]: two candidates share the
    ///   highest priority
    pub fn select(&self) -> Result<Arc<dyn IdentityResolver>, RegistryError> {
        let mut best: Option<&Candidate> = None;
        for candidate in &self.candidates {
            tracing::info!(
                name = %candidate.name,
                priority = candidate.priority,
                "found IdentityResolver implementation"
            );
            best = match best {
                Some(current) if current.priority >= candidate.priority => {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }

        let chosen = best.ok_or(RegistryError::NoImplementation)?;

        if let Some(rival) = self.candidates.iter().find(|c| {
            c.priority == chosen.priority && !std::ptr::eq(*c, chosen)
        }) {
            tracing::error!(
                priority = chosen.priority,
                first = %chosen.name,
                second = %rival.name,
                "ambiguous IdentityResolver priority"
            );
            return Err(RegistryError::AmbiguousPriority {
                priority: chosen.priority,
                first: chosen.name.clone(),
                second: rival.name.clone(),
            });
        }

        tracing::info!(name = %chosen.name, "using IdentityResolver implementation");
        Ok(Arc::clone(&chosen.resolver))
    }
}
