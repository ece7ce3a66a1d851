//! Client side of the generation/persistence protocol.
//!
//! A [`Client`] wraps any [`Collaborator`] (the in-process [`crate::workshop::Workshop`]
//! or the HTTP-backed [`crate::remote::HttpCollaborator`]) and enforces the
//! local rules before anything is sent:
//!
//! * Save and Update refuse a specification with blocking violations.
//! * Generate refuses a specification with any violation at all.
//! * At most one Generate per language name may be outstanding from this
//!   client; a second one fails with [`LangforgeError::GenerationInProgress`]
//!   without reaching the collaborator.
//!
//! Collaborator failures are handed back untouched and nothing is retried.
//! The caller's specification is only ever borrowed, so a failed call leaves
//! it exactly as it was.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::construct::{LanguageSpecification, OtherHasher};
use crate::error::{LangforgeError, Result};
use crate::protocol::{
    Ack, Archive, GenerateOptions, GenerateRequest, GenerationResult, SpecificationSummary,
};
use crate::validate::Validation;

/// The service that stores specifications and runs the generation engine.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn save(&self, spec: &LanguageSpecification) -> Result<Ack>;
    async fn fetch(&self, name: &str) -> Result<LanguageSpecification>;
    async fn list(&self) -> Result<Vec<SpecificationSummary>>;
    async fn update(&self, name: &str, spec: &LanguageSpecification) -> Result<Ack>;
    async fn delete(&self, name: &str) -> Result<Ack>;
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult>;
    async fn download(&self, language_name: &str) -> Result<Archive>;
}

#[async_trait]
impl<T: Collaborator + ?Sized> Collaborator for Arc<T> {
    async fn save(&self, spec: &LanguageSpecification) -> Result<Ack> {
        (**self).save(spec).await
    }
    async fn fetch(&self, name: &str) -> Result<LanguageSpecification> {
        (**self).fetch(name).await
    }
    async fn list(&self) -> Result<Vec<SpecificationSummary>> {
        (**self).list().await
    }
    async fn update(&self, name: &str, spec: &LanguageSpecification) -> Result<Ack> {
        (**self).update(name, spec).await
    }
    async fn delete(&self, name: &str) -> Result<Ack> {
        (**self).delete(name).await
    }
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult> {
        (**self).generate(request).await
    }
    async fn download(&self, language_name: &str) -> Result<Archive> {
        (**self).download(language_name).await
    }
}

/// Per-name markers for generations that have been dispatched but not yet
/// resolved.
#[derive(Debug, Default)]
struct InFlight {
    names: Mutex<HashSet<String, OtherHasher>>,
}

impl InFlight {
    fn claim(&self, name: &str) -> Result<InFlightGuard<'_>> {
        let mut names = self
            .names
            .lock()
            .map_err(|e| LangforgeError::Lock(e.to_string()))?;
        if !names.insert(name.to_string()) {
            return Err(LangforgeError::GenerationInProgress(name.to_string()));
        }
        Ok(InFlightGuard {
            registry: self,
            name: name.to_string(),
        })
    }
    fn contains(&self, name: &str) -> bool {
        self.names
            .lock()
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }
}

/// Clears its marker when dropped, whether the call succeeded, failed or the
/// future was abandoned.
struct InFlightGuard<'a> {
    registry: &'a InFlight,
    name: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut names = self
            .registry
            .names
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        names.remove(&self.name);
    }
}

pub struct Client<C> {
    collaborator: C,
    in_flight: InFlight,
    // names generated successfully during this session
    generated: Mutex<HashSet<String, OtherHasher>>,
}

impl<C: Collaborator> Client<C> {
    pub fn new(collaborator: C) -> Self {
        Self {
            collaborator,
            in_flight: InFlight::default(),
            generated: Mutex::new(HashSet::default()),
        }
    }

    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    /// True while a Generate for `name` is outstanding.
    pub fn is_generating(&self, name: &str) -> bool {
        self.in_flight.contains(name)
    }

    /// True once a Generate for `name` has succeeded in this session.
    pub fn has_generated(&self, name: &str) -> bool {
        self.generated
            .lock()
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }

    pub async fn save(&self, spec: &LanguageSpecification) -> Result<Ack> {
        require_saveable(spec)?;
        let ack = self.collaborator.save(spec).await?;
        info!(name = spec.name(), "specification saved");
        Ok(ack)
    }

    pub async fn fetch(&self, name: &str) -> Result<LanguageSpecification> {
        self.collaborator.fetch(name).await
    }

    pub async fn list(&self) -> Result<Vec<SpecificationSummary>> {
        self.collaborator.list().await
    }

    pub async fn update(&self, name: &str, spec: &LanguageSpecification) -> Result<Ack> {
        require_saveable(spec)?;
        let ack = self.collaborator.update(name, spec).await?;
        info!(name = name, renamed_to = spec.name(), "specification updated");
        Ok(ack)
    }

    pub async fn delete(&self, name: &str) -> Result<Ack> {
        let ack = self.collaborator.delete(name).await?;
        info!(name = name, "specification deleted");
        Ok(ack)
    }

    /// Sends a snapshot of `spec` to the engine. The result always describes
    /// that snapshot, whatever the caller edits while the call is outstanding.
    pub async fn generate(
        &self,
        spec: &LanguageSpecification,
        options: GenerateOptions,
    ) -> Result<GenerationResult> {
        let validation = Validation::of(spec);
        if !validation.permits_generate() {
            let violations = validation.into_violations();
            warn!(name = spec.name(), violations = violations.len(), "generation refused");
            return Err(LangforgeError::Invalid(violations));
        }
        let _guard = self.in_flight.claim(spec.name()).inspect_err(|e| {
            warn!(name = spec.name(), error = %e, "generation refused");
        })?;
        let request = GenerateRequest {
            specification: spec.clone(),
            options,
        };
        debug!(name = spec.name(), ?options, "generation dispatched");
        let result = self.collaborator.generate(&request).await;
        match &result {
            Ok(generated) => {
                info!(
                    name = spec.name(),
                    files = generated.files_generated.len(),
                    "generation complete"
                );
                if let Ok(mut names) = self.generated.lock() {
                    names.insert(spec.name().to_string());
                }
            }
            Err(e) => warn!(name = spec.name(), error = %e, "generation failed"),
        }
        result
    }

    pub async fn download(&self, language_name: &str) -> Result<Archive> {
        let archive = self.collaborator.download(language_name).await?;
        if archive.is_empty() {
            warn!(name = language_name, "empty archive");
            return Err(LangforgeError::EmptyArchive(language_name.to_string()));
        }
        info!(name = language_name, bytes = archive.len(), "archive downloaded");
        Ok(archive)
    }
}

fn require_saveable(spec: &LanguageSpecification) -> Result<()> {
    let validation = Validation::of(spec);
    if validation.permits_save() {
        return Ok(());
    }
    let blocking = validation.into_blocking();
    warn!(name = spec.name(), violations = blocking.len(), "save refused");
    Err(LangforgeError::Invalid(blocking))
}
