//! In-process collaborator: storage, generation and packing behind one value.
//!
//! The workshop never trusts its callers. Every save and update is checked for
//! blocking violations and every generate request for violations of any kind,
//! whether or not a [`crate::client::Client`] already did so.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::archive;
use crate::client::Collaborator;
use crate::construct::LanguageSpecification;
use crate::engine::{Engine, ScaffoldEngine};
use crate::error::{LangforgeError, Result};
use crate::persist::{PersistenceMode, Persistor};
use crate::protocol::{
    Ack, Archive, GenerateRequest, GenerationResult, SpecificationSummary,
};
use crate::validate::Validation;

pub struct Workshop {
    persistor: Mutex<Persistor>,
    engine: Box<dyn Engine>,
}

impl Workshop {
    pub fn new(persistor: Persistor) -> Self {
        Self::with_engine(persistor, ScaffoldEngine)
    }

    pub fn with_engine(persistor: Persistor, engine: impl Engine + 'static) -> Self {
        Self {
            persistor: Mutex::new(persistor),
            engine: Box::new(engine),
        }
    }

    pub fn open(mode: &PersistenceMode) -> Result<Self> {
        Ok(Self::new(Persistor::new(mode)?))
    }

    fn persistor(&self) -> Result<MutexGuard<'_, Persistor>> {
        self.persistor
            .lock()
            .map_err(|e| LangforgeError::Lock(e.to_string()))
    }

    pub fn save_specification(&self, spec: &LanguageSpecification) -> Result<Ack> {
        reject_blocking(spec)?;
        let existed = self.persistor()?.persist_specification(spec)?;
        info!(name = spec.name(), existed, "stored specification");
        Ok(Ack::new(if existed {
            "Language specification overwritten"
        } else {
            "Language specification created"
        }))
    }

    pub fn fetch_specification(&self, name: &str) -> Result<LanguageSpecification> {
        self.persistor()?
            .restore_specification(name)?
            .ok_or_else(|| not_found(name))
    }

    pub fn list_specifications(&self) -> Result<Vec<SpecificationSummary>> {
        self.persistor()?.summaries()
    }

    pub fn update_specification(&self, name: &str, spec: &LanguageSpecification) -> Result<Ack> {
        reject_blocking(spec)?;
        if !self.persistor()?.replace_specification(name, spec)? {
            return Err(not_found(name));
        }
        info!(name, renamed_to = spec.name(), "replaced specification");
        Ok(Ack::new("Language specification updated"))
    }

    pub fn delete_specification(&self, name: &str) -> Result<Ack> {
        if !self.persistor()?.remove_specification(name)? {
            return Err(not_found(name));
        }
        info!(name, "removed specification");
        Ok(Ack::new("Language specification deleted"))
    }

    pub fn generate_language(&self, request: &GenerateRequest) -> Result<GenerationResult> {
        let spec = &request.specification;
        let validation = Validation::of(spec);
        if !validation.permits_generate() {
            warn!(name = spec.name(), "refusing to generate");
            return Err(LangforgeError::Invalid(validation.into_violations()));
        }
        let artifacts = self.engine.generate(spec, &request.options)?;
        self.persistor()?
            .persist_artifacts(spec.name(), &artifacts)?;
        info!(name = spec.name(), files = artifacts.len(), "generated language");
        Ok(GenerationResult {
            language_name: spec.name().to_string(),
            language_type: spec.language_type(),
            files_generated: artifacts.into_iter().map(|artifact| artifact.path).collect(),
        })
    }

    pub fn download_language(&self, language_name: &str) -> Result<Archive> {
        let artifacts = self.persistor()?.restore_artifacts(language_name)?;
        if artifacts.is_empty() {
            return Err(LangforgeError::NotFound(format!(
                "generated language '{language_name}'"
            )));
        }
        archive::pack(language_name, &artifacts)
    }
}

fn not_found(name: &str) -> LangforgeError {
    LangforgeError::NotFound(format!("language '{name}'"))
}

fn reject_blocking(spec: &LanguageSpecification) -> Result<()> {
    let validation = Validation::of(spec);
    if validation.permits_save() {
        Ok(())
    } else {
        warn!(name = spec.name(), "refusing to store");
        Err(LangforgeError::Invalid(validation.into_blocking()))
    }
}

#[async_trait]
impl Collaborator for Workshop {
    async fn save(&self, spec: &LanguageSpecification) -> Result<Ack> {
        self.save_specification(spec)
    }
    async fn fetch(&self, name: &str) -> Result<LanguageSpecification> {
        self.fetch_specification(name)
    }
    async fn list(&self) -> Result<Vec<SpecificationSummary>> {
        self.list_specifications()
    }
    async fn update(&self, name: &str, spec: &LanguageSpecification) -> Result<Ack> {
        self.update_specification(name, spec)
    }
    async fn delete(&self, name: &str) -> Result<Ack> {
        self.delete_specification(name)
    }
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult> {
        self.generate_language(request)
    }
    async fn download(&self, language_name: &str) -> Result<Archive> {
        self.download_language(language_name)
    }
}
