// used for persistence
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::construct::LanguageSpecification;
use crate::engine::Artifact;
use crate::error::{LangforgeError, Result};
use crate::primitive::LanguageType;
use crate::protocol::SpecificationSummary;

/// Where the store keeps its SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

// ------------- Persistence -------------
pub struct Persistor {
    connection: Connection,
}

impl Persistor {
    pub fn new(mode: &PersistenceMode) -> Result<Persistor> {
        let connection = match mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        Self::with_connection(connection)
    }

    pub fn with_connection(connection: Connection) -> Result<Persistor> {
        // The "STRICT" keyword introduced in 3.37.0 breaks JDBC connections, which makes
        // debugging using an external tool like DBeaver impossible
        connection.execute_batch(
            "
            create table if not exists Specification (
                Name text not null,
                Version text not null,
                Description text not null,
                LanguageType text not null,
                Body text not null,
                Digest text not null,
                CreatedAt text not null,
                UpdatedAt text not null,
                constraint unique_and_referenceable_Name primary key (
                    Name
                )
            );-- STRICT;
            create table if not exists Artifact (
                Language text not null,
                Position integer not null,
                Path text not null,
                Contents blob not null,
                constraint unique_Artifact_Path primary key (
                    Language,
                    Path
                )
            );-- STRICT;
            ",
        )?;
        Ok(Persistor { connection })
    }

    /// Writes `spec` under its name, replacing any earlier record in full.
    /// Returns whether a record already existed.
    pub fn persist_specification(&mut self, spec: &LanguageSpecification) -> Result<bool> {
        let transaction = self.connection.transaction()?;
        let existing = write_specification(&transaction, spec, Utc::now())?;
        transaction.commit()?;
        debug!(name = spec.name(), existing, "persisted specification");
        Ok(existing)
    }

    /// Replaces the record stored as `name` with `spec`, which may carry a new
    /// name. Returns `false` when nothing is stored as `name`, and fails with
    /// [`LangforgeError::NameTaken`] when the new name belongs to another record.
    pub fn replace_specification(
        &mut self,
        name: &str,
        spec: &LanguageSpecification,
    ) -> Result<bool> {
        let transaction = self.connection.transaction()?;
        let created: Option<DateTime<Utc>> = transaction
            .query_row(
                "select CreatedAt from Specification where Name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(created) = created else {
            return Ok(false);
        };
        if name != spec.name() {
            let taken = transaction
                .query_row(
                    "select 1 from Specification where Name = ?",
                    params![spec.name()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if taken {
                return Err(LangforgeError::NameTaken(spec.name().to_string()));
            }
            transaction.execute("delete from Specification where Name = ?", params![name])?;
        }
        write_specification(&transaction, spec, created)?;
        transaction.commit()?;
        debug!(name, renamed_to = spec.name(), "replaced specification");
        Ok(true)
    }

    pub fn restore_specification(&self, name: &str) -> Result<Option<LanguageSpecification>> {
        let row: Option<(String, String)> = self
            .connection
            .query_row(
                "select Body, Digest from Specification where Name = ?",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((body, digest)) = row else {
            return Ok(None);
        };
        if blake3::hash(body.as_bytes()).to_hex().as_str() != digest {
            return Err(LangforgeError::DataCorruption {
                message: format!("stored body of '{name}' does not match its digest"),
            });
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub fn summaries(&self) -> Result<Vec<SpecificationSummary>> {
        let mut statement = self.connection.prepare_cached(
            "
            select Name, Version, Description, LanguageType, UpdatedAt
                from Specification
                order by Name
            ",
        )?;
        let rows = statement.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, DateTime<Utc>>(4)?,
            ))
        })?;
        let mut summaries = Vec::new();
        for row in rows {
            let (name, version, description, language_type, updated_at) = row?;
            let language_type: LanguageType =
                language_type
                    .parse()
                    .map_err(|e| LangforgeError::DataCorruption {
                        message: format!("specification '{name}': {e}"),
                    })?;
            summaries.push(SpecificationSummary {
                name,
                version,
                description,
                language_type,
                updated_at: Some(updated_at),
            });
        }
        Ok(summaries)
    }

    /// Returns whether a record was removed. Generated artifacts are kept.
    pub fn remove_specification(&mut self, name: &str) -> Result<bool> {
        let removed = self
            .connection
            .execute("delete from Specification where Name = ?", params![name])?;
        Ok(removed > 0)
    }

    /// Replaces the artifact set kept for `language`.
    pub fn persist_artifacts(&mut self, language: &str, artifacts: &[Artifact]) -> Result<()> {
        let transaction = self.connection.transaction()?;
        transaction.execute("delete from Artifact where Language = ?", params![language])?;
        {
            let mut insert = transaction.prepare_cached(
                "
                insert into Artifact (
                    Language,
                    Position,
                    Path,
                    Contents
                ) values (?, ?, ?, ?)
                ",
            )?;
            for (position, artifact) in artifacts.iter().enumerate() {
                insert.execute(params![language, position as i64, &artifact.path, &artifact.contents])?;
            }
        }
        transaction.commit()?;
        debug!(language, artifacts = artifacts.len(), "persisted artifacts");
        Ok(())
    }

    /// Artifacts for `language` in the order they were generated.
    pub fn restore_artifacts(&self, language: &str) -> Result<Vec<Artifact>> {
        let mut statement = self.connection.prepare_cached(
            "
            select Path, Contents
                from Artifact
                where Language = ?
                order by Position
            ",
        )?;
        let rows = statement.query_map(params![language], |row| {
            Ok(Artifact {
                path: row.get(0)?,
                contents: row.get(1)?,
            })
        })?;
        let mut artifacts = Vec::new();
        for artifact in rows {
            artifacts.push(artifact?);
        }
        Ok(artifacts)
    }
}

fn write_specification(
    transaction: &Transaction,
    spec: &LanguageSpecification,
    created: DateTime<Utc>,
) -> Result<bool> {
    let body = serde_json::to_string(spec)?;
    let digest = blake3::hash(body.as_bytes()).to_hex().to_string();
    let existing: Option<String> = transaction
        .query_row(
            "select Name from Specification where Name = ?",
            params![spec.name()],
            |row| row.get(0),
        )
        .optional()?;
    // last writer wins: every column is overwritten, only CreatedAt survives
    transaction.execute(
        "
        insert into Specification (
            Name,
            Version,
            Description,
            LanguageType,
            Body,
            Digest,
            CreatedAt,
            UpdatedAt
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        on conflict (Name) do update set
            Version = excluded.Version,
            Description = excluded.Description,
            LanguageType = excluded.LanguageType,
            Body = excluded.Body,
            Digest = excluded.Digest,
            UpdatedAt = excluded.UpdatedAt
        ",
        params![
            spec.name(),
            spec.version(),
            spec.description(),
            spec.language_type().as_str(),
            body,
            digest,
            created,
            Utc::now()
        ],
    )?;
    Ok(existing.is_some())
}
