//! User-facing settings for note creation and quick-create.
//!
//! # Responsibility
//! - Deserialize settings JSON with defaults for every missing field.
//! - Validate the relation-type table before any service sees it.
//!
//! # Invariants
//! - A `KgSettings` returned by `from_json_str`/`load` has passed `validate`.
//! - Separators and the trigger marker are constants, not settings.

use crate::model::note::NoteKind;
use crate::model::relation::{RelationTableError, RelationTypeTable};
use crate::synth::frontmatter::normalize_parent_key;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Default location of the generated concept template.
pub const DEFAULT_CONCEPT_TEMPLATE_PATH: &str = "templates/KG概念模板.md";
/// Default location of the generated relation template.
pub const DEFAULT_RELATION_TEMPLATE_PATH: &str = "templates/KG关系模板.md";

/// Where untitled and quick-created notes are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    /// Always use `default_folder`.
    Fixed,
    /// Use the folder of the active note.
    #[default]
    Current,
}

/// How parent properties are copied into a child note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceMode {
    /// Copy keys with their values.
    #[default]
    Full,
    /// Copy keys with empty values.
    Structure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KgSettings {
    pub concept_template_path: String,
    pub relation_template_path: String,
    pub new_note_location_mode: LocationMode,
    /// Vault folder for `LocationMode::Fixed`; `/` is the root.
    pub default_folder: String,
    /// Frontmatter key that holds parent-concept links.
    pub parent_key: String,
    pub inheritance_mode: InheritanceMode,
    /// Create missing concept notes before a relation note.
    pub auto_create_concepts: bool,
    pub relation_types: RelationTypeTable,
}

impl Default for KgSettings {
    fn default() -> Self {
        Self {
            concept_template_path: DEFAULT_CONCEPT_TEMPLATE_PATH.to_string(),
            relation_template_path: DEFAULT_RELATION_TEMPLATE_PATH.to_string(),
            new_note_location_mode: LocationMode::default(),
            default_folder: "/".to_string(),
            parent_key: "parent".to_string(),
            inheritance_mode: InheritanceMode::default(),
            auto_create_concepts: false,
            relation_types: RelationTypeTable::default(),
        }
    }
}

impl KgSettings {
    /// Parses and validates settings JSON. Blank input yields defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and validates a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| SettingsError::Io {
            path: path.display().to_string(),
            source: err,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.relation_types.validate()?;
        Ok(())
    }

    /// Parent key with surrounding whitespace removed, `parent` when blank.
    pub fn parent_key(&self) -> &str {
        normalize_parent_key(&self.parent_key)
    }

    /// Configured template path for `kind`, trimmed; `None` when blank.
    pub fn template_path(&self, kind: NoteKind) -> Option<&str> {
        let path = match kind {
            NoteKind::Concept => self.concept_template_path.trim(),
            NoteKind::Relation => self.relation_template_path.trim(),
        };
        (!path.is_empty()).then_some(path)
    }

    /// Path where `create_default_template` writes the template for `kind`.
    pub fn default_template_path(kind: NoteKind) -> &'static str {
        match kind {
            NoteKind::Concept => DEFAULT_CONCEPT_TEMPLATE_PATH,
            NoteKind::Relation => DEFAULT_RELATION_TEMPLATE_PATH,
        }
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    RelationTable(RelationTableError),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read settings `{path}`: {source}"),
            Self::Json(err) => write!(f, "invalid settings json: {err}"),
            Self::RelationTable(err) => write!(f, "invalid relation types: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::RelationTable(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<RelationTableError> for SettingsError {
    fn from(value: RelationTableError) -> Self {
        Self::RelationTable(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{InheritanceMode, KgSettings, LocationMode, SettingsError};
    use crate::model::note::NoteKind;
    use std::io::Write;

    #[test]
    fn blank_and_partial_json_fill_defaults() {
        assert_eq!(
            KgSettings::from_json_str("  ").expect("blank is default"),
            KgSettings::default()
        );

        let settings = KgSettings::from_json_str(
            r#"{"new_note_location_mode":"fixed","default_folder":"kg","inheritance_mode":"structure"}"#,
        )
        .expect("partial settings parse");
        assert_eq!(settings.new_note_location_mode, LocationMode::Fixed);
        assert_eq!(settings.default_folder, "kg");
        assert_eq!(settings.inheritance_mode, InheritanceMode::Structure);
        assert!(!settings.auto_create_concepts);
        assert_eq!(settings.relation_types.entries().len(), 4);
    }

    #[test]
    fn custom_relation_table_replaces_default() {
        let settings = KgSettings::from_json_str(
            r#"{"relation_types":[{"abbreviation":"p","name":"包含","head_heading":"关系","tail_heading":"关系","symmetric":false}]}"#,
        )
        .expect("custom table parses");
        assert_eq!(settings.relation_types.entries().len(), 1);
        assert!(settings.relation_types.lookup("P").is_some());
    }

    #[test]
    fn invalid_relation_table_is_rejected() {
        let error = KgSettings::from_json_str(
            r#"{"relation_types":[
                {"abbreviation":"i","name":"影响","head_heading":"","tail_heading":"","symmetric":false},
                {"abbreviation":"I","name":"其他","head_heading":"","tail_heading":"","symmetric":false}
            ]}"#,
        )
        .expect_err("duplicate abbreviation");
        assert!(matches!(error, SettingsError::RelationTable(_)));

        let malformed = KgSettings::from_json_str("{not json").expect_err("malformed json");
        assert!(matches!(malformed, SettingsError::Json(_)));
    }

    #[test]
    fn parent_key_and_template_paths_are_trimmed() {
        let settings = KgSettings {
            parent_key: "  ".to_string(),
            concept_template_path: " tpl/concept.md ".to_string(),
            relation_template_path: String::new(),
            ..KgSettings::default()
        };
        assert_eq!(settings.parent_key(), "parent");
        assert_eq!(
            settings.template_path(NoteKind::Concept),
            Some("tpl/concept.md")
        );
        assert_eq!(settings.template_path(NoteKind::Relation), None);
    }

    #[test]
    fn load_reads_file_and_round_trips_json() {
        let settings = KgSettings {
            parent_key: "父概念".to_string(),
            auto_create_concepts: true,
            ..KgSettings::default()
        };
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(settings.to_json_string().expect("serialize").as_bytes())
            .expect("write settings");

        let loaded = KgSettings::load(file.path()).expect("load settings");
        assert_eq!(loaded, settings);

        let missing = KgSettings::load("/definitely/missing/kg.json").expect_err("missing file");
        assert!(matches!(missing, SettingsError::Io { .. }));
    }
}
