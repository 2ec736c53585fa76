//! Note commands: create-or-link, reverse alias, property inheritance and
//! default templates.
//!
//! # Responsibility
//! - Create concept and relation notes from templates.
//! - Edit single frontmatter entries of existing notes, leaving every other
//!   line as written.
//!
//! # Invariants
//! - Lookups by name are case-insensitive over titles and aliases.
//! - Inheritance never overwrites a key the child already has.
//! - Default templates are never overwritten.

use super::{
    default_template_content, generate_uid, resolve_creation_folder, system_clock,
    untitled_note_title, Clock, ServiceError,
};
use crate::config::{InheritanceMode, KgSettings};
use crate::model::note::{join_note_path, parent_folder, NoteKind, NoteRecord};
use crate::repo::{NoteRepository, RepoError};
use crate::synth::frontmatter::{build_frontmatter, FrontmatterRequest, KEY_ALIASES};
use crate::synth::text::{find_wikilinks, parse_wikilink, sanitize_file_name, wikilink};
use crate::synth::title::{reverse_title, split_relation_title};
use crate::synth::yaml_edit::{self, FrontmatterError};
use log::{info, warn};
use serde_yaml_ng::{Mapping, Value};

/// Result of `create_or_link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrLinkOutcome {
    pub note: NoteRecord,
    /// False when an existing note matched the selection.
    pub created: bool,
    /// Replacement for the selection; `None` when there was no selection.
    pub link_text: Option<String>,
}

/// Result of the reverse-alias command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseAliasOutcome {
    /// Title is not `head-relation-tail`.
    NotRelationTitle,
    /// Relation is unknown or asymmetric.
    NotSymmetric,
    AlreadyPresent(String),
    Added(String),
}

/// Result of the inherit-properties command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InheritOutcome {
    /// Child has no value under the parent key.
    NoParentKey,
    /// Parent key holds no wikilinks.
    NoParentLinks,
    Inherited {
        /// Keys added to the child, in insertion order; may be empty.
        keys: Vec<String>,
        /// Linked parents that did not resolve to a note.
        missing_parents: Vec<String>,
    },
}

/// Template outcome of `create_default_template`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOutcome {
    Created(String),
    AlreadyExists(String),
}

pub struct NoteService<'s, R: NoteRepository> {
    repo: R,
    settings: &'s KgSettings,
    clock: Clock,
}

impl<'s, R: NoteRepository> NoteService<'s, R> {
    pub fn new(repo: R, settings: &'s KgSettings) -> Self {
        Self {
            repo,
            settings,
            clock: system_clock,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Links the selection to a matching note, creating it when missing.
    ///
    /// With a selection, a new note is created next to the active note.
    /// Without one, an untitled note is created in the resolved folder.
    pub fn create_or_link(
        &mut self,
        kind: NoteKind,
        selection: Option<&str>,
        active_note_path: Option<&str>,
    ) -> Result<CreateOrLinkOutcome, ServiceError> {
        let settings = self.settings;
        let template_path = settings
            .template_path(kind)
            .ok_or(ServiceError::TemplateNotConfigured(kind))?;
        let selection = selection.map(str::trim).filter(|value| !value.is_empty());
        let now = (self.clock)();

        let Some(selection) = selection else {
            let template = self.repo.read_template(template_path)?;
            let title = untitled_note_title(kind, now);
            let folder = resolve_creation_folder(
                settings.new_note_location_mode,
                &settings.default_folder,
                active_note_path,
            );
            let content = self.render_template(&template, kind, None, &generate_uid(now));
            let note = self
                .repo
                .create_note(&join_note_path(&folder, &title), &content)?;
            info!(
                "event=note_create module=service status=ok kind={} selection=false",
                kind.as_str()
            );
            return Ok(CreateOrLinkOutcome {
                note,
                created: true,
                link_text: None,
            });
        };

        let title = sanitize_file_name(selection);
        if title.is_empty() {
            return Err(ServiceError::EmptyTitle(selection.to_string()));
        }

        let (note, created) = match self.repo.find_by_title_or_alias(&title)? {
            Some(existing) => (existing, false),
            None => {
                let template = self.repo.read_template(template_path)?;
                let folder = active_note_path.map_or("/", parent_folder);
                let content =
                    self.render_template(&template, kind, Some(&title), &generate_uid(now));
                let note = self
                    .repo
                    .create_note(&join_note_path(folder, &title), &content)?;
                (note, true)
            }
        };
        info!(
            "event=note_create module=service status=ok kind={} selection=true created={}",
            kind.as_str(),
            created
        );
        let link_text = wikilink(&note.title, Some(selection));
        Ok(CreateOrLinkOutcome {
            note,
            created,
            link_text: Some(link_text),
        })
    }

    /// Adds `tail-relation-head` to the aliases of a symmetric relation note.
    ///
    /// Only the `aliases` entry is rewritten; the rest of the note is kept
    /// as written.
    pub fn add_reverse_alias(&mut self, path: &str) -> Result<ReverseAliasOutcome, ServiceError> {
        let note = self.require_note(path)?;
        let Some(parts) = split_relation_title(&note.title) else {
            return Ok(ReverseAliasOutcome::NotRelationTitle);
        };
        let symmetric = self
            .settings
            .relation_types
            .by_name(parts.relation)
            .is_some_and(|relation| relation.symmetric);
        let Some(alias) = reverse_title(&note.title).filter(|_| symmetric) else {
            return Ok(ReverseAliasOutcome::NotSymmetric);
        };

        let frontmatter = read_note_frontmatter(&note)?;
        let mut aliases = yaml_edit::aliases(&frontmatter);
        if aliases.contains(&alias) {
            return Ok(ReverseAliasOutcome::AlreadyPresent(alias));
        }
        aliases.push(alias.clone());
        let entry = yaml_edit::render_list_entry(KEY_ALIASES, &aliases)
            .map_err(|source| frontmatter_error(&note, source))?;
        let content = yaml_edit::set_entry(&note.content, KEY_ALIASES, &entry);
        self.repo.modify_note(&note.path, &content)?;
        info!("event=reverse_alias module=service status=ok");
        Ok(ReverseAliasOutcome::Added(alias))
    }

    /// Copies frontmatter keys the note lacks from every linked parent.
    ///
    /// Later parents win when two parents share a key. In full mode the
    /// parent's entry is copied as written; in structure mode only the key.
    pub fn inherit_properties(&mut self, path: &str) -> Result<InheritOutcome, ServiceError> {
        let note = self.require_note(path)?;
        let parent_key = self.settings.parent_key();
        let frontmatter = read_note_frontmatter(&note)?;

        let links = match frontmatter.get(parent_key) {
            None => return Ok(InheritOutcome::NoParentKey),
            Some(value) => yaml_edit::link_texts(value),
        };
        if links.is_empty() {
            return Ok(InheritOutcome::NoParentKey);
        }
        let parent_names: Vec<String> = links
            .iter()
            .flat_map(|text| {
                let found = find_wikilinks(text);
                if found.is_empty() {
                    vec![text.clone()]
                } else {
                    found
                }
            })
            .filter_map(|link| parse_wikilink(&link))
            .collect();
        if parent_names.is_empty() {
            return Ok(InheritOutcome::NoParentLinks);
        }

        let mut inherited: Vec<(String, String)> = Vec::new();
        let mut missing_parents = Vec::new();
        for name in parent_names {
            let Some(parent) = self.repo.find_by_title_or_alias(&name)? else {
                warn!("event=inherit_properties module=service status=parent_missing");
                missing_parents.push(name);
                continue;
            };
            let parent_frontmatter = read_note_frontmatter(&parent)?;
            for key in yaml_edit::string_keys(&parent_frontmatter) {
                if frontmatter.contains_key(key) {
                    continue;
                }
                let entry = match self.settings.inheritance_mode {
                    InheritanceMode::Full => match yaml_edit::raw_entry(&parent.content, key) {
                        Some(raw) => Ok(raw),
                        None => yaml_edit::render_value_entry(
                            key,
                            parent_frontmatter.get(key).unwrap_or(&Value::Null),
                        ),
                    },
                    InheritanceMode::Structure => yaml_edit::render_empty_entry(key),
                }
                .map_err(|source| frontmatter_error(&parent, source))?;
                match inherited.iter_mut().find(|(current, _)| current == key) {
                    Some((_, current)) => *current = entry,
                    None => inherited.push((key.to_string(), entry)),
                }
            }
        }

        if !inherited.is_empty() {
            let content = inherited
                .iter()
                .fold(note.content.clone(), |content, (key, entry)| {
                    yaml_edit::set_entry(&content, key, entry)
                });
            self.repo.modify_note(&note.path, &content)?;
        }
        info!(
            "event=inherit_properties module=service status=ok inherited={} missing_parents={}",
            inherited.len(),
            missing_parents.len()
        );
        Ok(InheritOutcome::Inherited {
            keys: inherited.into_iter().map(|(key, _)| key).collect(),
            missing_parents,
        })
    }

    /// Writes the default template for `kind` unless one already exists.
    pub fn create_default_template(
        &mut self,
        kind: NoteKind,
    ) -> Result<TemplateOutcome, ServiceError> {
        let path = KgSettings::default_template_path(kind);
        let content = default_template_content(self.settings.parent_key());
        match self.repo.create_note(path, &content) {
            Ok(note) => {
                info!(
                    "event=template_create module=service status=ok kind={}",
                    kind.as_str()
                );
                Ok(TemplateOutcome::Created(note.path))
            }
            Err(RepoError::AlreadyExists(path)) => Ok(TemplateOutcome::AlreadyExists(path)),
            Err(err) => Err(err.into()),
        }
    }

    fn require_note(&self, path: &str) -> Result<NoteRecord, ServiceError> {
        self.repo
            .get_note(path)?
            .ok_or_else(|| ServiceError::NoteNotFound(path.to_string()))
    }

    fn render_template(
        &self,
        template: &str,
        kind: NoteKind,
        title: Option<&str>,
        uid: &str,
    ) -> String {
        build_frontmatter(
            template,
            &FrontmatterRequest {
                uid,
                kind,
                title,
                parent_key: self.settings.parent_key(),
            },
            &self.settings.relation_types,
        )
        .content
    }
}

fn read_note_frontmatter(note: &NoteRecord) -> Result<Mapping, ServiceError> {
    yaml_edit::read_frontmatter(&note.content).map_err(|source| frontmatter_error(note, source))
}

fn frontmatter_error(note: &NoteRecord, source: FrontmatterError) -> ServiceError {
    warn!("event=frontmatter_read module=service status=error error_code=invalid_frontmatter");
    ServiceError::Frontmatter {
        path: note.path.clone(),
        source,
    }
}
