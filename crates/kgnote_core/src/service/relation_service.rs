//! Quick-create relation note pipeline.
//!
//! # Responsibility
//! - Turn an accepted `Final` candidate into a relation note.
//! - Optionally create missing concept notes first.
//! - Link the new relation note back from every head and tail concept.
//!
//! # Invariants
//! - Phases run strictly in order: concepts, relation note, backlinks.
//! - A missing relation template aborts before anything is written.
//! - An existing relation note is returned as-is with an `AlreadyExists` notice.
//! - One failing backlink target never stops the remaining targets.

use super::{generate_uid, resolve_creation_folder, system_clock, Clock, ServiceError};
use crate::config::{KgSettings, LocationMode};
use crate::model::note::{join_note_path, NoteKind, NoteRecord};
use crate::model::relation::RelationType;
use crate::query::QueryError;
use crate::repo::{NoteRepository, RepoError};
use crate::suggest::candidate::Candidate;
use crate::synth::backlink::{insert_link_under_heading, LinkInsertion};
use crate::synth::frontmatter::{build_frontmatter, FrontmatterRequest, ReverseAlias};
use crate::synth::text::sanitize_file_name;
use log::{info, warn};
use std::time::Instant;

/// Relation triple accepted by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationNoteRequest {
    pub title: String,
    pub relation_name: String,
    pub head: Vec<String>,
    pub tail: Vec<String>,
}

impl RelationNoteRequest {
    /// Extracts the request from a `Final` candidate.
    pub fn from_candidate(candidate: &Candidate) -> Option<Self> {
        match candidate {
            Candidate::Final {
                synthesized_title,
                relation_name,
                head,
                tail,
            } => Some(Self {
                title: synthesized_title.clone(),
                relation_name: relation_name.clone(),
                head: head.clone(),
                tail: tail.clone(),
            }),
            _ => None,
        }
    }
}

/// Concept side a backlink target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptSide {
    Head,
    Tail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacklinkStatus {
    /// Inserted under the configured section heading.
    Inserted,
    /// Heading missing in the target; appended at the end.
    AppendedAtEnd,
    AlreadyLinked,
    /// No concept note with this title or alias.
    TargetMissing,
    /// Store write failed; message is the store error.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkResult {
    pub concept: String,
    pub side: ConceptSide,
    pub status: BacklinkStatus,
}

/// Non-fatal conditions met while running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineNotice {
    /// Concept auto-creation skipped: template path blank or missing.
    ConceptTemplateUnavailable(String),
    ConceptCreateFailed { concept: String, error: String },
    /// Relation note path was already taken; the existing note is returned.
    AlreadyExists(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationNoteReport {
    pub note: NoteRecord,
    /// `[[title]]`, the text that replaces the trigger span.
    pub link_text: String,
    /// False when an existing note was returned.
    pub created: bool,
    pub created_concepts: Vec<String>,
    pub reverse_alias: ReverseAlias,
    pub backlinks: Vec<BacklinkResult>,
    pub notices: Vec<PipelineNotice>,
}

impl RelationNoteReport {
    pub fn failed_backlinks(&self) -> usize {
        self.backlinks
            .iter()
            .filter(|result| matches!(result.status, BacklinkStatus::Failed(_)))
            .count()
    }
}

/// Relation note pipeline over a note store.
pub struct RelationNoteService<'s, R: NoteRepository> {
    repo: R,
    settings: &'s KgSettings,
    clock: Clock,
}

impl<'s, R: NoteRepository> RelationNoteService<'s, R> {
    pub fn new(repo: R, settings: &'s KgSettings) -> Self {
        Self {
            repo,
            settings,
            clock: system_clock,
        }
    }

    /// Replaces the time source used for uids.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the three-phase pipeline for an accepted relation triple.
    ///
    /// # Errors
    /// - `TemplateNotConfigured`/`Repo(TemplateNotFound)` for the relation
    ///   template; nothing is created in that case.
    /// - `InvalidQuery` when the relation name is not in the table.
    /// - `EmptyTitle` when the title sanitizes to nothing.
    /// - `Repo` when creating the relation note fails for another reason.
    pub fn create_from_final(
        &mut self,
        request: &RelationNoteRequest,
        active_note_path: Option<&str>,
    ) -> Result<RelationNoteReport, ServiceError> {
        let started_at = Instant::now();
        let settings = self.settings;

        let title = sanitize_file_name(&request.title);
        if title.is_empty() {
            return Err(ServiceError::EmptyTitle(request.title.clone()));
        }
        let relation = settings
            .relation_types
            .by_name(&request.relation_name)
            .ok_or_else(|| {
                QueryError::invalid(
                    request.relation_name.as_str(),
                    format!("unknown relation name `{}`", request.relation_name),
                )
            })?;

        let relation_template_path = settings
            .template_path(NoteKind::Relation)
            .ok_or(ServiceError::TemplateNotConfigured(NoteKind::Relation))?;
        let relation_template = self.repo.read_template(relation_template_path)?;

        let mut notices = Vec::new();
        let created_concepts = if settings.auto_create_concepts {
            self.create_missing_concepts(request, &mut notices)
        } else {
            Vec::new()
        };

        let folder = resolve_creation_folder(
            settings.new_note_location_mode,
            &settings.default_folder,
            active_note_path,
        );
        let path = join_note_path(&folder, &title);
        let outcome = build_frontmatter(
            &relation_template,
            &FrontmatterRequest {
                uid: &generate_uid((self.clock)()),
                kind: NoteKind::Relation,
                title: Some(&title),
                parent_key: settings.parent_key(),
            },
            &settings.relation_types,
        );

        let (note, created, reverse_alias) =
            match self.repo.create_note(&path, &outcome.content) {
                Ok(note) => (note, true, outcome.reverse_alias),
                Err(RepoError::AlreadyExists(existing_path)) => {
                    warn!("event=relation_create module=service status=exists");
                    let note = self
                        .repo
                        .get_note(&existing_path)?
                        .ok_or_else(|| ServiceError::NoteNotFound(existing_path.clone()))?;
                    notices.push(PipelineNotice::AlreadyExists(existing_path));
                    (note, false, ReverseAlias::NotApplicable)
                }
                Err(err) => return Err(err.into()),
            };

        let link_text = note.link_text();
        let backlinks = self.insert_backlinks(request, relation, &link_text);

        let report = RelationNoteReport {
            note,
            link_text,
            created,
            created_concepts,
            reverse_alias,
            backlinks,
            notices,
        };
        info!(
            "event=relation_create module=service status=ok created={} concepts_created={} backlinks={} backlinks_failed={} duration_ms={}",
            report.created,
            report.created_concepts.len(),
            report.backlinks.len(),
            report.failed_backlinks(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn create_missing_concepts(
        &mut self,
        request: &RelationNoteRequest,
        notices: &mut Vec<PipelineNotice>,
    ) -> Vec<String> {
        let settings = self.settings;
        let Some(template_path) = settings.template_path(NoteKind::Concept) else {
            notices.push(PipelineNotice::ConceptTemplateUnavailable(String::new()));
            return Vec::new();
        };
        let template = match self.repo.read_template(template_path) {
            Ok(template) => template,
            Err(err) => {
                warn!(
                    "event=concept_autocreate module=service status=skipped error_code={}",
                    err.code()
                );
                notices.push(PipelineNotice::ConceptTemplateUnavailable(
                    template_path.to_string(),
                ));
                return Vec::new();
            }
        };

        let folder = resolve_creation_folder(LocationMode::Fixed, &settings.default_folder, None);
        let mut created = Vec::new();
        for concept in request.head.iter().chain(request.tail.iter()) {
            let name = sanitize_file_name(concept);
            if name.is_empty() || created.contains(&name) {
                continue;
            }
            match self.repo.find_by_title_or_alias(&name) {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(err) => {
                    notices.push(PipelineNotice::ConceptCreateFailed {
                        concept: name,
                        error: err.to_string(),
                    });
                    continue;
                }
            }

            let outcome = build_frontmatter(
                &template,
                &FrontmatterRequest {
                    uid: &generate_uid((self.clock)()),
                    kind: NoteKind::Concept,
                    title: Some(&name),
                    parent_key: settings.parent_key(),
                },
                &settings.relation_types,
            );
            match self
                .repo
                .create_note(&join_note_path(&folder, &name), &outcome.content)
            {
                Ok(_) => created.push(name),
                Err(RepoError::AlreadyExists(_)) => {}
                Err(err) => {
                    warn!(
                        "event=concept_autocreate module=service status=error error_code={}",
                        err.code()
                    );
                    notices.push(PipelineNotice::ConceptCreateFailed {
                        concept: name,
                        error: err.to_string(),
                    });
                }
            }
        }
        created
    }

    fn insert_backlinks(
        &mut self,
        request: &RelationNoteRequest,
        relation: &RelationType,
        link_text: &str,
    ) -> Vec<BacklinkResult> {
        let targets = request
            .head
            .iter()
            .map(|concept| (concept, ConceptSide::Head, relation.head_heading.as_str()))
            .chain(
                request
                    .tail
                    .iter()
                    .map(|concept| (concept, ConceptSide::Tail, relation.tail_heading.as_str())),
            );

        let mut results = Vec::new();
        for (concept, side, heading) in targets {
            let status = self.insert_backlink(concept, heading, link_text);
            results.push(BacklinkResult {
                concept: concept.clone(),
                side,
                status,
            });
        }
        results
    }

    fn insert_backlink(&mut self, concept: &str, heading: &str, link_text: &str) -> BacklinkStatus {
        let name = sanitize_file_name(concept);
        let target = match self.repo.find_by_title_or_alias(&name) {
            Ok(Some(target)) => target,
            Ok(None) => return BacklinkStatus::TargetMissing,
            Err(err) => return backlink_failed(err),
        };

        let insertion = insert_link_under_heading(&target.content, heading, link_text);
        let status = match &insertion {
            LinkInsertion::AlreadyLinked => return BacklinkStatus::AlreadyLinked,
            LinkInsertion::UnderHeading(_) => BacklinkStatus::Inserted,
            LinkInsertion::AppendedAtEnd(_) => BacklinkStatus::AppendedAtEnd,
        };
        let Some(content) = insertion.content() else {
            return BacklinkStatus::AlreadyLinked;
        };
        match self.repo.modify_note(&target.path, content) {
            Ok(()) => status,
            Err(err) => backlink_failed(err),
        }
    }
}

fn backlink_failed(err: RepoError) -> BacklinkStatus {
    warn!(
        "event=backlink_insert module=service status=error error_code={}",
        err.code()
    );
    BacklinkStatus::Failed(err.to_string())
}
