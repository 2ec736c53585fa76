//! Title suggestion and rename.
//!
//! # Responsibility
//! - Ask a `TitleSuggestionProvider` for a title that follows the note
//!   naming rules.
//! - Validate the provider's JSON answer and rename the note in place.
//!
//! # Invariants
//! - The note stays in its folder; only the basename changes.
//! - Nothing is renamed unless the caller accepts a title.

use super::ServiceError;
use crate::model::note::{join_note_path, NoteRecord};
use crate::model::relation::RelationTypeTable;
use crate::repo::NoteRepository;
use crate::synth::text::sanitize_file_name;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Prompt pair handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitlePrompt {
    pub system: String,
    pub user: String,
}

/// Answer expected from a provider, as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSuggestion {
    pub title: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Backend that produces a title suggestion.
///
/// Returns the raw JSON text `{"title": ..., "reasoning": ...}`.
pub trait TitleSuggestionProvider {
    fn suggest(&self, prompt: &TitlePrompt) -> Result<String, String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    Renamed {
        note: NoteRecord,
        suggestion: TitleSuggestion,
    },
    /// Caller rejected the suggestion.
    Declined(TitleSuggestion),
}

/// Builds the naming-rule prompt from the relation table.
pub fn build_title_prompt(content: &str, table: &RelationTypeTable) -> TitlePrompt {
    let relation_names: Vec<&str> = table
        .entries()
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    let system = format!(
        "你是一个知识管理专家，精通KG笔记法。你的任务是为用户提供的笔记内容生成一个符合规范的标题。\
规范如下: 1. 如果内容是关于单个核心概念，标题就是这个概念的名称。\
2. 如果内容是描述概念间的互动关系，标题必须遵循 \"概念A-关系类型-概念B\" 格式。\
3. 关系类型只能是：{}。\
4. 你的回答必须是一个 JSON 对象，格式为：{{\"title\": \"生成的标题\", \"reasoning\": \"你为什么这么命名的简单解释\"}}。\
5. 直接输出 JSON 对象，不要包含任何额外的解释或 markdown 格式。",
        relation_names.join("、")
    );
    TitlePrompt {
        system,
        user: format!("请为以下笔记内容生成标题：\n\n---\n\n{content}"),
    }
}

/// Parses and validates a provider answer.
pub fn parse_suggestion(raw: &str) -> Result<TitleSuggestion, ServiceError> {
    let trimmed = raw.trim();
    // Tolerate a fenced ```json block around the object.
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    let suggestion: TitleSuggestion = serde_json::from_str(body.trim())
        .map_err(|err| ServiceError::Suggestion(format!("invalid suggestion json: {err}")))?;
    if suggestion.title.trim().is_empty() {
        return Err(ServiceError::Suggestion("suggested title is empty".to_string()));
    }
    Ok(suggestion)
}

pub struct TitleService<'t, R: NoteRepository> {
    repo: R,
    table: &'t RelationTypeTable,
}

impl<'t, R: NoteRepository> TitleService<'t, R> {
    pub fn new(repo: R, table: &'t RelationTypeTable) -> Self {
        Self { repo, table }
    }

    /// Requests a title for the note at `path` and renames it when `accept`
    /// returns a final title.
    ///
    /// `accept` sees the suggestion and may return an edited title.
    pub fn suggest_and_rename<P, F>(
        &mut self,
        path: &str,
        provider: &P,
        accept: F,
    ) -> Result<TitleOutcome, ServiceError>
    where
        P: TitleSuggestionProvider + ?Sized,
        F: FnOnce(&TitleSuggestion) -> Option<String>,
    {
        let note = self
            .repo
            .get_note(path)?
            .ok_or_else(|| ServiceError::NoteNotFound(path.to_string()))?;
        if note.content.trim().is_empty() {
            return Err(ServiceError::Suggestion("note content is empty".to_string()));
        }

        let prompt = build_title_prompt(&note.content, self.table);
        let raw = provider.suggest(&prompt).map_err(|err| {
            warn!("event=title_suggest module=service status=error error_code=provider_failed");
            ServiceError::Suggestion(err)
        })?;
        let suggestion = parse_suggestion(&raw)?;

        let Some(final_title) = accept(&suggestion) else {
            return Ok(TitleOutcome::Declined(suggestion));
        };
        let title = sanitize_file_name(&final_title);
        if title.is_empty() {
            return Err(ServiceError::EmptyTitle(final_title));
        }

        let target = join_note_path(note.folder(), &title);
        let renamed = self.repo.rename_note(&note.path, &target)?;
        info!("event=title_rename module=service status=ok");
        Ok(TitleOutcome::Renamed {
            note: renamed,
            suggestion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{build_title_prompt, parse_suggestion};
    use crate::model::relation::RelationTypeTable;
    use crate::service::ServiceError;

    #[test]
    fn prompt_lists_relation_names_from_table() {
        let prompt = build_title_prompt("地球绕太阳公转。", &RelationTypeTable::default());
        assert!(prompt.system.contains("影响、对比、关联、应用"));
        assert!(prompt.system.contains("{\"title\""));
        assert!(prompt.user.ends_with("地球绕太阳公转。"));
    }

    #[test]
    fn parses_plain_and_fenced_json() {
        let plain = parse_suggestion(r#"{"title":"地球-影响-潮汐","reasoning":"描述作用"}"#)
            .expect("plain json");
        assert_eq!(plain.title, "地球-影响-潮汐");

        let fenced = parse_suggestion("```json\n{\"title\":\"月球\"}\n```").expect("fenced json");
        assert_eq!(fenced.title, "月球");
        assert!(fenced.reasoning.is_empty());
    }

    #[test]
    fn rejects_invalid_or_empty_titles() {
        assert!(matches!(
            parse_suggestion("not json"),
            Err(ServiceError::Suggestion(_))
        ));
        assert!(matches!(
            parse_suggestion(r#"{"title":"  ","reasoning":"x"}"#),
            Err(ServiceError::Suggestion(_))
        ));
    }
}
