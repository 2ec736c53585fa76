//! Command-line front end for kgnote core.
//!
//! # Responsibility
//! - Exercise the quick-create flow and note commands against a local
//!   SQLite note store without the Flutter host.
//! - Keep output deterministic for quick local sanity checks.

use clap::{Parser, Subcommand, ValueEnum};
use kgnote_core::db::open_db;
use kgnote_core::suggest::candidate::final_candidate;
use kgnote_core::{
    generate_candidates, InheritOutcome, KgSettings, NoteKind, NoteRepository, NoteService,
    RelationNoteRequest, RelationNoteService, RelationQuery, ReverseAliasOutcome,
    SqliteNoteRepository, TemplateOutcome,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kgnote")]
#[command(version, about = "Knowledge-graph note assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite note store
    #[arg(long, global = true, default_value = "kgnote.sqlite3")]
    db: PathBuf,

    /// Settings JSON file; defaults apply when omitted
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Concept,
    Relation,
}

impl From<KindArg> for NoteKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Concept => NoteKind::Concept,
            KindArg::Relation => NoteKind::Relation,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print core ping and version
    Ping,

    /// List quick-create candidates for a query (text after `@@`)
    Suggest { query: String },

    /// Create the relation note for a complete query, e.g. `i；地球；太阳`
    Create {
        query: String,
        /// Path of the note the query was typed in
        #[arg(long)]
        active: Option<String>,
    },

    /// Create a note from a selection, or an untitled note
    Link {
        #[arg(value_enum)]
        kind: KindArg,
        selection: Option<String>,
        #[arg(long)]
        active: Option<String>,
    },

    /// Add the reverse alias to a symmetric relation note
    Alias { path: String },

    /// Copy missing properties from the note's parents
    Inherit { path: String },

    /// Write the default template for a note kind
    Template {
        #[arg(value_enum)]
        kind: KindArg,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Commands::Ping = cli.command {
        println!("kgnote_core ping={}", kgnote_core::ping());
        println!("kgnote_core version={}", kgnote_core::core_version());
        return Ok(());
    }

    let settings = match cli.settings.as_ref() {
        Some(path) => KgSettings::load(path)?,
        None => KgSettings::default(),
    };
    let mut conn = open_db(&cli.db)?;
    let mut repo = SqliteNoteRepository::new(&mut conn);

    match cli.command {
        Commands::Ping => {}
        Commands::Suggest { query } => {
            let query = RelationQuery::parse(query);
            let titles = repo.list_titles()?;
            for candidate in generate_candidates(&query, &titles, &settings.relation_types) {
                println!("{}", candidate.label());
            }
        }
        Commands::Create { query, active } => {
            let query = RelationQuery::parse(query);
            let candidate = final_candidate(&query, &settings.relation_types)
                .ok_or("query is not a complete relation")?;
            let request =
                RelationNoteRequest::from_candidate(&candidate).ok_or("not a final candidate")?;
            let report = RelationNoteService::new(&mut repo, &settings)
                .create_from_final(&request, active.as_deref())?;
            println!("{} path={}", report.link_text, report.note.path);
            println!("created={}", report.created);
            for concept in &report.created_concepts {
                println!("concept_created={concept}");
            }
            for backlink in &report.backlinks {
                println!("backlink {} {:?}", backlink.concept, backlink.status);
            }
            for notice in &report.notices {
                println!("notice {notice:?}");
            }
        }
        Commands::Link {
            kind,
            selection,
            active,
        } => {
            let outcome = NoteService::new(&mut repo, &settings).create_or_link(
                kind.into(),
                selection.as_deref(),
                active.as_deref(),
            )?;
            println!("path={} created={}", outcome.note.path, outcome.created);
            if let Some(link) = outcome.link_text {
                println!("{link}");
            }
        }
        Commands::Alias { path } => {
            match NoteService::new(&mut repo, &settings).add_reverse_alias(&path)? {
                ReverseAliasOutcome::Added(alias) => println!("added alias {alias}"),
                ReverseAliasOutcome::AlreadyPresent(alias) => {
                    println!("alias already present: {alias}")
                }
                ReverseAliasOutcome::NotSymmetric => println!("relation is not symmetric"),
                ReverseAliasOutcome::NotRelationTitle => println!("not a relation title"),
            }
        }
        Commands::Inherit { path } => {
            match NoteService::new(&mut repo, &settings).inherit_properties(&path)? {
                InheritOutcome::NoParentKey => {
                    println!("no `{}` property", settings.parent_key())
                }
                InheritOutcome::NoParentLinks => println!("no parent links"),
                InheritOutcome::Inherited {
                    keys,
                    missing_parents,
                } => {
                    println!("inherited {} propert(ies)", keys.len());
                    for parent in missing_parents {
                        println!("missing parent {parent}");
                    }
                }
            }
        }
        Commands::Template { kind } => {
            match NoteService::new(&mut repo, &settings).create_default_template(kind.into())? {
                TemplateOutcome::Created(path) => println!("created {path}"),
                TemplateOutcome::AlreadyExists(path) => println!("already exists {path}"),
            }
        }
    }
    Ok(())
}
