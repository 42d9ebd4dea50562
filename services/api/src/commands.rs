use crate::cli::StoreArgs;
use crate::infra::{open_profile_store, storage_config};
use clap::{ArgGroup, Args};
use doc_scoring::config::StorageConfig;
use doc_scoring::error::AppError;
use doc_scoring::scoring::{
    DocumentSnapshot, ProfileId, RuleImporter, ScoreOutcome, ScoringProfile,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Document snapshot as JSON (text, fields, uploadedAt, documentType, ...)
    #[arg(long)]
    pub(crate) document: PathBuf,
    /// Profile to score with (defaults to the active profile)
    #[arg(long)]
    pub(crate) profile: Option<String>,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["csv", "json"])))]
pub(crate) struct ImportArgs {
    /// CSV export with Profile,Field Name,Condition,Answer,Points headers
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// JSON templates: [{ "name", "rules": [...] }]
    #[arg(long)]
    pub(crate) json: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let storage = storage_config(&args.store)?;
    let (profile_name, outcome) = score_document(&storage, &args)?;
    render_outcome(&profile_name, &outcome);
    Ok(())
}

/// Scores the document file and returns the scoring profile's name with the outcome.
pub(crate) fn score_document(
    storage: &StorageConfig,
    args: &ScoreArgs,
) -> Result<(String, ScoreOutcome), AppError> {
    let reader = BufReader::new(File::open(&args.document)?);
    let document: DocumentSnapshot = serde_json::from_reader(reader)?;

    let store = open_profile_store(storage);
    let profile_id = args.profile.clone().map(ProfileId);
    let outcome = store.score(profile_id.as_ref(), &document)?;
    let profile_name = store
        .profile(&outcome.profile_id)
        .map(|profile| profile.name.clone())
        .unwrap_or_default();
    Ok((profile_name, outcome))
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let storage = storage_config(&args.store)?;
    let profiles = import_rules(&storage, &args)?;

    println!(
        "Imported {} scoring profile(s) into {}",
        profiles.len(),
        storage.directory.display()
    );
    for (index, profile) in profiles.iter().enumerate() {
        let marker = if index == 0 { "*" } else { " " };
        println!(
            "{} {} ({}) - {} criteria, {} points available",
            marker,
            profile.name,
            profile.id,
            profile.criteria.len(),
            profile.max_possible_points()
        );
    }
    Ok(())
}

pub(crate) fn import_rules(
    storage: &StorageConfig,
    args: &ImportArgs,
) -> Result<Vec<ScoringProfile>, AppError> {
    let templates = match (&args.csv, &args.json) {
        (Some(path), _) => RuleImporter::from_path(path)?,
        (None, Some(path)) => RuleImporter::from_json(BufReader::new(File::open(path)?))?,
        (None, None) => Vec::new(),
    };

    let mut store = open_profile_store(storage);
    Ok(store.import_rules(&templates)?)
}

pub(crate) fn run_profiles(args: StoreArgs) -> Result<(), AppError> {
    let storage = storage_config(&args)?;
    let store = open_profile_store(&storage);

    println!("Scoring profiles ({})", storage.directory.display());
    for profile in store.profiles() {
        let marker = if &profile.id == store.active_profile_id() {
            "*"
        } else {
            " "
        };
        println!(
            "{} {} ({}) - {} criteria, {} points available",
            marker,
            profile.name,
            profile.id,
            profile.criteria.len(),
            profile.max_possible_points()
        );
        for criterion in &profile.criteria {
            println!(
                "    - {} [{} | {} pts | {} filter(s)]",
                criterion.name,
                criterion.match_condition.label(),
                criterion.points.value(),
                criterion.filters.len()
            );
        }
    }
    Ok(())
}

fn render_outcome(profile_name: &str, outcome: &ScoreOutcome) {
    println!("Profile: {} ({})", profile_name, outcome.profile_id);
    println!(
        "Score: {}/{} ({:.2}%)",
        outcome.total_score,
        outcome.max_possible_score,
        outcome.percentage()
    );
    for entry in &outcome.breakdown {
        let mark = if entry.awarded { "x" } else { " " };
        println!("  [{}] {} ({} pts)", mark, entry.name, entry.points);
        for trace in &entry.filters {
            let result = if trace.matched { "match" } else { "no match" };
            println!("      - {}: {}", trace.description, result);
        }
    }
}
