use crate::infra::{parse_answer, ServedCatalog};
use clap::Args;
use crop_advisor::advisory::{
    AdvisoryConfig, AdvisoryError, AdvisoryService, Answers, CatalogSource, RankedRecommendation,
    StrictRecommendation,
};
use crop_advisor::config::AppConfig;
use crop_advisor::error::AppError;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Answers used by `demo`: a mid-altitude temperate farm with irrigation.
const DEMO_SCRIPT: [(&str, &str); 4] = [
    ("altitud", "1000-2500"),
    ("clima", "templado"),
    ("suelo", "franco"),
    ("riego", "si"),
];

#[derive(Args, Debug)]
pub(crate) struct QuestionsArgs {
    /// JSON or CSV rule catalog (defaults to APP_CATALOG_PATH, then the bundled demo)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Answer given so far, as factor=value (repeatable)
    #[arg(long = "answer", value_parser = parse_answer)]
    pub(crate) answers: Vec<(String, String)>,
    /// Only print the next question instead of the full plan
    #[arg(long)]
    pub(crate) next: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// JSON or CSV rule catalog (defaults to APP_CATALOG_PATH, then the bundled demo)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Answer to match against, as factor=value (repeatable)
    #[arg(long = "answer", value_parser = parse_answer)]
    pub(crate) answers: Vec<(String, String)>,
    /// Score partial matches instead of requiring every condition
    #[arg(long)]
    pub(crate) ranked: bool,
}

pub(crate) fn run_questions(args: QuestionsArgs) -> Result<(), AppError> {
    let QuestionsArgs {
        catalog,
        answers,
        next,
    } = args;

    let service = configured_service(catalog)?;
    let answers = Answers::from_pairs(answers);

    if next {
        print_json(&service.plan_next(&answers)?)
    } else {
        print_json(&service.plan_all(&answers)?)
    }
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let RecommendArgs {
        catalog,
        answers,
        ranked,
    } = args;

    let service = configured_service(catalog)?;
    let answers = Answers::from_pairs(answers);

    if ranked {
        print_json(&service.recommend_ranked(&answers)?)
    } else {
        print_json(&service.recommend_strict(&answers)?)
    }
}

pub(crate) fn run_demo() -> Result<(), AppError> {
    let catalog = ServedCatalog::resolve(None)?;
    let service = AdvisoryService::new(Arc::new(catalog), AdvisoryConfig::default());

    println!("Crop advisory demo (bundled catalog)");
    let (turns, answers) = scripted_walk(&service, &DEMO_SCRIPT)?;
    for (index, turn) in turns.iter().enumerate() {
        println!(
            "\n{}. {} ({} pending)",
            index + 1,
            turn.question,
            turn.pending
        );
        println!("   options: {}", turn.options.join(" | "));
        println!("   answer:  {}", turn.chosen);
    }

    render_strict(&service.recommend_strict(&answers)?);
    render_ranked(&service.recommend_ranked(&answers)?);
    Ok(())
}

/// One exchange of the adaptive questionnaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DemoTurn {
    pub(crate) question: String,
    pub(crate) options: Vec<String>,
    pub(crate) chosen: String,
    pub(crate) pending: usize,
}

/// Follow `plan_next` until nothing is left, answering from `script` when the
/// scripted value is offered and with the first option otherwise.
pub(crate) fn scripted_walk<C>(
    service: &AdvisoryService<C>,
    script: &[(&str, &str)],
) -> Result<(Vec<DemoTurn>, Answers), AdvisoryError>
where
    C: CatalogSource + 'static,
{
    let mut answers = Answers::new();
    let mut turns = Vec::new();

    loop {
        let step = service.plan_next(&answers)?;
        let Some(question) = step.question else {
            break;
        };

        let scripted = script
            .iter()
            .find(|(factor, _)| factor.eq_ignore_ascii_case(&question.id))
            .map(|(_, value)| value.to_lowercase())
            .filter(|value| question.options.iter().any(|option| &option.value == value));
        let Some(chosen) = scripted.or_else(|| {
            question
                .options
                .first()
                .map(|option| option.value.clone())
        }) else {
            break;
        };

        answers.insert(&question.id, &chosen);
        turns.push(DemoTurn {
            question: question.text,
            options: question
                .options
                .into_iter()
                .map(|option| option.label)
                .collect(),
            chosen,
            pending: step.pending_count,
        });
    }

    Ok((turns, answers))
}

fn configured_service(
    catalog: Option<PathBuf>,
) -> Result<AdvisoryService<ServedCatalog>, AppError> {
    let config = AppConfig::load()?;
    let path = catalog.or(config.catalog.path);
    let catalog = ServedCatalog::resolve(path.as_deref())?;
    Ok(AdvisoryService::new(Arc::new(catalog), config.advisory))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

fn render_strict(result: &StrictRecommendation) {
    println!("\nStrict recommendation ({} match)", result.count);
    for description in &result.recommendations {
        println!("- {description}");
    }
}

fn render_ranked(result: &RankedRecommendation) {
    println!("\nRanked recommendation");
    if let Some(message) = &result.message {
        println!("- {message}");
    }
    for entry in &result.recommendations {
        println!("- {:>3}% {}", entry.percentage, entry.description);
    }
}
