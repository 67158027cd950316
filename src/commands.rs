use crate::aggregate::{ParameterSubset, TaskAggregator};
use crate::cli::{
    CheckCommand, CostsCommand, RankCommand, RateCommand, ReportFormat, ScoreCommand, Subset,
    SubsetArgs, TableCommand,
};
use crate::config;
use crate::cost::RecommendationCostEngine;
use crate::dataset;
use crate::error::{OpennessError, Result};
use crate::exit_code;
use crate::ranking::MonitoringRanker;
use crate::report::{self, OutputFormat};
use crate::revision::{MemoryStore, RevisionManager, WritePolicy};
use crate::score_table::score_table;
use crate::types::config::OpennessConfig;
use crate::types::model::{Criterion, CriterionValue, Monitoring, Revision, ScoreValues};
use crate::types::report::{Report, TaskRating};
use crate::validation::{self, ValidationPolicy};
use std::path::Path;
use tracing::warn;

struct Loaded {
    monitoring: Monitoring,
    config: OpennessConfig,
    has_config: bool,
}

fn load(path: &Path) -> Result<Loaded> {
    let monitoring = dataset::load(path)?;
    let root = dataset::root_of(path);
    let loaded = config::load_config(&root)?;
    if loaded.is_none() {
        eprintln!("warning: no openness.toml found in {}", root.display());
    }
    Ok(Loaded {
        monitoring,
        has_config: loaded.is_some(),
        config: loaded.unwrap_or_default(),
    })
}

fn subset_of(args: &SubsetArgs) -> (ParameterSubset, String) {
    if !args.parameters.is_empty() {
        let codes = args.parameters.iter().copied().collect();
        let label = args
            .parameters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        return (ParameterSubset::Explicit(codes), label);
    }
    match args.subset {
        Subset::All => (ParameterSubset::All, "all".to_string()),
        Subset::Npa => (ParameterSubset::Npa, "npa".to_string()),
        Subset::NonNpa => (ParameterSubset::NonNpa, "non-npa".to_string()),
    }
}

fn output_format(requested: Option<ReportFormat>, config: &OpennessConfig) -> OutputFormat {
    match requested {
        Some(ReportFormat::Json) => OutputFormat::Json,
        Some(ReportFormat::Md) => OutputFormat::Md,
        None => match config.default_format() {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Md,
        },
    }
}

fn print(report: &Report, format: OutputFormat, config: &OpennessConfig) -> Result<()> {
    let rendered = report::render(report, format, config.precision())?;
    println!("{rendered}");
    Ok(())
}

pub fn rate(cmd: &RateCommand) -> Result<i32> {
    let loaded = load(&cmd.dataset)?;
    let aggregator = TaskAggregator::new(&loaded.monitoring);
    let (subset, label) = subset_of(&cmd.subset);

    let tasks = match cmd.task {
        Some(id) => vec![aggregator.task(id)?],
        None => loaded.monitoring.tasks.iter().collect(),
    };
    let rows = tasks
        .into_iter()
        .map(|task| {
            let openness = aggregator.openness(task, &subset);
            let openness_initial = aggregator.openness_initial(task, &subset);
            TaskRating {
                task: task.id,
                organization: task.organization,
                openness,
                openness_initial,
                delta: openness.zip(openness_initial).map(|(now, then)| now - then),
                completeness: aggregator.completeness(task),
            }
        })
        .collect();

    let report = Report::Ratings {
        cycle: loaded.config.cycle_label(&loaded.monitoring.name),
        subset: label,
        rows,
    };
    print(&report, output_format(cmd.format, &loaded.config), &loaded.config)?;
    Ok(exit_code::SUCCESS)
}

pub fn rank(cmd: &RankCommand) -> Result<i32> {
    let loaded = load(&cmd.dataset)?;
    let aggregator = TaskAggregator::new(&loaded.monitoring);
    let (subset, label) = subset_of(&cmd.subset);
    let eligible = loaded.config.eligible_statuses();

    let ranking =
        MonitoringRanker::new(&aggregator).rank(&subset, |task| eligible.contains(&task.status));
    let report = Report::Ranking {
        cycle: loaded.config.cycle_label(&loaded.monitoring.name),
        subset: label,
        ranking,
    };
    print(&report, output_format(cmd.format, &loaded.config), &loaded.config)?;
    Ok(exit_code::SUCCESS)
}

pub fn costs(cmd: &CostsCommand) -> Result<i32> {
    let loaded = load(&cmd.dataset)?;
    let aggregator = TaskAggregator::new(&loaded.monitoring);
    let costs = RecommendationCostEngine::new(&aggregator).report(cmd.task)?;

    let report = Report::Costs {
        cycle: loaded.config.cycle_label(&loaded.monitoring.name),
        costs,
    };
    print(&report, output_format(cmd.format, &loaded.config), &loaded.config)?;
    Ok(exit_code::SUCCESS)
}

pub fn table(cmd: &TableCommand) -> Result<i32> {
    let loaded = load(&cmd.dataset)?;
    let aggregator = TaskAggregator::new(&loaded.monitoring);
    let table = score_table(&aggregator, cmd.task)?;

    let report = Report::ScoreTable {
        cycle: loaded.config.cycle_label(&loaded.monitoring.name),
        table,
    };
    print(&report, output_format(cmd.format, &loaded.config), &loaded.config)?;
    Ok(exit_code::SUCCESS)
}

fn validation_policy(monitoring: &Monitoring, config: &OpennessConfig) -> ValidationPolicy {
    ValidationPolicy {
        version: monitoring.formula,
        require_recommendation: config.require_recommendation(),
        no_interaction: monitoring.no_interaction,
    }
}

/// Values for a write: the stored FINAL values overlaid with the given flags.
fn requested_values(cmd: &ScoreCommand, stored: Option<&ScoreValues>) -> ScoreValues {
    let mut values = stored.cloned().unwrap_or_default();
    values.found = cmd.found == 1;
    for (criterion, value) in [
        (Criterion::Complete, cmd.complete),
        (Criterion::Topical, cmd.topical),
        (Criterion::Accessible, cmd.accessible),
        (Criterion::Hypertext, cmd.hypertext),
        (Criterion::Document, cmd.document),
        (Criterion::Image, cmd.image),
    ] {
        if let Some(value) = value {
            values.criteria.set(criterion, CriterionValue::Value(value));
        }
    }
    if let Some(recommendation) = &cmd.recommendation {
        values.recommendation = recommendation.clone();
    }
    if let Some(links) = &cmd.links {
        values.links = links.clone();
    }
    if let Some(accomplished) = cmd.accomplished {
        values.accomplished = accomplished;
    }
    values
}

pub fn score(cmd: &ScoreCommand) -> Result<i32> {
    let Loaded {
        mut monitoring,
        config,
        ..
    } = load(&cmd.dataset)?;
    if monitoring.task(cmd.task).is_none() {
        return Err(OpennessError::UnknownTask(cmd.task));
    }
    let parameter = monitoring
        .parameter(cmd.parameter)
        .cloned()
        .ok_or(OpennessError::UnknownParameter(cmd.parameter))?;

    let stored = monitoring
        .scores
        .iter()
        .find(|score| {
            score.task == cmd.task
                && score.parameter == cmd.parameter
                && score.revision == Revision::Final
        })
        .map(|score| score.values.clone());
    let values = requested_values(cmd, stored.as_ref());
    let policy = WritePolicy {
        phase: monitoring.phase,
        validation: validation_policy(&monitoring, &config),
    };

    let mut store = MemoryStore::from_scores(std::mem::take(&mut monitoring.scores))?;
    let outcome = RevisionManager::new(&mut store).on_score_write(cmd.task, &parameter, values, &policy);
    monitoring.scores = store.into_scores();
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(OpennessError::Validation(issues)) => {
            for issue in &issues {
                eprintln!("[BLOCKING] task {} parameter {}: {}", cmd.task, cmd.parameter, issue);
            }
            return Ok(exit_code::BLOCKING);
        }
        Err(other) => return Err(other),
    };

    let manifest = dataset::save(&cmd.dataset, &monitoring)?;
    println!(
        "score saved: task {} parameter {}",
        outcome.final_row.task, outcome.final_row.parameter
    );
    if outcome.interim_row.is_some() {
        println!("interim snapshot created");
    }
    if let Some(path) = manifest {
        println!("rollback manifest: {}", path.display());
    }
    Ok(exit_code::SUCCESS)
}

pub fn check(cmd: &CheckCommand) -> Result<i32> {
    let loaded = load(&cmd.dataset)?;
    let policy = validation_policy(&loaded.monitoring, &loaded.config);

    let mut findings = 0usize;
    for score in &loaded.monitoring.scores {
        if score.revision != Revision::Final {
            continue;
        }
        let Some(parameter) = loaded.monitoring.parameter(score.parameter) else {
            continue;
        };
        for issue in validation::validate_score(&score.values, None, parameter, &policy) {
            findings += 1;
            warn!(task = score.task, parameter = score.parameter, %issue, "stored score fails validation");
            println!("[WARN] task {} parameter {}: {}", score.task, score.parameter, issue);
        }
    }

    if findings == 0 {
        println!("check: no findings");
    }
    if findings > 0 || !loaded.has_config {
        Ok(exit_code::WARNINGS)
    } else {
        Ok(exit_code::SUCCESS)
    }
}
