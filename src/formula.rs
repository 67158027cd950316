use crate::types::model::{
    Criterion, CriterionValue, CriterionValues, FormulaVersion, Parameter, Relevance, Score,
    ScoreValues,
};

const V1_CRITERIA: [Criterion; 4] = [
    Criterion::Complete,
    Criterion::Topical,
    Criterion::Accessible,
    Criterion::Hypertext,
];

impl FormulaVersion {
    pub fn criteria(self) -> &'static [Criterion] {
        match self {
            // v1 never scored document or image, even when flagged relevant.
            Self::V1 => &V1_CRITERIA,
            Self::V8 => &Criterion::ALL,
        }
    }
}

/// Fraction of the score retained for one criterion value.
pub fn retained(criterion: Criterion, value: CriterionValue) -> f64 {
    let CriterionValue::Value(value) = value else {
        return 1.0;
    };
    match (criterion, value) {
        (Criterion::Complete, 1) => 0.2,
        (Criterion::Complete, 2) => 0.5,
        (Criterion::Topical, 1) => 0.7,
        (Criterion::Topical, 2) => 0.85,
        (Criterion::Accessible, 1) => 0.9,
        (Criterion::Accessible, 2) => 0.95,
        (Criterion::Hypertext, 0) => 0.2,
        (Criterion::Document, 0) => 0.85,
        (Criterion::Image, 0) => 0.95,
        _ => 1.0,
    }
}

pub fn evaluate(
    found: bool,
    criteria: &CriterionValues,
    relevance: &Relevance,
    version: FormulaVersion,
) -> f64 {
    if !found {
        return 0.0;
    }
    let product: f64 = version
        .criteria()
        .iter()
        .filter(|criterion| relevance.is_relevant(**criterion))
        .map(|criterion| retained(*criterion, criteria.get(*criterion)))
        .product();
    100.0 * product
}

pub fn evaluate_values(values: &ScoreValues, parameter: &Parameter, version: FormulaVersion) -> f64 {
    evaluate(values.found, &values.criteria, &parameter.relevance, version)
}

pub fn score_openness(score: &Score, parameter: &Parameter, version: FormulaVersion) -> f64 {
    evaluate_values(&score.values, parameter, version)
}

/// Evaluates many rows at once; each result equals [`score_openness`] on that row.
pub fn evaluate_bulk<'a, I>(rows: I, version: FormulaVersion) -> Vec<f64>
where
    I: IntoIterator<Item = (&'a Score, &'a Parameter)>,
{
    rows.into_iter()
        .map(|(score, parameter)| score_openness(score, parameter, version))
        .collect()
}

/// `found` with every relevant, recognized criterion at its maximum choice.
pub fn is_max(values: &ScoreValues, relevance: &Relevance, version: FormulaVersion) -> bool {
    values.found
        && version
            .criteria()
            .iter()
            .filter(|criterion| relevance.is_relevant(**criterion))
            .all(|criterion| values.criteria.get(*criterion).is_max_for(*criterion))
}
