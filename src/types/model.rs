use crate::error::OpennessError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

pub type TaskId = u64;
pub type OrganizationId = u64;
pub type ParameterCode = u32;
pub type QuestionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Complete,
    Topical,
    Accessible,
    Hypertext,
    Document,
    Image,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Self::Complete,
        Self::Topical,
        Self::Accessible,
        Self::Hypertext,
        Self::Document,
        Self::Image,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Topical => "topical",
            Self::Accessible => "accessible",
            Self::Hypertext => "hypertext",
            Self::Document => "document",
            Self::Image => "image",
        }
    }

    /// Three-level criteria are graded 1..=3, the rest are binary 0/1.
    pub fn is_graded(self) -> bool {
        matches!(self, Self::Complete | Self::Topical | Self::Accessible)
    }

    pub fn min_value(self) -> u8 {
        if self.is_graded() {
            1
        } else {
            0
        }
    }

    pub fn max_value(self) -> u8 {
        if self.is_graded() {
            3
        } else {
            1
        }
    }

    pub fn accepts(self, value: u8) -> bool {
        (self.min_value()..=self.max_value()).contains(&value)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored value of one optional criterion on a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CriterionValue {
    NotApplicable,
    #[default]
    Unevaluated,
    Value(u8),
}

impl CriterionValue {
    pub fn value(self) -> Option<u8> {
        match self {
            Self::Value(value) => Some(value),
            Self::NotApplicable | Self::Unevaluated => None,
        }
    }

    pub fn is_max_for(self, criterion: Criterion) -> bool {
        self.value() == Some(criterion.max_value())
    }
}

impl fmt::Display for CriterionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("n/a"),
            Self::Unevaluated => f.write_str("-"),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

const NOT_APPLICABLE_MARKER: &str = "n/a";

impl Serialize for CriterionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotApplicable => serializer.serialize_str(NOT_APPLICABLE_MARKER),
            Self::Unevaluated => serializer.serialize_none(),
            Self::Value(value) => serializer.serialize_u8(*value),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCriterionValue {
    Grade(u8),
    Marker(String),
}

impl<'de> Deserialize<'de> for CriterionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawCriterionValue>::deserialize(deserializer)? {
            None => Ok(Self::Unevaluated),
            Some(RawCriterionValue::Grade(value)) => Ok(Self::Value(value)),
            Some(RawCriterionValue::Marker(marker)) if marker == NOT_APPLICABLE_MARKER => {
                Ok(Self::NotApplicable)
            }
            Some(RawCriterionValue::Marker(marker)) => Err(serde::de::Error::custom(format!(
                "unsupported criterion marker: {marker}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CriterionValues {
    #[serde(default)]
    pub complete: CriterionValue,
    #[serde(default)]
    pub topical: CriterionValue,
    #[serde(default)]
    pub accessible: CriterionValue,
    #[serde(default)]
    pub hypertext: CriterionValue,
    #[serde(default)]
    pub document: CriterionValue,
    #[serde(default)]
    pub image: CriterionValue,
}

impl CriterionValues {
    pub fn get(&self, criterion: Criterion) -> CriterionValue {
        match criterion {
            Criterion::Complete => self.complete,
            Criterion::Topical => self.topical,
            Criterion::Accessible => self.accessible,
            Criterion::Hypertext => self.hypertext,
            Criterion::Document => self.document,
            Criterion::Image => self.image,
        }
    }

    pub fn set(&mut self, criterion: Criterion, value: CriterionValue) {
        let slot = match criterion {
            Criterion::Complete => &mut self.complete,
            Criterion::Topical => &mut self.topical,
            Criterion::Accessible => &mut self.accessible,
            Criterion::Hypertext => &mut self.hypertext,
            Criterion::Document => &mut self.document,
            Criterion::Image => &mut self.image,
        };
        *slot = value;
    }
}

#[cfg(test)]
impl CriterionValues {
    pub fn with(mut self, criterion: Criterion, value: CriterionValue) -> Self {
        self.set(criterion, value);
        self
    }
}

fn relevant_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relevance {
    #[serde(default = "relevant_by_default")]
    pub complete: bool,
    #[serde(default = "relevant_by_default")]
    pub topical: bool,
    #[serde(default = "relevant_by_default")]
    pub accessible: bool,
    #[serde(default = "relevant_by_default")]
    pub hypertext: bool,
    #[serde(default = "relevant_by_default")]
    pub document: bool,
    #[serde(default = "relevant_by_default")]
    pub image: bool,
}

impl Default for Relevance {
    fn default() -> Self {
        Self::all()
    }
}

impl Relevance {
    pub fn all() -> Self {
        Self {
            complete: true,
            topical: true,
            accessible: true,
            hypertext: true,
            document: true,
            image: true,
        }
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            complete: false,
            topical: false,
            accessible: false,
            hypertext: false,
            document: false,
            image: false,
        }
    }

    pub fn is_relevant(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Complete => self.complete,
            Criterion::Topical => self.topical,
            Criterion::Accessible => self.accessible,
            Criterion::Hypertext => self.hypertext,
            Criterion::Document => self.document,
            Criterion::Image => self.image,
        }
    }

    #[cfg(test)]
    pub fn with(mut self, criterion: Criterion, relevant: bool) -> Self {
        let slot = match criterion {
            Criterion::Complete => &mut self.complete,
            Criterion::Topical => &mut self.topical,
            Criterion::Accessible => &mut self.accessible,
            Criterion::Hypertext => &mut self.hypertext,
            Criterion::Document => &mut self.document,
            Criterion::Image => &mut self.image,
        };
        *slot = relevant;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub code: ParameterCode,
    #[serde(default)]
    pub name: String,
    pub weight: i32,
    #[serde(default)]
    pub relevance: Relevance,
    #[serde(default)]
    pub npa: bool,
    /// Organizations for which this parameter is not assessed.
    #[serde(default)]
    pub excluded: BTreeSet<OrganizationId>,
}

impl Parameter {
    pub fn is_excluded_for(&self, organization: OrganizationId) -> bool {
        self.excluded.contains(&organization)
    }
}

/// Openness formula generation a cycle is bound to, stored as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FormulaVersion {
    V1,
    V8,
}

impl TryFrom<u8> for FormulaVersion {
    type Error = OpennessError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::V1),
            8 => Ok(Self::V8),
            other => Err(OpennessError::UnknownFormulaVersion(other)),
        }
    }
}

impl From<FormulaVersion> for u8 {
    fn from(version: FormulaVersion) -> Self {
        match version {
            FormulaVersion::V1 => 1,
            FormulaVersion::V8 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prepare,
    Rate,
    Interact,
    Finalize,
    Publish,
}

impl Phase {
    pub fn is_interaction_or_later(self) -> bool {
        self >= Self::Interact
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Ready,
    Approved,
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "ready" => Some(Self::Ready),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    #[default]
    Final,
    Interim,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreValues {
    pub found: bool,
    #[serde(flatten)]
    pub criteria: CriterionValues,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub links: String,
    #[serde(default)]
    pub accomplished: bool,
}

#[cfg(test)]
impl ScoreValues {
    pub fn found() -> Self {
        Self {
            found: true,
            ..Self::default()
        }
    }

    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn with(mut self, criterion: Criterion, value: u8) -> Self {
        self.criteria.set(criterion, CriterionValue::Value(value));
        self
    }

    pub fn with_recommendation(mut self, text: &str) -> Self {
        self.recommendation = text.to_string();
        self
    }

    pub fn all_max() -> Self {
        Criterion::ALL
            .iter()
            .fold(Self::found(), |values, criterion| {
                values.with(*criterion, criterion.max_value())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub task: TaskId,
    pub parameter: ParameterCode,
    #[serde(default)]
    pub revision: Revision,
    #[serde(flatten)]
    pub values: ScoreValues,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub last_modified: DateTime<Utc>,
}

impl Score {
    pub fn new(
        task: TaskId,
        parameter: ParameterCode,
        values: ScoreValues,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            task,
            parameter,
            revision: Revision::Final,
            values,
            comments: Vec::new(),
            last_modified,
        }
    }

    pub fn key(&self) -> ScoreKey {
        ScoreKey {
            task: self.task,
            parameter: self.parameter,
            revision: self.revision,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScoreKey {
    pub task: TaskId,
    pub parameter: ParameterCode,
    pub revision: Revision,
}

impl ScoreKey {
    pub fn new(task: TaskId, parameter: ParameterCode, revision: Revision) -> Self {
        Self {
            task,
            parameter,
            revision,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub organization: OrganizationId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub task: TaskId,
    pub question: QuestionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitoring {
    #[serde(default)]
    pub name: String,
    pub phase: Phase,
    pub formula: FormulaVersion,
    #[serde(default)]
    pub no_interaction: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub scores: Vec<Score>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Monitoring {
    pub fn parameter(&self, code: ParameterCode) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.code == code)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }
}
