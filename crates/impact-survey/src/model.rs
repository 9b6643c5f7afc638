//! Survey entity and its parts
//!
//! A [`Survey`] is owned by the store once added; everything handed out to
//! views is a cloned snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use ulid::Ulid;

/// Unique, immutable survey identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyId(pub String);

impl SurveyId {
    /// Generate a fresh identifier (ULID, sortable by creation time)
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Borrow the raw string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SurveyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SurveyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Social-impact sector a survey targets (education, health, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorId(pub String);

impl From<&str> for SectorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Survey lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    /// Being edited, not collecting responses
    Draft,
    /// Collecting responses
    Active,
    /// Closed
    Completed,
}

/// Answer format of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free text
    Text,
    /// Yes or no
    YesNo,
    /// Exactly one of the options
    SingleChoice {
        /// Offered options
        options: Vec<String>,
    },
    /// Any subset of the options
    MultipleChoice {
        /// Offered options
        options: Vec<String>,
    },
    /// Integer rating between `min` and `max` inclusive
    Scale {
        /// Lowest rating
        min: u8,
        /// Highest rating
        max: u8,
    },
}

/// One question of a pre- or post-intervention questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text
    pub prompt: String,
    /// Answer format
    pub kind: QuestionKind,
    /// Whether an answer is mandatory
    pub required: bool,
}

impl Question {
    /// Required free-text question
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Text,
            required: true,
        }
    }

    /// Required rating question
    #[must_use]
    pub fn scale(prompt: impl Into<String>, min: u8, max: u8) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Scale { min, max },
            required: true,
        }
    }

    /// Mark as optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Person a survey is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Full name
    pub name: String,
    /// Email or phone, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl Beneficiary {
    /// Beneficiary without contact details
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: None,
        }
    }
}

/// Social-impact survey
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    /// Unique identifier
    pub id: SurveyId,
    /// Title
    pub title: String,
    /// Owning organization
    pub organization: String,
    /// Free-form description
    pub description: String,
    /// Targeted sectors
    pub sectors: BTreeSet<SectorId>,
    /// Questions asked before the intervention
    pub pre_questions: Vec<Question>,
    /// Questions asked after the intervention
    pub post_questions: Vec<Question>,
    /// Addressees
    pub beneficiaries: Vec<Beneficiary>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: SurveyStatus,
    /// Number of responses collected so far
    pub responses: u64,
}

impl Survey {
    /// New draft survey with a generated id
    #[must_use]
    pub fn new(title: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            id: SurveyId::generate(),
            title: title.into(),
            organization: organization.into(),
            description: String::new(),
            sectors: BTreeSet::new(),
            pre_questions: Vec::new(),
            post_questions: Vec::new(),
            beneficiaries: Vec::new(),
            created_at: Utc::now(),
            status: SurveyStatus::Draft,
            responses: 0,
        }
    }

    /// With a specific id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<SurveyId>) -> Self {
        self.id = id.into();
        self
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With an additional sector
    #[must_use]
    pub fn with_sector(mut self, sector: impl Into<SectorId>) -> Self {
        self.sectors.insert(sector.into());
        self
    }

    /// With an additional pre-intervention question
    #[must_use]
    pub fn with_pre_question(mut self, question: Question) -> Self {
        self.pre_questions.push(question);
        self
    }

    /// With an additional post-intervention question
    #[must_use]
    pub fn with_post_question(mut self, question: Question) -> Self {
        self.post_questions.push(question);
        self
    }

    /// With an additional beneficiary
    #[must_use]
    pub fn with_beneficiary(mut self, beneficiary: Beneficiary) -> Self {
        self.beneficiaries.push(beneficiary);
        self
    }

    /// With status
    #[must_use]
    pub fn with_status(mut self, status: SurveyStatus) -> Self {
        self.status = status;
        self
    }

    /// Total number of questions
    #[inline]
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.pre_questions.len() + self.post_questions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_survey_is_empty_draft() {
        let survey = Survey::new("Literacy baseline", "Read Foundation");
        assert_eq!(survey.status, SurveyStatus::Draft);
        assert_eq!(survey.responses, 0);
        assert_eq!(survey.question_count(), 0);
        assert!(!survey.id.as_str().is_empty());
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(SurveyId::generate(), SurveyId::generate());
    }

    #[test]
    fn builder_collects_parts() {
        let survey = Survey::new("Water access", "Blue Wells")
            .with_id("s-1")
            .with_sector("health")
            .with_sector("health")
            .with_pre_question(Question::scale("How far is the nearest well?", 1, 5))
            .with_post_question(Question::text("Anything else?").optional())
            .with_beneficiary(Beneficiary::new("Amina"));

        assert_eq!(survey.id, SurveyId::from("s-1"));
        assert_eq!(survey.sectors.len(), 1);
        assert_eq!(survey.question_count(), 2);
        assert!(!survey.post_questions[0].required);
    }

    #[test]
    fn question_kind_serializes_tagged() {
        let json = serde_json::to_value(QuestionKind::Scale { min: 1, max: 5 }).unwrap();
        assert_eq!(json["kind"], "scale");
        assert_eq!(json["max"], 5);
    }
}
