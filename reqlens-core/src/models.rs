use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category assigned when no candidate label reaches the threshold
pub const GENERAL_CATEGORY: &str = "General";

/// Fixed set of requirement categories every sentence is scored against
pub const CANDIDATE_LABELS: [&str; 5] = ["Functional", "Non-Functional", "UI", "Security", "Performance"];

/// Separator used when joining several accepted categories
pub const CATEGORY_SEPARATOR: &str = ", ";

/// Represents the review status of a classified requirement
///
/// Reviewers may set any free-text status; the well-known values get their
/// own variants so statistics can count them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequirementStatus {
    #[default]
    Review,
    Approved,
    Rejected,
    Other(String),
}

impl RequirementStatus {
    /// Parse a status from a string, keeping unknown values verbatim
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Review" => RequirementStatus::Review,
            "Approved" => RequirementStatus::Approved,
            "Rejected" => RequirementStatus::Rejected,
            other => RequirementStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementStatus::Review => write!(f, "Review"),
            RequirementStatus::Approved => write!(f, "Approved"),
            RequirementStatus::Rejected => write!(f, "Rejected"),
            RequirementStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for RequirementStatus {
    fn from(s: String) -> Self {
        RequirementStatus::parse(&s)
    }
}

impl From<RequirementStatus> for String {
    fn from(status: RequirementStatus) -> Self {
        status.to_string()
    }
}

/// A single sentence pulled from a document together with its categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRequirement {
    /// Unique identifier for the record
    pub id: Uuid,

    /// Comma-joined category labels, or "General"
    pub categories: String,

    /// Cleaned sentence text
    pub requirement: String,

    /// Current review status
    pub status: RequirementStatus,
}

impl ClassifiedRequirement {
    /// Creates a new record in the default `Review` status
    pub fn new(categories: String, requirement: String) -> Self {
        let categories = if categories.trim().is_empty() {
            GENERAL_CATEGORY.to_string()
        } else {
            categories
        };

        Self {
            id: Uuid::new_v4(),
            categories,
            requirement,
            status: RequirementStatus::default(),
        }
    }
}

/// Review counts over a set of requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementStats {
    pub total: usize,
    pub approved: usize,
    pub in_review: usize,
    /// Everything that is neither approved nor in review
    pub other: usize,
}

impl RequirementStats {
    /// Tally the statuses of the given requirements
    pub fn from_requirements(requirements: &[ClassifiedRequirement]) -> Self {
        let mut stats = RequirementStats {
            total: requirements.len(),
            ..Default::default()
        };

        for req in requirements {
            match req.status {
                RequirementStatus::Approved => stats.approved += 1,
                RequirementStatus::Review => stats.in_review += 1,
                _ => stats.other += 1,
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requirement_defaults_to_review() {
        let req = ClassifiedRequirement::new("Security".to_string(), "Passwords are hashed".to_string());
        assert_eq!(req.status, RequirementStatus::Review);
        assert_eq!(req.categories, "Security");
    }

    #[test]
    fn test_new_requirement_never_has_empty_categories() {
        let req = ClassifiedRequirement::new("  ".to_string(), "Something happens here".to_string());
        assert_eq!(req.categories, GENERAL_CATEGORY);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(RequirementStatus::parse("Approved"), RequirementStatus::Approved);
        assert_eq!(RequirementStatus::parse("Review"), RequirementStatus::Review);
        assert_eq!(RequirementStatus::parse("Rejected"), RequirementStatus::Rejected);
        assert_eq!(
            RequirementStatus::parse("Needs rework"),
            RequirementStatus::Other("Needs rework".to_string())
        );
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let req = ClassifiedRequirement::new("UI".to_string(), "The button is blue".to_string());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["status"], "Review");
        assert_eq!(json["id"], req.id.to_string());

        let status: RequirementStatus = serde_json::from_str("\"Deferred\"").unwrap();
        assert_eq!(status, RequirementStatus::Other("Deferred".to_string()));
    }

    #[test]
    fn test_stats_partition_total() {
        let mut reqs: Vec<ClassifiedRequirement> = (0..5)
            .map(|i| ClassifiedRequirement::new("Functional".to_string(), format!("Requirement number {}", i)))
            .collect();
        reqs[0].status = RequirementStatus::Approved;
        reqs[1].status = RequirementStatus::Rejected;
        reqs[2].status = RequirementStatus::Other("Deferred".to_string());

        let stats = RequirementStats::from_requirements(&reqs);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.in_review, 2);
        assert_eq!(stats.other, 2);
        assert_eq!(stats.total, stats.approved + stats.in_review + stats.other);
    }

    #[test]
    fn test_stats_json_uses_camel_case() {
        let stats = RequirementStats::from_requirements(&[]);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["inReview"], 0);
        assert_eq!(json["total"], 0);
    }
}
