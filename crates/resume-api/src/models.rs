//! Backend payloads
//!
//! Successful responses wrap their payload as `{ success, message, data }`.
//! Analysis documents are open-ended (score breakdowns, AI suggestions), so
//! only the fields the client acts on are typed; the rest is kept verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response envelope used by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Envelope of endpoints that only acknowledge (logout, delete, update).
#[derive(Debug, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

/// Authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Required vs. candidate experience, as compared by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceComparison {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jd: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Value>,
}

/// One resume analysis, either fresh from `/resume/analyze` or from history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ats_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceComparison>,
    /// Everything else (breakdown, suggestions, raw experience fields)
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Analysis {
    /// Fold `jdExperience` / `candidateExperience` of a fresh analysis into
    /// `experience`. History entries already carry `experience` and are
    /// returned unchanged.
    pub fn normalize(mut self) -> Self {
        if self.experience.is_some() {
            return self;
        }
        let jd = self.details.get("jdExperience").cloned();
        let candidate = self.details.get("candidateExperience").cloned();
        if jd.is_some() || candidate.is_some() {
            self.experience = Some(ExperienceComparison { jd, candidate });
        }
        self
    }

    /// Number of job-description skills found in the resume.
    pub fn matched_skill_count(&self) -> usize {
        self.skill_list("matched")
    }

    /// Number of job-description skills missing from the resume.
    pub fn missing_skill_count(&self) -> usize {
        self.skill_list("missing")
    }

    fn skill_list(&self, key: &str) -> usize {
        self.details
            .get("breakdown")
            .and_then(|b| b.get("skills"))
            .and_then(|s| s.get(key))
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

/// One page of `/analysis/history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    #[serde(default)]
    pub results: Vec<Analysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, alias = "totalResults", skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateNameRequest<'a> {
    pub full_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
    pub confirm_new_password: &'a str,
}
