use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use tracing::warn;

/// Tools the learner already uses. Clients send either a plain list or a free-form
/// object carrying richer detail; both are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolsUsed {
    List(Vec<Value>),
    Freeform(Map<String, Value>),
}

impl ToolsUsed {
    /// Flattens either shape into display names for prompt building.
    pub fn names(&self) -> Vec<String> {
        match self {
            ToolsUsed::List(items) => items.iter().filter_map(item_name).collect(),
            ToolsUsed::Freeform(map) => map
                .iter()
                .flat_map(|(key, value)| match value {
                    Value::Array(items) => items.iter().filter_map(item_name).collect::<Vec<_>>(),
                    Value::String(s) => vec![format!("{key}: {s}")],
                    Value::Null => vec![key.clone()],
                    other => vec![format!("{key}: {other}")],
                })
                .collect(),
        }
    }
}

fn item_name(item: &Value) -> Option<String> {
    match item {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::String(_) | Value::Null => None,
        Value::Object(obj) => Some(
            obj.get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| item.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

/// Optional advanced attributes. Stored together as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_models: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_hours_per_week: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industries: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_needs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_privacy_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_constraints: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_workflows: Option<String>,
}

/// Request body for profile intake.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    pub job: String,
    pub sector: String,
    pub ai_level: String,
    #[serde(default)]
    pub tools_used: Option<ToolsUsed>,
    #[serde(default)]
    pub work_style: Option<String>,
    #[serde(flatten)]
    pub details: ProfileDetails,
}

/// A stored learner profile. The newest one per user is the generation context.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub job: String,
    pub sector: String,
    pub ai_level: String,
    pub tools_used: Option<ToolsUsed>,
    pub work_style: Option<String>,
    #[serde(flatten)]
    pub details: ProfileDetails,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub user_id: String,
    pub job: String,
    pub sector: String,
    pub ai_level: String,
    pub tools_used: Option<Value>,
    pub work_style: Option<String>,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    /// Malformed stored JSON is dropped with a warning; the required fields still
    /// carry the profile.
    pub fn into_domain(self) -> Profile {
        let tools_used = self.tools_used.and_then(|v| match serde_json::from_value(v) {
            Ok(tools) => Some(tools),
            Err(e) => {
                warn!(profile_id = %self.id, "Ignoring malformed stored tools_used: {e}");
                None
            }
        });
        let details = match serde_json::from_value(self.details) {
            Ok(details) => details,
            Err(e) => {
                warn!(profile_id = %self.id, "Ignoring malformed stored profile details: {e}");
                ProfileDetails::default()
            }
        };
        Profile {
            id: self.id,
            user_id: self.user_id,
            job: self.job,
            sector: self.sector,
            ai_level: self.ai_level,
            tools_used,
            work_style: self.work_style,
            details,
            created_at: self.created_at,
        }
    }
}

impl Profile {
    /// Plain-text description of the learner embedded in every stage prompt.
    pub fn prompt_digest(&self) -> String {
        let mut lines = vec![
            format!("Job: {}", self.job),
            format!("Sector: {}", self.sector),
            format!("AI proficiency level: {}", self.ai_level),
        ];
        let tools = self
            .tools_used
            .as_ref()
            .map(ToolsUsed::names)
            .unwrap_or_default();
        if !tools.is_empty() {
            lines.push(format!("Tools already used: {}", tools.join(", ")));
        }
        push_opt(&mut lines, "Work style", self.work_style.as_deref());

        let d = &self.details;
        push_opt(&mut lines, "Seniority", d.seniority.as_deref());
        if let Some(years) = d.experience_years {
            lines.push(format!("Years of experience: {years}"));
        }
        push_opt(&mut lines, "Company size", d.company_size.as_deref());
        push_opt(&mut lines, "Preferred models", d.preferred_models.as_deref());
        push_opt(&mut lines, "Learning goals", d.learning_goals.as_deref());
        if let Some(hours) = d.availability_hours_per_week {
            lines.push(format!("Availability: {hours} hours per week"));
        }
        push_opt(&mut lines, "Timezone", d.timezone.as_deref());
        push_opt(&mut lines, "Language", d.language.as_deref());
        push_opt(&mut lines, "Other industries", d.industries.as_deref());
        push_opt(&mut lines, "Compliance needs", d.compliance_needs.as_deref());
        push_opt(&mut lines, "Data privacy notes", d.data_privacy_notes.as_deref());
        push_opt(&mut lines, "Hardware constraints", d.hardware_constraints.as_deref());
        push_opt(&mut lines, "Preferred workflows", d.preferred_workflows.as_deref());

        lines.join("\n")
    }
}

fn push_opt(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(format!("{label}: {v}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_row(tools_used: Option<Value>, details: Value) -> ProfileRow {
        ProfileRow {
            id: "p1".to_string(),
            user_id: "alice".to_string(),
            job: "Analyst".to_string(),
            sector: "Finance".to_string(),
            ai_level: "beginner".to_string(),
            tools_used,
            work_style: Some("remote".to_string()),
            details,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_into_domain_drops_malformed_json_columns() {
        let profile = stored_row(
            Some(json!("ChatGPT")),
            json!({ "experience_years": "five", "timezone": "CET" }),
        )
        .into_domain();
        assert!(profile.tools_used.is_none());
        assert_eq!(profile.details, ProfileDetails::default());
        assert_eq!(profile.job, "Analyst");
        assert_eq!(profile.work_style.as_deref(), Some("remote"));
    }

    #[test]
    fn test_into_domain_keeps_well_formed_json_columns() {
        let profile = stored_row(Some(json!(["ChatGPT"])), json!({ "timezone": "CET" })).into_domain();
        assert_eq!(profile.tools_used.unwrap().names(), vec!["ChatGPT"]);
        assert_eq!(profile.details.timezone.as_deref(), Some("CET"));
    }

    #[test]
    fn test_tools_used_accepts_list() {
        let tools: ToolsUsed = serde_json::from_value(json!(["ChatGPT", "Copilot"])).unwrap();
        assert_eq!(tools.names(), vec!["ChatGPT", "Copilot"]);
    }

    #[test]
    fn test_tools_used_list_of_objects_uses_name() {
        let tools: ToolsUsed =
            serde_json::from_value(json!([{ "name": "Notion AI", "usage": "daily" }, "Gemini"]))
                .unwrap();
        assert_eq!(tools.names(), vec!["Notion AI", "Gemini"]);
    }

    #[test]
    fn test_tools_used_accepts_freeform_object() {
        let tools: ToolsUsed = serde_json::from_value(json!({
            "assistants": ["ChatGPT", "Claude"],
            "automation": "Zapier",
            "seats": 12
        }))
        .unwrap();
        assert!(matches!(tools, ToolsUsed::Freeform(_)));
        let names = tools.names();
        assert!(names.contains(&"ChatGPT".to_string()));
        assert!(names.contains(&"Claude".to_string()));
        assert!(names.contains(&"automation: Zapier".to_string()));
        assert!(names.contains(&"seats: 12".to_string()));
    }

    #[test]
    fn test_tools_used_round_trips_verbatim() {
        let raw = json!(["ChatGPT", "Copilot"]);
        let tools: ToolsUsed = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&tools).unwrap(), raw);
    }

    #[test]
    fn test_profile_input_flattens_advanced_fields() {
        let input: ProfileInput = serde_json::from_value(json!({
            "job": "Data Analyst",
            "sector": "Finance",
            "ai_level": "intermediate",
            "tools_used": ["ChatGPT"],
            "work_style": "hybrid",
            "seniority": "Senior",
            "experience_years": 7,
            "language": "fr"
        }))
        .unwrap();
        assert_eq!(input.details.seniority.as_deref(), Some("Senior"));
        assert_eq!(input.details.experience_years, Some(7.0));
        assert_eq!(input.details.language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_prompt_digest_skips_absent_fields() {
        let profile = Profile {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            job: "Responsable Marketing".to_string(),
            sector: "Retail".to_string(),
            ai_level: "beginner".to_string(),
            tools_used: Some(ToolsUsed::List(vec![json!("ChatGPT")])),
            work_style: None,
            details: ProfileDetails {
                learning_goals: Some("Automate reporting".to_string()),
                ..ProfileDetails::default()
            },
            created_at: Utc::now(),
        };
        let digest = profile.prompt_digest();
        assert!(digest.contains("Job: Responsable Marketing"));
        assert!(digest.contains("Tools already used: ChatGPT"));
        assert!(digest.contains("Learning goals: Automate reporting"));
        assert!(!digest.contains("Work style"));
        assert!(!digest.contains("Timezone"));
    }
}
