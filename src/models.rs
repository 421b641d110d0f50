use serde::{Deserialize, Serialize};

// Query parameters for GET /workgpt
#[derive(Deserialize, Debug)]
pub struct AskParams {
    #[serde(default)]
    pub question: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

// Response payload - always {"answer": ...} on 200
#[derive(Serialize, Debug)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

// One cached question/answer pair. The file backend has no counter and
// always reports usage_count = 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question: String,
    pub answer: String,
    pub usage_count: u64,
}

// Who asked - only used for the audit trail, never for answer selection
#[derive(Debug, Clone)]
pub struct RequesterContext {
    pub name: Option<String>,
    pub email: Option<String>,
    pub ip: String,
}

// One append-only audit row per request (sqlite backend only)
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub user_name: String,
    pub email: Option<String>,
    pub ip_address: String,
    pub location: String,
    pub question: String,
    pub timestamp: String,
}

impl ActivityRecord {
    pub fn new(ctx: RequesterContext, location: Option<String>, question: String) -> Self {
        Self {
            user_name: ctx
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Guest".to_string()),
            email: ctx.email,
            ip_address: ctx.ip,
            location: location.unwrap_or_else(|| "Unknown".to_string()),
            question,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(name: Option<&str>) -> RequesterContext {
        RequesterContext {
            name: name.map(String::from),
            email: Some("a@b.c".to_string()),
            ip: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn test_activity_record_defaults_to_guest() {
        let rec = ActivityRecord::new(ctx(None), None, "q".into());
        assert_eq!(rec.user_name, "Guest");
        assert_eq!(rec.location, "Unknown");
    }

    #[test]
    fn test_activity_record_empty_name_is_guest() {
        let rec = ActivityRecord::new(ctx(Some("")), None, "q".into());
        assert_eq!(rec.user_name, "Guest");
    }

    #[test]
    fn test_activity_record_keeps_provided_fields() {
        let rec = ActivityRecord::new(ctx(Some("Ada")), Some("Paris, France".into()), "q".into());
        assert_eq!(rec.user_name, "Ada");
        assert_eq!(rec.location, "Paris, France");
        assert_eq!(rec.email.as_deref(), Some("a@b.c"));
        assert_eq!(rec.ip_address, "10.0.0.1");
        assert!(!rec.timestamp.is_empty());
    }
}
