use crate::router::QueryParams;
use swayami_identity::error::redact_sensitive;
use swayami_identity::Session;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugTrace {
    entries: Vec<(&'static str, String)>,
}

impl DebugTrace {
    pub fn build(
        params: &QueryParams,
        session: Option<&Session>,
        error: Option<&str>,
        outcome: &str,
    ) -> Self {
        let mut entries = vec![
            ("url", params.url().map_or_else(|| "-".to_string(), redact_sensitive)),
            ("origin", params.origin().unwrap_or_else(|| "-".to_string())),
            ("params", describe_params(params)),
        ];

        let session_snapshot = match session {
            Some(s) => match &s.user {
                Some(user) => format!(
                    "user={} email={} expired={}",
                    user.id,
                    user.email.as_deref().unwrap_or("-"),
                    s.is_expired()
                ),
                None => "session without user".to_string(),
            },
            None => "none".to_string(),
        };
        entries.push(("session", session_snapshot));

        if let Some(error) = error {
            entries.push(("error", error.to_string()));
        }
        entries.push(("outcome", outcome.to_string()));

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

fn describe_params(params: &QueryParams) -> String {
    if params.is_empty() {
        return "{}".to_string();
    }
    let joined = params
        .iter()
        .map(|(k, v)| match k {
            "code" | "access_token" | "refresh_token" => format!("{k}=[REDACTED]"),
            _ => format!("{k}={v}"),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{joined}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hides_authorization_code() {
        let params = QueryParams::from_pairs([("code", "secret"), ("state", "s1")]);
        let trace = DebugTrace::build(&params, None, None, "error");
        assert_eq!(trace.get("params"), Some("{code=[REDACTED], state=s1}"));
        assert_eq!(trace.get("session"), Some("none"));
        assert_eq!(trace.get("error"), None);
    }

    #[test]
    fn url_entry_hides_authorization_code() {
        let params =
            QueryParams::parse("http://localhost:5173/auth/callback?code=s3cr3t&state=s1").unwrap();
        let trace = DebugTrace::build(&params, None, None, "/login");

        let url = trace.get("url").unwrap();
        assert!(!url.contains("s3cr3t"));
        assert_eq!(url, "http://localhost:5173/auth/callback?code=[REDACTED]&state=s1");
        assert_eq!(trace.get("params"), Some("{code=[REDACTED], state=s1}"));
    }
}
