use chrono::{DateTime, FixedOffset};

/// A license assignment, independent of whether the holder has used it.
/// Identity key: `login`.
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub login: String,
    pub assigned_at: Option<DateTime<FixedOffset>>,
    pub last_activity_at: Option<DateTime<FixedOffset>>,
    pub last_activity_editor: Option<String>,
    pub pending_cancellation: bool,
}

impl Seat {
    /// Editor identifiers arrive as `client/version/…`; the short name is
    /// the version-less client part shown in tables.
    pub fn editor_short(&self) -> Option<String> {
        let editor = self.last_activity_editor.as_deref()?;
        let short = editor.split('/').next().unwrap_or(editor);
        Some(short.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(editor: Option<&str>) -> Seat {
        Seat {
            login: "armbla_abdemo".to_string(),
            assigned_at: None,
            last_activity_at: None,
            last_activity_editor: editor.map(String::from),
            pending_cancellation: false,
        }
    }

    #[test]
    fn editor_short_strips_version() {
        assert_eq!(
            seat(Some("vscode/1.96.2/copilot/1.250.0")).editor_short(),
            Some("vscode".to_string())
        );
        assert_eq!(
            seat(Some("github_spark")).editor_short(),
            Some("github_spark".to_string())
        );
        assert_eq!(seat(None).editor_short(), None);
    }
}
