//! Parsed syllabus model.
//!
//! A syllabus is parsed once per successful upload and fully replaced on
//! re-upload; the client never merges two parses.

use serde::{Deserialize, Serialize};

/// One unit of a parsed syllabus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusUnit {
    /// Unit name, e.g. "Unit I".
    pub name: String,
    /// Topics covered by the unit.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Expected answer format for the unit ("short", "medium", "long").
    #[serde(default)]
    pub format: String,
}

/// A parsed syllabus as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusData {
    /// Subject the syllabus belongs to.
    pub subject: String,
    /// Units in syllabus order.
    #[serde(default)]
    pub units: Vec<SyllabusUnit>,
}

impl SyllabusData {
    /// Looks up a unit by name.
    pub fn unit(&self, name: &str) -> Option<&SyllabusUnit> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Renders the syllabus as the free-text context block sent with
    /// standard-mode questions.
    ///
    /// Format: subject line, then per unit its name and a comma-joined
    /// topic list, blank-line separated.
    pub fn render_outline(&self) -> String {
        let mut text = String::new();
        if !self.subject.trim().is_empty() {
            text.push_str(&format!("Subject: {}\n\n", self.subject.trim()));
        }
        for unit in &self.units {
            text.push_str(&unit.name);
            text.push('\n');
            if !unit.topics.is_empty() {
                text.push_str(&format!("Topics: {}\n", unit.topics.join(", ")));
            }
            text.push('\n');
        }
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyllabusData {
        SyllabusData {
            subject: "Operating Systems".to_string(),
            units: vec![
                SyllabusUnit {
                    name: "Unit I".to_string(),
                    topics: vec!["Processes".to_string(), "Threads".to_string()],
                    format: "short".to_string(),
                },
                SyllabusUnit {
                    name: "Unit II".to_string(),
                    topics: vec![],
                    format: "long".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_unit_lookup() {
        let syllabus = sample();
        assert!(syllabus.unit("Unit I").is_some());
        assert!(syllabus.unit("Unit III").is_none());
    }

    #[test]
    fn test_render_outline() {
        let outline = sample().render_outline();
        assert_eq!(
            outline,
            "Subject: Operating Systems\n\nUnit I\nTopics: Processes, Threads\n\nUnit II"
        );
    }

    #[test]
    fn test_render_outline_without_subject() {
        let mut syllabus = sample();
        syllabus.subject = String::new();
        assert!(syllabus.render_outline().starts_with("Unit I"));
    }

    #[test]
    fn test_parse_backend_shape() {
        let syllabus: SyllabusData = serde_json::from_str(
            r#"{"subject": "Physics", "units": [{"name": "Unit I", "topics": ["Optics"], "format": "medium"}]}"#,
        )
        .unwrap();
        assert_eq!(syllabus.subject, "Physics");
        assert_eq!(syllabus.units[0].topics, vec!["Optics".to_string()]);
    }
}
