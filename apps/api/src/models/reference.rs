//! Reference-data rows shared by offer requirements and candidate profiles.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Whether a skill counts towards the hard or the soft skill vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillKind {
    Hard,
    Soft,
}

impl SkillKind {
    /// Accepts both the short (`hard`) and the catalogue (`Hardskill`) spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.starts_with("hard") {
            Some(SkillKind::Hard)
        } else if lower.starts_with("soft") {
            Some(SkillKind::Soft)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub skill_type: String,
    pub category: String,
}

impl Skill {
    pub fn kind(&self) -> Option<SkillKind> {
        SkillKind::parse(&self.skill_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: i32,
    pub domain: String,
    pub diploma: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Experience {
    pub id: i32,
    pub name: String,
}

/// A language together with a proficiency level (`beginner` .. `native`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LanguageLevel {
    pub id: i32,
    pub name: String,
    pub level: String,
}
