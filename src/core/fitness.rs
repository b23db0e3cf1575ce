use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Level;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    #[default]
    Cardio,
    Strength,
    Flexibility,
    Yoga,
    Running,
    Cycling,
    Swimming,
    Sports,
    Other,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cardio => "cardio",
            Self::Strength => "strength",
            Self::Flexibility => "flexibility",
            Self::Yoga => "yoga",
            Self::Running => "running",
            Self::Cycling => "cycling",
            Self::Swimming => "swimming",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Strength => "Strength Training",
            Self::Cardio => "Cardio",
            Self::Flexibility => "Flexibility",
            Self::Yoga => "Yoga",
            Self::Running => "Running",
            Self::Cycling => "Cycling",
            Self::Swimming => "Swimming",
            Self::Sports => "Sports",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cardio" => Some(Self::Cardio),
            "strength" => Some(Self::Strength),
            "flexibility" => Some(Self::Flexibility),
            "yoga" => Some(Self::Yoga),
            "running" => Some(Self::Running),
            "cycling" => Some(Self::Cycling),
            "swimming" => Some(Self::Swimming),
            "sports" => Some(Self::Sports),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessActivity {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub duration: Option<u32>,
    pub intensity: Option<Level>,
    pub calories: Option<u32>,
    pub notes: Option<String>,
    pub date: NaiveDateTime,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Form payload for a new activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub title: String,
    pub kind: ActivityKind,
    pub duration: Option<u32>,
    pub intensity: Option<Level>,
    pub calories: Option<u32>,
    pub notes: Option<String>,
    pub date: NaiveDateTime,
}

impl NewActivity {
    pub fn new(title: impl Into<String>, kind: ActivityKind, date: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            kind,
            duration: None,
            intensity: Some(Level::Medium),
            calories: None,
            notes: None,
            date,
        }
    }
}

impl FitnessActivity {
    pub fn from_draft(draft: NewActivity, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            kind: draft.kind,
            // Zero is what an empty numeric field submits.
            duration: draft.duration.filter(|d| *d > 0),
            intensity: draft.intensity,
            calories: draft.calories.filter(|c| *c > 0),
            notes: draft.notes.filter(|n| !n.trim().is_empty()),
            date: draft.date,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn draft_drops_empty_fields() {
        let mut draft = NewActivity::new("  Swim ", ActivityKind::Swimming, at(7));
        draft.duration = Some(0);
        draft.calories = Some(250);
        draft.notes = Some("   ".into());
        let activity = FitnessActivity::from_draft(draft, at(9));

        assert_eq!(activity.title, "Swim");
        assert_eq!(activity.duration, None);
        assert_eq!(activity.calories, Some(250));
        assert_eq!(activity.notes, None);
        assert_eq!(activity.intensity, Some(Level::Medium));
        assert!(!activity.completed);
        assert_eq!(activity.created_at, activity.updated_at);
    }

    #[test]
    fn kind_names() {
        assert_eq!(ActivityKind::parse("strength"), Some(ActivityKind::Strength));
        assert_eq!(ActivityKind::Strength.label(), "Strength Training");
        assert_eq!(ActivityKind::parse("pilates"), None);

        let json = serde_json::to_value(FitnessActivity::from_draft(
            NewActivity::new("Ride", ActivityKind::Cycling, at(6)),
            at(6),
        ))
        .unwrap();
        assert_eq!(json["type"], "cycling");
    }
}
