use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_SKILL_SCORE: i16 = 10;

/// Coach's scoring of a fighter's skills, each on a 0-10 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub striking: i16,
    pub grappling: i16,
    pub cardio: i16,
    pub strength: i16,
    pub flexibility: i16,
    pub technique: i16,
    pub discipline: i16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_at: Option<DateTime<Utc>>,
}

impl Assessment {
    fn scores(&self) -> [(&'static str, i16); 7] {
        [
            ("striking", self.striking),
            ("grappling", self.grappling),
            ("cardio", self.cardio),
            ("strength", self.strength),
            ("flexibility", self.flexibility),
            ("technique", self.technique),
            ("discipline", self.discipline),
        ]
    }

    /// Name of the first score outside 0..=10, if any.
    pub fn out_of_range(&self) -> Option<&'static str> {
        self.scores()
            .into_iter()
            .find(|(_, v)| !(0..=MAX_SKILL_SCORE).contains(v))
            .map(|(name, _)| name)
    }

    pub fn average(&self) -> f64 {
        let scores = self.scores();
        let total: i64 = scores.iter().map(|(_, v)| *v as i64).sum();
        total as f64 / scores.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fighter {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub belt_rank: Option<String>,
    pub assessment: Option<Assessment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a fighter or admin may edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub belt_rank: Option<String>,
}
