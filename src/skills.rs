use std::collections::BTreeMap;
use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::rating::{Rating, clamp_rating};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Skill {
    BallControl,
    Passing,
    Dribbling,
    Shooting,
    UsingBothFeet,
    Speed,
    Agility,
    Endurance,
    Strength,
    Positioning,
    DecisionMaking,
    GameAwareness,
    Teamwork,
    Respect,
    Sportsmanship,
    Confidence,
    Leadership,
    AttendanceAndPunctuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillCategory {
    Technical,
    Physical,
    Understanding,
    Social,
    Overall,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 5] = [
        SkillCategory::Technical,
        SkillCategory::Physical,
        SkillCategory::Understanding,
        SkillCategory::Social,
        SkillCategory::Overall,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SkillCategory::Technical => "Technical Skills",
            SkillCategory::Physical => "Physical Abilities",
            SkillCategory::Understanding => "Technical Understanding",
            SkillCategory::Social => "Psychological and Social",
            SkillCategory::Overall => "Overall",
        }
    }

    pub fn skills(self) -> impl Iterator<Item = Skill> {
        Skill::ALL.into_iter().filter(move |s| s.category() == self)
    }
}

impl Skill {
    /// Wire order; also the order the player screen lists them in.
    pub const ALL: [Skill; 18] = [
        Skill::BallControl,
        Skill::Passing,
        Skill::Dribbling,
        Skill::Shooting,
        Skill::UsingBothFeet,
        Skill::Speed,
        Skill::Agility,
        Skill::Endurance,
        Skill::Strength,
        Skill::Positioning,
        Skill::DecisionMaking,
        Skill::GameAwareness,
        Skill::Teamwork,
        Skill::Respect,
        Skill::Sportsmanship,
        Skill::Confidence,
        Skill::Leadership,
        Skill::AttendanceAndPunctuality,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Skill::BallControl => "ball_control",
            Skill::Passing => "passing",
            Skill::Dribbling => "dribbling",
            Skill::Shooting => "shooting",
            Skill::UsingBothFeet => "using_both_feet",
            Skill::Speed => "speed",
            Skill::Agility => "agility",
            Skill::Endurance => "endurance",
            Skill::Strength => "strength",
            Skill::Positioning => "positioning",
            Skill::DecisionMaking => "decision_making",
            Skill::GameAwareness => "game_awareness",
            Skill::Teamwork => "teamwork",
            Skill::Respect => "respect",
            Skill::Sportsmanship => "sportsmanship",
            Skill::Confidence => "confidence",
            Skill::Leadership => "leadership",
            Skill::AttendanceAndPunctuality => "attendance_and_punctuality",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Skill::BallControl => "Ball control",
            Skill::Passing => "Passing",
            Skill::Dribbling => "Dribbling",
            Skill::Shooting => "Shooting",
            Skill::UsingBothFeet => "Using both feet",
            Skill::Speed => "Speed",
            Skill::Agility => "Agility",
            Skill::Endurance => "Endurance",
            Skill::Strength => "Strength",
            Skill::Positioning => "Positioning",
            Skill::DecisionMaking => "Decision making",
            Skill::GameAwareness => "Game awareness",
            Skill::Teamwork => "Teamwork",
            Skill::Respect => "Respect",
            Skill::Sportsmanship => "Sportsmanship",
            Skill::Confidence => "Confidence",
            Skill::Leadership => "Leadership",
            Skill::AttendanceAndPunctuality => "Attendance and punctuality",
        }
    }

    pub fn category(self) -> SkillCategory {
        match self {
            Skill::BallControl
            | Skill::Passing
            | Skill::Dribbling
            | Skill::Shooting
            | Skill::UsingBothFeet => SkillCategory::Technical,
            Skill::Speed | Skill::Agility | Skill::Endurance | Skill::Strength => {
                SkillCategory::Physical
            }
            Skill::Positioning
            | Skill::DecisionMaking
            | Skill::GameAwareness
            | Skill::Teamwork => SkillCategory::Understanding,
            Skill::Respect | Skill::Sportsmanship | Skill::Confidence | Skill::Leadership => {
                SkillCategory::Social
            }
            Skill::AttendanceAndPunctuality => SkillCategory::Overall,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Skill::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// Server-confirmed ratings. Skills without an entry have no rating.
///
/// Serializes as a flat map carrying every skill key (absent ones as `null`),
/// which is what the evaluation endpoints expect; see `Evaluation`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillRatings(BTreeMap<Skill, Rating>);

impl SkillRatings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, skill: Skill) -> Option<Rating> {
        self.0.get(&skill).copied()
    }

    pub fn set(&mut self, skill: Skill, rating: Option<Rating>) {
        match rating {
            Some(rating) => {
                self.0.insert(skill, rating);
            }
            None => {
                self.0.remove(&skill);
            }
        }
    }

    pub fn rated_count(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Skill, Option<Rating>)> + '_ {
        Skill::ALL.into_iter().map(|s| (s, self.get(s)))
    }
}

impl Serialize for SkillRatings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Skill::ALL.len()))?;
        for (skill, rating) in self.iter() {
            map.serialize_entry(skill.key(), &rating)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SkillRatings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RatingsVisitor;

        impl<'de> Visitor<'de> for RatingsVisitor {
            type Value = SkillRatings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of skill keys to ratings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut ratings = SkillRatings::new();
                while let Some(key) = access.next_key::<String>()? {
                    match Skill::from_key(&key) {
                        Some(skill) => {
                            let rating = access.next_value::<Option<Rating>>().map_err(|err| {
                                serde::de::Error::custom(format!("{key}: {err}"))
                            })?;
                            ratings.set(skill, rating);
                        }
                        None => {
                            access.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(ratings)
            }
        }

        deserializer.deserialize_map(RatingsVisitor)
    }
}

/// Raw, possibly out-of-scale form input keyed by skill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillDraft(BTreeMap<Skill, f64>);

impl SkillDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded_from(ratings: &SkillRatings) -> Self {
        let mut draft = Self::new();
        for (skill, rating) in ratings.iter() {
            draft.set(skill, rating.map(|r| f64::from(r.value())));
        }
        draft
    }

    pub fn get(&self, skill: Skill) -> Option<f64> {
        self.0.get(&skill).copied()
    }

    pub fn set(&mut self, skill: Skill, value: Option<f64>) {
        match value {
            Some(value) => {
                self.0.insert(skill, value);
            }
            None => {
                self.0.remove(&skill);
            }
        }
    }

    pub fn clamped(&self) -> SkillRatings {
        let mut out = SkillRatings::new();
        for skill in Skill::ALL {
            out.set(skill, clamp_rating(self.get(skill)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_cover_every_skill_once() {
        let total: usize = SkillCategory::ALL.iter().map(|c| c.skills().count()).sum();
        assert_eq!(total, Skill::ALL.len());
        assert_eq!(SkillCategory::Overall.skills().count(), 1);
    }

    #[test]
    fn keys_round_trip() {
        for skill in Skill::ALL {
            assert_eq!(Skill::from_key(skill.key()), Some(skill));
        }
        assert_eq!(Skill::from_key("average_rating"), None);
    }

    #[test]
    fn ratings_serialize_every_key() {
        let mut ratings = SkillRatings::new();
        ratings.set(Skill::Passing, Some(Rating::Good));
        let value = serde_json::to_value(&ratings).expect("serialize");
        let obj = value.as_object().expect("object");
        assert_eq!(obj.len(), 18);
        assert_eq!(obj["passing"], 3);
        assert!(obj["ball_control"].is_null());
    }
}
