use serde::{Deserialize, Serialize};
use validator::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "Under 18")]
    Under18,
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55-64")]
    From55To64,
    #[serde(rename = "65+")]
    Over65,
}

impl AgeBracket {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::Under18 => "Under 18",
            AgeBracket::From18To24 => "18-24",
            AgeBracket::From25To34 => "25-34",
            AgeBracket::From35To44 => "35-44",
            AgeBracket::From45To54 => "45-54",
            AgeBracket::From55To64 => "55-64",
            AgeBracket::Over65 => "65+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Non-binary")]
    NonBinary,
    Transgender,
    Genderqueer,
    Agender,
    #[serde(rename = "Prefer not to say")]
    PreferNotToSay,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::NonBinary => "Non-binary",
            Gender::Transgender => "Transgender",
            Gender::Genderqueer => "Genderqueer",
            Gender::Agender => "Agender",
            Gender::PreferNotToSay => "Prefer not to say",
        }
    }
}

/// Participant ids are numeric codes handed out by the experimenter.
pub fn validate_participant_id(id: &str) -> Result<(), ValidationError> {
    let id = id.trim();
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    Err(ValidationError::new("participant_id_digits")
        .with_message("participant id must contain digits only".into()))
}

/// Demographics captured once at the start of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: String,
    pub age: AgeBracket,
    pub gender: Gender,
}

impl ParticipantInfo {
    pub fn new(id: &str, age: AgeBracket, gender: Gender) -> Self {
        Self {
            id: id.trim().to_string(),
            age,
            gender,
        }
    }
}
