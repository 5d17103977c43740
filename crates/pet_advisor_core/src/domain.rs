//! crates/pet_advisor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single entry of a chat transcript.
///
/// The content of a `User` message is fixed at creation. An `Assistant` message
/// starts empty and is rewritten in place while its answer streams in; only the
/// transcript that owns it can do that.
#[derive(Debug, Clone)]
pub struct Message {
    id: Uuid,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn content_mut(&mut self) -> Option<&mut String> {
        match self.role {
            Role::Assistant => Some(&mut self.content),
            Role::User => None,
        }
    }
}

//=========================================================================================
// Pets
//=========================================================================================

/// The kind of animal a profile describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Species {
    #[default]
    Dog,
    Cat,
    Other,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Dog, Species::Cat, Species::Other];

    /// The label shown to users and sent to the advisory backend.
    pub fn label(self) -> &'static str {
        match self {
            Species::Dog => "狗",
            Species::Cat => "猫",
            Species::Other => "其他",
        }
    }

    /// Avatar glyphs offered for this species in the pet form.
    pub fn avatar_choices(self) -> &'static [&'static str] {
        match self {
            Species::Dog => &["🐕", "🐶", "🦮", "🐕‍🦺", "🐩"],
            Species::Cat => &["🐱", "🐈", "🐈‍⬛", "😺", "😸"],
            Species::Other => &["🐰", "🐹", "🐦", "🐢", "🐠"],
        }
    }

    pub fn default_avatar(self) -> &'static str {
        self.avatar_choices()[0]
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown species: {0}")]
pub struct UnknownSpecies(pub String);

impl FromStr for Species {
    type Err = UnknownSpecies;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "狗" | "dog" => Ok(Species::Dog),
            "猫" | "cat" => Ok(Species::Cat),
            "其他" | "other" => Ok(Species::Other),
            other => Err(UnknownSpecies(other.to_string())),
        }
    }
}

/// Allergens suggested by the pet form.
pub const COMMON_ALLERGIES: [&str; 10] = [
    "牛肉", "鸡肉", "羊肉", "鱼肉", "小麦", "玉米", "大豆", "乳制品", "鸡蛋", "花生",
];

/// A pet known to the application.
///
/// `id` is `None` until the registry stores the profile; after that it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PetProfile {
    pub id: Option<Uuid>,
    pub name: String,
    pub species: Species,
    pub breed: String,
    pub age: String,
    pub weight: String,
    pub avatar: String,
    pub allergies: Vec<String>,
}

impl PetProfile {
    /// Creates an unsaved profile with the species' default avatar.
    pub fn new(name: impl Into<String>, species: Species, breed: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            species,
            breed: breed.into(),
            age: String::new(),
            weight: String::new(),
            avatar: species.default_avatar().to_string(),
            allergies: Vec::new(),
        }
    }

    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = age.into();
        self
    }

    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = weight.into();
        self
    }

    pub fn with_allergies<I, S>(mut self, allergies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for allergy in allergies {
            self.add_allergy(allergy);
        }
        self
    }

    /// Adds an allergy, ignoring blanks and entries already present.
    /// Returns whether the list changed.
    pub fn add_allergy(&mut self, allergy: impl Into<String>) -> bool {
        let allergy = allergy.into();
        let allergy = allergy.trim();
        if allergy.is_empty() || self.allergies.iter().any(|a| a == allergy) {
            return false;
        }
        self.allergies.push(allergy.to_string());
        true
    }

    pub fn remove_allergy(&mut self, allergy: &str) -> bool {
        let before = self.allergies.len();
        self.allergies.retain(|a| a != allergy);
        self.allergies.len() != before
    }
}

/// The pet details attached to an outbound question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetContext {
    pub name: String,
    pub species: Species,
    pub breed: String,
    pub allergies: Vec<String>,
}

impl From<&PetProfile> for PetContext {
    fn from(pet: &PetProfile) -> Self {
        Self {
            name: pet.name.clone(),
            species: pet.species,
            breed: pet.breed.clone(),
            allergies: pet.allergies.clone(),
        }
    }
}

/// A question as handed to the advisory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub question: String,
    pub pet: Option<PetContext>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>, pet: Option<&PetProfile>) -> Self {
        Self {
            question: question.into(),
            pet: pet.map(PetContext::from),
        }
    }
}
