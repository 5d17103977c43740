//! crates/pet_advisor_core/src/registry.rs
//!
//! The in-memory collection of pet profiles for one session.

use crate::domain::{PetProfile, Species};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Pet profiles in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PetRegistry {
    pets: Vec<PetProfile>,
}

impl PetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the two demo pets shown on first launch.
    pub fn with_sample_pets() -> Self {
        let mut registry = Self::new();
        let samples = [
            PetProfile::new("旺财", Species::Dog, "金毛")
                .with_age("3岁")
                .with_weight("28kg")
                .with_allergies(["牛肉", "小麦"]),
            PetProfile::new("咪咪", Species::Cat, "英短")
                .with_age("2岁")
                .with_weight("4.5kg"),
        ];
        for pet in samples {
            let id = Uuid::now_v7();
            registry.pets.push(PetProfile { id: Some(id), ..pet });
        }
        registry
    }

    /// Stores a new profile under a freshly assigned id and returns the stored copy.
    /// Any id already on `profile` is replaced.
    pub fn add(&mut self, profile: PetProfile) -> Result<PetProfile, RegistryError> {
        validate(&profile)?;
        let stored = PetProfile {
            id: Some(Uuid::now_v7()),
            ..profile
        };
        self.pets.push(stored.clone());
        Ok(stored)
    }

    /// Replaces the entry with the same id, keeping its position.
    ///
    /// Returns `Ok(false)` when the profile has no id or no entry matches it.
    pub fn update(&mut self, profile: PetProfile) -> Result<bool, RegistryError> {
        validate(&profile)?;
        let Some(id) = profile.id else {
            return Ok(false);
        };
        match self.pets.iter_mut().find(|p| p.id == Some(id)) {
            Some(slot) => {
                *slot = profile;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the entry with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.pets.len();
        self.pets.retain(|p| p.id != Some(id));
        self.pets.len() != before
    }

    pub fn get(&self, id: Uuid) -> Option<&PetProfile> {
        self.pets.iter().find(|p| p.id == Some(id))
    }

    pub fn list(&self) -> &[PetProfile] {
        &self.pets
    }

    pub fn len(&self) -> usize {
        self.pets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pets.is_empty()
    }
}

fn validate(profile: &PetProfile) -> Result<(), RegistryError> {
    if profile.name.trim().is_empty() {
        return Err(RegistryError::MissingField("name"));
    }
    if profile.breed.trim().is_empty() {
        return Err(RegistryError::MissingField("breed"));
    }
    Ok(())
}

/// Finds the pet a question is about: the first profile, in directory order,
/// whose name occurs anywhere in the question.
pub fn match_pet<'a>(question: &str, pets: &'a [PetProfile]) -> Option<&'a PetProfile> {
    pets.iter()
        .find(|pet| !pet.name.is_empty() && question.contains(pet.name.as_str()))
}
