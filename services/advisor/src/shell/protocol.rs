//! services/advisor/src/shell/protocol.rs
//!
//! Defines the user intents the shell understands and how terminal input maps to them.

use crate::shell::state::Tab;
use pet_advisor_core::domain::{PetProfile, Species};

/// Something the user wants to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SwitchTab(Tab),
    /// Look a food up by name and open its detail page.
    Search(String),
    /// Open a food from the featured list by its 1-based position.
    OpenFeatured(usize),
    /// Photograph an ingredient list. Not available yet.
    ScanIngredients,
    AddPet,
    /// Edit the pet at this 1-based position of the profile list.
    EditPet(usize),
    SavePet(PetForm),
    /// Delete the pet currently being edited.
    DeletePet,
    Back,
    Ask(String),
    /// Ask one of the suggested questions by its 1-based position.
    QuickQuestion(usize),
    /// Redraw the current screen.
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    #[error("未知指令：{0}（输入 /help 查看帮助）")]
    UnknownCommand(String),
    #[error("缺少参数：{0}")]
    MissingArgument(&'static str),
    #[error("参数无效：{0}")]
    InvalidArgument(String),
    #[error("在此页面请使用指令（输入 /help 查看帮助）")]
    NoDefaultAction,
}

impl Intent {
    /// Parses one line of terminal input. Text without a leading `/` is a question
    /// on the chat tab and a food search on the search tab.
    pub fn parse(line: &str, tab: Tab) -> Result<Self, IntentError> {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return match tab {
                Tab::AiChat => Ok(Intent::Ask(line.to_string())),
                Tab::Search => Ok(Intent::Search(line.to_string())),
                Tab::Profile => Err(IntentError::NoDefaultAction),
            };
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        match name {
            "tab" => rest
                .parse::<Tab>()
                .map(Intent::SwitchTab)
                .map_err(IntentError::InvalidArgument),
            "search" => Ok(Intent::Search(rest.to_string())),
            "food" => parse_index(rest, "食物编号").map(Intent::OpenFeatured),
            "scan" => Ok(Intent::ScanIngredients),
            "add" => Ok(Intent::AddPet),
            "edit" => parse_index(rest, "宠物编号").map(Intent::EditPet),
            "save" => PetForm::parse(rest).map(Intent::SavePet),
            "delete" => Ok(Intent::DeletePet),
            "back" => Ok(Intent::Back),
            "ask" => Ok(Intent::Ask(rest.to_string())),
            "quick" => parse_index(rest, "问题编号").map(Intent::QuickQuestion),
            "show" | "pets" => Ok(Intent::Show),
            "help" => Ok(Intent::Help),
            "quit" | "exit" => Ok(Intent::Quit),
            other => Err(IntentError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_index(raw: &str, what: &'static str) -> Result<usize, IntentError> {
    if raw.is_empty() {
        return Err(IntentError::MissingArgument(what));
    }
    match raw.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index),
        _ => Err(IntentError::InvalidArgument(raw.to_string())),
    }
}

//=========================================================================================
// Pet Form
//=========================================================================================

/// The fields entered on the add/edit pet page. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetForm {
    pub name: Option<String>,
    pub species: Option<Species>,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub weight: Option<String>,
    pub avatar: Option<String>,
    pub allergies: Option<Vec<String>>,
}

impl PetForm {
    /// Parses `key=value` pairs separated by whitespace, e.g.
    /// `name=旺财 species=狗 breed=金毛 allergies=牛肉,小麦`.
    pub fn parse(raw: &str) -> Result<Self, IntentError> {
        let mut form = PetForm::default();
        for pair in raw.split_whitespace() {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| IntentError::InvalidArgument(pair.to_string()))?;
            let value = value.trim().to_string();
            match key {
                "name" => form.name = Some(value),
                "species" | "type" => {
                    let species = value
                        .parse::<Species>()
                        .map_err(|e| IntentError::InvalidArgument(e.to_string()))?;
                    form.species = Some(species);
                }
                "breed" => form.breed = Some(value),
                "age" => form.age = Some(value),
                "weight" => form.weight = Some(value),
                "avatar" => form.avatar = Some(value),
                "allergies" => {
                    form.allergies = Some(
                        value
                            .split([',', '，'])
                            .map(str::trim)
                            .filter(|a| !a.is_empty())
                            .map(str::to_string)
                            .collect(),
                    );
                }
                other => return Err(IntentError::InvalidArgument(other.to_string())),
            }
        }
        Ok(form)
    }

    /// Fills the form into `base`, the profile the page was opened with.
    pub fn apply_to(self, mut base: PetProfile) -> PetProfile {
        if let Some(name) = self.name {
            base.name = name;
        }
        if let Some(species) = self.species {
            // Keep the avatar only if it belongs to the new species.
            if self.avatar.is_none() && !species.avatar_choices().contains(&base.avatar.as_str()) {
                base.avatar = species.default_avatar().to_string();
            }
            base.species = species;
        }
        if let Some(breed) = self.breed {
            base.breed = breed;
        }
        if let Some(age) = self.age {
            base.age = age;
        }
        if let Some(weight) = self.weight {
            base.weight = weight;
        }
        if let Some(avatar) = self.avatar {
            base.avatar = avatar;
        }
        if let Some(allergies) = self.allergies {
            base.allergies.clear();
            for allergy in allergies {
                base.add_allergy(allergy);
            }
        }
        base
    }
}
