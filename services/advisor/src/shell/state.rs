//! services/advisor/src/shell/state.rs
//!
//! Defines the application's shared state and the navigation state of the shell.

use pet_advisor_core::{ports::AdvisoryService, registry::PetRegistry, transcript::Transcript};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared for the Whole Session)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The transcript lives here rather than in the chat screen so that switching tabs
/// never loses the conversation.
pub struct AppState {
    pub advisor: Arc<dyn AdvisoryService>,
    pub registry: Mutex<PetRegistry>,
    pub transcript: Arc<Mutex<Transcript>>,
}

impl AppState {
    /// A fresh session: demo pets and a transcript opened by the assistant greeting.
    pub fn new(advisor: Arc<dyn AdvisoryService>) -> Self {
        Self::with_parts(
            advisor,
            PetRegistry::with_sample_pets(),
            Transcript::with_greeting(),
        )
    }

    pub fn with_parts(
        advisor: Arc<dyn AdvisoryService>,
        registry: PetRegistry,
        transcript: Transcript,
    ) -> Self {
        Self {
            advisor,
            registry: Mutex::new(registry),
            transcript: Arc::new(Mutex::new(transcript)),
        }
    }
}

//=========================================================================================
// Navigation
//=========================================================================================

/// The bottom navigation tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Search,
    AiChat,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Search, Tab::AiChat, Tab::Profile];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Search => "查询",
            Tab::AiChat => "AI问答",
            Tab::Profile => "个人中心",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" | "查询" => Ok(Tab::Search),
            "chat" | "ai" | "ai问答" => Ok(Tab::AiChat),
            "profile" | "个人中心" => Ok(Tab::Profile),
            other => Err(other.to_string()),
        }
    }
}

/// Full-screen pages shown on top of the tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Main,
    FoodDetail(String),
    AddPet,
    EditPet(Uuid),
}

/// Which screen is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    tab: Tab,
    page: Page,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            tab: Tab::Search,
            page: Page::Main,
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.page = Page::Main;
    }

    pub fn open_food(&mut self, name: impl Into<String>) {
        self.page = Page::FoodDetail(name.into());
    }

    pub fn open_add_pet(&mut self) {
        self.page = Page::AddPet;
    }

    pub fn open_edit_pet(&mut self, id: Uuid) {
        self.page = Page::EditPet(id);
    }

    /// After a pet was saved or deleted the profile list is shown.
    pub fn pet_form_closed(&mut self) {
        self.switch_tab(Tab::Profile);
    }

    /// Back to the main page of the current tab.
    pub fn back(&mut self) {
        self.page = Page::Main;
    }
}
