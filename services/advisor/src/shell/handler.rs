//! services/advisor/src/shell/handler.rs
//!
//! Routes user intents to the catalog, the pet registry or the chat controller
//! and decides what the terminal shows next.

use crate::shell::{
    ask_task::ask_process,
    protocol::Intent,
    state::{AppState, Navigator, Page, Tab},
    view,
};
use pet_advisor_core::{
    catalog::FEATURED_DANGEROUS_FOODS, domain::PetProfile, exchange::Exchange,
    transcript::QUICK_QUESTIONS,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

const SCAN_UNAVAILABLE: &str = "拍照识别配料表功能暂未开放，敬请期待。";
const STILL_ANSWERING: &str = "上一个问题还在回答中，请稍候。";

/// What the terminal should do after an intent was handled.
#[derive(Debug)]
pub enum Reply {
    /// Show this screen.
    Screen(String),
    /// Show a one-line message and stay on the current screen.
    Notice(String),
    /// An answer is streaming into the `placeholder` message; the task completes
    /// with it.
    Streaming { task: JoinHandle<()>, placeholder: Uuid },
    /// Nothing to show.
    Idle,
    Quit,
}

/// Applies one intent to the session.
pub async fn handle_intent(
    app_state: &Arc<AppState>,
    nav: &mut Navigator,
    intent: Intent,
) -> Reply {
    match intent {
        Intent::SwitchTab(tab) => {
            nav.switch_tab(tab);
            render(app_state, nav).await
        }
        Intent::Search(query) => {
            let query = query.trim();
            if query.is_empty() {
                return Reply::Idle;
            }
            info!(food = %query, "Food search.");
            nav.open_food(query);
            render(app_state, nav).await
        }
        Intent::OpenFeatured(index) => match nth(&FEATURED_DANGEROUS_FOODS, index) {
            Some(food) => {
                nav.open_food(food.name);
                render(app_state, nav).await
            }
            None => Reply::Notice(format!("没有第 {} 个食物", index)),
        },
        Intent::ScanIngredients => Reply::Notice(SCAN_UNAVAILABLE.to_string()),
        Intent::AddPet => {
            nav.open_add_pet();
            render(app_state, nav).await
        }
        Intent::EditPet(index) => {
            let id = {
                let registry = app_state.registry.lock().await;
                nth(registry.list(), index).and_then(|p| p.id)
            };
            match id {
                Some(id) => {
                    nav.open_edit_pet(id);
                    render(app_state, nav).await
                }
                None => Reply::Notice(format!("没有第 {} 只宠物", index)),
            }
        }
        Intent::SavePet(form) => {
            let result = {
                let mut registry = app_state.registry.lock().await;
                match nav.page() {
                    Page::AddPet => {
                        let profile = form.apply_to(PetProfile::default());
                        registry.add(profile).map(|saved| Some(saved.name))
                    }
                    Page::EditPet(id) => match registry.get(*id).cloned() {
                        Some(existing) => {
                            let profile = form.apply_to(existing);
                            let name = profile.name.clone();
                            registry
                                .update(profile)
                                .map(|updated| updated.then_some(name))
                        }
                        None => Ok(None),
                    },
                    _ => return Reply::Notice("请先输入 /add 或 /edit <编号>".to_string()),
                }
            };
            match result {
                Ok(Some(name)) => {
                    info!(pet = %name, "Pet profile saved.");
                    nav.pet_form_closed();
                    render(app_state, nav).await
                }
                Ok(None) => {
                    warn!("Tried to save a pet that no longer exists.");
                    nav.pet_form_closed();
                    render(app_state, nav).await
                }
                Err(e) => {
                    warn!("Rejected pet profile: {}", e);
                    Reply::Notice("请填写宠物姓名和品种".to_string())
                }
            }
        }
        Intent::DeletePet => {
            let Page::EditPet(id) = nav.page().clone() else {
                return Reply::Notice("请先输入 /edit <编号> 选择宠物".to_string());
            };
            if app_state.registry.lock().await.remove(id) {
                info!(%id, "Pet profile deleted.");
            }
            nav.pet_form_closed();
            render(app_state, nav).await
        }
        Intent::Back => {
            nav.back();
            render(app_state, nav).await
        }
        Intent::Ask(question) => ask(app_state, nav, question).await,
        Intent::QuickQuestion(index) => {
            if !app_state.transcript.lock().await.offers_quick_questions() {
                return Reply::Notice("快捷问题仅在对话开始前可用".to_string());
            }
            match nth(&QUICK_QUESTIONS, index) {
                Some(question) => ask(app_state, nav, question.to_string()).await,
                None => Reply::Notice(format!("没有第 {} 个快捷问题", index)),
            }
        }
        Intent::Show => render(app_state, nav).await,
        Intent::Help => Reply::Screen(view::help()),
        Intent::Quit => Reply::Quit,
    }
}

async fn ask(app_state: &Arc<AppState>, nav: &mut Navigator, question: String) -> Reply {
    if question.trim().is_empty() {
        return Reply::Idle;
    }
    // Opening the exchange here claims the transcript before the task is spawned.
    let exchange = {
        let mut transcript = app_state.transcript.lock().await;
        match Exchange::begin(&mut transcript, &question) {
            Some(exchange) => exchange,
            None => return Reply::Notice(STILL_ANSWERING.to_string()),
        }
    };
    let placeholder = exchange.placeholder();
    if nav.tab() != Tab::AiChat || *nav.page() != Page::Main {
        nav.switch_tab(Tab::AiChat);
    }

    let task = {
        let app_state = app_state.clone();
        tokio::spawn(async move {
            ask_process(app_state, exchange, question).await;
        })
    };
    Reply::Streaming { task, placeholder }
}

/// The item at a 1-based position.
fn nth<T>(items: &[T], index: usize) -> Option<&T> {
    index.checked_sub(1).and_then(|i| items.get(i))
}

async fn render(app_state: &Arc<AppState>, nav: &Navigator) -> Reply {
    let pets = app_state.registry.lock().await.list().to_vec();
    let transcript = app_state.transcript.lock().await;
    Reply::Screen(view::screen(nav.tab(), nav.page(), &pets, &transcript))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::protocol::PetForm;
    use async_trait::async_trait;
    use bytes::Bytes;
    use pet_advisor_core::{
        domain::{AskRequest, Species},
        ports::{AdvisoryService, ByteStream, PortResult},
        registry::PetRegistry,
        transcript::Transcript,
    };

    struct CannedAdvisor;

    #[async_trait]
    impl AdvisoryService for CannedAdvisor {
        async fn ask(&self, _request: &AskRequest) -> PortResult<ByteStream> {
            let body = "data: {\"content\":\"可以少量食用\"}\n\ndata: {\"done\":true}\n\n";
            Ok(Box::pin(futures::stream::iter([Ok(Bytes::from(body))])))
        }
    }

    fn app_state() -> Arc<AppState> {
        Arc::new(AppState::new(Arc::new(CannedAdvisor)))
    }

    fn screen(reply: Reply) -> String {
        match reply {
            Reply::Screen(text) => text,
            other => panic!("expected a screen, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn search_opens_food_detail_and_back_returns() {
        let state = app_state();
        let mut nav = Navigator::new();

        let text = screen(handle_intent(&state, &mut nav, Intent::Search(" 葡萄 ".into())).await);
        assert_eq!(nav.page(), &Page::FoodDetail("葡萄".into()));
        assert!(text.contains("肾衰竭"));

        handle_intent(&state, &mut nav, Intent::Back).await;
        assert_eq!(nav.page(), &Page::Main);
        assert_eq!(nav.tab(), Tab::Search);
    }

    #[tokio::test]
    async fn blank_search_is_ignored() {
        let state = app_state();
        let mut nav = Navigator::new();
        let reply = handle_intent(&state, &mut nav, Intent::Search("  ".into())).await;
        assert!(matches!(reply, Reply::Idle));
        assert_eq!(nav.page(), &Page::Main);
    }

    #[tokio::test]
    async fn add_then_edit_then_delete_pet() {
        let state = app_state();
        let mut nav = Navigator::new();

        handle_intent(&state, &mut nav, Intent::AddPet).await;
        let form = PetForm::parse("name=小黑 species=猫 breed=狸花").unwrap();
        handle_intent(&state, &mut nav, Intent::SavePet(form)).await;
        assert_eq!(nav.tab(), Tab::Profile);
        assert_eq!(state.registry.lock().await.len(), 3);

        handle_intent(&state, &mut nav, Intent::EditPet(3)).await;
        let form = PetForm::parse("age=1岁").unwrap();
        handle_intent(&state, &mut nav, Intent::SavePet(form)).await;
        {
            let registry = state.registry.lock().await;
            let pet = &registry.list()[2];
            assert_eq!(pet.age, "1岁");
            assert_eq!(pet.species, Species::Cat);
        }

        handle_intent(&state, &mut nav, Intent::EditPet(3)).await;
        handle_intent(&state, &mut nav, Intent::DeletePet).await;
        assert_eq!(state.registry.lock().await.len(), 2);
        assert_eq!(nav.page(), &Page::Main);
    }

    #[tokio::test]
    async fn invalid_pet_is_rejected_without_change() {
        let state = app_state();
        let mut nav = Navigator::new();
        handle_intent(&state, &mut nav, Intent::AddPet).await;

        let form = PetForm::parse("name=小黑").unwrap();
        let reply = handle_intent(&state, &mut nav, Intent::SavePet(form)).await;
        assert!(matches!(reply, Reply::Notice(_)));
        assert_eq!(nav.page(), &Page::AddPet);
        assert_eq!(state.registry.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn scan_is_a_stub() {
        let state = app_state();
        let mut nav = Navigator::new();
        let reply = handle_intent(&state, &mut nav, Intent::ScanIngredients).await;
        assert!(matches!(reply, Reply::Notice(text) if text == SCAN_UNAVAILABLE));
    }

    #[tokio::test]
    async fn quick_question_streams_into_the_transcript() {
        let state = app_state();
        let mut nav = Navigator::new();

        let Reply::Streaming { task, placeholder } =
            handle_intent(&state, &mut nav, Intent::QuickQuestion(1)).await
        else {
            panic!("expected a streaming reply");
        };
        assert_eq!(
            state.transcript.lock().await.in_flight_placeholder(),
            Some(placeholder)
        );
        task.await.unwrap();
        assert_eq!(nav.tab(), Tab::AiChat);

        {
            let transcript = state.transcript.lock().await;
            assert_eq!(transcript.len(), 3);
            assert_eq!(transcript.messages()[1].content(), "狗狗可以吃西瓜吗？");
            assert_eq!(
                transcript.get(placeholder).unwrap().content(),
                "可以少量食用"
            );
            assert_eq!(transcript.in_flight_placeholder(), None);
        }

        let reply = handle_intent(&state, &mut nav, Intent::QuickQuestion(2)).await;
        assert!(matches!(reply, Reply::Notice(_)));
    }

    #[tokio::test]
    async fn question_is_refused_until_the_spawned_answer_finishes() {
        let state = app_state();
        let mut nav = Navigator::new();

        // The spawned task has not run yet, but the exchange is already open.
        let Reply::Streaming { task, placeholder } =
            handle_intent(&state, &mut nav, Intent::Ask("葡萄能吃吗".into())).await
        else {
            panic!("expected a streaming reply");
        };
        let reply = handle_intent(&state, &mut nav, Intent::Ask("洋葱呢".into())).await;
        assert!(matches!(reply, Reply::Notice(text) if text == STILL_ANSWERING));
        assert_eq!(state.transcript.lock().await.len(), 3);

        task.await.unwrap();
        let transcript = state.transcript.lock().await;
        assert_eq!(transcript.last().unwrap().id(), placeholder);
        assert!(!transcript.is_in_flight());
    }

    #[tokio::test]
    async fn transcript_survives_tab_switches() {
        let state = Arc::new(AppState::with_parts(
            Arc::new(CannedAdvisor),
            PetRegistry::new(),
            Transcript::with_greeting(),
        ));
        let mut nav = Navigator::new();

        if let Reply::Streaming { task, .. } =
            handle_intent(&state, &mut nav, Intent::Ask("西瓜能吃吗".into())).await
        {
            task.await.unwrap();
        }
        handle_intent(&state, &mut nav, Intent::SwitchTab(Tab::Profile)).await;
        let text = screen(handle_intent(&state, &mut nav, Intent::SwitchTab(Tab::AiChat)).await);
        assert!(text.contains("西瓜能吃吗"));
        assert!(text.contains("可以少量食用"));
    }
}
