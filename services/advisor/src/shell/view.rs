//! services/advisor/src/shell/view.rs
//!
//! Plain-text rendering of every screen, plus the incremental printer used while
//! an answer streams in.

use crate::shell::state::{Page, Tab};
use pet_advisor_core::{
    catalog::{self, SafetyDetails, SafetyLevel, FEATURED_DANGEROUS_FOODS},
    domain::{PetProfile, Role, Species, COMMON_ALLERGIES},
    transcript::{Transcript, QUICK_QUESTIONS},
};

const DISCLAIMER: &str = "AI建议仅供参考，重大问题请咨询专业兽医";
const THINKING: &str = "正在思考...";

/// Renders the screen for `tab` and `page`.
pub fn screen(tab: Tab, page: &Page, pets: &[PetProfile], transcript: &Transcript) -> String {
    let body = match page {
        Page::Main => match tab {
            Tab::Search => search_home(),
            Tab::AiChat => chat(transcript),
            Tab::Profile => profile(pets),
        },
        Page::FoodDetail(name) => food_detail(name),
        Page::AddPet => pet_form("添加宠物", None),
        Page::EditPet(id) => {
            let pet = pets.iter().find(|p| p.id == Some(*id));
            pet_form("编辑宠物", pet)
        }
    };
    format!("{}\n{}", body, nav_bar(tab))
}

pub fn nav_bar(active: Tab) -> String {
    let items: Vec<String> = Tab::ALL
        .iter()
        .map(|tab| {
            if *tab == active {
                format!("[{}]", tab.label())
            } else {
                format!(" {} ", tab.label())
            }
        })
        .collect();
    format!("────────────\n{}", items.join(" | "))
}

pub fn search_home() -> String {
    let mut lines = vec![
        "🐾 宠物食物安全查询".to_string(),
        "输入食物名称，如：葡萄、巧克力".to_string(),
        "/scan 拍照识别配料表".to_string(),
        String::new(),
        "⚠️ 热门危险食物".to_string(),
    ];
    for (i, food) in FEATURED_DANGEROUS_FOODS.iter().enumerate() {
        lines.push(format!(
            "  {}. {} {} [{}] {}",
            i + 1,
            food.icon,
            food.name,
            food.level,
            food.blurb
        ));
    }
    lines.push("输入 /food <编号> 查看详情".to_string());
    lines.join("\n")
}

pub fn food_detail(name: &str) -> String {
    let record = catalog::lookup(name);
    let verdict = if record.level.is_dangerous() {
        "禁止食用"
    } else if record.level == SafetyLevel::Safe {
        "可以食用"
    } else {
        "安全性未知"
    };

    let mut lines = vec![
        format!("{} {}", record.icon, name.trim()),
        format!("风险等级：{}（{}）", record.level, verdict),
        String::new(),
        "基本信息".to_string(),
        format!("  {}", record.description),
    ];

    match &record.details {
        SafetyDetails::Hazard(hazard) => {
            lines.push("毒性物质".to_string());
            lines.push(format!("  {}", hazard.toxic_substance));
            lines.push("中毒症状".to_string());
            lines.extend(hazard.symptoms.iter().map(|s| format!("  • {}", s)));
            lines.push(format!("  {}", hazard.dosage));
            lines.push("紧急处理".to_string());
            lines.extend(
                hazard
                    .first_aid
                    .iter()
                    .enumerate()
                    .map(|(i, step)| format!("  {}. {}", i + 1, step)),
            );
            lines.push("安全替代品".to_string());
            lines.push(format!("  {}", hazard.alternatives.join("、")));
        }
        SafetyDetails::Feeding(feeding) => {
            lines.push("营养益处".to_string());
            lines.extend(feeding.benefits.iter().map(|b| format!("  • {}", b)));
            lines.push("喂食注意".to_string());
            lines.extend(feeding.precautions.iter().map(|p| format!("  • {}", p)));
            lines.push("建议份量".to_string());
            lines.push(format!("  {}", feeding.serving_size));
            lines.push(format!("适用：{}", feeding.suitable_for.join("、")));
        }
        SafetyDetails::Unknown { recommendation } => {
            lines.push(format!("  {}", recommendation));
        }
    }

    lines.push(String::new());
    lines.push("紧急情况？".to_string());
    lines.push("  如果您的宠物误食了危险食物，请立即联系兽医或宠物急救中心".to_string());
    lines.push("输入 /back 返回".to_string());
    lines.join("\n")
}

pub fn profile(pets: &[PetProfile]) -> String {
    let mut lines = vec!["👤 宠物主人".to_string(), String::new(), "我的爱宠".to_string()];
    if pets.is_empty() {
        lines.push("  还没有宠物，输入 /add 添加".to_string());
    }
    for (i, pet) in pets.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, pet_summary(pet)));
        if !pet.allergies.is_empty() {
            lines.push(format!("     过敏：{}", pet.allergies.join("、")));
        }
    }
    lines.push("输入 /add 添加宠物，/edit <编号> 编辑".to_string());
    lines.join("\n")
}

fn pet_summary(pet: &PetProfile) -> String {
    let mut parts = vec![pet.species.label().to_string(), pet.breed.clone()];
    if !pet.age.is_empty() {
        parts.push(pet.age.clone());
    }
    if !pet.weight.is_empty() {
        parts.push(pet.weight.clone());
    }
    format!("{} {}（{}）", pet.avatar, pet.name, parts.join(" · "))
}

pub fn pet_form(title: &str, pet: Option<&PetProfile>) -> String {
    let mut lines = vec![title.to_string()];
    match pet {
        Some(pet) => {
            lines.push(format!("  当前：{}", pet_summary(pet)));
            if !pet.allergies.is_empty() {
                lines.push(format!("  过敏：{}", pet.allergies.join("、")));
            }
        }
        None => lines.push("  例如：/save name=旺财 species=狗 breed=金毛 age=3岁 weight=5kg".to_string()),
    }

    let species: Vec<&str> = Species::ALL.iter().map(|s| s.label()).collect();
    lines.push(format!("  类型：{}", species.join(" / ")));
    let avatar_species = pet.map(|p| p.species).unwrap_or_default();
    lines.push(format!("  头像：{}", avatar_species.avatar_choices().join(" ")));
    lines.push(format!("  常见过敏源：{}", COMMON_ALLERGIES.join("、")));
    lines.push("  字段：name species breed age weight avatar allergies（逗号分隔）".to_string());
    if pet.is_some() {
        lines.push("输入 /save 保存，/delete 删除，/back 返回".to_string());
    } else {
        lines.push("输入 /save 保存，/back 返回".to_string());
    }
    lines.join("\n")
}

pub fn chat(transcript: &Transcript) -> String {
    let mut lines = vec!["🤖 AI宠物营养顾问".to_string(), String::new()];
    let streaming = transcript.in_flight_placeholder();
    for message in transcript.messages() {
        match message.role() {
            Role::User => lines.push(format!("🧑 {}", message.content())),
            Role::Assistant if Some(message.id()) == streaming => {
                if message.content().is_empty() {
                    lines.push(format!("🤖 {}", THINKING));
                } else {
                    lines.push(format!("🤖 {}", message.content()));
                    if transcript.is_loading() {
                        lines.push(format!("   {}", THINKING));
                    }
                }
            }
            Role::Assistant => lines.push(format!("🤖 {}", message.content())),
        }
    }
    if transcript.offers_quick_questions() {
        lines.push(String::new());
        lines.push("快捷问题".to_string());
        for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, question));
        }
        lines.push("输入 /quick <编号> 直接提问".to_string());
    }
    lines.push(String::new());
    lines.push(DISCLAIMER.to_string());
    lines.join("\n")
}

pub fn help() -> String {
    [
        "指令：",
        "  /tab search|chat|profile  切换页面",
        "  /search <食物>            查询食物安全",
        "  /food <编号>              查看热门危险食物",
        "  /scan                     拍照识别配料表",
        "  /pets                     重新显示当前页面",
        "  /add  /edit <编号>        添加或编辑宠物",
        "  /save key=value ...       保存宠物资料",
        "  /delete                   删除正在编辑的宠物",
        "  /ask <问题>  /quick <编号> 向AI提问",
        "  /back                     返回",
        "  /quit                     退出",
        "在查询页直接输入食物名称，在AI问答页直接输入问题。",
    ]
    .join("\n")
}

//=========================================================================================
// Streaming Output
//=========================================================================================

/// Tracks how much of a streaming answer has been printed and yields what is new.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    printed: String,
}

impl StreamPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text to print so the terminal shows `content`, or `None` when
    /// nothing changed. A rewritten answer (e.g. a `formatted` replacement) is
    /// printed again in full on a new line.
    pub fn update(&mut self, content: &str) -> Option<String> {
        if content == self.printed {
            return None;
        }
        let out = match content.strip_prefix(self.printed.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => format!("\n🤖 {}", content),
        };
        self.printed = content.to_string();
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pet_advisor_core::{events::StreamEvent, exchange::Exchange, registry::PetRegistry};

    #[test]
    fn food_detail_shows_hazard_sections() {
        let text = food_detail(" 巧克力 ");
        assert!(text.contains("可可碱（Theobromine）"));
        assert!(text.contains("紧急处理"));
        assert!(text.contains("高危"));
    }

    #[test]
    fn verdict_follows_the_safety_level() {
        assert!(food_detail("洋葱").contains("高危（禁止食用）"));
        let melon = food_detail("西瓜");
        assert!(melon.contains("安全（可以食用）"));
        assert!(melon.contains("营养益处"));
        assert!(food_detail("榴莲").contains("未知（安全性未知）"));
    }

    #[test]
    fn streaming_answer_keeps_the_thinking_line_until_formatted() {
        let mut transcript = Transcript::with_greeting();
        let mut exchange = Exchange::begin(&mut transcript, "葡萄能吃吗").unwrap();
        exchange.apply(StreamEvent::ContentDelta("不能".into()), &mut transcript);
        let text = chat(&transcript);
        assert!(text.contains("🤖 不能\n   正在思考..."));

        exchange.apply(StreamEvent::Formatted("不能，葡萄有毒。".into()), &mut transcript);
        let text = chat(&transcript);
        assert!(text.contains("🤖 不能，葡萄有毒。"));
        assert!(!text.contains(THINKING));
    }

    #[test]
    fn unknown_food_recommends_a_vet() {
        let text = food_detail("榴莲");
        assert!(text.contains("暂无该食物的详细安全信息"));
        assert!(text.contains("建议咨询专业兽医"));
    }

    #[test]
    fn chat_offers_quick_questions_only_at_start() {
        let text = chat(&Transcript::with_greeting());
        assert!(text.contains("狗狗可以吃西瓜吗？"));
        assert!(text.contains(DISCLAIMER));

        let mut transcript = Transcript::with_greeting();
        Exchange::begin(&mut transcript, "葡萄能吃吗").unwrap();
        let text = chat(&transcript);
        assert!(!text.contains("快捷问题"));
        assert!(text.contains(THINKING));
    }

    #[test]
    fn profile_lists_pets_in_order() {
        let registry = PetRegistry::with_sample_pets();
        let text = profile(registry.list());
        let first = text.find("旺财").unwrap();
        let second = text.find("咪咪").unwrap();
        assert!(first < second);
        assert!(text.contains("牛肉、小麦"));
    }

    #[test]
    fn nav_bar_marks_active_tab() {
        assert!(nav_bar(Tab::AiChat).contains("[AI问答]"));
    }

    #[test]
    fn stream_printer_prints_only_new_text() {
        let mut printer = StreamPrinter::new();
        assert_eq!(printer.update(""), None);
        assert_eq!(printer.update("葡萄").as_deref(), Some("葡萄"));
        assert_eq!(printer.update("葡萄有毒").as_deref(), Some("有毒"));
        assert_eq!(printer.update("葡萄有毒"), None);
        assert_eq!(
            printer.update("Full answer.").as_deref(),
            Some("\n🤖 Full answer.")
        );
    }
}
