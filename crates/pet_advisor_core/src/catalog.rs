//! crates/pet_advisor_core/src/catalog.rs
//!
//! Static food safety tables and their lookup.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyLevel {
    High,
    Medium,
    Safe,
    Unknown,
}

impl SafetyLevel {
    pub fn label(self) -> &'static str {
        match self {
            SafetyLevel::High => "高危",
            SafetyLevel::Medium => "中危",
            SafetyLevel::Safe => "安全",
            SafetyLevel::Unknown => "未知",
        }
    }

    pub fn is_dangerous(self) -> bool {
        matches!(self, SafetyLevel::High | SafetyLevel::Medium)
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What is known about a toxic food.
#[derive(Debug, PartialEq, Eq)]
pub struct HazardInfo {
    pub toxic_substance: &'static str,
    pub symptoms: &'static [&'static str],
    pub dosage: &'static str,
    pub first_aid: &'static [&'static str],
    pub alternatives: &'static [&'static str],
}

/// Feeding guidance for a safe food.
#[derive(Debug, PartialEq, Eq)]
pub struct FeedingInfo {
    pub benefits: &'static [&'static str],
    pub precautions: &'static [&'static str],
    pub serving_size: &'static str,
    pub suitable_for: &'static [&'static str],
}

#[derive(Debug, PartialEq, Eq)]
pub enum SafetyDetails {
    Hazard(HazardInfo),
    Feeding(FeedingInfo),
    Unknown { recommendation: &'static str },
}

#[derive(Debug, PartialEq, Eq)]
pub struct SafetyRecord {
    pub level: SafetyLevel,
    pub icon: &'static str,
    pub description: &'static str,
    pub details: SafetyDetails,
}

/// An entry of the "popular dangerous foods" list on the search screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturedFood {
    pub name: &'static str,
    pub level: SafetyLevel,
    pub icon: &'static str,
    pub blurb: &'static str,
}

pub const FEATURED_DANGEROUS_FOODS: [FeaturedFood; 6] = [
    FeaturedFood { name: "巧克力", level: SafetyLevel::High, icon: "🍫", blurb: "含可可碱，对宠物有毒" },
    FeaturedFood { name: "葡萄", level: SafetyLevel::High, icon: "🍇", blurb: "可能导致肾衰竭" },
    FeaturedFood { name: "洋葱", level: SafetyLevel::High, icon: "🧅", blurb: "破坏红细胞，引起贫血" },
    FeaturedFood { name: "木糖醇", level: SafetyLevel::High, icon: "🍬", blurb: "导致低血糖、肝衰竭" },
    FeaturedFood { name: "牛油果", level: SafetyLevel::Medium, icon: "🥑", blurb: "含毒性物质persin" },
    FeaturedFood { name: "生鸡蛋", level: SafetyLevel::Medium, icon: "🥚", blurb: "可能含有沙门氏菌" },
];

static DANGEROUS_FOODS: [(&str, SafetyRecord); 3] = [
    (
        "巧克力",
        SafetyRecord {
            level: SafetyLevel::High,
            icon: "🍫",
            description: "巧克力对犬猫有剧毒",
            details: SafetyDetails::Hazard(HazardInfo {
                toxic_substance: "可可碱（Theobromine）",
                symptoms: &["呕吐", "腹泻", "心跳加速", "癫痫", "严重时可致死"],
                dosage: "每公斤体重20mg可可碱即可引起中毒",
                first_aid: &[
                    "立即停止喂食",
                    "尽快联系兽医",
                    "如刚食用，可在兽医指导下催吐",
                    "送医治疗，可能需要洗胃",
                ],
                alternatives: &["宠物专用零食", "胡萝卜条", "苹果片（去籽）"],
            }),
        },
    ),
    (
        "葡萄",
        SafetyRecord {
            level: SafetyLevel::High,
            icon: "🍇",
            description: "葡萄和葡萄干可能导致犬只急性肾衰竭",
            details: SafetyDetails::Hazard(HazardInfo {
                toxic_substance: "未知毒性物质（研究中）",
                symptoms: &["呕吐", "腹泻", "食欲不振", "腹痛", "少尿或无尿", "肾衰竭"],
                dosage: "少量即可能引起中毒，个体差异大",
                first_aid: &[
                    "立即停止喂食",
                    "紧急就医，越早越好",
                    "可能需要输液治疗",
                    "密切监测肾功能",
                ],
                alternatives: &["蓝莓", "西瓜", "香蕉"],
            }),
        },
    ),
    (
        "洋葱",
        SafetyRecord {
            level: SafetyLevel::High,
            icon: "🧅",
            description: "洋葱会破坏宠物的红细胞，导致贫血",
            details: SafetyDetails::Hazard(HazardInfo {
                toxic_substance: "硫化物",
                symptoms: &["贫血", "虚弱", "呼吸急促", "尿液变红", "牙龈苍白"],
                dosage: "体重的0.5%即可引起中毒",
                first_aid: &["立即停止喂食", "联系兽医", "可能需要输血治疗", "补充营养支持"],
                alternatives: &["南瓜", "胡萝卜", "西兰花（少量）"],
            }),
        },
    ),
];

static SAFE_FOODS: [(&str, SafetyRecord); 2] = [
    (
        "苹果",
        SafetyRecord {
            level: SafetyLevel::Safe,
            icon: "🍎",
            description: "苹果是安全的宠物零食，富含维生素和纤维",
            details: SafetyDetails::Feeding(FeedingInfo {
                benefits: &["富含维生素C和A", "提供膳食纤维", "帮助清洁牙齿"],
                precautions: &[
                    "必须去除果核和种子（含氰化物）",
                    "适量喂食，避免糖分过多",
                    "切成小块，防止窒息",
                ],
                serving_size: "每天1-2片，根据宠物体型调整",
                suitable_for: &["狗", "猫（少量）"],
            }),
        },
    ),
    (
        "西瓜",
        SafetyRecord {
            level: SafetyLevel::Safe,
            icon: "🍉",
            description: "西瓜水分充足，适合夏季喂食",
            details: SafetyDetails::Feeding(FeedingInfo {
                benefits: &["补充水分", "富含维生素A和C", "低热量"],
                precautions: &["去除种子和外皮", "不要过量，可能引起腹泻", "切成小块"],
                serving_size: "少量作为零食，不超过总食量的10%",
                suitable_for: &["狗", "猫"],
            }),
        },
    ),
];

static UNKNOWN_FOOD: SafetyRecord = SafetyRecord {
    level: SafetyLevel::Unknown,
    icon: "🔍",
    description: "暂无该食物的详细安全信息",
    details: SafetyDetails::Unknown {
        recommendation: "建议咨询专业兽医",
    },
};

/// Looks up the safety record for a food by exact (trimmed) name.
/// Foods in neither table get the generic "unknown" record.
pub fn lookup(food_name: &str) -> &'static SafetyRecord {
    let name = food_name.trim();
    DANGEROUS_FOODS
        .iter()
        .chain(SAFE_FOODS.iter())
        .find(|(known, _)| *known == name)
        .map(|(_, record)| record)
        .unwrap_or(&UNKNOWN_FOOD)
}
