use super::user::Currency;
use rust_decimal::Decimal;
use serde::Serialize;

/// What a quest asks for. Every requirement is measured on approved stats
/// except `TrackedHours`, which comes from the time-tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "camelCase")]
pub enum QuestRequirement {
    ApprovedDevlogs(u32),
    MaxStreak(u32),
    ApprovedHours(Decimal),
    ApprovedArtHours(Decimal),
    TrackedHours(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestReward {
    pub currency: Currency,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quest {
    pub id: &'static str,
    pub title: &'static str,
    pub requirement: QuestRequirement,
    pub reward: QuestReward,
}

fn quest(
    id: &'static str,
    title: &'static str,
    requirement: QuestRequirement,
    currency: Currency,
    amount: i64,
) -> Quest {
    Quest {
        id,
        title,
        requirement,
        reward: QuestReward { currency, amount },
    }
}

/// All quests offered on the platform
pub fn catalog() -> Vec<Quest> {
    use QuestRequirement::*;

    vec![
        quest("first-devlog", "Post your first devlog", ApprovedDevlogs(1), Currency::Coins, 5),
        quest("streak-3", "Three day streak", MaxStreak(3), Currency::Coins, 10),
        quest("streak-7", "Week-long streak", MaxStreak(7), Currency::Coins, 25),
        quest(
            "hours-10",
            "Log 10 approved hours",
            ApprovedHours(Decimal::from(10)),
            Currency::Coins,
            20,
        ),
        quest(
            "hours-50",
            "Log 50 approved hours",
            ApprovedHours(Decimal::from(50)),
            Currency::Stellarships,
            1,
        ),
        quest(
            "artist-5",
            "Log 5 approved art hours",
            ApprovedArtHours(Decimal::from(5)),
            Currency::Paintchips,
            10,
        ),
        quest(
            "tracked-25",
            "Track 25 hours of coding",
            TrackedHours(Decimal::from(25)),
            Currency::Coins,
            15,
        ),
    ]
}

pub fn find_quest(id: &str) -> Option<Quest> {
    catalog().into_iter().find(|q| q.id == id)
}
