//! Diagnosis input model.
//!
//! A diagnosis is a primary organ finding plus optional secondary findings
//! and constitution references, each scored 0–100. The minimum score across
//! everything selected drives the strategy banner shown on the report.

use serde::{Deserialize, Serialize};

/// Organ system names offered by the diagnosis form.
pub const ORGAN_NAMES: [&str; 12] = [
    "膀胱虛弱",
    "膽虛",
    "小腸虛弱",
    "大腸虛弱",
    "胃虛",
    "腎虛",
    "肺虛",
    "脾虛",
    "肝虛",
    "心虛",
    "津液停聚",
    "津液虧虛",
];

/// TCM constitution type names.
pub const CONSTITUTION_NAMES: [&str; 10] = [
    "平和型",
    "氣虛型",
    "陽虛型",
    "陰虛型",
    "痰濕型",
    "濕熱型",
    "血瘀型",
    "氣鬱型",
    "特稟型",
    "血虛型",
];

/// One named finding with its 0–100 score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u8,
}

impl ScoreEntry {
    pub fn new(name: impl Into<String>, score: u8) -> Self {
        ScoreEntry {
            name: name.into(),
            score,
        }
    }
}

/// Severity band derived from the lowest score in the diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyLevel {
    /// Minimum score below 60.
    Severe,
    /// Minimum score 60–80.
    NeedsCare,
    /// Minimum score above 80.
    Good,
}

impl StrategyLevel {
    pub fn from_min_score(min_score: u8) -> Self {
        if min_score < 60 {
            StrategyLevel::Severe
        } else if min_score <= 80 {
            StrategyLevel::NeedsCare
        } else {
            StrategyLevel::Good
        }
    }

    /// Banner text shown on the report header.
    pub fn text(self) -> &'static str {
        match self {
            StrategyLevel::Severe => "嚴重 (強化修復 + 密集調理)",
            StrategyLevel::NeedsCare => "需調理 (溫和調理 + 鞏固)",
            StrategyLevel::Good => "良好 (基礎保養 + 維持)",
        }
    }

    /// Banner colour, as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            StrategyLevel::Severe => "#c0392b",
            StrategyLevel::NeedsCare => "#e67e22",
            StrategyLevel::Good => "#27ae60",
        }
    }
}

/// The full diagnosis a report is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisInput {
    pub primary: ScoreEntry,
    #[serde(default)]
    pub secondary: Vec<ScoreEntry>,
    #[serde(default)]
    pub constitutions: Vec<ScoreEntry>,
}

impl DiagnosisInput {
    pub fn new(primary: ScoreEntry) -> Self {
        DiagnosisInput {
            primary,
            secondary: Vec::new(),
            constitutions: Vec::new(),
        }
    }

    /// Lowest score across the primary, secondary and constitution entries.
    pub fn min_score(&self) -> u8 {
        self.secondary
            .iter()
            .chain(&self.constitutions)
            .map(|e| e.score)
            .fold(self.primary.score, u8::min)
    }

    pub fn strategy(&self) -> StrategyLevel {
        StrategyLevel::from_min_score(self.min_score())
    }

    /// One-line summary shown on the report and stored with the record,
    /// e.g. `首要：脾虛(55分) | 次要：胃虛(70分) | 參考體質：濕熱型`.
    pub fn summary(&self) -> String {
        let secondary = if self.secondary.is_empty() {
            "無".to_string()
        } else {
            self.secondary
                .iter()
                .map(|e| format!("{}({}分)", e.name, e.score))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let constitutions = if self.constitutions.is_empty() {
            "無".to_string()
        } else {
            self.constitutions
                .iter()
                .map(|e| e.name.clone())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "首要：{}({}分) | 次要：{} | 參考體質：{}",
            self.primary.name, self.primary.score, secondary, constitutions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_bands_split_at_60_and_80() {
        assert_eq!(StrategyLevel::from_min_score(0), StrategyLevel::Severe);
        assert_eq!(StrategyLevel::from_min_score(59), StrategyLevel::Severe);
        assert_eq!(StrategyLevel::from_min_score(60), StrategyLevel::NeedsCare);
        assert_eq!(StrategyLevel::from_min_score(80), StrategyLevel::NeedsCare);
        assert_eq!(StrategyLevel::from_min_score(81), StrategyLevel::Good);
        assert_eq!(StrategyLevel::from_min_score(100), StrategyLevel::Good);
    }

    #[test]
    fn min_score_considers_every_entry() {
        let mut input = DiagnosisInput::new(ScoreEntry::new("脾虛", 75));
        assert_eq!(input.min_score(), 75);
        input.secondary.push(ScoreEntry::new("胃虛", 82));
        input.constitutions.push(ScoreEntry::new("濕熱型", 58));
        assert_eq!(input.min_score(), 58);
        assert_eq!(input.strategy(), StrategyLevel::Severe);
    }

    #[test]
    fn summary_uses_none_markers_for_missing_sections() {
        let input = DiagnosisInput::new(ScoreEntry::new("腎虛", 66));
        assert_eq!(input.summary(), "首要：腎虛(66分) | 次要：無 | 參考體質：無");
    }

    #[test]
    fn summary_lists_all_entries() {
        let input = DiagnosisInput {
            primary: ScoreEntry::new("脾虛", 55),
            secondary: vec![ScoreEntry::new("胃虛", 70), ScoreEntry::new("肝虛", 65)],
            constitutions: vec![ScoreEntry::new("濕熱型", 60)],
        };
        assert_eq!(
            input.summary(),
            "首要：脾虛(55分) | 次要：胃虛(70分), 肝虛(65分) | 參考體質：濕熱型"
        );
    }
}
