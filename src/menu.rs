//! Two-week menu normaliser.
//!
//! The model is asked for a strict `Week → Day → meal` object, but real
//! responses wander: day entries appear at the top level, under week
//! wrappers with arbitrary names, as free text with inline meal labels, or
//! duplicated across several shapes at once. This module flattens whatever
//! arrived into day numbers, merges duplicates without letting an empty
//! field clobber a populated one, and rebuilds the canonical two-week view.
//!
//! Day keys are recognised case-insensitively anywhere in a key
//! (`day\s*(\d{1,2})`, value 1–31). Days 1–7 become `Week 1 (啟動期)`,
//! 8–14 become `Week 2 (鞏固期)`; an out-of-range day number is parsed but
//! lands in no bucket. If nothing at all resolves to a day, the whole raw
//! value is rendered as Day 1 so the report still shows something.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::report::normalize_text;

pub const MEAL_PLACEHOLDER: &str = "—";
pub const WEEK_ONE_LABEL: &str = "Week 1 (啟動期)";
pub const WEEK_TWO_LABEL: &str = "Week 2 (鞏固期)";

const MEAL_LABELS: [&str; 3] = ["早餐", "午餐", "晚餐"];

static RE_DAY_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)day\s*(\d{1,2})").unwrap());
static RE_MEAL_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(早餐|午餐|晚餐)\s*[:：]\s*").unwrap());

// ── Types ────────────────────────────────────────────────────────────────

/// One meal slot. Plain text and detailed (content + calories) forms both
/// occur in model output and both are preserved on re-serialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Meal {
    Text(String),
    Detailed { content: String, calories: String },
}

impl Meal {
    fn empty() -> Self {
        Meal::Text(String::new())
    }

    fn placeholder() -> Self {
        Meal::Text(MEAL_PLACEHOLDER.to_string())
    }

    /// Empty means "nothing worth keeping": blank or placeholder text, or a
    /// detailed entry with neither content nor calories.
    pub fn is_empty(&self) -> bool {
        match self {
            Meal::Text(text) => {
                let trimmed = text.trim();
                trimmed.is_empty() || trimmed == MEAL_PLACEHOLDER
            }
            Meal::Detailed { content, calories } => content.is_empty() && calories.is_empty(),
        }
    }
}

impl Serialize for Meal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Meal::Text(text) => serializer.serialize_str(text),
            Meal::Detailed { content, calories } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("內容", content)?;
                map.serialize_entry("熱量", calories)?;
                map.end()
            }
        }
    }
}

/// The three meal slots of one day, in fixed breakfast/lunch/dinner order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMeals {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
}

impl DayMeals {
    fn empty() -> Self {
        DayMeals {
            breakfast: Meal::empty(),
            lunch: Meal::empty(),
            dinner: Meal::empty(),
        }
    }

    fn slot_mut(&mut self, label: &str) -> &mut Meal {
        match label {
            "早餐" => &mut self.breakfast,
            "午餐" => &mut self.lunch,
            _ => &mut self.dinner,
        }
    }

    fn slot(&self, label: &str) -> &Meal {
        match label {
            "早餐" => &self.breakfast,
            "午餐" => &self.lunch,
            _ => &self.dinner,
        }
    }
}

impl Serialize for DayMeals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("早餐", &self.breakfast)?;
        map.serialize_entry("午餐", &self.lunch)?;
        map.serialize_entry("晚餐", &self.dinner)?;
        map.end()
    }
}

/// One day in the plan, keyed `Day {number}` when serialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPlan {
    pub number: u8,
    pub meals: DayMeals,
}

/// A labelled week holding its days in ascending day order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekBucket {
    pub label: &'static str,
    pub days: Vec<DayPlan>,
}

impl Serialize for WeekBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for day in &self.days {
            map.serialize_entry(&format!("Day {}", day.number), &day.meals)?;
        }
        map.end()
    }
}

/// The normalised two-week plan. Serialises as the canonical
/// `{"Week 1 (啟動期)": {"Day 1": …}, "Week 2 (鞏固期)": {…}}` object with
/// week buckets and days in order; an empty bucket is omitted entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeekMenu {
    pub weeks: Vec<WeekBucket>,
}

impl Serialize for WeekMenu {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.weeks.len()))?;
        for week in &self.weeks {
            map.serialize_entry(week.label, week)?;
        }
        map.end()
    }
}

// ── Parsing helpers ──────────────────────────────────────────────────────

/// Recognise a day number (1–31) anywhere inside a key.
fn parse_day_number(key: &str) -> Option<u8> {
    let captures = RE_DAY_KEY.captures(key)?;
    let day: u8 = captures.get(1)?.as_str().parse().ok()?;
    if (1..=31).contains(&day) {
        Some(day)
    } else {
        None
    }
}

/// Pull `label: content` runs out of free text. Each meal label keeps its
/// first occurrence; content runs to the next label or end of text, with
/// list punctuation trimmed off both ends.
fn extract_meals_from_text(text: &str) -> [Option<String>; 3] {
    let source = text.trim();
    let mut extracted: [Option<String>; 3] = [None, None, None];

    let matches: Vec<(usize, usize, usize)> = RE_MEAL_LABEL
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(1)?.as_str();
            let slot = MEAL_LABELS.iter().position(|l| *l == label)?;
            Some((slot, whole.start(), whole.end()))
        })
        .collect();

    for (i, &(slot, _, content_start)) in matches.iter().enumerate() {
        if extracted[slot].is_some() {
            continue;
        }
        let content_end = matches
            .get(i + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(source.len());
        let content = source[content_start..content_end]
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '，' | ';' | '；'));
        if !content.is_empty() {
            extracted[slot] = Some(content.to_string());
        }
    }

    extracted
}

/// Coerce one meal value. An object carrying 內容/熱量 keeps the detailed
/// form (content falls back to the placeholder when only calories were
/// given); anything else becomes trimmed text.
fn normalize_meal_value(value: &Value) -> Meal {
    if value.is_object() {
        let content = value.get("內容").map(normalize_text).unwrap_or_default();
        let calories = value.get("熱量").map(normalize_text).unwrap_or_default();
        if !content.is_empty() || !calories.is_empty() {
            return Meal::Detailed {
                content: if content.is_empty() {
                    MEAL_PLACEHOLDER.to_string()
                } else {
                    content
                },
                calories,
            };
        }
    }
    Meal::Text(normalize_text(value))
}

/// Normalise one day entry (object or free text) into three filled slots.
/// Slots that stay empty after every recovery attempt get the placeholder.
fn normalize_day_meals(raw: &Value) -> DayMeals {
    let mut meals = DayMeals::empty();

    let apply_extracted = |meals: &mut DayMeals, source: &str| {
        let extracted = extract_meals_from_text(source);
        for (slot, label) in MEAL_LABELS.iter().enumerate() {
            if let Some(content) = &extracted[slot] {
                if meals.slot(label).is_empty() {
                    *meals.slot_mut(label) = Meal::Text(content.clone());
                }
            }
        }
    };

    match raw {
        Value::String(text) => {
            apply_extracted(&mut meals, text);
            if MEAL_LABELS.iter().all(|l| meals.slot(l).is_empty()) {
                meals.breakfast = Meal::Text(text.trim().to_string());
            }
        }
        Value::Object(map) => {
            for label in MEAL_LABELS {
                if let Some(value) = map.get(label) {
                    *meals.slot_mut(label) = normalize_meal_value(value);
                }
            }

            // Keys that are not meal labels may still carry meal text, e.g.
            // {"餐單": "早餐: 燕麥, 午餐: 雞胸"}. Scan "key value" first so
            // a label hiding in the key itself is caught too.
            for (key, value) in map {
                if MEAL_LABELS.contains(&key.as_str()) {
                    continue;
                }
                let value_text = value.as_str().unwrap_or("");
                let combined = format!("{key} {value_text}");
                apply_extracted(&mut meals, combined.trim());
                if !value_text.is_empty() {
                    apply_extracted(&mut meals, value_text);
                }
            }
        }
        _ => {}
    }

    for label in MEAL_LABELS {
        if meals.slot(label).is_empty() {
            *meals.slot_mut(label) = Meal::placeholder();
        }
    }

    meals
}

/// Merge a second sighting of the same day: a populated slot is never
/// overwritten, an empty one takes the incoming value.
fn merge_day_meals(base: DayMeals, incoming: DayMeals) -> DayMeals {
    let mut merged = base;
    for label in MEAL_LABELS {
        if merged.slot(label).is_empty() && !incoming.slot(label).is_empty() {
            *merged.slot_mut(label) = incoming.slot(label).clone();
        }
    }
    merged
}

// ── Entry point ──────────────────────────────────────────────────────────

/// Normalise whatever the model produced for `two_week_menu` into the
/// canonical two-week plan. Never fails.
pub fn normalize_menu(raw: &Value) -> WeekMenu {
    let mut days: BTreeMap<u8, DayMeals> = BTreeMap::new();

    let upsert_day = |days: &mut BTreeMap<u8, DayMeals>, number: u8, value: &Value| {
        let normalized = normalize_day_meals(value);
        match days.remove(&number) {
            Some(existing) => {
                days.insert(number, merge_day_meals(existing, normalized));
            }
            None => {
                days.insert(number, normalized);
            }
        }
    };

    if let Value::Object(map) = raw {
        for (top_key, top_value) in map {
            if let Some(day) = parse_day_number(top_key) {
                upsert_day(&mut days, day, top_value);
                continue;
            }

            let Value::Object(nested) = top_value else {
                continue;
            };

            // A non-day wrapper (usually a week heading). Day entries inside
            // it are lifted out; leftover fragments are pooled and attached
            // to the lowest day the wrapper mentioned.
            let mut nested_day_numbers: Vec<u8> = Vec::new();
            let mut stray_fragments: Vec<String> = Vec::new();

            for (nested_key, nested_value) in nested {
                if let Some(day) = parse_day_number(nested_key) {
                    nested_day_numbers.push(day);
                    upsert_day(&mut days, day, nested_value);
                } else {
                    let value_text = nested_value.as_str().unwrap_or("");
                    let fragment = format!("{nested_key} {value_text}");
                    let fragment = fragment.trim();
                    if !fragment.is_empty() {
                        stray_fragments.push(fragment.to_string());
                    }
                }
            }

            if let Some(&target) = nested_day_numbers.iter().min() {
                if !stray_fragments.is_empty() {
                    let base = days
                        .remove(&target)
                        .unwrap_or_else(|| normalize_day_meals(&Value::Object(Default::default())));
                    let incoming =
                        normalize_day_meals(&Value::String(stray_fragments.join(" ")));
                    days.insert(target, merge_day_meals(base, incoming));
                }
            }
        }
    }

    let mut week1 = Vec::new();
    let mut week2 = Vec::new();
    for (number, meals) in days {
        let plan = DayPlan { number, meals };
        match number {
            1..=7 => week1.push(plan),
            8..=14 => week2.push(plan),
            // Parsed but out of plan range; no bucket takes it.
            _ => {}
        }
    }

    let mut weeks = Vec::new();
    if !week1.is_empty() {
        weeks.push(WeekBucket {
            label: WEEK_ONE_LABEL,
            days: week1,
        });
    }
    if !week2.is_empty() {
        weeks.push(WeekBucket {
            label: WEEK_TWO_LABEL,
            days: week2,
        });
    }

    if weeks.is_empty() {
        weeks.push(WeekBucket {
            label: WEEK_ONE_LABEL,
            days: vec![DayPlan {
                number: 1,
                meals: normalize_day_meals(raw),
            }],
        });
    }

    WeekMenu { weeks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(meal: &Meal) -> &str {
        match meal {
            Meal::Text(t) => t,
            Meal::Detailed { content, .. } => content,
        }
    }

    fn find_day(menu: &WeekMenu, number: u8) -> Option<&DayMeals> {
        menu.weeks
            .iter()
            .flat_map(|w| &w.days)
            .find(|d| d.number == number)
            .map(|d| &d.meals)
    }

    #[test]
    fn day_keys_are_recognised_loosely() {
        assert_eq!(parse_day_number("Day 1"), Some(1));
        assert_eq!(parse_day_number("day14"), Some(14));
        assert_eq!(parse_day_number("DAY  3"), Some(3));
        assert_eq!(parse_day_number("第一天"), None);
        assert_eq!(parse_day_number("Day 0"), None);
        assert_eq!(parse_day_number("Day 32"), None);
    }

    #[test]
    fn detailed_meal_objects_survive() {
        let raw = json!({
            "Day 1": {
                "早餐": {"內容": "燕麥粥", "熱量": "約 300 kcal"},
                "午餐": {"內容": "雞胸沙律", "熱量": "約 500 kcal"},
                "晚餐": {"內容": "蒸魚", "熱量": "約 400 kcal"}
            }
        });
        let menu = normalize_menu(&raw);
        let day1 = find_day(&menu, 1).unwrap();
        assert_eq!(
            day1.breakfast,
            Meal::Detailed {
                content: "燕麥粥".into(),
                calories: "約 300 kcal".into()
            }
        );
    }

    #[test]
    fn calories_only_meal_gets_placeholder_content() {
        let raw = json!({"Day 1": {"早餐": {"熱量": "300 kcal"}}});
        let menu = normalize_menu(&raw);
        let day1 = find_day(&menu, 1).unwrap();
        assert_eq!(
            day1.breakfast,
            Meal::Detailed {
                content: MEAL_PLACEHOLDER.into(),
                calories: "300 kcal".into()
            }
        );
    }

    #[test]
    fn missing_meals_default_to_placeholder() {
        let raw = json!({"Day 2": {"午餐": "雞胸沙律"}});
        let menu = normalize_menu(&raw);
        let day2 = find_day(&menu, 2).unwrap();
        assert_eq!(text(&day2.breakfast), MEAL_PLACEHOLDER);
        assert_eq!(text(&day2.lunch), "雞胸沙律");
        assert_eq!(text(&day2.dinner), MEAL_PLACEHOLDER);
    }

    #[test]
    fn free_text_day_is_split_on_meal_labels() {
        let raw = json!({"Day 3": "早餐: 燕麥粥，午餐：雞胸沙律; 晚餐: 蒸魚"});
        let menu = normalize_menu(&raw);
        let day3 = find_day(&menu, 3).unwrap();
        assert_eq!(text(&day3.breakfast), "燕麥粥");
        assert_eq!(text(&day3.lunch), "雞胸沙律");
        assert_eq!(text(&day3.dinner), "蒸魚");
    }

    #[test]
    fn unlabelled_free_text_lands_in_breakfast() {
        let raw = json!({"Day 4": "輕斷食日，只喝水"});
        let menu = normalize_menu(&raw);
        let day4 = find_day(&menu, 4).unwrap();
        assert_eq!(text(&day4.breakfast), "輕斷食日，只喝水");
        assert_eq!(text(&day4.lunch), MEAL_PLACEHOLDER);
    }

    #[test]
    fn duplicate_day_keys_merge_without_overwriting() {
        let raw = json!({
            "Day 1": {"早餐": "燕麥粥"},
            "day 1": {"早餐": "粟米片", "午餐": "雞胸沙律"}
        });
        let menu = normalize_menu(&raw);
        let day1 = find_day(&menu, 1).unwrap();
        // First populated value wins; the later duplicate only fills gaps.
        assert_eq!(text(&day1.breakfast), "燕麥粥");
        assert_eq!(text(&day1.lunch), "雞胸沙律");
    }

    #[test]
    fn week_wrappers_are_flattened() {
        let raw = json!({
            "Week 1 (啟動期)": {"Day 1": {"早餐": "燕麥粥"}},
            "Week 2 (鞏固期)": {"Day 8": {"早餐": "蕎麥麵"}}
        });
        let menu = normalize_menu(&raw);
        assert_eq!(menu.weeks.len(), 2);
        assert_eq!(menu.weeks[0].label, WEEK_ONE_LABEL);
        assert_eq!(menu.weeks[0].days[0].number, 1);
        assert_eq!(menu.weeks[1].label, WEEK_TWO_LABEL);
        assert_eq!(menu.weeks[1].days[0].number, 8);
    }

    #[test]
    fn stray_fragments_attach_to_lowest_nested_day() {
        let raw = json!({
            "第一週": {
                "Day 2": {"午餐": "雞胸沙律"},
                "備註": "早餐: 燕麥粥"
            }
        });
        let menu = normalize_menu(&raw);
        let day2 = find_day(&menu, 2).unwrap();
        assert_eq!(text(&day2.breakfast), "燕麥粥");
        assert_eq!(text(&day2.lunch), "雞胸沙律");
    }

    #[test]
    fn days_partition_into_two_weeks_in_order() {
        let raw = json!({
            "Day 9": "x", "Day 1": "a", "Day 14": "y", "Day 7": "b"
        });
        let menu = normalize_menu(&raw);
        let week1: Vec<u8> = menu.weeks[0].days.iter().map(|d| d.number).collect();
        let week2: Vec<u8> = menu.weeks[1].days.iter().map(|d| d.number).collect();
        assert_eq!(week1, vec![1, 7]);
        assert_eq!(week2, vec![9, 14]);
    }

    #[test]
    fn out_of_plan_days_get_no_bucket() {
        let raw = json!({"Day 15": "a", "Day 31": "b"});
        let menu = normalize_menu(&raw);
        // Nothing landed in a week, so the fallback renders the raw value.
        assert_eq!(menu.weeks.len(), 1);
        assert_eq!(menu.weeks[0].days[0].number, 1);
    }

    #[test]
    fn no_recognisable_days_falls_back_to_day_one() {
        let raw = json!("早餐: 燕麥粥, 午餐: 雞胸沙律");
        let menu = normalize_menu(&raw);
        assert_eq!(menu.weeks.len(), 1);
        assert_eq!(menu.weeks[0].label, WEEK_ONE_LABEL);
        let day1 = find_day(&menu, 1).unwrap();
        assert_eq!(text(&day1.breakfast), "燕麥粥");
        assert_eq!(text(&day1.lunch), "雞胸沙律");
    }

    #[test]
    fn serialises_to_canonical_shape() {
        let raw = json!({"Day 1": {"早餐": {"內容": "燕麥粥", "熱量": "300"}}});
        let menu = normalize_menu(&raw);
        let value = serde_json::to_value(&menu).unwrap();
        assert_eq!(
            value,
            json!({
                "Week 1 (啟動期)": {
                    "Day 1": {
                        "早餐": {"內容": "燕麥粥", "熱量": "300"},
                        "午餐": "—",
                        "晚餐": "—"
                    }
                }
            })
        );
    }
}
