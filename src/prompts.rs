//! Prompt assembly and the response JSON schema.
//!
//! Everything the model is told lives here: the consultant persona, the
//! Nesture product database the recommendations must be drawn from, the
//! fixed dietary rules, and the strict JSON output contract. Keeping the
//! knowledge base in one module means a product-line update never touches
//! the generation plumbing.

use serde_json::{json, Map, Value};

use crate::input::DiagnosisInput;

// ── Knowledge base ───────────────────────────────────────────────────────

pub const PRODUCT_LINE_FOOD: &str = "FA01 烏黑養腎精華生髮飲, FA02 必白美肌精華素顏飲, FA03 漲杯美肌精華豐胸飲, FA04 抗氧抗衰精華逆齡飲, FA05 階段1「疏」姨媽前｜紅粉菲菲養血暖宮飲, FA06 階段2「排」姨媽中｜紅粉菲菲養血暖宮飲, FA07 階段3「養」日常補｜紅粉菲菲養血暖宮飲, FC01 寶寶積食健脾飲, FC02 腎氣寶寶聰明飲, FC03 寶寶補氣養血飲, FC04 視力寶寶護眼飲, FC05 護肺靈止咳潤肺飲, FM01 健脾美白營養飲, FM02 排清胎毒營養飲, FM03 祛腫控糖營養飲, FM04 孕期安睡營養飲, FM05 通便營養飲, FM06 腎氣富媽飲。";

pub const PRODUCT_LINE_SOUP: &str = "S01 人蔘花陳皮瑤柱燉排骨雞腳湯, S02 沙參玉竹瑤柱燉排骨雞腳湯, S03 黑豆黃精黨參燉瑤柱雞腳湯, S04 當歸熟地南棗燉排骨雞腳湯, S05 白茅根茯苓燉月季花湯, S06 茯苓酸棗仁燉陳皮甘草湯, S07 五指毛桃炒白術茯苓燉排骨雞腳湯, S08 鹿茸片葛根黃耆瑤柱燉雞腳湯, SA01 酸棗仁茯苓燉陳皮排骨湯, SA02 素馨花陳皮燉赤小豆薏仁湯, SA03 五指毛桃炒薏仁白术燉瑤柱排骨湯, SA04 當歸五指毛桃燉排骨雞腳湯, SA05 五指毛桃益母草燉當歸湯, SA06 五指元氣烏髮湯, SA07 丹參白术燉瑤柱薏苡仁湯, SA08 五指毛桃瑤柱燉陳皮蓮子百合湯, SB01 梔子薏仁燉陳皮排骨湯, SB02 土茯苓赤小豆扁豆燉月季花湯, SB03 布渣葉扁豆花炒白術燉排骨雞腳湯, SB04 土茯苓赤芍燉排骨雞腳湯, SB05 蒲公英蛇舌草王不留行燉雞腳湯, SB06 女貞首烏固髮湯, SB07 赤小豆白芷荷葉燉瑤柱葛根湯, SC01 玉竹沙參茯苓燉排骨雞腳湯, SC02 芍茯苓燉陳皮麥冬湯, SC03 沙參玉竹燉玉米鬚白扁豆湯, SC04 熟地玉竹黃精燉排骨雞腳湯, SC05 王不留行沙參燉枸杞當歸湯, SC06 女貞黑鑽固本湯, SC07 沙參桑白皮燉瑤柱百合湯, SC08 沙參玉竹燉瑤柱百合湯, SE01 黨參葛根燉陳皮貝母湯, SE02 陳皮佛手燉玉米鬚茯苓湯, SE03 炒薏仁月季花燉陳皮排骨雞腳湯, SE04 赤小豆扁豆薏仁燉瑤柱排骨湯, SE05 薏仁玉米鬚燉月季花排骨雞腳湯, SE06 五指毛桃茯苓赤小豆燉排骨雞腳湯, SE07 杜仲巴戟驅濕固髮湯, SE08 炒薏仁白扁豆陳皮燉瑤柱排骨湯, SF01 太子蔘茯苓燉陳皮排骨湯, SF02 玉米鬚燉浮小麥湯, SF03 土茯苓布渣葉陳皮炭燉排骨雞腳湯, SF04 當歸白芍燉排骨雞腳湯, SF05 五指毛桃葛根燉黨參當歸湯, SF06 制何首烏黑豆桑寄生固髮湯, SF07 黃芪玉竹燉瑤柱百合湯, SF08 椰子南北杏雪梨瑤柱燉排骨湯, SG01 丹參益母草燉當歸茯苓湯, SG02 雞血藤生艾葉蜜棗燉排骨雞腳湯, SG03 益母草山楂燉陳皮茯苓湯, SG04 當歸尾赤芍蘇木燉排骨雞腳湯, SG05 王不留行黃耆燉肉桂當歸湯, SG06 丹參牛膝固髮湯, SG07 川芎當歸尾燉瑤柱排骨湯, SG08 石斛草黨參陳皮燉瑤柱排骨湯。";

pub const PRODUCT_LINE_BREWED: &str = "B01 抗敏無咳寶寶 (成人：强肺防敏飲), B02 中氣十足寶寶 (成人：補腦強腰飲), B03 視力精靈寶寶 (成人：抗藍光護眼飲), B04 胃口大開寶寶 (成人：消滯開胃飲), B05 聰明發育寶寶 (成人：烏髮抗衰飲), B06 索美人 | 排毒消脂, B07 喉嚨救兵 | 護肺止咳, B08 鐵打佬 | 健肌壯筋骨, B09 唔再濕滯｜健脾祛濕, B10 夜鬼熬夜救星｜清肝降火, B11 宫好唔易老 | 美肌養顏。";

pub const PRODUCT_LINE_TEA: &str = "T01 腎氣補補生髮茶, T02 深睡助眠茶, T03 排毒降火祛痘茶, T04 補胸漲杯茶, T05 養胃修復茶, T06 熬夜排毒清肝茶, T07 養雌逆齡茶, T08 刮油祛濕茶, T09 氣血補補素顏茶, T10 「早C晚A」美白抗氧抗衰茶。";

pub const PRODUCT_LINE_FOOT: &str = "f01 【解鬱安眠神泡】- 壓力山大｜失眠救星足浴包, f02 【好孕暖宮寶】- 宮寒備孕｜助孕神器足浴包, f03 【清熱袪痘戰士】- 面油口氣｜脾胃救星足浴包, f04 【月月輕鬆暖宮寶】- 手腳冰涼｜經痛剋星足浴包, f05 【爆汗祛濕寶】- 專攻水腫肚脹｜踢走濕重感足浴包。";

pub const DIETARY_RULES: &str = "飯前蘋果醋水；比例 0.5-1 碗澱粉 + 1 手掌肉 + 1 碗菜；禁小麥製品與紅肉；進食次序 肉->飯->菜；5點前低糖水果；餐後適量溫水；每週2天斷食日。";

// ── Prompt assembly ──────────────────────────────────────────────────────

fn score_list(entries: &[crate::input::ScoreEntry]) -> String {
    if entries.is_empty() {
        return "無".to_string();
    }
    entries
        .iter()
        .map(|e| format!("{} ({}分)", e.name, e.score))
        .collect::<Vec<_>>()
        .join(", ")
}

fn day_menu_skeleton(day: u8) -> String {
    format!(
        concat!(
            "                    \"Day {}\": {{\n",
            "                        \"早餐\": {{\"內容\": \"...\", \"熱量\": \"約 300 kcal\"}},\n",
            "                        \"午餐\": {{\"內容\": \"...\", \"熱量\": \"約 500 kcal\"}},\n",
            "                        \"晚餐\": {{\"內容\": \"...\", \"熱量\": \"約 400 kcal\"}}\n",
            "                    }}"
        ),
        day
    )
}

fn week_skeleton(start: u8, end: u8) -> String {
    (start..=end)
        .map(day_menu_skeleton)
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Assemble the full report prompt for one diagnosis.
///
/// `date_text` is the already-formatted current date, e.g. `2026年8月26日`.
pub fn build_report_prompt(input: &DiagnosisInput, date_text: &str) -> String {
    let strategy = input.strategy();
    format!(
        r#"你現在是一位擁有 30 年經驗的資深中西醫整合醫學專家。請根據以下數據，為客戶撰寫一份深度調理報告。

【客戶診斷數據】
- **核心病機 (首要問題)**：{primary_name} (分數: {primary_score}/100)
- **相關兼證 (次要問題)**：{secondary}
- **體質背景 (身體土壤)**：{constitutions}
- **系統判定策略等級**：{strategy}
- **當前日期**：{date}

---

【你的執行步驟】
1. **定調核心**：分析首要問題在中醫與西醫營養學上的意義。
2. **審視關聯**：分析次要問題與體質是如何「推波助瀾」或加重首要問題的。
3. **制定整合策略**：標本兼治，語氣需與策略等級相符。
4. **產品匹配**：從下方的「白燕 (Nesture) 產品數據庫」中，為 5 大產品線（食療、藥膳湯、焗湯、茶療、足療）各挑選 1 款最精準的產品。**必須嚴格使用數據庫中的完整產品名稱。**
5. **產品引言**：為產品推介部分撰寫一段溫馨的引言，特別針對那些平時工作繁忙、沒有時間自行準備食材的客戶，說明這些產品如何提供便捷的解決方案。

---

【白燕 (Nesture) 產品數據庫 (必須嚴格跟從名稱)】：
- **食療系列**：{food}
- **藥膳湯療**：{soup}
- **焗湯系列**：{brewed}
- **茶療系列**：{tea}
- **足療系列**：{foot}

---

【必須加入的專業飲食規則】：
- {rules}

---

【最終輸出要求】
請僅回傳一個純粹的 JSON 物件，嚴禁包含任何 Markdown 標記。
**注意：兩週餐單必須完整包含 Day 1 到 Day 14 的每一天，不可省略。**
JSON 結構如下：
{{
    "goal": "...",
    "intro_title": "...",
    "intro_paragraphs": ["...", "..."],
    "integrative_strategy": {{
        "western_analysis": "...", "western_strategy": "...",
        "tcm_analysis": "...", "tcm_strategy": "..."
    }},
    "red_light_items": [{{"title": "...", "content": "..."}}],
    "green_light_list": ["..."],
    "diet_rules": [{{"title": "...", "content": "..."}}],
    "lifestyle_solutions": [{{"title": "...", "content": "..."}}],
    "seasonal_guidance": {{"february": "...", "march": "..."}},
    "two_week_menu": {{
        "Week 1 (啟動期)": {{
{week1}
        }},
        "Week 2 (鞏固期)": {{
{week2}
        }}
    }},
    "product_intro": "針對繁忙客戶的溫馨引言...",
    "product_recommendations": [
        {{"line": "食療系列", "name": "產品名稱", "reason": "匹配理由", "principle": "推介原理"}},
        {{"line": "藥膳湯療", "name": "...", "reason": "...", "principle": "..."}},
        {{"line": "焗湯系列", "name": "...", "reason": "...", "principle": "..."}},
        {{"line": "茶療系列", "name": "...", "reason": "...", "principle": "..."}},
        {{"line": "足療系列", "name": "...", "reason": "...", "principle": "..."}}
    ],
    "conclusion": "..."
}}"#,
        primary_name = input.primary.name,
        primary_score = input.primary.score,
        secondary = score_list(&input.secondary),
        constitutions = score_list(&input.constitutions),
        strategy = strategy.text(),
        date = date_text,
        food = PRODUCT_LINE_FOOD,
        soup = PRODUCT_LINE_SOUP,
        brewed = PRODUCT_LINE_BREWED,
        tea = PRODUCT_LINE_TEA,
        foot = PRODUCT_LINE_FOOT,
        rules = DIETARY_RULES,
        week1 = week_skeleton(1, 7),
        week2 = week_skeleton(8, 14),
    )
}

// ── Response schema ──────────────────────────────────────────────────────

fn titled_item_schema() -> Value {
    json!({
        "type": "object",
        "required": ["title", "content"],
        "additionalProperties": false,
        "properties": {
            "title": {"type": "string"},
            "content": {"type": "string"}
        }
    })
}

fn day_menu_schema() -> Value {
    let meal = json!({
        "type": "object",
        "required": ["內容", "熱量"],
        "additionalProperties": false,
        "properties": {
            "內容": {"type": "string"},
            "熱量": {"type": "string"}
        }
    });
    json!({
        "type": "object",
        "required": ["早餐", "午餐", "晚餐"],
        "additionalProperties": false,
        "properties": {
            "早餐": meal,
            "午餐": meal,
            "晚餐": meal
        }
    })
}

fn week_menu_schema(start_day: u8, end_day: u8) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for day in start_day..=end_day {
        let key = format!("Day {day}");
        properties.insert(key.clone(), day_menu_schema());
        required.push(Value::String(key));
    }
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": required,
        "properties": properties
    })
}

/// JSON schema the structured-output mode is asked to honour. It mirrors
/// [`crate::report::ReportPayload`] with the canonical fourteen-day menu.
pub fn response_json_schema() -> Value {
    json!({
        "type": "object",
        "required": [
            "goal",
            "intro_title",
            "intro_paragraphs",
            "integrative_strategy",
            "red_light_items",
            "green_light_list",
            "diet_rules",
            "lifestyle_solutions",
            "seasonal_guidance",
            "two_week_menu",
            "product_intro",
            "product_recommendations",
            "conclusion"
        ],
        "additionalProperties": false,
        "properties": {
            "goal": {"type": "string"},
            "intro_title": {"type": "string"},
            "intro_paragraphs": {"type": "array", "items": {"type": "string"}, "minItems": 1},
            "integrative_strategy": {
                "type": "object",
                "required": ["western_analysis", "western_strategy", "tcm_analysis", "tcm_strategy"],
                "additionalProperties": false,
                "properties": {
                    "western_analysis": {"type": "string"},
                    "western_strategy": {"type": "string"},
                    "tcm_analysis": {"type": "string"},
                    "tcm_strategy": {"type": "string"}
                }
            },
            "red_light_items": {"type": "array", "items": titled_item_schema()},
            "green_light_list": {"type": "array", "items": {"type": "string"}},
            "diet_rules": {"type": "array", "items": titled_item_schema()},
            "lifestyle_solutions": {"type": "array", "items": titled_item_schema()},
            "seasonal_guidance": {
                "type": "object",
                "required": ["february", "march"],
                "additionalProperties": false,
                "properties": {
                    "february": {"type": "string"},
                    "march": {"type": "string"}
                }
            },
            "two_week_menu": {
                "type": "object",
                "required": ["Week 1 (啟動期)", "Week 2 (鞏固期)"],
                "additionalProperties": false,
                "properties": {
                    "Week 1 (啟動期)": week_menu_schema(1, 7),
                    "Week 2 (鞏固期)": week_menu_schema(8, 14)
                }
            },
            "product_intro": {"type": "string"},
            "product_recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["line", "name", "reason", "principle"],
                    "additionalProperties": false,
                    "properties": {
                        "line": {"type": "string"},
                        "name": {"type": "string"},
                        "reason": {"type": "string"},
                        "principle": {"type": "string"}
                    }
                }
            },
            "conclusion": {"type": "string"}
        }
    })
}
