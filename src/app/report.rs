use crate::config::toml_config::WebhookConfig;
use crate::domain::model::{PairValidation, Player, RuleId, RuleViolation, ValidationResult};
use crate::domain::ports::{Embed, EmbedField, WebhookPayload};

pub const SUCCESS_COLOR: u32 = 3066993;
pub const FAILURE_COLOR: u32 = 15158332;
/// Discord 單一 embed field 的字元上限
pub const FIELD_VALUE_LIMIT: usize = 1024;
pub const THREAD_NAME_LIMIT: usize = 100;

pub const ERROR_TITLE: &str = "Oops! There are some errors";
pub const SUCCESS_TITLE: &str = "Success";
pub const SUCCESS_MESSAGE: &str = "Decks validated and saved successfully!";

/// What the UI log shows after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogReport {
    pub title: String,
    pub success: bool,
    pub lines: Vec<String>,
}

impl LogReport {
    pub fn failure(lines: Vec<String>) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            success: false,
            lines,
        }
    }

    pub fn critical(message: &str) -> Self {
        Self::failure(vec![format!("Critical error during validation: {}", message)])
    }
}

pub fn rule_heading(rule: RuleId) -> &'static str {
    match rule {
        RuleId::CommandersUnresolved => "Deck rules were not checked:",
        RuleId::DeckSize => "Each deck must have exactly 100 cards, including the commander:",
        RuleId::CommanderColors => "Commanders must be monocolor:",
        RuleId::SharedCards => "Decks cannot share non-land cards:",
        RuleId::ColorIdentity => {
            "Every card must fit within the combined color identity of both commanders:"
        }
        RuleId::GameChangers => "Each deck may include at most 3 Game Changers:",
    }
}

/// One multi-line block per rule, in rule order.
pub fn render_violations(violations: &[RuleViolation]) -> Vec<String> {
    let mut order: Vec<RuleId> = violations.iter().map(|violation| violation.rule).collect();
    order.sort();
    order.dedup();

    order
        .into_iter()
        .map(|rule| {
            let mut block = rule_heading(rule).to_string();
            for violation in violations.iter().filter(|v| v.rule == rule) {
                block.push_str("\n- ");
                block.push_str(&violation.detail);
            }
            block
        })
        .collect()
}

/// 每位玩家的錯誤加上 "Player N:" 前綴，之後接規則違規區塊
pub fn error_lines(pair: &PairValidation) -> Vec<String> {
    let mut lines = Vec::new();
    for player in [Player::One, Player::Two] {
        for error in &pair.player(player).errors {
            lines.push(format!("{}: {}", player, error));
        }
    }
    lines.extend(render_violations(&pair.violations));
    lines
}

pub fn render_log(pair: &PairValidation) -> LogReport {
    let mut lines = error_lines(pair);
    if lines.is_empty() {
        lines.push(SUCCESS_MESSAGE.to_string());
        return LogReport {
            title: SUCCESS_TITLE.to_string(),
            success: true,
            lines,
        };
    }

    for player in [Player::One, Player::Two] {
        for warning in &pair.player(player).warnings {
            lines.push(format!("{} (warning): {}", player, warning));
        }
    }
    LogReport::failure(lines)
}

fn clip(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(limit.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

/// Packs lines into chunks whose joined length stays within `limit` characters.
fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        let line = clip(line, limit);
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { current_len + 1 + line_len };

        if needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(&line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn player_embed(pair: &PairValidation, player: Player) -> Embed {
    let result: &ValidationResult = pair.player(player);
    let player_violations: Vec<&RuleViolation> = pair
        .violations
        .iter()
        .filter(|violation| violation.player.is_none() || violation.player == Some(player))
        .collect();
    let passed = result.errors.is_empty() && player_violations.is_empty();

    let commander = if result.commander.name.is_empty() {
        "(missing)".to_string()
    } else {
        result.commander.name.clone()
    };

    let mut fields = vec![
        EmbedField {
            name: "Commander".to_string(),
            value: clip(&commander, FIELD_VALUE_LIMIT),
            inline: true,
        },
        EmbedField {
            name: "Cards".to_string(),
            value: result.total_cards().to_string(),
            inline: true,
        },
    ];

    let deck_lines: Vec<String> = result
        .decklist
        .iter()
        .map(|entry| format!("{}x {}", entry.quantity, entry.name))
        .collect();
    let chunks = chunk_lines(&deck_lines, FIELD_VALUE_LIMIT);
    if chunks.is_empty() {
        fields.push(EmbedField {
            name: "Decklist".to_string(),
            value: "(empty)".to_string(),
            inline: false,
        });
    }
    for (index, chunk) in chunks.into_iter().enumerate() {
        fields.push(EmbedField {
            name: if index == 0 {
                "Decklist".to_string()
            } else {
                "Decklist (cont.)".to_string()
            },
            value: chunk,
            inline: false,
        });
    }

    let mut problems: Vec<String> = result.errors.clone();
    problems.extend(player_violations.iter().map(|v| v.detail.clone()));
    if !problems.is_empty() {
        fields.push(EmbedField {
            name: "Errors".to_string(),
            value: clip(&problems.join("\n"), FIELD_VALUE_LIMIT),
            inline: false,
        });
    }

    Embed {
        title: format!("{}: {}", player, commander),
        color: if passed { SUCCESS_COLOR } else { FAILURE_COLOR },
        fields,
    }
}

pub fn build_payload(pair: &PairValidation, webhook: &WebhookConfig) -> WebhookPayload {
    let thread_name = webhook
        .thread_name
        .replace("{player1}", &pair.player1.commander.name)
        .replace("{player2}", &pair.player2.commander.name);

    WebhookPayload {
        username: webhook.username.clone(),
        avatar_url: webhook.avatar_url.clone(),
        thread_name: clip(&thread_name, THREAD_NAME_LIMIT),
        embeds: vec![
            player_embed(pair, Player::One),
            player_embed(pair, Player::Two),
        ],
    }
}
