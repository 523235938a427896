use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 兩位玩家之一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Raw form input for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSubmission {
    pub commander: String,
    pub decklist: String,
}

impl DeckSubmission {
    pub fn new(commander: impl Into<String>, decklist: impl Into<String>) -> Self {
        Self {
            commander: commander.into(),
            decklist: decklist.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRequest {
    pub name: String,
    pub quantity: u32,
    pub is_commander: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_line: Option<String>,
}

/// Card metadata as returned by Scryfall. Fields we do not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    #[serde(default)]
    pub color_identity: Vec<String>,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub legalities: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_changer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_faces: Option<Vec<CardFace>>,
}

impl CatalogRecord {
    pub fn is_commander_legal(&self) -> bool {
        self.legalities.get("commander").map(String::as_str) == Some("legal")
    }

    pub fn is_game_changer(&self) -> bool {
        self.game_changer.unwrap_or(false)
    }

    pub fn is_land(&self) -> bool {
        let type_line = if self.type_line.is_empty() {
            // 部分雙面牌只在 card_faces 上帶 type_line
            self.card_faces
                .as_ref()
                .and_then(|faces| faces.first())
                .and_then(|face| face.type_line.clone())
                .unwrap_or_default()
        } else {
            self.type_line.clone()
        };
        type_line.to_lowercase().contains("land")
    }

    pub fn is_colorless(&self) -> bool {
        self.color_identity.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub name: String,
    pub quantity: u32,
    pub catalog_record: Option<CatalogRecord>,
    pub is_legal: bool,
    pub error: Option<String>,
}

impl CardEntry {
    pub fn unresolved(name: impl Into<String>, quantity: u32, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            catalog_record: None,
            is_legal: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub commander: CardEntry,
    pub decklist: Vec<CardEntry>,
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Decklist quantities plus one for a legally resolved commander.
    /// Summed as `u64` so any parsed quantities add up without overflowing.
    pub fn total_cards(&self) -> u64 {
        let commander = if self.commander.is_legal && self.commander.catalog_record.is_some() {
            1
        } else {
            0
        };
        self.decklist
            .iter()
            .map(|entry| u64::from(entry.quantity))
            .sum::<u64>()
            + commander
    }

    pub fn entry_count(&self) -> usize {
        self.decklist.len() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleId {
    CommandersUnresolved,
    DeckSize,
    CommanderColors,
    SharedCards,
    ColorIdentity,
    GameChangers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One finding of the deckbuilding rule engine, kept free of presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: RuleId,
    pub severity: Severity,
    pub player: Option<Player>,
    pub card_names: Vec<String>,
    pub detail: String,
}

/// Combined outcome of validating both players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairValidation {
    pub player1: ValidationResult,
    pub player2: ValidationResult,
    pub violations: Vec<RuleViolation>,
    pub validated_at: chrono::DateTime<chrono::Utc>,
}

impl PairValidation {
    pub fn player(&self, player: Player) -> &ValidationResult {
        match player {
            Player::One => &self.player1,
            Player::Two => &self.player2,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.player1.errors.is_empty()
            && self.player2.errors.is_empty()
            && !self
                .violations
                .iter()
                .any(|violation| violation.severity == Severity::Error)
    }
}
