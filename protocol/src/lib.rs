use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// ---- Choices ----
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Choice {
    #[serde(rename = "✊", alias = "rock")]
    Rock,
    #[serde(rename = "✋", alias = "paper")]
    Paper,
    #[serde(rename = "✌️", alias = "scissors", alias = "✌")]
    Scissors,
}

impl Choice {
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// The choice this one defeats.
    pub fn beats(self) -> Choice {
        match self {
            Choice::Rock => Choice::Scissors,
            Choice::Scissors => Choice::Paper,
            Choice::Paper => Choice::Rock,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Choice::Rock => "✊",
            Choice::Paper => "✋",
            Choice::Scissors => "✌️",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Choice::Rock => "Rock",
            Choice::Paper => "Paper",
            Choice::Scissors => "Scissors",
        }
    }

    pub fn random() -> Choice {
        // ALL is non-empty
        *Choice::ALL.choose(&mut thread_rng()).unwrap_or(&Choice::Rock)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown choice '{0}' (expected rock, paper or scissors)")]
pub struct UnknownChoice(pub String);

impl FromStr for Choice {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" | "✊" => Ok(Choice::Rock),
            "paper" | "p" | "✋" => Ok(Choice::Paper),
            "scissors" | "s" | "✌️" | "✌" => Ok(Choice::Scissors),
            other => Err(UnknownChoice(other.to_string())),
        }
    }
}

/// ---- Outcomes ----
/// Positional result of a round: which seat won, or a draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Player1,
    Player2,
    Draw,
}

impl Outcome {
    /// Classic cyclic rule. Anti-symmetric in its arguments for non-draws.
    pub fn resolve(first: Choice, second: Choice) -> Outcome {
        if first == second {
            Outcome::Draw
        } else if first.beats() == second {
            Outcome::Player1
        } else {
            Outcome::Player2
        }
    }

    /// The same outcome seen with the seats swapped.
    pub fn invert(self) -> Outcome {
        match self {
            Outcome::Player1 => Outcome::Player2,
            Outcome::Player2 => Outcome::Player1,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

/// Result of a round from one player's point of view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Loss,
    Draw,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Win => write!(f, "You win"),
            Verdict::Loss => write!(f, "You lose"),
            Verdict::Draw => write!(f, "Draw"),
        }
    }
}

/// ---- Countries ----
pub const UNKNOWN_COUNTRY: &str = "Unknown";
pub const UNKNOWN_COUNTRY_CODE: &str = "XX";
pub const UNKNOWN_FLAG: &str = "🌍";

/// The (code, display name, flag) triple a player's results are tallied under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CountryTag {
    pub country_code: String,
    pub country: String,
    pub flag: String,
}

impl CountryTag {
    /// Builds a tag from optional client-supplied parts, filling gaps with
    /// the "unknown" placeholders.
    pub fn from_parts(
        country: Option<String>,
        country_code: Option<String>,
        flag: Option<String>,
    ) -> Self {
        let non_empty = |v: Option<String>, fallback: &str| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };
        CountryTag {
            country_code: non_empty(country_code, UNKNOWN_COUNTRY_CODE),
            country: non_empty(country, UNKNOWN_COUNTRY),
            flag: non_empty(flag, UNKNOWN_FLAG),
        }
    }

    pub fn unknown(country_code: &str) -> Self {
        CountryTag {
            country_code: country_code.to_string(),
            country: UNKNOWN_COUNTRY.to_string(),
            flag: UNKNOWN_FLAG.to_string(),
        }
    }
}

impl fmt::Display for CountryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.flag, self.country, self.country_code)
    }
}

/// ---- Players ----
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub country: CountryTag,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundPlayer {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub choice: Choice,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub room_id: String,
    /// 1-based count of rounds resolved in this room.
    pub round: u32,
    pub player1: RoundPlayer,
    pub player2: RoundPlayer,
    pub result: Outcome,
}

impl RoundSummary {
    pub fn winner(&self) -> Option<&RoundPlayer> {
        match self.result {
            Outcome::Player1 => Some(&self.player1),
            Outcome::Player2 => Some(&self.player2),
            Outcome::Draw => None,
        }
    }

    /// `None` if `id` did not play this round.
    pub fn verdict_for(&self, id: Uuid) -> Option<Verdict> {
        let seen_as_first = if self.player1.profile.id == id {
            self.result
        } else if self.player2.profile.id == id {
            self.result.invert()
        } else {
            return None;
        };
        Some(match seen_as_first {
            Outcome::Player1 => Verdict::Win,
            Outcome::Player2 => Verdict::Loss,
            Outcome::Draw => Verdict::Draw,
        })
    }

    pub fn opponent_of(&self, id: Uuid) -> Option<&RoundPlayer> {
        if self.player1.profile.id == id {
            Some(&self.player2)
        } else if self.player2.profile.id == id {
            Some(&self.player1)
        } else {
            None
        }
    }
}

/// ---- Leaderboard ----
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub country_code: String,
    pub country: String,
    pub flag: String,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

impl LeaderboardEntry {
    pub fn new(tag: &CountryTag) -> Self {
        LeaderboardEntry {
            country_code: tag.country_code.clone(),
            country: tag.country.clone(),
            flag: tag.flag.clone(),
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    pub fn games(&self) -> u64 {
        self.wins + self.losses + self.draws
    }
}

/// ---- Messages ----
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientToServer {
    /// Enter matchmaking. Country fields fall back to the unknown placeholders.
    Join {
        name: String,
        #[serde(default)]
        country: Option<String>,
        #[serde(default)]
        country_code: Option<String>,
        #[serde(default)]
        flag: Option<String>,
    },
    Choose {
        choice: Choice,
    },
    RequestRematch,
    CountryStats {
        country_code: String,
    },
    // Debug
    ActivePlayers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerToClient {
    Hello {
        your_id: Uuid,
    },
    RoomAssigned {
        room_id: String,
    },
    RoomReady {
        room_id: String,
        you: PublicProfile,
        opponent: PublicProfile,
    },
    /// Sent to the side that has not chosen yet. Never reveals the choice.
    OpponentHasChosen,
    RoundResult {
        round: RoundSummary,
        standings: Vec<LeaderboardEntry>,
    },
    RematchReady,
    OpponentLeft {
        message: String,
    },
    CountryStats {
        stats: LeaderboardEntry,
    },
    ActivePlayers {
        players: Vec<PublicProfile>,
    },
    Error {
        message: String,
    },
}
