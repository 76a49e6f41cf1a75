//! Outbound notifications and their chat rendering.

use std::fmt;

/// Something worth announcing in the chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    GameStarted {
        matchup: Option<String>,
    },
    Goal {
        matchup: Option<String>,
        team: Option<String>,
        period: Option<i64>,
        time: Option<String>,
        score: Option<String>,
    },
    Penalty {
        matchup: Option<String>,
        team: Option<String>,
        period: Option<i64>,
        time: Option<String>,
        offence: Option<String>,
    },
    PeriodEnd {
        matchup: Option<String>,
        period: Option<i64>,
    },
    GameOver {
        teams: Option<(String, String)>,
        score: Option<String>,
    },
}

impl Notification {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Notification::GameStarted { .. } => "game_started",
            Notification::Goal { .. } => "goal",
            Notification::Penalty { .. } => "penalty",
            Notification::PeriodEnd { .. } => "period_end",
            Notification::GameOver { .. } => "game_over",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_message(self))
    }
}

pub fn format_message(notification: &Notification) -> String {
    match notification {
        Notification::GameStarted { matchup } => match matchup {
            Some(m) => format!("Game started: {}", m),
            None => "Game started!".to_string(),
        },
        Notification::Goal {
            matchup,
            team,
            period,
            time,
            score,
        } => with_details("Goal", matchup, team, *period, time, score),
        Notification::Penalty {
            matchup,
            team,
            period,
            time,
            offence,
        } => {
            let mut out = with_details("Penalty", matchup, team, *period, time, &None);
            if let Some(label) = offence.as_deref().and_then(expand_offence) {
                out.push_str(&format!(" - {}", label));
            }
            out
        }
        Notification::PeriodEnd { matchup, period } => {
            let mut out = String::from("Period break");
            if let Some(m) = matchup {
                out.push_str(&format!(" - {}", m));
            }
            if let Some(p) = period {
                out.push_str(&format!(" - End of period {}", p));
            }
            out
        }
        Notification::GameOver { teams, score } => match (teams, score) {
            (Some((home, away)), Some(s)) => format!("Match over - {} {} {}", home, s, away),
            (None, Some(s)) => format!("Match over - Final score {}", s),
            _ => "Match over - final score unknown".to_string(),
        },
    }
}

/// "<head> - matchup | team | P<n> | clock | score", skipping unknown parts.
fn with_details(
    head: &str,
    matchup: &Option<String>,
    team: &Option<String>,
    period: Option<i64>,
    time: &Option<String>,
    score: &Option<String>,
) -> String {
    let parts: Vec<String> = [
        matchup.clone(),
        team.clone(),
        period.map(|p| format!("P{}", p)),
        time.clone().filter(|t| !t.is_empty()),
        score.clone(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect();

    if parts.is_empty() {
        head.to_string()
    } else {
        format!("{} - {}", head, parts.join(" | "))
    }
}

/// Readable label for a penalty code; unknown codes pass through unchanged.
pub fn expand_offence(code: &str) -> Option<String> {
    if code.is_empty() {
        return None;
    }
    let label = match code {
        "HI-ST" => "High Sticking",
        "HOLD" => "Holding",
        "HOOK" => "Hooking",
        "TRIP" => "Tripping",
        "ROUGH" => "Roughing",
        "SLASH" => "Slashing",
        "CROSS" => "Cross Checking",
        "INTERF" => "Interference",
        "ELBOW" => "Elbowing",
        "CHARGE" => "Charging",
        "BOARD" => "Boarding",
        "KNEE" => "Kneeing",
        "UNSPORT" => "Unsportsmanlike Conduct",
        "DELAY" => "Delay of Game",
        other => other,
    };
    Some(label.to_string())
}
