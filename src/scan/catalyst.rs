//! News catalyst detection.
//!
//! A headline qualifies as a catalyst when its lowercased title
//! contains at least one trigger keyword and zero suppressor keywords.
//! The first qualifying headline per symbol wins; matches are not
//! aggregated across headlines, so the catalyst always references a
//! single concrete story.

use crate::types::{Catalyst, Headline};

/// Keywords that suggest a tradeable news driver: earnings events,
/// regulatory decisions, corporate actions, personnel changes, and
/// trial results.
pub const TRIGGER_KEYWORDS: &[&str] = &[
    "earnings", "beat", "miss", "guidance", "upgrade", "downgrade",
    "fda", "approval", "patent", "launch", "partnership", "contract",
    "lawsuit", "settlement", "investigation", "recall", "dividend",
    "split", "buyback", "acquisition", "merger", "spinoff", "ceo",
    "executive", "resignation", "appointed", "clinical", "trial",
    "data", "results", "breakthrough", "innovation",
];

/// M&A noise the strategy deliberately avoids; a suppressor match
/// vetoes the headline even when trigger keywords are present.
pub const SUPPRESSOR_KEYWORDS: &[&str] = &["merger", "buyout", "acquisition"];

/// Scan headlines newest-first and return a catalyst for the first
/// qualifying one, if any.
pub fn detect_catalyst(symbol: &str, headlines: &[Headline]) -> Option<Catalyst> {
    for headline in headlines {
        let title = headline.title.to_lowercase();

        let matched: Vec<String> = TRIGGER_KEYWORDS
            .iter()
            .filter(|keyword| title.contains(*keyword))
            .map(|keyword| keyword.to_string())
            .collect();

        let suppressed = SUPPRESSOR_KEYWORDS
            .iter()
            .any(|keyword| title.contains(keyword));

        if !matched.is_empty() && !suppressed {
            return Some(Catalyst {
                symbol: symbol.to_string(),
                catalyst_types: matched,
                headline: headline.clone(),
            });
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
