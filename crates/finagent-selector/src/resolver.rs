//! Reference resolution against conversation context
//!
//! Explicit mentions always win: a ticker pattern or a known company name in
//! the query binds directly, ignoring prior context. Only when the query names
//! nothing and carries an anaphoric cue does the resolver fall back to the
//! most recent entity in the conversation. Resolution is deterministic for a
//! fixed context snapshot; ambiguity is represented as an unbound entity, not
//! an error, and the selector decides what to do with it.

use crate::intent;
use finagent_context::ConversationContext;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Uppercase ticker pattern (1-5 letters)
static TICKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,5}$").expect("valid ticker pattern"));

/// Uppercase words that look like tickers but never are
const NOT_TICKERS: &[&str] = &[
    "I", "A", "OK", "US", "USA", "AI", "CEO", "IPO", "ETF", "PE", "EPS", "RSI", "MACD", "SMA",
    "EMA", "ATR", "YTD", "FAANG", "VS",
];

/// Known company names mapped to their ticker symbols
const COMPANY_NAMES: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("tesla", "TSLA"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("nvidia", "NVDA"),
    ("meta", "META"),
    ("facebook", "META"),
    ("netflix", "NFLX"),
    ("rivian", "RIVN"),
    ("intel", "INTC"),
    ("amd", "AMD"),
];

/// Query text enriched with resolved subject entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedQuery {
    /// Original query text
    pub text: String,
    /// Bound symbols in mention order (possibly from context)
    pub symbols: Vec<String>,
    /// Best-effort single subject, if any
    pub entity: Option<String>,
    /// Whether context supplied any of the bound symbols
    pub used_context: bool,
}

/// Resolves pronouns and ellipsis against conversation context
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceResolver;

impl ReferenceResolver {
    /// Create a new resolver
    pub fn new() -> Self {
        Self
    }

    /// Resolve a query's subject entities
    pub fn resolve(&self, query: &str, context: &ConversationContext) -> ResolvedQuery {
        let mut symbols = extract_symbols(query);
        let mut used_context = false;

        if symbols.is_empty() {
            if intent::has_anaphoric_cue(query) && !context.entities.is_empty() {
                if intent::has_comparison_cue(query) && context.entities.len() >= 2 {
                    // "compare them" binds the last two subjects
                    symbols = context.recent_entities(2).to_vec();
                } else {
                    symbols = vec![context.entities[context.entities.len() - 1].clone()];
                }
                used_context = true;
            }
        } else if intent::has_comparison_cue(query) && symbols.len() == 1 {
            // "compare with Microsoft" pulls the other side from context
            if let Some(last) = context.last_entity() {
                if last != symbols[0] {
                    symbols.insert(0, last.to_string());
                    used_context = true;
                }
            }
        }

        let entity = symbols.last().cloned();

        tracing::debug!(
            query,
            ?symbols,
            used_context,
            "Resolved query references"
        );

        ResolvedQuery {
            text: query.to_string(),
            symbols,
            entity,
            used_context,
        }
    }
}

/// Extract explicit symbol mentions in query order, deduplicated
fn extract_symbols(query: &str) -> Vec<String> {
    let mut symbols = Vec::new();

    for word in query.split_whitespace() {
        let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
        if clean.is_empty() {
            continue;
        }

        // Ticker-looking uppercase word
        if TICKER_RE.is_match(clean) && !NOT_TICKERS.contains(&clean) {
            push_unique(&mut symbols, clean.to_string());
            continue;
        }

        // Known company name, possessive forms included ("Apple's")
        let lower = clean.to_lowercase();
        let name = lower.strip_suffix("'s").unwrap_or(&lower);
        if let Some((_, ticker)) = COMPANY_NAMES.iter().find(|(n, _)| *n == name) {
            push_unique(&mut symbols, (*ticker).to_string());
        }
    }

    symbols
}

fn push_unique(symbols: &mut Vec<String>, symbol: String) {
    if !symbols.contains(&symbol) {
        symbols.push(symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(entities: &[&str]) -> ConversationContext {
        let mut ctx = ConversationContext::new("test");
        let entities: Vec<String> = entities.iter().map(ToString::to_string).collect();
        ctx.record_turn("seed", &entities, &[]);
        ctx
    }

    #[test]
    fn test_explicit_ticker_mention() {
        let ctx = context_with(&["TSLA"]);
        let resolved = ReferenceResolver::new().resolve("Analyze AAPL", &ctx);

        assert_eq!(resolved.symbols, vec!["AAPL".to_string()]);
        assert_eq!(resolved.entity.as_deref(), Some("AAPL"));
        assert!(!resolved.used_context);
    }

    #[test]
    fn test_company_name_mention() {
        let ctx = ConversationContext::new("test");
        let resolved = ReferenceResolver::new().resolve("What's Apple's stock price?", &ctx);

        assert_eq!(resolved.symbols, vec!["AAPL".to_string()]);
        assert!(!resolved.used_context);
    }

    #[test]
    fn test_explicit_mention_ignores_context() {
        let ctx = context_with(&["TSLA"]);
        let resolved = ReferenceResolver::new().resolve("What's the PE ratio of MSFT?", &ctx);

        assert_eq!(resolved.entity.as_deref(), Some("MSFT"));
        assert!(!resolved.used_context);
    }

    #[test]
    fn test_anaphora_binds_last_entity() {
        let ctx = context_with(&["AAPL"]);
        let resolved = ReferenceResolver::new().resolve("What about the fundamentals?", &ctx);

        assert_eq!(resolved.entity.as_deref(), Some("AAPL"));
        assert!(resolved.used_context);
    }

    #[test]
    fn test_pronoun_binds_last_entity() {
        let ctx = context_with(&["AAPL"]);
        let resolved = ReferenceResolver::new().resolve("What about its PE ratio?", &ctx);

        assert_eq!(resolved.entity.as_deref(), Some("AAPL"));
        assert!(resolved.used_context);
    }

    #[test]
    fn test_compare_them_binds_last_two() {
        let mut ctx = ConversationContext::new("test");
        ctx.record_turn("analyze AAPL", &["AAPL".to_string()], &[]);
        ctx.record_turn("now check GOOGL", &["GOOGL".to_string()], &[]);

        let resolved = ReferenceResolver::new().resolve("Compare them", &ctx);

        assert_eq!(
            resolved.symbols,
            vec!["AAPL".to_string(), "GOOGL".to_string()]
        );
        assert!(resolved.used_context);
    }

    #[test]
    fn test_compare_with_pulls_counterpart_from_context() {
        let ctx = context_with(&["AAPL"]);
        let resolved = ReferenceResolver::new().resolve("Compare with Microsoft", &ctx);

        assert_eq!(
            resolved.symbols,
            vec!["AAPL".to_string(), "MSFT".to_string()]
        );
        assert!(resolved.used_context);
    }

    #[test]
    fn test_unresolvable_without_context() {
        let ctx = ConversationContext::new("test");
        let resolved = ReferenceResolver::new().resolve("What about the fundamentals?", &ctx);

        assert!(resolved.symbols.is_empty());
        assert!(resolved.entity.is_none());
        assert!(!resolved.used_context);
    }

    #[test]
    fn test_indicator_acronyms_are_not_tickers() {
        let ctx = ConversationContext::new("test");
        let resolved = ReferenceResolver::new().resolve("Calculate RSI for AAPL", &ctx);

        assert_eq!(resolved.symbols, vec!["AAPL".to_string()]);
    }

    #[test]
    fn test_mention_order_preserved() {
        let ctx = ConversationContext::new("test");
        let resolved = ReferenceResolver::new().resolve("Compare Apple and Microsoft", &ctx);

        assert_eq!(
            resolved.symbols,
            vec!["AAPL".to_string(), "MSFT".to_string()]
        );
    }
}
