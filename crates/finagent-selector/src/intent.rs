//! Lexical intent signals detected from query text
//!
//! Signals are purely keyword-driven so the same query always yields the same
//! signal set. They steer which capability tags the selector favors and how
//! optional parameters (period, indicators, statement type) get bound.

/// Capability areas a query can signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuerySignal {
    /// Price, quote, or volume data
    Price,
    /// Company fundamentals and valuation
    Fundamental,
    /// Detailed financial statements
    Financials,
    /// Technical indicators
    Technical,
    /// Chart patterns and trend structure
    Patterns,
    /// Multi-stock comparison
    Comparison,
}

impl QuerySignal {
    /// Capability tag matched against descriptor capabilities
    pub fn capability_tag(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Fundamental => "fundamentals",
            Self::Financials => "financials",
            Self::Technical => "indicators",
            Self::Patterns => "patterns",
            Self::Comparison => "comparison",
        }
    }

    /// All signals in detection order, which is also plan presentation order
    pub fn all() -> [Self; 6] {
        [
            Self::Price,
            Self::Fundamental,
            Self::Financials,
            Self::Technical,
            Self::Patterns,
            Self::Comparison,
        ]
    }
}

/// Keywords for signal detection
mod keywords {
    pub const PRICE: &[&str] = &[
        "price",
        "quote",
        "stock price",
        "how much",
        "volume",
        "performed",
        "trading at",
        "price history",
    ];

    pub const FUNDAMENTAL: &[&str] = &[
        "fundamental",
        "pe ratio",
        "p/e",
        "valuation",
        "market cap",
        "earnings",
        "dividend",
        "overvalued",
        "undervalued",
    ];

    /// Short fundamental tokens, matched on word boundaries
    pub const FUNDAMENTAL_WORDS: &[&str] = &["eps"];

    pub const FINANCIALS: &[&str] = &[
        "income statement",
        "balance sheet",
        "cash flow",
        "revenue",
        "financials",
        "expenses",
        "debt",
        "assets",
    ];

    pub const TECHNICAL: &[&str] = &[
        "technical",
        "indicator",
        "moving average",
        "bollinger",
        "stochastic",
        "oversold",
        "overbought",
        "trading signal",
    ];

    /// Short indicator tokens, matched on word boundaries
    pub const TECHNICAL_WORDS: &[&str] = &["rsi", "macd", "sma", "ema", "atr"];

    pub const PATTERNS: &[&str] = &[
        "pattern",
        "support",
        "resistance",
        "trend",
        "uptrend",
        "downtrend",
        "breakout",
        "setup",
    ];

    pub const COMPARISON: &[&str] = &[
        "compare",
        "comparison",
        "versus",
        "vs",
        "against",
        "correlation",
        "better",
        "which",
    ];

    pub const CAPABILITY: &[&str] = &[
        "what can you do",
        "what do you do",
        "what tools",
        "how do you work",
        "what kind of analysis",
        "what can you help",
        "what can you assist",
        "your capabilities",
        "who are you",
    ];

    /// Multi-word anaphoric cues, matched as substrings
    pub const ANAPHORA_PHRASES: &[&str] = &[
        "what about",
        "how about",
        "and the",
        "same for",
        "and for",
        "the stock",
        "the chart",
    ];

    /// Single-word anaphoric cues, matched as whole words
    pub const ANAPHORA_WORDS: &[&str] = &["it", "its", "that", "them", "they", "this"];
}

/// Time-modifier phrases mapped to period values
const TIME_PHRASES: &[(&str, &str)] = &[
    ("last year", "1y"),
    ("past year", "1y"),
    ("last month", "1mo"),
    ("past month", "1mo"),
    ("last week", "1wk"),
    ("yesterday", "1d"),
    ("year to date", "ytd"),
    ("ytd", "ytd"),
];

/// Indicator names recognized in queries
const INDICATOR_WORDS: &[&str] = &[
    "rsi",
    "macd",
    "sma",
    "ema",
    "bollinger",
    "stochastic",
    "atr",
    "obv",
    "volume",
];

/// Check if query contains any of the keywords
fn matches_any(query: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| query.contains(kw))
}

/// Check if query contains any of the words, on word boundaries
fn matches_any_word(query: &str, words: &[&str]) -> bool {
    query
        .split(|c: char| !c.is_alphanumeric() && c != '/')
        .any(|w| words.contains(&w))
}

/// Detect all capability signals in a query, in fixed order
pub fn detect_signals(query: &str) -> Vec<QuerySignal> {
    let query = query.to_lowercase();
    let mut signals = Vec::new();

    if matches_any(&query, keywords::PRICE) {
        signals.push(QuerySignal::Price);
    }
    if matches_any(&query, keywords::FUNDAMENTAL)
        || matches_any_word(&query, keywords::FUNDAMENTAL_WORDS)
    {
        signals.push(QuerySignal::Fundamental);
    }
    if matches_any(&query, keywords::FINANCIALS) {
        signals.push(QuerySignal::Financials);
    }
    if matches_any(&query, keywords::TECHNICAL)
        || matches_any_word(&query, keywords::TECHNICAL_WORDS)
    {
        signals.push(QuerySignal::Technical);
    }
    if matches_any(&query, keywords::PATTERNS) {
        signals.push(QuerySignal::Patterns);
    }
    if matches_any_word(&query, keywords::COMPARISON) {
        signals.push(QuerySignal::Comparison);
    }

    tracing::debug!(?signals, "Detected query signals");
    signals
}

/// Check for a capability/FAQ query that needs no tool
pub fn is_capability_query(query: &str) -> bool {
    matches_any(&query.to_lowercase(), keywords::CAPABILITY)
}

/// Check for an anaphoric cue referring back to an earlier subject
pub fn has_anaphoric_cue(query: &str) -> bool {
    let query = query.to_lowercase();
    matches_any(&query, keywords::ANAPHORA_PHRASES)
        || matches_any_word(&query, keywords::ANAPHORA_WORDS)
}

/// Check for a comparison cue
pub fn has_comparison_cue(query: &str) -> bool {
    matches_any_word(&query.to_lowercase(), keywords::COMPARISON)
}

/// Map a time-modifier phrase to a period value
pub fn time_modifier(query: &str) -> Option<&'static str> {
    let query = query.to_lowercase();
    TIME_PHRASES
        .iter()
        .find(|(phrase, _)| query.contains(phrase))
        .map(|(_, period)| *period)
}

/// Extract named technical indicators from a query
pub fn indicator_names(query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    let mut indicators = Vec::new();
    for name in INDICATOR_WORDS {
        if matches_any_word(&query, &[*name]) {
            indicators.push((*name).to_string());
        }
    }

    // Phrase form that word matching misses
    if query.contains("moving average") && !indicators.iter().any(|i| i == "sma") {
        indicators.push("sma".to_string());
    }

    indicators
}

/// Map statement words to a statement_type value
pub fn statement_type(query: &str) -> Option<&'static str> {
    let query = query.to_lowercase();
    if query.contains("income") || query.contains("revenue") || query.contains("expenses") {
        Some("income")
    } else if query.contains("balance") || query.contains("debt") || query.contains("assets") {
        Some("balance")
    } else if query.contains("cash flow") || query.contains("cash") {
        Some("cash")
    } else {
        None
    }
}
