//! Typed tool descriptors
//!
//! A descriptor is the static metadata for one remote capability: what the
//! tool does, when to reach for it, and the parameter schema it accepts.
//! Descriptors are immutable after catalog load; identity is the tool id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    StringList,
}

impl ParamType {
    /// Check whether a JSON value is compatible with this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// Schema entry for one tool parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name as the tool server expects it
    pub name: String,

    /// Declared value type
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Whether the parameter must be bound for the tool to be invocable
    #[serde(default)]
    pub required: bool,

    /// Default value for optional parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Static metadata describing one remote tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique id, namespaced as `server.tool`
    pub id: String,

    /// Name of the server this tool is bound to
    pub server: String,

    /// What the tool does
    pub description: String,

    /// Free-text guidance on when the tool applies
    pub when_to_use: String,

    /// Example queries the tool answers well
    #[serde(default)]
    pub examples: Vec<String>,

    /// Parameter schema, in declaration order
    #[serde(default)]
    pub params: Vec<ParamSpec>,

    /// Category tag for grouped iteration
    pub category: String,

    /// Capability tags matched against detected query signals
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Relative invocation cost, used as a selection tie-break
    #[serde(default)]
    pub cost: f64,
}

impl ToolDescriptor {
    /// Look up a parameter spec by name
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Iterate required parameters
    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.required)
    }

    /// Iterate optional parameters
    pub fn optional_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| !p.required)
    }

    /// Check for a capability tag
    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.iter().any(|c| c == tag)
    }

    /// The single-symbol parameter, if the tool takes one
    pub fn symbol_param(&self) -> Option<&ParamSpec> {
        self.param("symbol")
            .filter(|p| p.param_type == ParamType::String)
    }

    /// The multi-symbol parameter, if the tool natively accepts several symbols
    pub fn symbols_param(&self) -> Option<&ParamSpec> {
        self.param("symbols")
            .filter(|p| p.param_type == ParamType::StringList)
    }

    /// Score this descriptor's text metadata against a query
    ///
    /// Whole-phrase hits on description/when_to_use/examples score highest,
    /// then per-word overlap. Purely lexical and deterministic; capability-tag
    /// matching is layered on top by the selector.
    pub fn relevance(&self, query: &str) -> f64 {
        let query = query.to_lowercase();
        let description = self.description.to_lowercase();
        let when_to_use = self.when_to_use.to_lowercase();
        let mut score = 0.0;

        if description.contains(&query) {
            score += 1.0;
        }
        if when_to_use.contains(&query) {
            score += 0.8;
        }
        if self
            .examples
            .iter()
            .any(|example| example.to_lowercase() == query)
        {
            score += 0.6;
        }

        for word in query_words(&query) {
            if description.contains(word) {
                score += 0.25;
            }
            if when_to_use.contains(word) {
                score += 0.4;
            }
            if self
                .examples
                .iter()
                .any(|example| example.to_lowercase().contains(word))
            {
                score += 0.3;
            }
            if self.capabilities.iter().any(|c| c == word) {
                score += 0.5;
            }
        }

        score
    }
}

/// Split a lowercased query into words worth matching
///
/// Short words and bare punctuation carry no signal and would inflate scores.
fn query_words(query: &str) -> impl Iterator<Item = &str> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            id: "stock_data.get_price".to_string(),
            server: "stock_data".to_string(),
            description: "Analyzes stock prices, historical data, and volume trends".to_string(),
            when_to_use: "User asks about stock prices, price history, or volume".to_string(),
            examples: vec!["What's Apple's stock price?".to_string()],
            params: vec![
                ParamSpec {
                    name: "symbol".to_string(),
                    param_type: ParamType::String,
                    required: true,
                    default: None,
                },
                ParamSpec {
                    name: "period".to_string(),
                    param_type: ParamType::String,
                    required: false,
                    default: Some(json!("1mo")),
                },
            ],
            category: "market_data".to_string(),
            capabilities: vec!["price".to_string()],
            cost: 1.0,
        }
    }

    #[test]
    fn test_param_type_accepts() {
        assert!(ParamType::String.accepts(&json!("1mo")));
        assert!(!ParamType::String.accepts(&json!(5)));
        assert!(ParamType::Integer.accepts(&json!(14)));
        assert!(!ParamType::Integer.accepts(&json!(14.5)));
        assert!(ParamType::Number.accepts(&json!(14.5)));
        assert!(ParamType::Boolean.accepts(&json!(true)));
        assert!(ParamType::StringList.accepts(&json!(["rsi", "macd"])));
        assert!(!ParamType::StringList.accepts(&json!([1, 2])));
    }

    #[test]
    fn test_param_split() {
        let tool = descriptor();
        let required: Vec<_> = tool.required_params().map(|p| p.name.as_str()).collect();
        let optional: Vec<_> = tool.optional_params().map(|p| p.name.as_str()).collect();
        assert_eq!(required, vec!["symbol"]);
        assert_eq!(optional, vec!["period"]);
    }

    #[test]
    fn test_symbol_param_detection() {
        let tool = descriptor();
        assert!(tool.symbol_param().is_some());
        assert!(tool.symbols_param().is_none());
    }

    #[test]
    fn test_relevance_whole_phrase_beats_word_overlap() {
        let tool = descriptor();
        let exact = tool.relevance("What's Apple's stock price?");
        let partial = tool.relevance("show volume");
        assert!(exact > partial);
        assert!(partial > 0.0);
    }

    #[test]
    fn test_relevance_zero_for_unrelated_query() {
        let tool = descriptor();
        assert_eq!(tool.relevance("hmm"), 0.0);
    }
}
