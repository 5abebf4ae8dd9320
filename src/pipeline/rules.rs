//! Keyword rules engine for intent classification.
//!
//! Rules are checked in priority order and the first match wins. The order
//! is observable: "entrega" belongs to the delay rule, so a message asking
//! to "alterar o endereço de entrega" classifies as delay, not refund.
//!
//! Default table:
//! 1. "status do meu pedido" / "acompanhar meu pedido" → Status
//! 2. "demora" / "entrega" → Delay
//! 3. "cancelar meu pedido" / "solicitar reembolso" /
//!    "alterar o endereço de entrega" / "troca e devolução" → RefundCancel
//! 4. "chegou danificado" / "defeito" / "pedido extraviado" → DamagedLost
//! 5. "promoções" / "cupons" → Promotions
//!
//! Anything else is `Category::Unhandled`.

use regex::Regex;
use tracing::debug;

use crate::pipeline::types::Category;

/// One keyword rule: any keyword occurring anywhere in the content matches.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    /// Category assigned on match.
    pub category: Category,
    /// Lower-case keywords, for logging.
    pub keywords: Vec<String>,
    /// Alternation of the escaped keywords.
    pub regex: Regex,
}

impl ClassificationRule {
    /// Build a rule from literal keywords (matched as lower-case substrings).
    pub fn new(category: Category, keywords: &[&str]) -> Result<Self, regex::Error> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let pattern = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Self {
            category,
            regex: Regex::new(&pattern)?,
            keywords,
        })
    }

    fn matches(&self, lowered: &str) -> bool {
        !self.keywords.is_empty() && self.regex.is_match(lowered)
    }
}

/// Ordered keyword classifier.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    rules: Vec<ClassificationRule>,
}

impl RulesEngine {
    /// Create a rules engine with the default support-topic table.
    pub fn default_rules() -> Self {
        let table: [(Category, &[&str]); 5] = [
            (
                Category::Status,
                &["status do meu pedido", "acompanhar meu pedido"],
            ),
            (Category::Delay, &["demora", "entrega"]),
            (
                Category::RefundCancel,
                &[
                    "cancelar meu pedido",
                    "solicitar reembolso",
                    "alterar o endereço de entrega",
                    "troca e devolução",
                ],
            ),
            (
                Category::DamagedLost,
                &["chegou danificado", "defeito", "pedido extraviado"],
            ),
            (Category::Promotions, &["promoções", "cupons"]),
        ];

        let rules = table
            .into_iter()
            .map(|(category, keywords)| {
                // Escaped literals always compile.
                ClassificationRule::new(category, keywords).unwrap()
            })
            .collect();

        Self { rules }
    }

    /// Create an empty rules engine (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule with lower priority than every existing rule.
    pub fn add_rule(&mut self, category: Category, keywords: &[&str]) -> Result<(), regex::Error> {
        self.rules.push(ClassificationRule::new(category, keywords)?);
        Ok(())
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Return the first rule matching the content, if any.
    pub fn evaluate(&self, content: &str) -> Option<&ClassificationRule> {
        let lowered = content.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Classify message content. Never fails: no match is `Unhandled`.
    pub fn classify(&self, content: &str) -> Category {
        match self.evaluate(content) {
            Some(rule) => {
                debug!(
                    category = %rule.category,
                    keywords = ?rule.keywords,
                    "Message matched rule"
                );
                rule.category
            }
            None => {
                debug!("No rule matched, message is unhandled");
                Category::Unhandled
            }
        }
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::default_rules()
    }
}
