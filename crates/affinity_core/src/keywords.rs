//! Keyword-category affection analysis.
//!
//! Each category is a named keyword list with one fixed delta. A message
//! earns a category's delta once if any keyword occurs as a substring of the
//! lowercased text. Substring (not whole-word) matching is intentional:
//! "unique" also fires inside "uniquely".

use crate::error::TableError;
use serde::{Deserialize, Serialize};

const COMPLIMENTS: &[&str] = &[
    "beautiful", "handsome", "cute", "pretty", "gorgeous", "amazing",
    "wonderful", "incredible", "perfect", "stunning", "attractive",
    "genius", "fantastic", "smart", "intelligent", "unique", "brilliant",
    "interesting", "clever", "capable", "appreciate", "appreciative",
    "bright", "cheerful", "commendable", "composed", "dedicated",
    "determined", "encourage", "engaging", "enthusiastic", "enthusiasm",
    "excellent", "friendly", "generous", "genuine", "good choice", "good call",
    "good idea", "great idea", "great choice", "great call", "helpful", "impressive",
    "likable", "lovely", "loyal", "motivated", "observant", "optimistic", "optimism",
    "outstanding", "perceptive", "polite", "prudent", "proactive", "respectful", "respect",
    "sensible", "sincere", "superb", "terrific", "thoughtful", "tremendous", "trustworthy",
    "i trust you", "i believe in you",
];

const ROMANTIC: &[&str] = &[
    "i love you", "i adore you", "i cherish you", "kiss", "date",
    "commit", "be together", "future together", "marry me", "marry you",
    "caress", "our relationship", "affection", "date with me", "date you",
    "be with you", "you are perfect", "you're perfect", "you are my everything",
    "you make me happy", "i want you",
];

const VULNERABILITY: &[&str] = &[
    "scared", "afraid", "worried", "insecure", "anxious", "fear",
    "vulnerable", "hurt", "pain", "struggling", "difficult",
    "vulnerability", "open up", "terrified", "terrifies",
];

const RUDE: &[&str] = &[
    "you're stupid", "you're an idiot", "you're dumb", "shut up", "i hate you",
    "you're ugly", "loser", "you're worthless", "you're pathetic", "you're annoying",
    "you suck", "you're the worst", "leave me alone", "go away", "i don't like you",
    "never want you", "never love you", "go fuck yourself",
];

const HUMOR: &[&str] = &[
    "chuckle", "giggle", "grin", "funny", "laugh", "hilarious", "guffaw",
];

const ASKING_ABOUT_CHARACTER: &[&str] = &[
    "what about you", "tell me about yourself", "your thoughts", "your opinion",
    "how do you feel", "what do you think", "about you", "about yourself",
];

/// Name of the flat per-message bonus category in the default table.
pub const BASE_MESSAGE: &str = "base_message";

/// A named keyword group sharing one fixed delta.
///
/// An empty keyword list marks an "always applies" category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub name: String,
    pub keywords: Vec<String>,
    pub delta: i32,
}

impl KeywordCategory {
    pub fn always_applies(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords of this category found in an already-lowercased message, in table order.
    fn matches_in(&self, lowered: &str) -> Vec<String> {
        self.keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .cloned()
            .collect()
    }
}

/// One category that contributed to an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub category: String,
    /// Empty for "always applies" categories.
    pub matched_keywords: Vec<String>,
    pub delta: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_delta: i32,
    pub matches: Vec<KeywordMatch>,
}

impl AnalysisResult {
    /// Matches driven by message content, skipping flat bonuses.
    pub fn keyword_matches(&self) -> impl Iterator<Item = &KeywordMatch> {
        self.matches.iter().filter(|m| !m.matched_keywords.is_empty())
    }

    /// True when no content category fired.
    pub fn is_neutral(&self) -> bool {
        self.keyword_matches().next().is_none()
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.category.as_str()).collect()
    }
}

/// Stateless-per-call keyword classifier.
///
/// Categories are evaluated in registration order and are independent:
/// any number of them can fire on the same message.
#[derive(Debug, Clone, Default)]
pub struct KeywordAnalyzer {
    categories: Vec<KeywordCategory>,
}

impl KeywordAnalyzer {
    /// Analyzer with no categories. Every message scores 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default affection table.
    pub fn canonical() -> Self {
        let mut analyzer = Self::new();
        let table: [(&str, &[&str], i32); 7] = [
            ("compliments", COMPLIMENTS, 3),
            ("romantic", ROMANTIC, 10),
            ("vulnerability", VULNERABILITY, 5),
            ("rude", RUDE, -5),
            ("humor", HUMOR, 3),
            ("asking_about_character", ASKING_ABOUT_CHARACTER, 3),
            (BASE_MESSAGE, &[], 2),
        ];
        for (name, keywords, delta) in table {
            analyzer.categories.push(KeywordCategory {
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                delta,
            });
        }
        analyzer
    }

    /// Build an analyzer from a list of categories, rejecting duplicates.
    pub fn from_categories<I>(categories: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = KeywordCategory>,
    {
        let mut analyzer = Self::new();
        for c in categories {
            analyzer.register_category(&c.name, c.keywords, c.delta)?;
        }
        Ok(analyzer)
    }

    /// Register a new category.
    ///
    /// Keywords are lowercased; blanks and repeats are dropped, keeping
    /// first-seen order. A category registered with no keywords always applies.
    pub fn register_category<I, S>(
        &mut self,
        name: &str,
        keywords: I,
        delta: i32,
    ) -> Result<(), TableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(name, keywords, delta)?;
        if let Some(added) = self.categories.last() {
            tracing::debug!(
                category = %added.name,
                keywords = added.keywords.len(),
                delta = added.delta,
                "Registered keyword category"
            );
        }
        Ok(())
    }

    fn insert<I, S>(&mut self, name: &str, keywords: I, delta: i32) -> Result<(), TableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(TableError::EmptyCategoryName);
        }
        if self.category(name).is_some() {
            return Err(TableError::DuplicateCategory(name.to_string()));
        }

        let mut lowered: Vec<String> = Vec::new();
        for k in keywords {
            let k = k.as_ref().to_lowercase();
            if k.trim().is_empty() || lowered.contains(&k) {
                continue;
            }
            lowered.push(k);
        }

        self.categories.push(KeywordCategory {
            name: name.to_string(),
            keywords: lowered,
            delta,
        });
        Ok(())
    }

    /// Score one message against every registered category.
    ///
    /// The total saturates at the `i32` bounds, so custom tables with extreme
    /// deltas still produce a result.
    pub fn analyze(&self, message: &str) -> AnalysisResult {
        let lowered = message.to_lowercase();
        let mut result = AnalysisResult::default();

        for category in &self.categories {
            let matched_keywords = if category.always_applies() {
                Vec::new()
            } else {
                let found = category.matches_in(&lowered);
                if found.is_empty() {
                    continue;
                }
                found
            };

            result.total_delta = result.total_delta.saturating_add(category.delta);
            result.matches.push(KeywordMatch {
                category: category.name.clone(),
                matched_keywords,
                delta: category.delta,
            });
        }

        result
    }

    pub fn categories(&self) -> &[KeywordCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&KeywordCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
