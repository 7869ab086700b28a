//! Prompt template registry
//!
//! Seeded with the premade prompts. Ids are not unique-checked: inserting an
//! existing id replaces the previous template (last write wins), which is
//! logged so accidental overwrites are visible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

/// Substitution marker for the user's input.
pub const PLACEHOLDER: &str = "{user_input}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub description: String,
    pub prompt: String,
}

impl PromptTemplate {
    pub fn new(name: &str, description: &str, prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            prompt: prompt.to_string(),
        }
    }

    pub fn placeholder_count(&self) -> usize {
        self.prompt.matches(PLACEHOLDER).count()
    }
}

/// Replace every placeholder in `augmented` with the user's input.
pub fn render(augmented: &str, user_input: &str) -> String {
    augmented.replace(PLACEHOLDER, user_input)
}

pub struct TemplateRegistry {
    prompts: RwLock<BTreeMap<String, PromptTemplate>>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_premade()
    }
}

impl TemplateRegistry {
    pub fn empty() -> Self {
        Self {
            prompts: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_premade() -> Self {
        let registry = Self::empty();
        {
            let mut prompts = registry.prompts.write().unwrap_or_else(PoisonError::into_inner);
            for (id, template) in premade_prompts() {
                prompts.insert(id.to_string(), template);
            }
        }
        registry
    }

    pub fn get(&self, id: &str) -> Option<PromptTemplate> {
        self.prompts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.prompts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Inserts or replaces. Returns `true` when an existing template was overwritten.
    pub fn insert(&self, id: &str, template: PromptTemplate) -> bool {
        if template.placeholder_count() != 1 {
            warn!(
                "Template '{}' has {} '{}' placeholders; expected exactly one",
                id,
                template.placeholder_count(),
                PLACEHOLDER
            );
        }

        let previous = self
            .prompts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), template);

        match previous {
            Some(old) => {
                warn!("Template '{}' overwritten (was '{}')", id, old.name);
                true
            }
            None => {
                info!("Template '{}' registered", id);
                false
            }
        }
    }

    pub fn list(&self) -> BTreeMap<String, PromptTemplate> {
        self.prompts.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.prompts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn premade_prompts() -> Vec<(&'static str, PromptTemplate)> {
    vec![
        (
            "code_review",
            PromptTemplate::new(
                "Code Review Assistant",
                "Analyzes code for bugs, best practices, and improvements",
                "Please review the following code and provide feedback on:\n1. Potential bugs or issues\n2. Code quality and best practices\n3. Performance optimizations\n4. Security concerns\n\nCode:\n{user_input}",
            ),
        ),
        (
            "documentation",
            PromptTemplate::new(
                "Documentation Generator",
                "Generates comprehensive documentation for code",
                "Generate detailed documentation for the following code including:\n1. Function/class descriptions\n2. Parameter explanations\n3. Return value descriptions\n4. Usage examples\n\nCode:\n{user_input}",
            ),
        ),
        (
            "bug_fix",
            PromptTemplate::new(
                "Bug Fix Assistant",
                "Helps identify and fix bugs in code",
                "Help me fix the following bug. Please:\n1. Identify the root cause\n2. Explain why the bug occurs\n3. Provide a corrected version\n4. Suggest prevention strategies\n\nBuggy code:\n{user_input}",
            ),
        ),
        (
            "refactor",
            PromptTemplate::new(
                "Code Refactoring",
                "Suggests improvements and refactoring for code",
                "Refactor the following code to improve:\n1. Readability and maintainability\n2. Performance\n3. Code organization\n4. Following best practices\n\nOriginal code:\n{user_input}",
            ),
        ),
        (
            "explain",
            PromptTemplate::new(
                "Code Explainer",
                "Explains complex code in simple terms",
                "Explain the following code in simple terms:\n1. What does it do?\n2. How does it work?\n3. Key concepts involved\n4. Potential use cases\n\nCode:\n{user_input}",
            ),
        ),
        (
            "csv_analysis",
            PromptTemplate::new(
                "CSV Data Analysis",
                "Analyzes CSV data and provides insights",
                "Analyze the following CSV data and provide:\n1. Data overview and structure\n2. Key statistics and patterns\n3. Potential insights and trends\n4. Recommendations for further analysis\n\nCSV Data:\n{user_input}",
            ),
        ),
        (
            "csv_clean",
            PromptTemplate::new(
                "CSV Data Cleaning",
                "Helps clean and prepare CSV data",
                "Help clean the following CSV data by:\n1. Identifying data quality issues\n2. Suggesting cleaning strategies\n3. Providing cleaned data recommendations\n4. Highlighting potential problems\n\nCSV Data:\n{user_input}",
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premade_prompts_are_seeded() {
        let registry = TemplateRegistry::with_premade();
        assert_eq!(registry.len(), 7);
        let ids = [
            "code_review",
            "documentation",
            "bug_fix",
            "refactor",
            "explain",
            "csv_analysis",
            "csv_clean",
        ];
        for id in ids {
            let template = registry.get(id).unwrap();
            assert_eq!(template.placeholder_count(), 1, "{id}");
        }
    }

    #[test]
    fn unknown_template_is_none() {
        assert!(TemplateRegistry::with_premade().get("poetry").is_none());
    }

    #[test]
    fn insert_new_template() {
        let registry = TemplateRegistry::empty();
        let template = PromptTemplate::new("SQL", "Writes SQL", "Write SQL for: {user_input}");
        let replaced = registry.insert("sql", template);
        assert!(!replaced);
        assert!(registry.contains("sql"));
    }

    #[test]
    fn duplicate_id_overwrites_last_write_wins() {
        let registry = TemplateRegistry::with_premade();
        let replaced = registry.insert(
            "explain",
            PromptTemplate::new("Plain Explainer", "Shorter", "ELI5: {user_input}"),
        );
        assert!(replaced);
        let template = registry.get("explain").unwrap();
        assert_eq!(template.name, "Plain Explainer");
        assert_eq!(template.prompt, "ELI5: {user_input}");
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn template_without_placeholder_is_still_accepted() {
        let registry = TemplateRegistry::empty();
        registry.insert("static", PromptTemplate::new("Static", "No input", "Say hello"));
        assert_eq!(registry.get("static").unwrap().placeholder_count(), 0);
    }

    #[test]
    fn render_substitutes_input() {
        assert_eq!(render("Code:\n{user_input}\nEnd", "fn main() {}"), "Code:\nfn main() {}\nEnd");
        assert_eq!(render("no marker", "ignored"), "no marker");
    }
}
