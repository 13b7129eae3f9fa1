//! Prompt service implementation.
//!
//! Prompts are defined in `definitions/` and registered via `registry.rs`.

use rmcp::model::{GetPromptResult, Prompt, PromptMessage, PromptMessageRole};
use std::collections::HashMap;
use tracing::{debug, info};

use super::error::PromptError;
use super::registry::get_all_prompts;
use super::templates::PromptTemplate;

/// Service for listing and rendering prompts.
pub struct PromptService {
    /// Key: prompt name.
    prompts: HashMap<String, PromptTemplate>,
}

impl Default for PromptService {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptService {
    pub fn new() -> Self {
        info!("Initializing PromptService");
        let mut service = Self {
            prompts: HashMap::new(),
        };
        for template in get_all_prompts() {
            service.register_prompt(template);
        }
        service
    }

    pub fn register_prompt(&mut self, template: PromptTemplate) {
        debug!("Registering prompt: {}", template.name);
        self.prompts.insert(template.name.clone(), template);
    }

    /// List all available prompts, sorted by name.
    pub async fn list_prompts(&self) -> Vec<Prompt> {
        let mut prompts: Vec<_> = self
            .prompts
            .values()
            .map(|template| Prompt {
                name: template.name.clone(),
                title: None,
                description: template.description.clone(),
                arguments: Some(template.arguments.clone()),
                icons: None,
                meta: None,
            })
            .collect();
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        prompts
    }

    /// Get a prompt with arguments substituted.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<GetPromptResult, PromptError> {
        let template = self
            .prompts
            .get(name)
            .ok_or_else(|| PromptError::not_found(name))?;
        let arguments = arguments.unwrap_or_default();

        if let Some(missing) = template.arguments.iter().find(|arg| {
            arg.required.unwrap_or(false)
                && arguments.get(&arg.name).is_none_or(|v| v.trim().is_empty())
        }) {
            return Err(PromptError::missing_argument(&missing.name));
        }

        let content = template.render(&arguments)?;
        Ok(GetPromptResult {
            description: template.description.clone(),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, content)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::PromptMessageContent;

    fn first_text(result: &GetPromptResult) -> &str {
        match &result.messages[0].content {
            PromptMessageContent::Text { text } => text,
            _ => panic!("expected text message"),
        }
    }

    #[tokio::test]
    async fn test_list_prompts() {
        let prompts = PromptService::new().list_prompts().await;
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name, "mood_playlist");
    }

    #[tokio::test]
    async fn test_mood_playlist_renders_optional_parts() {
        let service = PromptService::new();
        let args = HashMap::from([
            ("mood".to_string(), "nostalgic 🌅".to_string()),
            ("language".to_string(), "hindi".to_string()),
        ]);
        let result = service.get_prompt("mood_playlist", Some(args)).await.unwrap();
        let text = first_text(&result);
        assert!(text.starts_with("I'm feeling nostalgic 🌅. Build me a playlist"));
        assert!(text.contains("with hindi songs"));
        assert!(!text.contains("long"));
        assert!(text.contains("generate_mood_playlist"));
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let service = PromptService::new();
        let result = service.get_prompt("mood_playlist", None).await;
        assert!(matches!(result, Err(PromptError::MissingArgument(_))));
    }

    #[tokio::test]
    async fn test_get_nonexistent_prompt() {
        let result = PromptService::new().get_prompt("nonexistent", None).await;
        assert!(matches!(result, Err(PromptError::NotFound(_))));
    }
}
