//! Prompt construction for the LLM planner

use url::Url;

use crate::planning::Chunk;

const INSTRUCTIONS: &str = r#"You are an expert software engineer building Model Context Protocol (MCP) servers.
Read the API documentation excerpt below and extract the REST endpoints it describes.

Respond with a single JSON object and nothing else, using exactly this shape:
{
  "service_name": "short snake_case name of the API",
  "base_url": "absolute base URL that endpoint paths are relative to",
  "auth_hints": ["required credentials or setup, one per entry"],
  "resources": [
    {
      "name": "unique resource name",
      "description": "what the resource represents",
      "endpoints": [
        {
          "method": "GET | POST | PUT | PATCH | DELETE",
          "path_template": "/path/with/{placeholders}",
          "description": "what the endpoint does",
          "parameters": [
            {"name": "id", "location": "path | query | body | header", "required": true, "type_hint": "string"}
          ]
        }
      ]
    }
  ]
}

Rules:
- Only include endpoints that the excerpt actually documents.
- Every {placeholder} in path_template needs a parameter with location "path".
- Use upper-case HTTP methods.
- If the excerpt documents no endpoints, return an empty "resources" list."#;

/// Fills the fixed instruction template with one chunk of documentation
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    root_url: Url,
    title: Option<String>,
}

impl PromptBuilder {
    pub fn new(root_url: Url, title: Option<String>) -> Self {
        Self { root_url, title }
    }

    /// Prompt for `chunk`, which is one of `total` chunks
    pub fn build(&self, chunk: &Chunk, total: usize) -> String {
        let mut prompt = String::with_capacity(INSTRUCTIONS.len() + chunk.text.len() + 256);
        prompt.push_str(INSTRUCTIONS);
        prompt.push_str("\n\n");
        if let Some(title) = &self.title {
            prompt.push_str(&format!("Documentation title: {title}\n"));
        }
        prompt.push_str(&format!("Documentation root: {}\n", self.root_url));
        prompt.push_str(&format!("Excerpt {} of {}:\n\n", chunk.index + 1, total));
        prompt.push_str(&chunk.text);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let builder = PromptBuilder::new(
            Url::parse("https://docs.example.com/").unwrap(),
            Some("Example API".to_string()),
        );
        let chunk = Chunk {
            index: 1,
            text: "Source: https://docs.example.com/users\n\nGET /users".to_string(),
            sources: Vec::new(),
        };

        let prompt = builder.build(&chunk, 3);
        assert!(prompt.starts_with("You are an expert software engineer"));
        assert!(prompt.contains("\"path_template\""));
        assert!(prompt.contains("Documentation title: Example API\n"));
        assert!(prompt.contains("Documentation root: https://docs.example.com/\n"));
        assert!(prompt.contains("Excerpt 2 of 3:"));
        assert!(prompt.ends_with("GET /users"));
    }

    #[test]
    fn test_prompt_without_title() {
        let builder = PromptBuilder::new(Url::parse("https://docs.example.com/").unwrap(), None);
        let chunk = Chunk {
            index: 0,
            text: "text".to_string(),
            sources: Vec::new(),
        };
        assert!(!builder.build(&chunk, 1).contains("Documentation title"));
    }
}
