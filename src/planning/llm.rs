//! LLM Planner
//!
//! Chunks the corpus, asks the completion service for a blueprint per chunk,
//! validates each answer as untrusted input and merges the survivors.
//! Transport-level failures fail the whole plan so the pipeline can fall back
//! to the heuristic planner; a single unparseable answer only drops its chunk.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::blueprint::{Blueprint, validate, validate_blueprint};
use crate::ingestion::Corpus;
use crate::planning::{
    BlueprintMerger, CompletionClient, CompletionError, PlannerError, PromptBuilder,
    ResponseError, chunk_corpus, origin_of, service_name_for,
};

pub const DEFAULT_CHUNK_CHARS: usize = 12_000;
pub const DEFAULT_PLANNER_CONCURRENCY: usize = 2;

/// A blueprint produced by a planner plus its recoverable problems
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub blueprint: Blueprint,
    pub warnings: Vec<String>,
}

/// Plans a blueprint through an external completion service
pub struct LlmPlanner {
    client: Arc<dyn CompletionClient>,
    chunk_chars: usize,
    concurrency: usize,
}

impl LlmPlanner {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            chunk_chars: DEFAULT_CHUNK_CHARS,
            concurrency: DEFAULT_PLANNER_CONCURRENCY,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn plan(&self, corpus: &Corpus) -> Result<PlanOutcome, PlannerError> {
        // 1. Chunk the corpus
        let chunks = chunk_corpus(corpus, self.chunk_chars);
        if chunks.is_empty() {
            return Err(PlannerError::EmptyCorpus);
        }
        let total = chunks.len();
        info!(
            "Planning with {} over {} chunk(s)",
            self.client.describe(),
            total
        );

        // 2. Ask for one partial blueprint per chunk, then restore chunk order
        let prompts = PromptBuilder::new(corpus.root_url.clone(), corpus.title().map(str::to_string));
        let mut responses: Vec<(usize, Result<String, CompletionError>)> = stream::iter(chunks.iter())
            .map(|chunk| {
                let prompt = prompts.build(chunk, total);
                let client = Arc::clone(&self.client);
                async move { (chunk.index, client.complete(&prompt).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        responses.sort_by_key(|(index, _)| *index);

        // 3. Parse and merge in chunk order
        let default_service_name = service_name_for(&corpus.root_url);
        let default_base_url = origin_of(&corpus.root_url);
        let mut merger = BlueprintMerger::new();
        let mut warnings = Vec::new();

        for (index, response) in responses {
            let raw = response?;
            match parse_completion(&raw, &default_service_name, &default_base_url) {
                Ok(partial) => {
                    debug!(
                        "Chunk {}/{} yielded {} resource(s)",
                        index + 1,
                        total,
                        partial.resources.len()
                    );
                    merger.add(index, partial);
                }
                Err(error) => {
                    let message = format!("chunk {} of {} dropped: {}", index + 1, total, error);
                    warn!("{message}");
                    warnings.push(message);
                }
            }
        }

        // 4. Validate the merged result
        let (merged, merge_warnings) = merger.finish(&default_service_name, &default_base_url);
        warnings.extend(merge_warnings);
        let blueprint = merged.ok_or(PlannerError::NoUsableResources { chunks: total })?;
        let blueprint = validate_blueprint(blueprint)?;

        Ok(PlanOutcome {
            blueprint,
            warnings,
        })
    }
}

/// Plan with default chunking and concurrency
pub async fn plan_llm(
    corpus: &Corpus,
    client: Arc<dyn CompletionClient>,
) -> Result<PlanOutcome, PlannerError> {
    LlmPlanner::new(client).plan(corpus).await
}

/// Parse one raw completion into a validated partial blueprint.
///
/// Code fences and prose around the JSON object are tolerated. A missing
/// `service_name` or `base_url` is filled from the crawl root since a single
/// excerpt often does not mention either.
pub fn parse_completion(
    raw: &str,
    default_service_name: &str,
    default_base_url: &str,
) -> Result<Blueprint, ResponseError> {
    let mut value = extract_json_object(raw)
        .ok_or_else(|| ResponseError::Malformed("no JSON object found".to_string()))?;

    let Some(object) = value.as_object_mut() else {
        return Err(ResponseError::Malformed("top-level value is not an object".to_string()));
    };
    for (key, default) in [("service_name", default_service_name), ("base_url", default_base_url)] {
        let missing = match object.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            object.insert(key.to_string(), Value::String(default.to_string()));
        }
    }

    Ok(validate(&value)?)
}

/// The first JSON object embedded in `raw`. Prose around it may contain
/// braces of its own (`replace {id} with ...`), so parsing is attempted from
/// every `{` in turn and stops at the end of the first complete object.
fn extract_json_object(raw: &str) -> Option<Value> {
    raw.match_indices('{').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if value.is_object() => Some(value),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::HttpMethod;
    use crate::ingestion::Page;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Answers by chunk number, read from the "Excerpt i of n" prompt line
    struct ScriptedClient {
        answers: Vec<Result<String, CompletionError>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(answers: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                answers,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let index = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Excerpt "))
                .and_then(|rest| rest.split_whitespace().next())
                .and_then(|n| n.parse::<usize>().ok())
                .expect("prompt names its excerpt");
            self.answers[index - 1].clone()
        }
    }

    fn corpus_with_pages(count: usize, body_len: usize) -> Corpus {
        let root = Url::parse("https://docs.example.com/").unwrap();
        let mut corpus = Corpus::new(root.clone());
        for i in 0..count {
            corpus.pages.push(Page {
                url: root.join(&format!("/p{i}")).unwrap(),
                title: Some(format!("Page {i}")),
                text: "z".repeat(body_len),
                outbound_links: Vec::new(),
                depth: 0,
            });
        }
        corpus
    }

    fn answer(resource: &str, method: &str, path: &str) -> String {
        format!(
            r#"{{"service_name": "example", "base_url": "https://api.example.com", "resources": [{{"name": "{resource}", "description": "", "endpoints": [{{"method": "{method}", "path_template": "{path}", "parameters": [], "description": ""}}]}}]}}"#
        )
    }

    #[tokio::test]
    async fn test_plans_and_merges_chunks_in_order() {
        let corpus = corpus_with_pages(3, 300);
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(answer("users", "GET", "/users")),
            Ok(format!("```json\n{}\n```", answer("users", "POST", "/users"))),
            Ok(answer("orders", "GET", "/orders")),
        ]));

        let outcome = LlmPlanner::new(client.clone())
            .with_chunk_chars(400)
            .with_concurrency(3)
            .plan(&corpus)
            .await
            .unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert!(outcome.warnings.is_empty());
        let blueprint = outcome.blueprint;
        assert_eq!(blueprint.base_url, "https://api.example.com");
        assert_eq!(blueprint.resources.len(), 2);
        assert_eq!(blueprint.resources[0].name, "users");
        assert_eq!(blueprint.resources[0].endpoints[1].method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_dropped_with_warning() {
        let corpus = corpus_with_pages(2, 300);
        let client = Arc::new(ScriptedClient::new(vec![
            Ok("Sorry, I cannot help with that.".to_string()),
            Ok(answer("items", "GET", "/items")),
        ]));

        let outcome = LlmPlanner::new(client)
            .with_chunk_chars(400)
            .plan(&corpus)
            .await
            .unwrap();

        assert_eq!(outcome.blueprint.resources[0].name, "items");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("chunk 1 of 2 dropped"));
    }

    #[tokio::test]
    async fn test_transport_error_fails_the_plan() {
        let corpus = corpus_with_pages(2, 300);
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(answer("items", "GET", "/items")),
            Err(CompletionError::Authentication("invalid key".to_string())),
        ]));

        let result = LlmPlanner::new(client).with_chunk_chars(400).plan(&corpus).await;
        assert!(matches!(
            result,
            Err(PlannerError::Completion(CompletionError::Authentication(_)))
        ));
    }

    #[tokio::test]
    async fn test_zero_usable_resources_fails() {
        let corpus = corpus_with_pages(1, 50);
        let client = Arc::new(ScriptedClient::new(vec![Ok(
            r#"{"service_name": "x", "base_url": "https://x.example", "resources": []}"#.to_string(),
        )]));

        let result = plan_llm(&corpus, client).await;
        assert!(matches!(result, Err(PlannerError::NoUsableResources { chunks: 1 })));
    }

    #[tokio::test]
    async fn test_empty_corpus_fails() {
        let corpus = corpus_with_pages(0, 0);
        let client = Arc::new(ScriptedClient::new(Vec::new()));
        assert!(matches!(plan_llm(&corpus, client).await, Err(PlannerError::EmptyCorpus)));
    }

    #[test]
    fn test_parse_completion_fills_defaults() {
        let raw = r#"Here you go: {"resources": [{"name": "pets", "endpoints": [{"method": "GET", "path_template": "/pets/{id}", "parameters": [{"name": "id", "location": "path"}]}]}]} Done."#;
        let blueprint = parse_completion(raw, "example", "https://docs.example.com").unwrap();
        assert_eq!(blueprint.service_name, "example");
        assert_eq!(blueprint.base_url, "https://docs.example.com");
        assert_eq!(blueprint.resources[0].endpoints[0].parameters[0].name, "id");
    }

    #[test]
    fn test_parse_completion_skips_braces_in_prose() {
        let raw = r#"Replace {id} with the pet id. Blueprint: {"resources": [{"name": "pets", "endpoints": [{"method": "DELETE", "path_template": "/pets/{id}", "parameters": [{"name": "id", "location": "path"}]}]}]} (see {docs})."#;
        let blueprint = parse_completion(raw, "example", "https://docs.example.com").unwrap();
        assert_eq!(blueprint.resources[0].name, "pets");
        assert_eq!(blueprint.resources[0].endpoints[0].method, HttpMethod::Delete);
    }

    #[test]
    fn test_parse_completion_rejects_invalid_shapes() {
        assert!(matches!(
            parse_completion("no json here", "x", "https://x.example"),
            Err(ResponseError::Malformed(_))
        ));
        assert!(matches!(
            parse_completion("{not json}", "x", "https://x.example"),
            Err(ResponseError::Malformed(_))
        ));

        let wrong_method = r#"{"resources": [{"name": "a", "endpoints": [{"method": "FETCH", "path_template": "/a"}]}]}"#;
        match parse_completion(wrong_method, "x", "https://x.example") {
            Err(ResponseError::Invalid(error)) => assert!(error.mentions("FETCH")),
            other => panic!("Expected validation failure, got {other:?}"),
        }
    }
}
