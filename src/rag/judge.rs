//! Yes/no classifiers and the answer generator.
//!
//! Both traits are injected into the graph so tests can swap in scripted
//! fakes. `LlmJudge` backs them with structured-output chat completions.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chunk::Chunk;
use super::prompts;
use crate::core::config::settings::LlmSettings;
use crate::core::errors::RagError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

/// What a verdict was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// chunk vs. question
    Relevance,
    /// answer vs. context
    Groundedness,
    /// answer vs. question
    Adequacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub criterion: Criterion,
    pub passed: bool,
}

impl Verdict {
    pub fn new(criterion: Criterion, passed: bool) -> Self {
        Self { criterion, passed }
    }
}

#[async_trait]
pub trait Judge: Send + Sync {
    async fn grade_chunk(&self, question: &str, chunk: &Chunk) -> Result<Verdict, RagError>;

    async fn is_grounded(&self, context: &[Chunk], answer: &str) -> Result<Verdict, RagError>;

    async fn resolves_question(&self, question: &str, answer: &str) -> Result<Verdict, RagError>;
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// One answer for `question` from `context`; the context may be empty.
    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, RagError>;
}

/// Structured output the graders are asked for.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct BinaryScore {
    /// 'yes' or 'no'
    #[serde(alias = "score")]
    pub binary_score: ScoreValue,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScoreValue {
    Bool(bool),
    Text(String),
}

impl ScoreValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            ScoreValue::Bool(b) => Some(*b),
            ScoreValue::Text(text) => parse_yes_no(text),
        }
    }
}

fn parse_yes_no(text: &str) -> Option<bool> {
    let normalized = text
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
        .to_ascii_lowercase();
    match normalized.as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.find('\n') {
        Some(newline) if !rest[..newline].trim_start().starts_with('{') => {
            rest[newline + 1..].trim()
        }
        _ => rest.trim(),
    }
}

/// Read a grader reply: `{"binary_score": ...}` JSON, optionally fenced, or a
/// bare yes/no.
pub fn parse_verdict(raw: &str) -> Result<bool, RagError> {
    let body = strip_code_fence(raw);

    if let Ok(score) = serde_json::from_str::<BinaryScore>(body) {
        return score.binary_score.as_bool().ok_or_else(|| {
            RagError::Classification(format!("unrecognised binary_score in '{}'", body))
        });
    }

    parse_yes_no(body)
        .ok_or_else(|| RagError::Classification(format!("unparseable verdict '{}'", body)))
}

/// Judge and generator backed by one chat model.
pub struct LlmJudge {
    provider: Arc<dyn LlmProvider>,
    temperature: f64,
    max_tokens: Option<i32>,
    score_schema: Value,
}

impl LlmJudge {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: &LlmSettings) -> Result<Self, RagError> {
        let score_schema = serde_json::to_value(schemars::schema_for!(BinaryScore))
            .map_err(|e| RagError::Classification(format!("schema generation failed: {}", e)))?;

        Ok(Self {
            provider,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            score_schema,
        })
    }

    async fn classify(
        &self,
        criterion: Criterion,
        system: &str,
        user: String,
    ) -> Result<Verdict, RagError> {
        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .with_temperature(self.temperature)
            .with_json_schema("binary_score", self.score_schema.clone());

        let reply = self
            .provider
            .chat(request)
            .await
            .map_err(|e| RagError::Classification(e.to_string()))?;

        let passed = parse_verdict(&reply)?;
        tracing::debug!(?criterion, passed, "Grader verdict");
        Ok(Verdict::new(criterion, passed))
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn grade_chunk(&self, question: &str, chunk: &Chunk) -> Result<Verdict, RagError> {
        self.classify(
            Criterion::Relevance,
            prompts::RELEVANCE_SYSTEM,
            prompts::relevance_user(question, chunk),
        )
        .await
    }

    async fn is_grounded(&self, context: &[Chunk], answer: &str) -> Result<Verdict, RagError> {
        self.classify(
            Criterion::Groundedness,
            prompts::GROUNDED_SYSTEM,
            prompts::grounded_user(context, answer),
        )
        .await
    }

    async fn resolves_question(&self, question: &str, answer: &str) -> Result<Verdict, RagError> {
        self.classify(
            Criterion::Adequacy,
            prompts::ADEQUACY_SYSTEM,
            prompts::adequacy_user(question, answer),
        )
        .await
    }
}

#[async_trait]
impl AnswerGenerator for LlmJudge {
    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, RagError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(prompts::GENERATE_SYSTEM),
            ChatMessage::user(prompts::generate_user(question, context)),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let answer = self
            .provider
            .chat(request)
            .await
            .map_err(|e| RagError::Generation(e.to_string()))?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(RagError::Generation("model returned an empty answer".to_string()));
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::errors::ApiError;

    #[test]
    fn verdicts_accept_bool_and_yes_no() {
        assert!(parse_verdict(r#"{"binary_score": true}"#).unwrap());
        assert!(!parse_verdict(r#"{"binary_score": "No"}"#).unwrap());
        assert!(parse_verdict(r#"{"score": "yes"}"#).unwrap());
        assert!(parse_verdict("YES").unwrap());
        assert!(!parse_verdict(" no. ").unwrap());
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"binary_score\": \"yes\"}\n```";
        assert!(parse_verdict(raw).unwrap());
        assert!(!parse_verdict("```{\"binary_score\": false}```").unwrap());
    }

    #[test]
    fn anything_else_is_a_classification_error() {
        for raw in ["maybe", r#"{"binary_score": "perhaps"}"#, "", r#"{"other": 1}"#] {
            assert!(
                matches!(parse_verdict(raw), Err(RagError::Classification(_))),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn schema_names_the_binary_score_field() {
        let schema = serde_json::to_value(schemars::schema_for!(BinaryScore)).unwrap();
        assert!(schema["properties"]["binary_score"].is_object());
    }

    struct CannedProvider {
        reply: Result<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl CannedProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("connection refused".to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone().map_err(ApiError::BadGateway)
        }

        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn grading_requests_structured_output() {
        let provider = CannedProvider::replying(r#"{"binary_score": "yes"}"#);
        let judge = LlmJudge::new(provider.clone(), &LlmSettings::default()).unwrap();

        let verdict = judge
            .grade_chunk("What year?", &Chunk::new("Built in 1985."))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::new(Criterion::Relevance, true));
        let requests = provider.requests.lock().unwrap();
        let format = requests[0].response_format.as_ref().unwrap();
        assert_eq!(format["type"], "json_schema");
        assert!(requests[0].messages[1].content.contains("Built in 1985."));
    }

    #[tokio::test]
    async fn provider_failures_map_to_stage_errors() {
        let judge = LlmJudge::new(CannedProvider::failing(), &LlmSettings::default()).unwrap();

        assert!(matches!(
            judge.is_grounded(&[], "answer").await,
            Err(RagError::Classification(_))
        ));
        assert!(matches!(
            judge.generate("q", &[]).await,
            Err(RagError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn generated_answer_is_trimmed() {
        let provider = CannedProvider::replying("  It was built in 1985.\n");
        let judge = LlmJudge::new(provider, &LlmSettings::default()).unwrap();
        let answer = judge
            .generate("What year?", &[Chunk::new("The car was built in 1985.")])
            .await
            .unwrap();
        assert_eq!(answer, "It was built in 1985.");
    }
}
