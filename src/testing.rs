//! Deterministic fakes for the external collaborators.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::errors::{ApiError, RagError};
use crate::llm::{ChatRequest, LlmProvider};
use crate::rag::{AnswerGenerator, Chunk, Criterion, Embedder, Judge, Verdict};
use crate::tools::{SearchResult, WebSearch};

/// Bag-of-words embedder: each lowercase word bumps one of `DIM` buckets.
#[derive(Default)]
pub struct HashEmbedder;

impl HashEmbedder {
    pub const DIM: usize = 64;

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; Self::DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % Self::DIM as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|text| Self::vectorize(text)).collect())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Err(ApiError::BadGateway("embedding service unreachable".to_string()))
    }
}

/// A call observed by `ScriptedJudge`.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeCall {
    Grade(Chunk),
    Generate(Vec<Chunk>),
    Grounded { context: Vec<Chunk>, answer: String },
    Resolves(String),
}

/// Judge and generator that replay scripted outcomes.
///
/// Each script is consumed front to back; once exhausted the default applies
/// (relevant, grounded, adequate, answer "scripted answer").
pub struct ScriptedJudge {
    relevance: Mutex<VecDeque<bool>>,
    grounded: Mutex<VecDeque<bool>>,
    adequate: Mutex<VecDeque<bool>>,
    answers: Mutex<VecDeque<String>>,
    default_relevant: bool,
    default_grounded: bool,
    default_adequate: bool,
    fail_classification: bool,
    fail_generation: bool,
    calls: Mutex<Vec<JudgeCall>>,
}

impl Default for ScriptedJudge {
    fn default() -> Self {
        Self {
            relevance: Mutex::new(VecDeque::new()),
            grounded: Mutex::new(VecDeque::new()),
            adequate: Mutex::new(VecDeque::new()),
            answers: Mutex::new(VecDeque::new()),
            default_relevant: true,
            default_grounded: true,
            default_adequate: true,
            fail_classification: false,
            fail_generation: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relevance(self, script: impl IntoIterator<Item = bool>) -> Self {
        self.relevance.lock().unwrap().extend(script);
        self
    }

    pub fn grounded(self, script: impl IntoIterator<Item = bool>) -> Self {
        self.grounded.lock().unwrap().extend(script);
        self
    }

    pub fn adequate(self, script: impl IntoIterator<Item = bool>) -> Self {
        self.adequate.lock().unwrap().extend(script);
        self
    }

    pub fn answers<S: Into<String>>(self, script: impl IntoIterator<Item = S>) -> Self {
        self.answers
            .lock()
            .unwrap()
            .extend(script.into_iter().map(Into::into));
        self
    }

    pub fn all_irrelevant(mut self) -> Self {
        self.default_relevant = false;
        self
    }

    pub fn never_grounded(mut self) -> Self {
        self.default_grounded = false;
        self
    }

    pub fn never_adequate(mut self) -> Self {
        self.default_adequate = false;
        self
    }

    pub fn failing_classification(mut self) -> Self {
        self.fail_classification = true;
        self
    }

    pub fn failing_generation(mut self) -> Self {
        self.fail_generation = true;
        self
    }

    pub fn calls(&self) -> Vec<JudgeCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Contexts passed to every `generate` call, in order.
    pub fn generation_contexts(&self) -> Vec<Vec<Chunk>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                JudgeCall::Generate(context) => Some(context),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: JudgeCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(script: &Mutex<VecDeque<bool>>, default: bool) -> bool {
        script.lock().unwrap().pop_front().unwrap_or(default)
    }

    fn check_classification(&self) -> Result<(), RagError> {
        if self.fail_classification {
            return Err(RagError::Classification("scripted failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn grade_chunk(&self, _question: &str, chunk: &Chunk) -> Result<Verdict, RagError> {
        self.record(JudgeCall::Grade(chunk.clone()));
        self.check_classification()?;
        let passed = Self::next(&self.relevance, self.default_relevant);
        Ok(Verdict::new(Criterion::Relevance, passed))
    }

    async fn is_grounded(&self, context: &[Chunk], answer: &str) -> Result<Verdict, RagError> {
        self.record(JudgeCall::Grounded {
            context: context.to_vec(),
            answer: answer.to_string(),
        });
        self.check_classification()?;
        let passed = Self::next(&self.grounded, self.default_grounded);
        Ok(Verdict::new(Criterion::Groundedness, passed))
    }

    async fn resolves_question(&self, _question: &str, answer: &str) -> Result<Verdict, RagError> {
        self.record(JudgeCall::Resolves(answer.to_string()));
        self.check_classification()?;
        let passed = Self::next(&self.adequate, self.default_adequate);
        Ok(Verdict::new(Criterion::Adequacy, passed))
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedJudge {
    async fn generate(&self, _question: &str, context: &[Chunk]) -> Result<String, RagError> {
        self.record(JudgeCall::Generate(context.to_vec()));
        if self.fail_generation {
            return Err(RagError::Generation("scripted failure".to_string()));
        }
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "scripted answer".to_string()))
    }
}

/// Web search returning fixed results and recording queries.
#[derive(Default)]
pub struct StaticSearch {
    results: Vec<SearchResult>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn with_contents(contents: &[&str]) -> Self {
        Self {
            results: contents
                .iter()
                .enumerate()
                .map(|(i, content)| SearchResult {
                    title: format!("result {}", i),
                    url: format!("https://example.com/{}", i),
                    content: content.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ApiError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(ApiError::BadGateway("search service unreachable".to_string()));
        }
        Ok(self.results.iter().take(max_results).cloned().collect())
    }
}

/// Chat model that is never reachable; only its identity is used.
pub struct OfflineLlm;

#[async_trait]
impl LlmProvider for OfflineLlm {
    fn name(&self) -> &str {
        "offline"
    }

    fn model(&self) -> &str {
        "offline-model"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(false)
    }

    async fn chat(&self, _request: ChatRequest) -> Result<String, ApiError> {
        Err(ApiError::BadGateway("offline".to_string()))
    }

    async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Err(ApiError::BadGateway("offline".to_string()))
    }
}
