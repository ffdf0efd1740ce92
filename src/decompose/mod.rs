//! Multi-step questions.
//!
//! [`QueryDecomposer`] splits a compound question into independently answerable
//! sub-queries; [`QueryExecutor`] runs each one through the [`Pipeline`], records every
//! result in a [`SessionStore`], and hands back the last one. [`detect_visualization`]
//! tags a question with the kind of visual output it asks for.


use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_COLLABORATOR_TIMEOUT_MS;
use crate::generation::{GenerationParams, Generator, generate_within};
use crate::parsing::last_structured_as;
use crate::pipeline::{Pipeline, PipelineError, PipelineRequest, PipelineResult};
use crate::session::SessionStore;

/// Words that suggest a question combines several lookups.
pub const COMPLEX_QUERY_KEYWORDS: &[&str] = &[
    "and",
    "combine",
    "join",
    "across",
    "from",
    "to",
    "table",
    "plot",
    "visualize",
    "merge",
    "calculate",
];

/// Questions longer than this many words are always decomposed.
pub const MAX_SIMPLE_QUERY_WORDS: usize = 8;

const DECOMPOSE_MAX_TOKENS: u32 = 256;
const DECOMPOSE_TEMPERATURE: f32 = 0.3;

/// Keyword (whole word, case-insensitive) or length heuristic.
pub fn needs_decomposition(query: &str) -> bool {
    let words: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    words
        .iter()
        .any(|w| COMPLEX_QUERY_KEYWORDS.contains(&w.as_str()))
        || query.split_whitespace().count() > MAX_SIMPLE_QUERY_WORDS
}

/// What kind of visual output a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    Table,
    Chart,
    Flowchart,
    #[default]
    None,
}

impl VisualizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationKind::Table => "table",
            VisualizationKind::Chart => "chart",
            VisualizationKind::Flowchart => "flowchart",
            VisualizationKind::None => "none",
        }
    }
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords per visualization kind, checked in this order.
pub const VISUALIZATION_KEYWORDS: &[(VisualizationKind, &[&str])] = &[
    (
        VisualizationKind::Table,
        &["table", "grid", "spreadsheet", "matrix", "tabulate", "pivot"],
    ),
    (
        VisualizationKind::Chart,
        &[
            "chart", "graph", "plot", "line", "bar", "scatter", "visualize", "histogram", "pie",
        ],
    ),
    (
        VisualizationKind::Flowchart,
        &["flowchart", "diagram", "process", "sequence", "workflow", "step-by-step"],
    ),
];

/// First kind whose keyword appears as a whole word (case-insensitive; hyphenated words
/// such as `step-by-step` stay intact).
pub fn detect_visualization(query: &str) -> VisualizationKind {
    let words: Vec<String> = query
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    VISUALIZATION_KEYWORDS
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(&w.as_str())))
        .map(|(kind, _)| *kind)
        .unwrap_or_default()
}

pub struct QueryDecomposer {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl std::fmt::Debug for QueryDecomposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDecomposer")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QueryDecomposer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sub-queries for `query`; `[query]` when it looks simple or the model reply is unusable.
    pub async fn decompose(&self, query: &str) -> Vec<String> {
        if !needs_decomposition(query) {
            return vec![query.to_string()];
        }

        let params = GenerationParams::new(DECOMPOSE_MAX_TOKENS, DECOMPOSE_TEMPERATURE);
        let raw = match generate_within(
            self.generator.as_ref(),
            &decomposition_prompt(query),
            params,
            self.timeout,
        )
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Query decomposition failed, running query as is");
                return vec![query.to_string()];
            }
        };

        match parse_sub_queries(&raw) {
            Some(sub_queries) => {
                debug!(count = sub_queries.len(), "Decomposed query");
                sub_queries
            }
            None => {
                warn!("Decomposition reply was not a list of strings, running query as is");
                vec![query.to_string()]
            }
        }
    }
}

fn decomposition_prompt(query: &str) -> String {
    format!(
        "You are a query decomposition assistant.\n\n\
         Take the following complex question and break it down into multiple smaller,\n\
         executable sub-queries. Each sub-query should be something that could be run\n\
         independently against a knowledge base.\n\n\
         Output must be a valid JSON array of strings and nothing else.\n\n\
         Example:\n\
         Question: \"Fetch sales data from 2020 to 2022\"\n\
         Output: [\"Fetch sales data for 2020\", \"Fetch sales data for 2021\", \
         \"Fetch sales data for 2022\", \"Combine all into a single result\"]\n\n\
         Question:\n\"{query}\""
    )
}

/// The last JSON array of non-blank strings in `raw`, trimmed.
pub fn parse_sub_queries(raw: &str) -> Option<Vec<String>> {
    let list: Vec<String> = last_structured_as(raw)?;
    let trimmed: Vec<String> = list.iter().map(|q| q.trim().to_string()).collect();

    (!trimmed.is_empty() && trimmed.iter().all(|q| !q.is_empty())).then_some(trimmed)
}

/// Runs decomposed questions step by step and keeps a per-session record.
pub struct QueryExecutor {
    pipeline: Arc<Pipeline>,
    decomposer: QueryDecomposer,
    sessions: SessionStore<PipelineResult>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("decomposer", &self.decomposer)
            .field("sessions", &self.sessions.session_count())
            .finish()
    }
}

impl QueryExecutor {
    pub fn new(
        pipeline: Arc<Pipeline>,
        decomposer: QueryDecomposer,
        sessions: SessionStore<PipelineResult>,
    ) -> Self {
        Self {
            pipeline,
            decomposer,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore<PipelineResult> {
        &self.sessions
    }

    /// Decomposes `request.query`, runs every sub-query with the request's other settings,
    /// appends each result to `session_id`, and returns the last result.
    ///
    /// Stops at the first failing sub-query; results already recorded stay in the session.
    pub async fn execute(
        &self,
        session_id: &str,
        request: PipelineRequest,
    ) -> Result<PipelineResult, PipelineError> {
        let sub_queries = self.decomposer.decompose(&request.query).await;
        let (first, rest) = match sub_queries.split_first() {
            Some((first, rest)) => (first.clone(), rest.to_vec()),
            None => (request.query.clone(), Vec::new()),
        };

        info!(
            session_id,
            steps = rest.len() + 1,
            "Executing query"
        );

        let mut last = self.run_step(session_id, &request, first).await?;
        for sub_query in rest {
            last = self.run_step(session_id, &request, sub_query).await?;
        }
        Ok(last)
    }

    async fn run_step(
        &self,
        session_id: &str,
        template: &PipelineRequest,
        sub_query: String,
    ) -> Result<PipelineResult, PipelineError> {
        let request = PipelineRequest {
            query: sub_query.clone(),
            ..template.clone()
        };
        let result = self.pipeline.run(request).await?;
        self.sessions.append(session_id, sub_query, result.clone());
        Ok(result)
    }
}
