//! Orchestration engine
//!
//! One entry point per pattern. Every call resolves a model identifier (the
//! request's or the provider default), binds a model for the duration of that
//! call only, and runs the pattern against the shared retriever.

mod types;

pub use types::*;

use crate::agents::{CodeAgent, ReActConfig, ReActController, Termination};
use crate::config::OrchestrationConfig;
use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, LanguageModelProvider, ModelRequest, Signature};
use crate::metrics::OrchestrationMetrics;
use crate::rag::{
    aggregate_confidence, CitedRag, GroundedRag, GroundedRagConfig, MultiHopConfig,
    MultiHopRetriever, SimpleRag, Source,
};
use crate::reasoning::{
    Analyzer, BasicAnswer, ChainOfThought, DecisionConfig, DecisionMaker, ExplorationStrategy,
    TreeOfThoughtConfig, TreeOfThoughtOrchestrator,
};
use crate::retrieval::{Passage, Retriever};
use crate::tools::{builtin_tools, Tool, ToolRegistry};
use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

/// Confidence reported for chat replies
pub const CHAT_CONFIDENCE: f32 = 0.8;

/// Confidence reported for synthesized tree-of-thought answers and
/// successful agent runs
pub const SYNTHESIS_CONFIDENCE: f32 = 0.8;

pub const CHAT: Signature = Signature {
    name: "chat",
    instructions: "Answer the user's message.",
    inputs: &[FieldSpec::text("question", "The user's message")],
    outputs: &[FieldSpec::text("answer", "The reply")],
    with_rationale: true,
};

/// Request-scoped orchestration over an injected model provider and retriever
#[derive(Clone)]
pub struct Engine {
    provider: Arc<dyn LanguageModelProvider>,
    retriever: Arc<dyn Retriever>,
    settings: OrchestrationConfig,
}

struct Bound {
    model_id: String,
    model: Arc<dyn LanguageModel>,
}

impl Engine {
    pub fn new(
        provider: Arc<dyn LanguageModelProvider>,
        retriever: Arc<dyn Retriever>,
        settings: OrchestrationConfig,
    ) -> Self {
        Self {
            provider,
            retriever,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestrationConfig {
        &self.settings
    }

    fn bind(&self, requested: Option<&str>) -> Result<Bound> {
        self.bind_with(ModelRequest::new(self.resolve_model(requested)))
    }

    fn bind_with(&self, request: ModelRequest) -> Result<Bound> {
        let model = self.provider.bind(&request)?;
        Ok(Bound {
            model_id: request.model,
            model,
        })
    }

    fn resolve_model(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
            .to_string()
    }

    /// Plain question answering with a rationale
    #[instrument(skip(self, request))]
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        observe("chat", async {
            let bound = self.bind_with(ModelRequest {
                model: self.resolve_model(request.model.as_deref()),
                temperature: request.temperature,
                system_prompt: request.system_prompt.clone(),
            })?;

            let inputs = Inputs::new().with("question", request.message.as_str());
            let prediction = predict(bound.model.as_ref(), &CHAT, &inputs).await?;

            Ok(ChatResponse {
                response: prediction.text("answer"),
                reasoning: prediction.rationale(),
                confidence: CHAT_CONFIDENCE,
                model: bound.model_id,
            })
        })
        .await
    }

    /// RAG in the requested mode
    #[instrument(
        skip(self, request),
        fields(mode = request.mode.as_str(), include_citations = request.include_citations)
    )]
    pub async fn rag_query(&self, request: RagQuery) -> Result<RagResponse> {
        observe("rag", async {
            let bound = self.bind(request.model.as_deref())?;
            let model = bound.model.as_ref();
            let retriever = self.retriever.as_ref();

            let mut response = match request.mode {
                RagMode::Grounded => {
                    let rag = GroundedRag::new(GroundedRagConfig {
                        num_passages: request.num_passages.unwrap_or(self.settings.rag_num_passages),
                        include_citations: request.include_citations,
                    });
                    let grounded = rag.answer(model, retriever, &request.question).await?;
                    RagResponse {
                        answer: grounded.answer,
                        sources: grounded.sources,
                        citations: None,
                        confidence: grounded.confidence,
                        mode: request.mode,
                        passages_used: grounded.passages_used,
                        model: String::new(),
                    }
                }
                RagMode::Simple => {
                    let rag = request.num_passages.map(SimpleRag::new).unwrap_or_default();
                    let simple = rag.answer(model, retriever, &request.question).await?;
                    let sources = sources_for(&simple.passages);
                    RagResponse {
                        answer: simple.answer,
                        confidence: aggregate_confidence(&sources),
                        sources,
                        citations: None,
                        mode: request.mode,
                        passages_used: simple.passages.len(),
                        model: String::new(),
                    }
                }
                RagMode::Cited => {
                    let rag = request.num_passages.map(CitedRag::new).unwrap_or_default();
                    let cited = rag.answer(model, retriever, &request.question).await?;
                    RagResponse {
                        answer: cited.answer,
                        sources: sources_for(&cited.passages),
                        citations: Some(cited.citations),
                        confidence: cited.confidence,
                        mode: request.mode,
                        passages_used: cited.passages.len(),
                        model: String::new(),
                    }
                }
            };

            if !request.include_citations {
                response.sources.clear();
            }
            response.model = bound.model_id;
            Ok(response)
        })
        .await
    }

    /// Multi-hop RAG for questions needing several retrieval rounds
    #[instrument(skip(self, request))]
    pub async fn multi_hop_rag(&self, request: MultiHopQuery) -> Result<MultiHopResponse> {
        observe("multi_hop_rag", async {
            let bound = self.bind(request.model.as_deref())?;
            let retriever = MultiHopRetriever::new(MultiHopConfig {
                num_passages: request
                    .num_passages
                    .unwrap_or(self.settings.multi_hop_num_passages),
                max_hops: request.max_hops.unwrap_or(self.settings.max_hops),
                max_context_chars: self.settings.max_context_chars,
            });

            let result = retriever
                .run(bound.model.as_ref(), self.retriever.as_ref(), &request.question)
                .await?;

            Ok(MultiHopResponse {
                answer: result.answer,
                reasoning: result.reasoning,
                passages: result.passages,
                hops_used: result.hops_used,
                model: bound.model_id,
            })
        })
        .await
    }

    /// Run the ReAct agent with the built-in tools plus the declared ones
    #[instrument(skip(self, request), fields(declared_tools = request.tools.len()))]
    pub async fn execute_agent(&self, request: AgentTask) -> Result<AgentResponse> {
        let metrics = OrchestrationMetrics::start("agent");
        let result = async {
            let bound = self.bind(request.model.as_deref())?;
            let controller = ReActController::new(
                agent_tools(&request.tools),
                ReActConfig {
                    max_iterations: request.max_iterations.unwrap_or(self.settings.max_iterations),
                },
            );

            let run = controller.run(bound.model.as_ref(), &request.task).await?;
            Ok::<_, crate::errors::AppError>((run, bound.model_id))
        }
        .await;

        match result {
            Ok((run, model_id)) => {
                metrics.finish(run.termination.as_str());
                Ok(AgentResponse {
                    answer: run.answer,
                    success: run.success,
                    steps: run.trajectory,
                    iterations_used: run.iterations_used,
                    model: model_id,
                })
            }
            Err(e) => {
                metrics.finish("error");
                Err(e)
            }
        }
    }

    /// Structured reasoning with the requested pattern
    #[instrument(skip(self, request), fields(pattern = request.pattern.as_str()))]
    pub async fn reason(&self, request: ReasoningQuery) -> Result<ReasoningResponse> {
        observe(request.pattern.as_str(), async {
            let bound = self.bind(request.model.as_deref())?;
            let model = bound.model.as_ref();

            let mut response = ReasoningResponse {
                answer: String::new(),
                reasoning: String::new(),
                confidence: 0.0,
                pattern_used: request.pattern,
                model: bound.model_id.clone(),
                branches: None,
            };

            match request.pattern {
                ReasoningPattern::Basic => {
                    let out = BasicAnswer::new().run(model, &request.question).await?;
                    response.answer = out.answer;
                    response.reasoning = out.reasoning;
                    response.confidence = out.confidence;
                }
                ReasoningPattern::ChainOfThought => {
                    let out = ChainOfThought::new().run(model, &request.question).await?;
                    response.answer = out.answer;
                    response.reasoning = out.reasoning;
                    response.confidence = out.confidence;
                }
                ReasoningPattern::TreeOfThought => {
                    let tot = TreeOfThoughtOrchestrator::new(TreeOfThoughtConfig {
                        num_branches: request.num_branches.unwrap_or(self.settings.num_branches),
                        strategy: self.exploration_strategy(),
                    });
                    let out = tot.run(model, &request.question).await?;
                    response.answer = out.final_answer;
                    response.reasoning = out.reasoning;
                    response.confidence = SYNTHESIS_CONFIDENCE;
                    response.branches = Some(out.branches);
                }
                ReasoningPattern::React => {
                    let controller = ReActController::new(
                        ToolRegistry::new(builtin_tools()),
                        ReActConfig {
                            max_iterations: request
                                .max_iterations
                                .unwrap_or(self.settings.max_iterations),
                        },
                    );
                    let out = controller.run(model, &request.question).await?;
                    response.confidence = match out.termination {
                        Termination::Finished => SYNTHESIS_CONFIDENCE,
                        Termination::Exhausted => 0.0,
                    };
                    response.answer = out.answer;
                    response.reasoning = out.log;
                }
            }

            Ok(response)
        })
        .await
    }

    /// Confidence-scored decision
    #[instrument(skip(self, request))]
    pub async fn decide(&self, request: DecisionQuery) -> Result<DecisionResponse> {
        observe("decision", async {
            let bound = self.bind(request.model.as_deref())?;
            let maker = DecisionMaker::new(DecisionConfig {
                min_confidence: request
                    .min_confidence
                    .unwrap_or(self.settings.decision_min_confidence),
            });

            let decision = maker
                .decide(
                    bound.model.as_ref(),
                    &request.situation,
                    &request.options,
                    &request.constraints,
                )
                .await?;

            Ok(DecisionResponse {
                decision,
                model: bound.model_id,
            })
        })
        .await
    }

    /// Multi-perspective analysis of a topic
    #[instrument(skip(self, request))]
    pub async fn analyze(&self, request: AnalysisQuery) -> Result<AnalysisResponse> {
        observe("analysis", async {
            let bound = self.bind(request.model.as_deref())?;
            let analysis = Analyzer::new()
                .analyze(bound.model.as_ref(), &request.topic, &request.context)
                .await?;

            Ok(AnalysisResponse {
                analysis,
                model: bound.model_id,
            })
        })
        .await
    }

    /// Code and explanation for a task
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn generate_code(&self, request: CodeTask) -> Result<CodeResponse> {
        observe("code", async {
            let bound = self.bind(request.model.as_deref())?;
            let code = CodeAgent::new()
                .generate(bound.model.as_ref(), &request.task, &request.language)
                .await?;

            Ok(CodeResponse {
                code,
                model: bound.model_id,
            })
        })
        .await
    }

    fn exploration_strategy(&self) -> ExplorationStrategy {
        match self.settings.branch_workers {
            Some(max_workers) if max_workers > 1 => ExplorationStrategy::Concurrent { max_workers },
            _ => ExplorationStrategy::Sequential,
        }
    }
}

/// Built-in tools followed by declared tools. A declared tool that shadows a
/// built-in is skipped.
pub fn agent_tools(declared: &[ToolDefinition]) -> ToolRegistry {
    let mut tools = builtin_tools();
    let builtin_names: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();

    for definition in declared {
        if builtin_names.iter().any(|n| *n == definition.name) {
            tracing::warn!(tool = %definition.name, "Declared tool shadows a built-in, skipping");
            continue;
        }
        tools.push(Tool::passthrough(
            definition.name.clone(),
            definition.description.clone(),
        ));
    }

    ToolRegistry::new(tools)
}

fn sources_for(passages: &[Passage]) -> Vec<Source> {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| Source::from_passage(i, p))
        .collect()
}

/// Record run metrics around one orchestration
async fn observe<T, F>(pattern: &'static str, run: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let metrics = OrchestrationMetrics::start(pattern);
    let result = run.await;
    metrics.finish(if result.is_ok() { "ok" } else { "error" });
    result
}
