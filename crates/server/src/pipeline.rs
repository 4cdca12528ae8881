//! The per-request orchestration pipeline.
//!
//! Strictly sequential: retrieve, normalize, extract citations, assemble the
//! prompt, generate, postprocess. Generation must see exactly the evidence
//! selected by normalization, so no stage overlaps another. Telemetry
//! observes every stage as a side channel and never fails a request.

use citegate_core::AppResult;
use citegate_generation::{ChatMessage, Completion, SamplingParams};
use citegate_prompt::build_messages;
use citegate_retrieval::{collect_citations, normalize_hits, Hit, UsedSnippet};

use crate::answer::finalize;
use crate::routes::{AppState, ChatRequest, ChatResponse, DebugInfo, DryrunResponse};

/// Run the full `/chat` pipeline.
pub async fn run_chat(state: &AppState, request: ChatRequest) -> AppResult<ChatResponse> {
    let e2e_timer = state.telemetry.e2e_timer();

    // 1) retrieve
    let raw_hits = retrieve(state, &request.question, request.k).await?;
    let raw_sample: Vec<Hit> = if request.debug {
        raw_hits.iter().take(10).cloned().collect()
    } else {
        Vec::new()
    };

    // 2) normalize + citations
    let evidence = normalize_hits(
        raw_hits,
        state.config.max_ctx_snippets,
        state.config.max_ctx_chars,
    );
    let citations = collect_citations(&evidence);

    // 3) build messages with the selected snippet text
    let messages = build_messages(&request.question, &evidence)?;

    // 4) generate with clamped parameters
    let params = SamplingParams::new(request.temperature, request.max_tokens).clamped();
    let completion = generate(state, &messages, params).await?;

    // 5) postprocess and record usage (best-effort, never fails the request)
    let answer = finalize(&completion.content, &citations);
    state.telemetry.record_token_usage(
        completion.usage.prompt_tokens,
        completion.usage.completion_tokens,
        completion.usage.total_tokens,
    );

    let latency_seconds = round3(e2e_timer.elapsed_seconds());
    tracing::info!(
        citations = citations.len(),
        latency_seconds = latency_seconds,
        total_tokens = completion.usage.total_tokens,
        "Chat request completed"
    );

    let debug = request.debug.then(|| DebugInfo {
        used_snippets: evidence.iter().map(UsedSnippet::from).collect(),
        messages: messages.clone(),
        raw_hits: raw_sample,
        payload_model: state.config.model_name.clone(),
        payload_temperature: params.temperature,
        payload_max_tokens: params.max_tokens,
    });

    Ok(ChatResponse {
        answer,
        citations,
        latency_seconds,
        usage: completion.usage,
        debug,
    })
}

/// Run the `/dryrun` pipeline: everything `/chat` would send to the backend,
/// without calling it.
pub async fn run_dryrun(state: &AppState, question: &str, k: usize) -> AppResult<DryrunResponse> {
    let raw_hits = retrieve(state, question, k).await?;

    let evidence = normalize_hits(
        raw_hits,
        state.config.max_ctx_snippets,
        state.config.max_ctx_chars,
    );
    let citations = collect_citations(&evidence);
    let messages = build_messages(question, &evidence)?;

    Ok(DryrunResponse {
        question: question.to_string(),
        citations,
        used_snippets: evidence.iter().map(UsedSnippet::from).collect(),
        messages,
        note: "This is a dry run; no generation call was made.",
    })
}

/// Retrieval stage: latency is observed on every exit path via the timer
/// guard, and the stage error counter increments exactly on failure.
async fn retrieve(state: &AppState, question: &str, k: usize) -> AppResult<Vec<Hit>> {
    let _timer = state.telemetry.retrieval_timer();
    state
        .retriever
        .search(question, k)
        .await
        .inspect_err(|_| state.telemetry.inc_error("retriever"))
}

/// Generation stage: same latency and error accounting as retrieval.
async fn generate(
    state: &AppState,
    messages: &[ChatMessage],
    params: SamplingParams,
) -> AppResult<Completion> {
    let _timer = state.telemetry.generation_timer();
    state
        .generator
        .complete(messages, &state.config.model_name, params)
        .await
        .inspect_err(|_| state.telemetry.inc_error("generation"))
}

fn round3(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
