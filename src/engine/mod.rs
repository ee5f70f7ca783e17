//! The turn engine: one stateless request/response cycle.
//!
//! Every turn runs the same pipeline: migrate the client-held state, apply
//! the deterministic pre-routing rules (widget action codes, hard confirms,
//! legacy digit shortcuts, language pinning), route to a specialist, run the
//! strict call, fold the reply into the state, and chain bounded follow-up
//! hops when the reply requests an advance. Failures never surface as HTTP
//! errors; they become `ok:false` payloads carrying the entry state so the
//! client can resubmit the same turn.

pub mod affirmative;
pub mod apply;
pub mod builder;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::config::CoachConfig;
use crate::error::LlmError;
use crate::language::{self, UiCatalog};
use crate::llm::strict::call_strict;
use crate::llm::{LlmProvider, StrictCall, StrictOutcome, TokenUsage};
use crate::router::{read_triggers, route, RouteDecision};
use crate::specialists::output::{SpecialistReply, StepAction};
use crate::specialists::schema::{schema_for, value_field};
use crate::specialists::{prompts, Specialist};
use crate::state::model::wire_keys;
use crate::state::{migrate, CanvasState, DreamRuntimeMode, StepId};
use crate::ui::actions::{self, ACTION_SUBMIT_SCORES, ACTION_TEXT_SUBMIT, SWITCH_TO_SELF_DREAM_TOKEN};
use crate::ui::render::{self, UiFlags, UiPayload};
use crate::ui::{contract_id, default_menu, status_for, REGISTRY_VERSION};
use crate::usage::{SessionTurnRecord, UsageReporter};

const SHORTEN_BIGWHY_TOKEN: &str = "__SHORTEN_BIGWHY__";
const SELF_DREAM_MESSAGE: &str = "I want to write my dream in my own words.";
const GO_NEXT_MESSAGE: &str = "Go to next step";
const UNKNOWN_ACTION_TEXT: &str =
    "We could not process this choice. Please refresh and try again.";

/// One turn request as the widget sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TurnRequest {
    pub current_step_id: String,
    pub user_message: String,
    pub state: Option<Value>,
    /// "chat" (default) or "widget". Widget mode disables the legacy
    /// free-text shortcuts and rejects unknown action codes.
    pub input_mode: Option<String>,
    pub strict: Option<bool>,
    pub session_id: Option<String>,
}

impl TurnRequest {
    fn widget_mode(&self) -> bool {
        self.input_mode
            .as_deref()
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("widget"))
    }
}

/// One turn response. Always HTTP 200; `ok:false` plus `error` signals a
/// failed turn the client should resubmit.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub ok: bool,
    pub current_step_id: String,
    pub active_specialist: String,
    /// `step:status:menu` identity of the screen being shown.
    pub contract_id: String,
    pub text: String,
    pub prompt: String,
    pub specialist: Value,
    pub state: Value,
    pub registry_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Wire values that ride on the state blob without being session state:
/// the start marker and the captured first message are echoed back verbatim.
#[derive(Debug, Clone, Default)]
struct Passthrough {
    started: bool,
    initial_user_message: String,
}

/// Transient keys stripped off the incoming blob before migration.
#[derive(Debug, Clone, Default)]
struct Transients {
    text_submit: String,
    pending_scores: Option<Vec<Vec<f64>>>,
}

/// Direction context for the forced dream-formulation call after scoring.
struct DirectionContext {
    top_clusters: String,
    business_context: String,
}

/// Call accounting folded across the hops of one turn.
#[derive(Debug, Clone, Copy, Default)]
struct TurnAccounting {
    attempts: u32,
    usage: Option<TokenUsage>,
}

impl TurnAccounting {
    fn absorb(&mut self, outcome: &StrictOutcome) {
        self.attempts = self.attempts.max(outcome.attempts);
        self.usage = TokenUsage::combine(self.usage, outcome.usage);
    }
}

/// The stateless turn orchestrator.
pub struct TurnEngine {
    provider: Arc<dyn LlmProvider>,
    config: CoachConfig,
    ui_catalog: UiCatalog,
    reporter: Option<UsageReporter>,
}

impl TurnEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CoachConfig) -> TurnEngine {
        let reporter = config
            .session_log_dir
            .as_ref()
            .map(|dir| UsageReporter::new(dir.clone()));
        TurnEngine {
            provider,
            config,
            ui_catalog: UiCatalog::new(),
            reporter,
        }
    }

    /// Runs one full turn. Infallible by contract: every failure is folded
    /// into an `ok:false` response that carries the entry state.
    pub async fn run_turn(&self, request: TurnRequest) -> TurnResponse {
        let raw = request.state.clone().unwrap_or_else(|| json!({}));
        let transients = read_transients(&raw);
        let mut passthrough = read_passthrough(&raw);

        let mut state = migrate(&raw);
        if request.state.is_none() {
            state.set_current_step(&request.current_step_id);
        }
        let entry_state = state.clone();
        let entry_passthrough = passthrough.clone();

        match self
            .turn_inner(&request, state, &mut passthrough, &transients)
            .await
        {
            Ok(response) => response,
            Err(err) => self.error_response(entry_state, &entry_passthrough, &err).await,
        }
    }

    async fn turn_inner(
        &self,
        request: &TurnRequest,
        mut state: CanvasState,
        passthrough: &mut Passthrough,
        transients: &Transients,
    ) -> Result<TurnResponse, LlmError> {
        let widget_mode = request.widget_mode();
        let allow_legacy = !widget_mode;
        let session_id = request.session_id.as_deref();

        // Unwrap planner envelopes, then drop injection scaffolding unless
        // the session is pristine (a first paste may legitimately quote
        // instructions it wants help with).
        let unwrapped = {
            let inner = affirmative::extract_wrapped_message(&request.user_message);
            if inner.is_empty() {
                request.user_message.clone()
            } else {
                inner
            }
        };
        let pristine = is_pristine(&state);
        let mut user_message =
            if pristine || !affirmative::looks_like_meta_instruction(&unwrapped) {
                unwrapped
            } else {
                tracing::info!("dropped meta-instruction message");
                String::new()
            };

        capture_initial_message(passthrough, &user_message);

        let mut action_code = {
            let t = user_message.trim();
            if actions::is_action_code(t) {
                t.to_string()
            } else {
                String::new()
            }
        };

        // Widget text submissions carry the real text in a transient.
        if action_code == ACTION_TEXT_SUBMIT {
            user_message = transients.text_submit.trim().to_string();
            action_code.clear();
            capture_initial_message(passthrough, &user_message);
        }

        if state.current_step == StepId::Step0 {
            language::reset_stale_language(&mut state, &user_message);
        }

        // Hard-confirm codes persist the pending final and synthesize the
        // CONFIRM without a specialist call; the proceed flag then drives
        // the normal chain below.
        let mut forced_proceed = false;
        if !action_code.is_empty() && actions::is_hard_confirm_code(&action_code) {
            if self.resolve_hard_confirm(&mut state) {
                user_message.clear();
                action_code.clear();
                forced_proceed = true;
            }
            // Without a pending final the code degrades to its "yes" route.
        }

        let scores_requested = action_code == ACTION_SUBMIT_SCORES;
        if scores_requested {
            action_code.clear();
        } else if !forced_proceed && !action_code.is_empty() {
            match actions::route_for(&action_code) {
                Some(route_token) => user_message = route_token.to_string(),
                None if widget_mode => {
                    return Ok(self
                        .unknown_action_response(
                            state,
                            passthrough,
                            &action_code,
                            request.strict.unwrap_or(false),
                        )
                        .await);
                }
                // Chat mode lets an unknown code through as plain text.
                None => {}
            }
        }

        // Legacy digit shortcut: "1".."3" picks the numbered option from
        // the previous question.
        if allow_legacy && !forced_proceed && !scores_requested {
            let previous = SpecialistReply::from_value(state.last_specialist_result.clone());
            let expanded =
                affirmative::expand_choice(user_message.trim(), &render::pick_prompt(&previous));
            if expanded != user_message.trim() {
                user_message = expanded;
            }
        }

        // An empty message on an untouched verification step reuses the
        // captured first message, so a widget "start" press replays it.
        if user_message.trim().is_empty()
            && !passthrough.initial_user_message.is_empty()
            && state.current_step == StepId::Step0
            && state.step_0_final.trim().is_empty()
            && state.last_specialist_result.as_object().is_none_or(|m| m.is_empty())
        {
            user_message = passthrough.initial_user_message.clone();
        }

        language::ensure_language(&mut state, &user_message);
        let lang = language::normalize_lang_code(&state.language);

        // Flip back from the builder to self-authoring.
        if user_message.trim() == SWITCH_TO_SELF_DREAM_TOKEN
            && state.current_step == StepId::Dream
        {
            state.mark_step_intro_shown(StepId::Dream.as_str());
            state.dream_runtime_mode = DreamRuntimeMode::SelfAuthored;
            let decision = forced_decision(StepId::Dream, Specialist::Dream, &state);
            let outcome = self.invoke(&state, &decision, SELF_DREAM_MESSAGE, None).await?;
            let mut accounting = TurnAccounting::default();
            accounting.absorb(&outcome);
            let next = apply::apply_state_update(
                &state,
                &decision,
                &outcome.reply,
                false,
                self.config.targetgroup_word_cap,
                self.config.rules_bullet_cap,
            );
            return Ok(self
                .finish(session_id, next, passthrough, outcome.reply, accounting)
                .await);
        }

        // Scoring submission: average the rows, pick the winning themes and
        // force the formulation call with an empty message.
        if let Some(response) = self
            .try_submit_scores(
                session_id,
                &mut state,
                passthrough,
                transients,
                scores_requested,
                &user_message,
            )
            .await?
        {
            return Ok(response);
        }

        if let Some(response) = self
            .try_start_trigger(&mut state, passthrough, &user_message)
            .await
        {
            return Ok(response);
        }

        // Readiness short-circuit: a clear yes on the stored verification
        // confirm advances to the dream without re-running verification.
        if allow_legacy {
            let previous = SpecialistReply::from_value(state.last_specialist_result.clone());
            let readiness_asked = state.current_step == StepId::Step0
                && previous.action() == Some(StepAction::Confirm)
                && !previous.confirmation_question().trim().is_empty()
                && !previous.flag("proceed_to_dream");
            if readiness_asked
                && affirmative::is_clear_yes(&user_message)
                && !state.step_0_final.trim().is_empty()
            {
                state.active_specialist =
                    Specialist::ValidationAndBusinessName.as_str().to_string();
                state.last_specialist_result = readiness_proceed(&state).into_value();
            }
        }

        // Confirm-screen advance: a clear yes on a stored CONFIRM whose
        // final is already persisted moves to the next step directly.
        if allow_legacy && state.current_step != StepId::Step0 {
            let previous = SpecialistReply::from_value(state.last_specialist_result.clone());
            let confirm_pending = previous.action() == Some(StepAction::Confirm)
                && !previous.confirmation_question().trim().is_empty()
                && !state.final_for(state.current_step).trim().is_empty();
            if confirm_pending
                && affirmative::is_clear_yes(&user_message)
                && state.current_step != StepId::Presentation
            {
                state.current_step = state.current_step.next();
                state.last_specialist_result = Value::Object(Map::new());
                user_message.clear();
            }
        }

        // Dream-builder readiness guard: a yes on the exercise offer (or on
        // a ready/start question) must land on the explainer, not the dream
        // specialist.
        if allow_legacy && state.current_step == StepId::Dream {
            let previous = SpecialistReply::from_value(state.last_specialist_result.clone());
            let offered = previous.flag("suggest_dreambuilder");
            let ready_question = previous.action() == Some(StepAction::Ask) && {
                let q = previous.question().to_lowercase();
                q.contains("ready") || q.contains("start")
            };
            if affirmative::is_clear_yes(&user_message) && (offered || ready_question) {
                state.dream_runtime_mode = DreamRuntimeMode::BuilderCollect;
                let decision =
                    forced_decision(StepId::Dream, Specialist::DreamExplainer, &state);
                let outcome = self.invoke(&state, &decision, &user_message, None).await?;
                let mut accounting = TurnAccounting::default();
                accounting.absorb(&outcome);
                let reply = self.normalize(decision.step, outcome.reply, &state);
                let mut next = apply::apply_state_update(
                    &state,
                    &decision,
                    &reply,
                    false,
                    self.config.targetgroup_word_cap,
                    self.config.rules_bullet_cap,
                );
                builder_bookkeeping(&mut next, decision.specialist, &reply);
                return Ok(self
                    .finish(session_id, next, passthrough, reply, accounting)
                    .await);
            }
        }

        // Main path: route, invoke, fold, then chain bounded hops.
        let mut accounting = TurnAccounting::default();
        let decision = route(&state, &user_message);
        let outcome = self.invoke(&state, &decision, &user_message, None).await?;
        accounting.absorb(&outcome);
        let mut reply = outcome.reply;

        if decision.specialist == Specialist::DreamExplainer {
            reply = self.gate_scoring(&state, reply);
        }
        reply = self.normalize(decision.step, reply, &state);
        if decision.step == StepId::BigWhy {
            reply = self
                .enforce_bigwhy_cap(&state, &decision, reply, &lang, &mut accounting)
                .await?;
        }

        // 20 statements collected but the model skipped the scoring flip:
        // one nudge call forces the gate.
        if decision.specialist == Specialist::DreamExplainer
            && !reply.flag("scoring_phase")
            && reply.statements().len() >= 20
        {
            let probe = apply::apply_state_update(
                &state,
                &decision,
                &reply,
                false,
                self.config.targetgroup_word_cap,
                self.config.rules_bullet_cap,
            );
            let next_decision = route(&probe, GO_NEXT_MESSAGE);
            if next_decision.specialist == Specialist::DreamExplainer {
                let retry = self.invoke(&probe, &next_decision, GO_NEXT_MESSAGE, None).await?;
                accounting.absorb(&retry);
                if retry.reply.flag("scoring_phase") {
                    reply = self.normalize(next_decision.step, retry.reply, &probe);
                }
            }
        }

        let mut next_state = apply::apply_state_update(
            &state,
            &decision,
            &reply,
            decision.show_session_intro,
            self.config.targetgroup_word_cap,
            self.config.rules_bullet_cap,
        );
        builder_bookkeeping(&mut next_state, decision.specialist, &reply);

        let mut hops: u32 = 1;
        let mut last_step = decision.step;
        loop {
            let flags = read_triggers(&next_state.last_specialist_result);
            let wants_advance = match last_step {
                StepId::Step0 => flags.proceed_to_dream,
                StepId::Dream => flags.proceed_to_purpose,
                StepId::Presentation => false,
                _ => flags.proceed_to_next,
            };
            if !wants_advance {
                break;
            }
            if hops >= self.config.hop_limit {
                tracing::info!(
                    hops,
                    step = %last_step,
                    "hop limit reached, deferring advance to the next turn"
                );
                break;
            }

            // Subsequent hops always run on an empty message: the user's
            // words were consumed by the hop that confirmed.
            let chained = route(&next_state, "");
            let outcome = self.invoke(&next_state, &chained, "", None).await?;
            hops += 1;
            accounting.absorb(&outcome);
            let mut hop_reply = self.normalize(chained.step, outcome.reply, &next_state);
            if chained.step == StepId::BigWhy {
                let candidate = apply::bigwhy_candidate(&hop_reply);
                if !candidate.is_empty()
                    && apply::count_words(&candidate) > self.config.bigwhy_word_cap
                {
                    hop_reply = apply::bigwhy_too_long_feedback(&lang, self.config.bigwhy_word_cap);
                }
            }
            next_state = apply::apply_state_update(
                &next_state,
                &chained,
                &hop_reply,
                false,
                self.config.targetgroup_word_cap,
                self.config.rules_bullet_cap,
            );
            builder_bookkeeping(&mut next_state, chained.specialist, &hop_reply);
            reply = hop_reply;
            last_step = chained.step;
        }

        Ok(self
            .finish(session_id, next_state, passthrough, reply, accounting)
            .await)
    }

    /// Persists the pending final for a hard-confirm code and stores the
    /// synthesized CONFIRM. Returns false when nothing was pending.
    fn resolve_hard_confirm(&self, state: &mut CanvasState) -> bool {
        let step = state.current_step;
        let previous = SpecialistReply::from_value(state.last_specialist_result.clone());
        let candidate = {
            let from_field = previous.text(value_field(step)).trim().to_string();
            if !from_field.is_empty() {
                from_field
            } else {
                let refined = previous.refined_formulation().trim().to_string();
                if !refined.is_empty() {
                    refined
                } else {
                    state.final_for(step).trim().to_string()
                }
            }
        };
        if candidate.is_empty() {
            return false;
        }

        match step {
            StepId::Step0 => {
                state.persist_step0(&candidate, previous.text("business_name"));
            }
            StepId::TargetGroup => {
                state.targetgroup_final =
                    apply::first_sentence_capped(&candidate, self.config.targetgroup_word_cap);
            }
            StepId::RulesOfTheGame => {
                let lines: Vec<String> = candidate.lines().map(str::to_string).collect();
                let bullets = apply::rules_bullets(&lines, self.config.rules_bullet_cap);
                if !bullets.is_empty() {
                    state.rulesofthegame_final = bullets;
                }
            }
            _ => state.set_final_for(step, candidate.clone()),
        }

        let mut confirmed = previous;
        confirmed.set("action", Value::from("CONFIRM"));
        confirmed.set(value_field(step), Value::from(candidate));
        match step {
            StepId::Step0 => confirmed.set("proceed_to_dream", Value::from("true")),
            StepId::Dream => {
                confirmed.set("proceed_to_purpose", Value::from("true"));
                confirmed.set("suggest_dreambuilder", Value::from("false"));
            }
            _ => confirmed.set("proceed_to_next", Value::from("true")),
        }
        state.last_specialist_result = confirmed.into_value();
        true
    }

    /// The dream-builder scoring handoff, when this turn submits scores.
    async fn try_submit_scores(
        &self,
        session_id: Option<&str>,
        state: &mut CanvasState,
        passthrough: &Passthrough,
        transients: &Transients,
        scores_requested: bool,
        user_message: &str,
    ) -> Result<Option<TurnResponse>, LlmError> {
        let explainer_active = state.current_step == StepId::Dream
            && state.active_specialist == Specialist::DreamExplainer.as_str();
        if !explainer_active {
            return Ok(None);
        }
        let rows = if scores_requested {
            transients.pending_scores.clone()
        } else {
            builder::scores_from_message(user_message)
        };
        let Some(rows) = rows else {
            return Ok(None);
        };
        if rows.is_empty() {
            return Ok(None);
        }

        let previous = SpecialistReply::from_value(state.last_specialist_result.clone());
        let clusters = previous.clusters();
        let statements = {
            let from_reply = previous.statements();
            if from_reply.len() >= state.dream_builder_statements.len() {
                from_reply
            } else {
                state.dream_builder_statements.clone()
            }
        };
        if clusters.is_empty() || clusters.len() != rows.len() || statements.is_empty() {
            tracing::warn!(
                clusters = clusters.len(),
                rows = rows.len(),
                "score rows do not match the stored clusters, ignoring submission"
            );
            return Ok(None);
        }

        let averages = builder::cluster_averages(&clusters, &rows);
        let top = builder::top_clusters(&averages);
        if top.is_empty() {
            return Ok(None);
        }

        state.dream_builder_statements = statements.clone();
        state.dream_runtime_mode = DreamRuntimeMode::BuilderRefine;
        let direction = DirectionContext {
            top_clusters: builder::top_clusters_json(&top),
            business_context: json!({
                "business_name": state.business_name,
                "step_0_final": state.step_0_final,
            })
            .to_string(),
        };

        let decision = forced_decision(StepId::Dream, Specialist::DreamExplainer, state);
        let outcome = self.invoke(state, &decision, "", Some(&direction)).await?;
        let mut accounting = TurnAccounting::default();
        accounting.absorb(&outcome);
        let reply = self.normalize(decision.step, outcome.reply, state);
        let mut next = apply::apply_state_update(
            state,
            &decision,
            &reply,
            false,
            self.config.targetgroup_word_cap,
            self.config.rules_bullet_cap,
        );
        next.dream_runtime_mode = DreamRuntimeMode::BuilderRefine;
        if next.dream_builder_statements.is_empty() {
            next.dream_builder_statements = statements;
        }
        Ok(Some(
            self.finish(session_id, next, passthrough, reply, accounting)
                .await,
        ))
    }

    /// Deterministic session-start screens. Returns a response only when the
    /// turn is an empty message on an unopened verification step.
    async fn try_start_trigger(
        &self,
        state: &mut CanvasState,
        passthrough: &mut Passthrough,
        user_message: &str,
    ) -> Option<TurnResponse> {
        let untouched = state.last_specialist_result.as_object().is_none_or(|m| m.is_empty());
        if !user_message.trim().is_empty()
            || state.current_step != StepId::Step0
            || state.intro_shown_session == "true"
            || !untouched
        {
            return None;
        }

        language::ensure_ui_strings(
            state,
            &self.ui_catalog,
            self.provider.as_ref(),
            self.config.llm_timeout,
        )
        .await;

        if !passthrough.started {
            // Not started yet: show the start hint only, no intro marking.
            let hint = state
                .ui_strings
                .get("startHint")
                .cloned()
                .unwrap_or_else(|| "Click Start to begin.".to_string());
            let reply = SpecialistReply::from_value(json!({
                "action": "ASK",
                "message": "",
                "question": hint,
                "refined_formulation": "",
                "confirmation_question": "",
                "business_name": state.business_name,
                "proceed_to_dream": "false",
                "step_0": "",
                "menu_id": "",
                "wants_recap": false,
            }));
            state.active_specialist =
                Specialist::ValidationAndBusinessName.as_str().to_string();
            state.last_specialist_result = reply.as_value().clone();
            return Some(TurnResponse {
                ok: true,
                current_step_id: state.current_step.as_str().to_string(),
                active_specialist: state.active_specialist.clone(),
                contract_id: contract_id(
                    state.current_step.as_str(),
                    status_for(state.current_step, state).as_str(),
                    "",
                ),
                text: String::new(),
                prompt: hint,
                specialist: reply.into_value(),
                state: state_value(state, passthrough),
                registry_version: REGISTRY_VERSION,
                ui: None,
                error: None,
            });
        }

        state.mark_session_intro_shown();
        if state.language.trim().is_empty() && !passthrough.initial_user_message.is_empty() {
            language::ensure_language(state, &passthrough.initial_user_message.clone());
        }

        let reply = if state.step_0_final.trim().is_empty() {
            SpecialistReply::from_value(json!({
                "action": "ASK",
                "message": language::STEP0_CONTEXT_MESSAGE,
                "question": language::step0_question(),
                "refined_formulation": "",
                "confirmation_question": "",
                "business_name": state.business_name,
                "proceed_to_dream": "false",
                "step_0": "",
                "menu_id": "",
                "wants_recap": false,
            }))
        } else {
            // Returning session: re-confirm the stored facts instead of
            // asking for them again.
            readiness_confirm(state)
        };
        state.active_specialist = Specialist::ValidationAndBusinessName.as_str().to_string();
        state.last_specialist_result = reply.as_value().clone();
        Some(TurnResponse {
            ok: true,
            current_step_id: state.current_step.as_str().to_string(),
            active_specialist: state.active_specialist.clone(),
            contract_id: contract_id(
                state.current_step.as_str(),
                status_for(state.current_step, state).as_str(),
                "",
            ),
            text: render::compose_text(&reply),
            prompt: render::pick_prompt(&reply),
            specialist: reply.into_value(),
            state: state_value(state, passthrough),
            registry_version: REGISTRY_VERSION,
            ui: None,
            error: None,
        })
    }

    /// A scoring flip without enough statements is rolled back; the model
    /// also sometimes emits scoring without re-listing the statements.
    fn gate_scoring(&self, state: &CanvasState, mut reply: SpecialistReply) -> SpecialistReply {
        if reply.flag("scoring_phase") && reply.statements().is_empty() {
            let previous = SpecialistReply::from_value(state.last_specialist_result.clone());
            let backfill = {
                let from_reply = previous.statements();
                if from_reply.is_empty() {
                    state.dream_builder_statements.clone()
                } else {
                    from_reply
                }
            };
            if !backfill.is_empty() {
                reply.set("statements", Value::from(backfill));
            }
        }
        if reply.flag("scoring_phase") && reply.statements().len() < 20 {
            tracing::debug!(
                statements = reply.statements().len(),
                "scoring requested below the statement minimum, staying in collect"
            );
            reply.set("scoring_phase", Value::from("false"));
            reply.set("clusters", json!([]));
        }
        reply
    }

    fn normalize(&self, step: StepId, reply: SpecialistReply, state: &CanvasState) -> SpecialistReply {
        apply::normalize_confirm_finals(
            step,
            reply,
            state,
            language::step0_question(),
            self.config.targetgroup_word_cap,
        )
    }

    /// The Big Why word cap: one forced shorten pass, then deterministic
    /// REFINE feedback if the wording is still too long.
    async fn enforce_bigwhy_cap(
        &self,
        state: &CanvasState,
        decision: &RouteDecision,
        reply: SpecialistReply,
        lang: &str,
        accounting: &mut TurnAccounting,
    ) -> Result<SpecialistReply, LlmError> {
        let cap = self.config.bigwhy_word_cap;
        let candidate = apply::bigwhy_candidate(&reply);
        if candidate.is_empty() || apply::count_words(&candidate) <= cap {
            return Ok(reply);
        }

        let shorten = format!("{SHORTEN_BIGWHY_TOKEN} {candidate}");
        let retry = self.invoke(state, decision, &shorten, None).await?;
        accounting.absorb(&retry);
        let shortened = self.normalize(decision.step, retry.reply, state);
        let result = apply::bigwhy_candidate(&shortened);
        if result.is_empty() || apply::count_words(&result) > cap {
            return Ok(apply::bigwhy_too_long_feedback(lang, cap));
        }
        Ok(shortened)
    }

    /// One strict specialist call, input assembled per specialist family.
    async fn invoke(
        &self,
        state: &CanvasState,
        decision: &RouteDecision,
        user_message: &str,
        direction: Option<&DirectionContext>,
    ) -> Result<StrictOutcome, LlmError> {
        let specialist = decision.specialist;
        let lang = language::normalize_lang_code(&state.language);
        let lang_if_set = if state.language.trim().is_empty() { "" } else { lang.as_str() };
        let intro = decision.intro_shown_for_step.as_str();
        let previous = SpecialistReply::from_value(state.last_specialist_result.clone());

        let input = match specialist {
            Specialist::ValidationAndBusinessName => {
                prompts::step0_input(user_message, lang_if_set)
            }
            Specialist::Dream => {
                prompts::standard_input(decision.step, user_message, intro, lang_if_set)
            }
            Specialist::DreamExplainer => {
                let statements = {
                    let from_reply = previous.statements();
                    if from_reply.len() >= state.dream_builder_statements.len() {
                        from_reply
                    } else {
                        state.dream_builder_statements.clone()
                    }
                };
                prompts::explainer_input(
                    user_message,
                    intro,
                    lang_if_set,
                    &statements,
                    direction.map(|d| d.top_clusters.as_str()),
                    direction.map(|d| d.business_context.as_str()),
                )
            }
            Specialist::Strategy | Specialist::RulesOfTheGame => prompts::statements_input(
                decision.step,
                user_message,
                intro,
                &lang,
                &previous.statements(),
            ),
            Specialist::TargetGroup | Specialist::ProductsServices => prompts::context_input(
                decision.step,
                user_message,
                intro,
                &lang,
                &prompts::context_block(state),
            ),
            _ => prompts::standard_input(decision.step, user_message, intro, &lang),
        };

        let call = StrictCall {
            schema: schema_for(specialist),
            instructions: prompts::instructions_for(specialist, state),
            input,
            temperature: prompts::temperature_for(specialist),
            max_output_tokens: prompts::max_output_tokens_for(specialist),
            timeout: self.config.llm_timeout,
        };
        let mut outcome = call_strict(self.provider.as_ref(), call).await?;

        if specialist == Specialist::RulesOfTheGame
            && outcome.reply.action() == Some(StepAction::Confirm)
        {
            self.tidy_rules_confirm(&mut outcome.reply);
        }
        Ok(outcome)
    }

    /// Rewrites a rules CONFIRM into the canonical `- ` bullet list, noting
    /// in the message when entries were merged or dropped by the cap.
    fn tidy_rules_confirm(&self, reply: &mut SpecialistReply) {
        let source = {
            let statements = reply.statements();
            if statements.is_empty() {
                reply
                    .text("rulesofthegame")
                    .lines()
                    .map(str::to_string)
                    .collect()
            } else {
                statements
            }
        };
        let offered = source.iter().filter(|s| !s.trim().is_empty()).count();
        let bullets = apply::rules_bullets(&source, self.config.rules_bullet_cap);
        if bullets.is_empty() {
            return;
        }
        let kept = bullets.lines().count();
        reply.set("refined_formulation", Value::from(bullets.clone()));
        reply.set("rulesofthegame", Value::from(bullets));
        if kept < offered {
            let note = format!(
                "Similar rules were merged and the list was limited to the {} Rules of the Game that matter most.",
                self.config.rules_bullet_cap
            );
            let message = reply.message().trim().to_string();
            let combined = if message.is_empty() {
                note
            } else {
                format!("{message}\n\n{note}")
            };
            reply.set("message", Value::from(combined));
        }
    }

    async fn finish(
        &self,
        session_id: Option<&str>,
        mut state: CanvasState,
        passthrough: &Passthrough,
        reply: SpecialistReply,
        accounting: TurnAccounting,
    ) -> TurnResponse {
        language::ensure_ui_strings(
            &mut state,
            &self.ui_catalog,
            self.provider.as_ref(),
            self.config.llm_timeout,
        )
        .await;

        if let Some(reporter) = &self.reporter {
            if accounting.attempts > 0 {
                reporter.append(
                    session_id.unwrap_or("anonymous"),
                    SessionTurnRecord {
                        turn_id: Uuid::new_v4(),
                        timestamp: Utc::now(),
                        step: state.current_step.as_str().to_string(),
                        specialist: state.active_specialist.clone(),
                        model: self.provider.model_name().to_string(),
                        attempts: accounting.attempts,
                        usage: accounting.usage,
                    },
                );
            }
        }

        let mut flags = UiFlags::new();
        if reply.flag("scoring_phase") {
            flags.insert("builder_scoring".to_string(), true);
        }
        // A reply without a menu falls back to the step's default menu for
        // its output status.
        let status = status_for(state.current_step, &state);
        let menu_id = {
            let named = reply.menu_id().trim().to_string();
            if !named.is_empty() {
                named
            } else {
                default_menu(state.current_step, status)
                    .unwrap_or("")
                    .to_string()
            }
        };
        let ui = render::build_ui_payload(&menu_id, flags);
        TurnResponse {
            ok: true,
            current_step_id: state.current_step.as_str().to_string(),
            active_specialist: state.active_specialist.clone(),
            contract_id: contract_id(state.current_step.as_str(), status.as_str(), &menu_id),
            text: render::compose_text(&reply),
            prompt: render::pick_prompt(&reply),
            specialist: reply.into_value(),
            state: state_value(&state, passthrough),
            registry_version: REGISTRY_VERSION,
            ui,
            error: None,
        }
    }

    async fn unknown_action_response(
        &self,
        mut state: CanvasState,
        passthrough: &Passthrough,
        code: &str,
        strict: bool,
    ) -> TurnResponse {
        tracing::warn!(code, strict, "unknown action code in widget mode");
        language::ensure_ui_strings(
            &mut state,
            &self.ui_catalog,
            self.provider.as_ref(),
            self.config.llm_timeout,
        )
        .await;
        TurnResponse {
            ok: false,
            current_step_id: state.current_step.as_str().to_string(),
            active_specialist: state.active_specialist.clone(),
            contract_id: contract_id(
                state.current_step.as_str(),
                status_for(state.current_step, &state).as_str(),
                "",
            ),
            text: UNKNOWN_ACTION_TEXT.to_string(),
            prompt: String::new(),
            specialist: state.last_specialist_result.clone(),
            state: state_value(&state, passthrough),
            registry_version: REGISTRY_VERSION,
            ui: None,
            error: Some(json!({
                "type": "unknown_actioncode",
                "action_code": code,
                "strict": strict,
                "retry_action": "retry_same_action",
            })),
        }
    }

    /// Failed turn: the entry state goes back unchanged so the client can
    /// resubmit the exact same request.
    async fn error_response(
        &self,
        state: CanvasState,
        passthrough: &Passthrough,
        err: &LlmError,
    ) -> TurnResponse {
        tracing::warn!(error = %err, kind = err.wire_type(), "turn failed");
        let mut error = json!({
            "type": err.wire_type(),
            "message": err.to_string(),
            "retry_action": "retry_same_action",
        });
        if let Some(backoff) = err.suggested_backoff() {
            error["backoff_ms"] = Value::from(backoff.as_millis() as u64);
        }
        let text = state
            .ui_strings
            .get("errorMessage")
            .cloned()
            .unwrap_or_else(|| {
                "Something went wrong while processing your message. Please try again."
                    .to_string()
            });
        TurnResponse {
            ok: false,
            current_step_id: state.current_step.as_str().to_string(),
            active_specialist: state.active_specialist.clone(),
            contract_id: contract_id(
                state.current_step.as_str(),
                status_for(state.current_step, &state).as_str(),
                "",
            ),
            text,
            prompt: String::new(),
            specialist: state.last_specialist_result.clone(),
            state: state_value(&state, passthrough),
            registry_version: REGISTRY_VERSION,
            ui: None,
            error: Some(error),
        }
    }
}

fn read_transients(raw: &Value) -> Transients {
    if let Some(telemetry) = raw.get(wire_keys::UI_TELEMETRY) {
        if !telemetry.is_null() {
            tracing::info!(telemetry = %telemetry, "ui telemetry");
        }
    }
    Transients {
        text_submit: raw
            .get(wire_keys::TEXT_SUBMIT)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        pending_scores: raw
            .get(wire_keys::PENDING_SCORES)
            .and_then(builder::parse_score_rows),
    }
}

fn read_passthrough(raw: &Value) -> Passthrough {
    Passthrough {
        started: raw
            .get("started")
            .map(|v| match v {
                Value::Bool(b) => *b,
                Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
                _ => false,
            })
            .unwrap_or(false),
        initial_user_message: raw
            .get("initial_user_message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string(),
    }
}

fn capture_initial_message(passthrough: &mut Passthrough, message: &str) {
    if passthrough.initial_user_message.is_empty() && language::is_plain_user_text(message) {
        passthrough.initial_user_message = message.trim().to_string();
    }
}

fn is_pristine(state: &CanvasState) -> bool {
    state.current_step == StepId::Step0
        && state.step_0_final.trim().is_empty()
        && state.intro_shown_session != "true"
        && state.last_specialist_result.as_object().is_none_or(|m| m.is_empty())
}

fn forced_decision(step: StepId, specialist: Specialist, state: &CanvasState) -> RouteDecision {
    RouteDecision {
        step,
        specialist,
        specialist_input: String::new(),
        intro_shown_for_step: state.intro_shown_for_step.trim().to_string(),
        show_step_intro: state.intro_shown_for_step.trim() != step.as_str(),
        show_session_intro: state.intro_shown_session != "true",
    }
}

/// Serializes the state and echoes the passthrough wire values back onto it.
fn state_value(state: &CanvasState, passthrough: &Passthrough) -> Value {
    let mut value = serde_json::to_value(state).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        if passthrough.started {
            map.insert("started".to_string(), Value::from("true"));
        }
        if !passthrough.initial_user_message.is_empty() {
            map.insert(
                "initial_user_message".to_string(),
                Value::from(passthrough.initial_user_message.clone()),
            );
        }
    }
    value
}

/// The payload injected after a readiness yes: a bare CONFIRM whose only
/// content is the proceed flag, so nothing of the verification screen
/// leaks into the dream turn.
fn readiness_proceed(state: &CanvasState) -> SpecialistReply {
    let name = state.business_name.trim();
    SpecialistReply::from_value(json!({
        "action": "CONFIRM",
        "message": "",
        "question": "",
        "refined_formulation": "",
        "confirmation_question": "",
        "business_name": if name.is_empty() { "TBD" } else { name },
        "proceed_to_dream": "true",
        "step_0": state.step_0_final,
        "menu_id": "",
        "wants_recap": false,
    }))
}

/// Synthesizes the verification readiness CONFIRM from the stored final,
/// re-asking the readiness question.
fn readiness_confirm(state: &CanvasState) -> SpecialistReply {
    let (venture, name, status) = parse_step0_final(&state.step_0_final);
    let venture = if venture.is_empty() { "venture".to_string() } else { venture };
    let name = if name.is_empty() { state.business_name.trim().to_string() } else { name };
    let name_part = if name.is_empty() || name == "TBD" {
        String::new()
    } else {
        format!(" called {name}")
    };
    let statement = if status.to_lowercase().contains("exist") {
        format!("You have a {venture}{name_part}.")
    } else {
        format!("You want to start a {venture}{name_part}.")
    };
    let question = format!(
        "{statement} Is that correct, and if so are you ready to start the first step, 'Your Dream'?"
    );
    SpecialistReply::from_value(json!({
        "action": "CONFIRM",
        "message": "",
        "question": "",
        "refined_formulation": "",
        "confirmation_question": question,
        "business_name": if name.is_empty() { "TBD".to_string() } else { name },
        "proceed_to_dream": "false",
        "step_0": state.step_0_final,
        "menu_id": "",
        "wants_recap": false,
    }))
}

/// Splits "Venture: x | Name: y | Status: z" into its parts; missing
/// segments read as "".
fn parse_step0_final(text: &str) -> (String, String, String) {
    let mut venture = String::new();
    let mut name = String::new();
    let mut status = String::new();
    for segment in text.split('|') {
        let segment = segment.trim();
        let Some((key, value)) = segment.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_lowercase().as_str() {
            "venture" => venture = value,
            "name" => name = value,
            "status" => status = value,
            _ => {}
        }
    }
    (venture, name, status)
}

/// Tracks dream-builder mode and statement carryover after an explainer turn.
fn builder_bookkeeping(next: &mut CanvasState, specialist: Specialist, reply: &SpecialistReply) {
    if specialist != Specialist::DreamExplainer {
        return;
    }
    let statements = reply.statements();
    if !statements.is_empty() {
        next.dream_builder_statements = statements;
    }
    if reply.flag("scoring_phase") {
        next.dream_runtime_mode = DreamRuntimeMode::BuilderScoring;
    } else if next.dream_runtime_mode == DreamRuntimeMode::SelfAuthored {
        next.dream_runtime_mode = DreamRuntimeMode::BuilderCollect;
    }
}
