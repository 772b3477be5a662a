//! Per-ticket review and submit state machine.
//!
//! Every generate and submit request carries a [`RequestToken`]. A response
//! only drives the selection state when its token matches the request that
//! is in flight for the current selection; anything else is reported as
//! stale so the caller can decide what shared state it may still touch.

use crate::{Failure, Solution, SolutionCache, TicketKey};

pub type RequestToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewPhase {
    #[default]
    Idle,
    Selected,
    GeneratingSolutions,
    SolutionsReady,
    ReviewingSolution,
    Submitting,
}

/// Editable duplicate of a cached solution. Edits never reach the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingCopy {
    pub source_index: usize,
    pub solution: Solution,
}

impl WorkingCopy {
    pub fn text(&self) -> &str {
        &self.solution.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Generate,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    token: RequestToken,
    kind: RequestKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub token: RequestToken,
    pub ticket_key: TicketKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub token: RequestToken,
    pub ticket_key: TicketKey,
    pub solution_text: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// Solutions now shown for the selection; the caller caches them.
    Applied(Vec<Solution>),
    /// Generation for the selection failed; partial results were dropped.
    Failed(Failure),
    /// The selection moved on before the response arrived. Failures are
    /// re-tagged as stale.
    Stale(Result<Vec<Solution>, Failure>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Resolved,
    /// Back in review with the working copy untouched.
    Failed(Failure),
    /// Posted after the selection changed. If the ticket was selected again
    /// meanwhile, the selection is cleared.
    StaleResolved,
    /// Carries a [`FailureKind::StaleState`](crate::FailureKind::StaleState) failure.
    StaleFailed(Failure),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TicketLifecycle {
    phase: ReviewPhase,
    selected: Option<TicketKey>,
    solutions: Vec<Solution>,
    working_copy: Option<WorkingCopy>,
    in_flight: Option<InFlight>,
    last_token: RequestToken,
}

impl TicketLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn working_copy(&self) -> Option<&WorkingCopy> {
        self.working_copy.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Changes the selection. A cache hit shows the cached list at once;
    /// a miss returns the generate request to issue.
    pub fn select(
        &mut self,
        key: Option<TicketKey>,
        cache: &SolutionCache,
    ) -> Option<GenerateRequest> {
        if key == self.selected {
            return None;
        }

        let Some(key) = key else {
            self.reset();
            return None;
        };

        self.selected = Some(key.clone());
        self.phase = ReviewPhase::Selected;
        self.solutions.clear();
        self.working_copy = None;
        self.in_flight = None;

        if let Some(cached) = cache.get(&key) {
            self.solutions = cached.to_vec();
            self.phase = ReviewPhase::SolutionsReady;
            return None;
        }

        Some(self.begin_generate(key))
    }

    /// Starts a fresh generation for the selection regardless of the cache.
    pub fn regenerate(&mut self) -> Option<GenerateRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        let key = self.selected.clone()?;
        self.solutions.clear();
        self.working_copy = None;
        Some(self.begin_generate(key))
    }

    /// Applies a generate response. A failed regenerate falls back to the
    /// list still cached for the ticket, if any.
    pub fn solutions_generated(
        &mut self,
        token: RequestToken,
        ticket_key: &str,
        result: Result<Vec<Solution>, Failure>,
        cache: &SolutionCache,
    ) -> GenerateOutcome {
        if !self.is_current(token, ticket_key, RequestKind::Generate) {
            return GenerateOutcome::Stale(result.map_err(Failure::into_stale));
        }
        self.in_flight = None;

        match result {
            Ok(solutions) => {
                self.solutions = solutions.clone();
                self.phase = ReviewPhase::SolutionsReady;
                GenerateOutcome::Applied(solutions)
            }
            Err(failure) => {
                match cache.get(ticket_key) {
                    Some(cached) => {
                        self.solutions = cached.to_vec();
                        self.phase = ReviewPhase::SolutionsReady;
                    }
                    None => {
                        self.solutions.clear();
                        self.phase = ReviewPhase::Selected;
                    }
                }
                GenerateOutcome::Failed(failure)
            }
        }
    }

    /// Opens a working copy of solution `index`.
    pub fn review(&mut self, index: usize) -> bool {
        if !matches!(
            self.phase,
            ReviewPhase::SolutionsReady | ReviewPhase::ReviewingSolution
        ) {
            return false;
        }
        let Some(solution) = self.solutions.get(index) else {
            return false;
        };
        self.working_copy = Some(WorkingCopy {
            source_index: index,
            solution: solution.clone(),
        });
        self.phase = ReviewPhase::ReviewingSolution;
        true
    }

    pub fn edit(&mut self, text: String) -> bool {
        if self.phase != ReviewPhase::ReviewingSolution {
            return false;
        }
        match self.working_copy.as_mut() {
            Some(copy) => {
                copy.solution.text = text;
                true
            }
            None => false,
        }
    }

    pub fn discard_review(&mut self) -> bool {
        if self.phase != ReviewPhase::ReviewingSolution {
            return false;
        }
        self.working_copy = None;
        self.phase = ReviewPhase::SolutionsReady;
        true
    }

    pub fn submit(&mut self) -> Option<SubmitRequest> {
        if self.phase != ReviewPhase::ReviewingSolution || self.in_flight.is_some() {
            return None;
        }
        let ticket_key = self.selected.clone()?;
        let (solution_text, model) = self
            .working_copy
            .as_ref()
            .map(|copy| (copy.solution.text.clone(), copy.solution.model.clone()))?;
        let request = SubmitRequest {
            token: self.next_token(),
            ticket_key,
            solution_text,
            model,
        };
        self.in_flight = Some(InFlight {
            token: request.token,
            kind: RequestKind::Submit,
        });
        self.phase = ReviewPhase::Submitting;
        Some(request)
    }

    pub fn solution_submitted(
        &mut self,
        token: RequestToken,
        ticket_key: &str,
        result: Result<(), Failure>,
    ) -> SubmitOutcome {
        if !self.is_current(token, ticket_key, RequestKind::Submit) {
            return match result {
                Ok(()) => {
                    // The resolved ticket may have been selected again since.
                    if self.selected.as_deref() == Some(ticket_key) {
                        self.reset();
                    }
                    SubmitOutcome::StaleResolved
                }
                Err(failure) => SubmitOutcome::StaleFailed(failure.into_stale()),
            };
        }
        self.in_flight = None;

        match result {
            Ok(()) => {
                self.reset();
                SubmitOutcome::Resolved
            }
            Err(failure) => {
                self.phase = ReviewPhase::ReviewingSolution;
                SubmitOutcome::Failed(failure)
            }
        }
    }

    fn begin_generate(&mut self, ticket_key: TicketKey) -> GenerateRequest {
        let token = self.next_token();
        self.in_flight = Some(InFlight {
            token,
            kind: RequestKind::Generate,
        });
        self.phase = ReviewPhase::GeneratingSolutions;
        GenerateRequest { token, ticket_key }
    }

    fn is_current(&self, token: RequestToken, ticket_key: &str, kind: RequestKind) -> bool {
        self.selected.as_deref() == Some(ticket_key)
            && self.in_flight.as_ref() == Some(&InFlight { token, kind })
    }

    fn next_token(&mut self) -> RequestToken {
        self.last_token += 1;
        self.last_token
    }

    fn reset(&mut self) {
        self.phase = ReviewPhase::Idle;
        self.selected = None;
        self.solutions.clear();
        self.working_copy = None;
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{GenerateOutcome, ReviewPhase, SubmitOutcome, TicketLifecycle};
    use crate::{Failure, FailureKind, Solution, SolutionCache};

    fn solution(text: &str) -> Solution {
        Solution {
            text: text.to_string(),
            confidence: 0.9,
            model: "gemini-2.0-flash".to_string(),
            sources: Vec::new(),
        }
    }

    fn cache_with(keys: &[&str]) -> SolutionCache {
        let mut cache = SolutionCache::new();
        for key in keys {
            cache.put(*key, vec![solution("Rerun the posting job.")]);
        }
        cache
    }

    #[test]
    fn submit_carries_edited_text_and_fresh_token() {
        let cache = cache_with(&["ERP-42"]);
        let mut lifecycle = TicketLifecycle::new();
        lifecycle.select(Some("ERP-42".to_string()), &cache);
        assert!(lifecycle.review(0));
        assert!(lifecycle.edit("Rerun it twice.".to_string()));

        let request = lifecycle.submit().expect("submit request");
        assert_eq!(request.token, 1);
        assert_eq!(request.ticket_key, "ERP-42");
        assert_eq!(request.solution_text, "Rerun it twice.");
        assert_eq!(request.model, "gemini-2.0-flash");
        assert_eq!(lifecycle.phase(), ReviewPhase::Submitting);
        assert!(lifecycle.submit().is_none());
    }

    #[test]
    fn stale_failures_are_tagged_stale() {
        let cache = cache_with(&["ERP-42"]);
        let mut lifecycle = TicketLifecycle::new();
        let generate = lifecycle
            .select(Some("ERP-7".to_string()), &cache)
            .expect("generate request");
        lifecycle.select(Some("ERP-42".to_string()), &cache);
        lifecycle.review(0);
        let submit = lifecycle.submit().expect("submit request");
        lifecycle.select(None, &cache);

        let outcome = lifecycle.solutions_generated(
            generate.token,
            "ERP-7",
            Err(Failure::network("timeout")),
            &cache,
        );
        assert_eq!(
            outcome,
            GenerateOutcome::Stale(Err(Failure::new(FailureKind::StaleState, "timeout")))
        );

        let outcome = lifecycle.solution_submitted(
            submit.token,
            "ERP-42",
            Err(Failure::network("http status 500")),
        );
        assert_eq!(
            outcome,
            SubmitOutcome::StaleFailed(Failure::new(FailureKind::StaleState, "http status 500"))
        );
        assert_eq!(lifecycle.phase(), ReviewPhase::Idle);
    }

    #[test]
    fn stale_success_for_other_ticket_keeps_selection() {
        let cache = cache_with(&["ERP-42", "ERP-7"]);
        let mut lifecycle = TicketLifecycle::new();
        lifecycle.select(Some("ERP-42".to_string()), &cache);
        lifecycle.review(0);
        let submit = lifecycle.submit().expect("submit request");
        lifecycle.select(Some("ERP-7".to_string()), &cache);

        let outcome = lifecycle.solution_submitted(submit.token, "ERP-42", Ok(()));
        assert_eq!(outcome, SubmitOutcome::StaleResolved);
        assert_eq!(lifecycle.selected(), Some("ERP-7"));
        assert_eq!(lifecycle.phase(), ReviewPhase::SolutionsReady);
    }

    #[test]
    fn failed_generate_without_cache_returns_to_selected() {
        let cache = SolutionCache::new();
        let mut lifecycle = TicketLifecycle::new();
        let request = lifecycle
            .select(Some("ERP-42".to_string()), &cache)
            .expect("generate request");

        let outcome = lifecycle.solutions_generated(
            request.token,
            "ERP-42",
            Err(Failure::network("http status 502")),
            &cache,
        );
        assert_eq!(
            outcome,
            GenerateOutcome::Failed(Failure::network("http status 502"))
        );
        assert_eq!(lifecycle.phase(), ReviewPhase::Selected);
        assert!(lifecycle.solutions().is_empty());
    }
}
