//! # Filter Chain
//!
//! An ordered chain of dependent filters, e.g. guide year → type → make. Changing a
//! level reloads every level after it and issues lookup tickets for the ones whose
//! required parents are all selected. A dependent keeps its selection while it reloads
//! and loses it only when the new options no longer contain it.
//!
//! Every ticket carries a sequence number from a per-chain counter, and each level
//! remembers the latest sequence it issued. A result is applied only when its ticket
//! is still the latest for that level, so a slow lookup for an old parent value can
//! never overwrite the options for the current one.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::gateway::GatewayResult;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::options::{FilterSet, OptionList, Scalar};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    #[error("no filter level {0}")]
    UnknownLevel(usize),

    #[error("{key} options are not loaded")]
    NotLoaded { key: String },

    #[error("{value} is not an option for {key}")]
    NotAnOption { key: String, value: String },

    #[error("{key} has no failed lookup to retry")]
    NothingToRetry { key: String },
}

pub type CascadeResult<T> = Result<T, CascadeError>;

/// One filter in a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSpec {
    pub key: String,
    /// Dependents cannot be looked up until this level has a value
    pub required: bool,
}

/// Ordered filter levels; level 0 is the root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSpec {
    levels: Vec<LevelSpec>,
}

impl ChainSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, key: impl Into<String>, required: bool) -> Self {
        self.levels.push(LevelSpec {
            key: key.into(),
            required,
        });
        self
    }

    /// Guide year (required) → type (optional) → make
    pub fn vehicle() -> Self {
        Self::new()
            .level("guide_year", true)
            .level("type", false)
            .level("make", false)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[LevelSpec] {
        &self.levels
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.key == key)
    }
}

/// Lookup state of one level
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LevelState {
    #[default]
    Unselected,
    Loading,
    Loaded(OptionList),
    Error(String),
}

/// A lookup to perform for one level, scoped by the values selected before it
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTicket {
    pub level: usize,
    pub key: String,
    pub seq: u64,
    pub scope: FilterSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied,
    /// Applied, but the level's selection was not among the new options and was
    /// cleared; the levels after it must be looked up again
    Reissued(Vec<LookupTicket>),
    /// A newer lookup was issued for the level; the result was discarded
    Stale,
}

#[derive(Debug, Clone, Default)]
struct Level {
    state: LevelState,
    selection: Option<Scalar>,
    latest_seq: Option<u64>,
}

/// Selection state of one chain
#[derive(Debug, Clone)]
pub struct FilterChain {
    spec: ChainSpec,
    levels: Vec<Level>,
    next_seq: u64,
    cache: Option<HashMap<(usize, String), OptionList>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl FilterChain {
    pub fn new(spec: ChainSpec) -> Self {
        let levels = vec![Level::default(); spec.len()];
        Self {
            spec,
            levels,
            next_seq: 1,
            cache: None,
            metrics: None,
        }
    }

    /// Reuse option lists already fetched for the same level and scope
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(HashMap::new());
        self
    }

    /// Count discarded results in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    pub fn state(&self, level: usize) -> Option<&LevelState> {
        self.levels.get(level).map(|l| &l.state)
    }

    pub fn selection(&self, level: usize) -> Option<&Scalar> {
        self.levels.get(level).and_then(|l| l.selection.as_ref())
    }

    pub fn options(&self, level: usize) -> Option<&OptionList> {
        match self.state(level) {
            Some(LevelState::Loaded(options)) => Some(options),
            _ => None,
        }
    }

    /// Every selected level as a filter set
    pub fn filter_set(&self) -> FilterSet {
        self.scope_before(self.levels.len())
    }

    /// Start the root lookup
    pub fn load_root(&mut self) -> CascadeResult<LookupTicket> {
        if self.levels.is_empty() {
            return Err(CascadeError::UnknownLevel(0));
        }
        Ok(self.issue(0))
    }

    /// Set or clear the value at `level` and invalidate every level after it
    pub fn select(
        &mut self,
        level: usize,
        value: Option<Scalar>,
    ) -> CascadeResult<Vec<LookupTicket>> {
        let key = self.key(level)?.to_string();

        if let Some(value) = &value {
            match &self.levels[level].state {
                LevelState::Loaded(options) if !options.contains(value) => {
                    return Err(CascadeError::NotAnOption {
                        key,
                        value: value.to_string(),
                    });
                }
                LevelState::Loaded(_) => {}
                // the root may be populated by the caller
                _ if level == 0 => {}
                _ => return Err(CascadeError::NotLoaded { key }),
            }
        }

        self.levels[level].selection = value;
        Ok(self.reload_after(level))
    }

    /// Apply a lookup result if its ticket is still the latest for its level
    pub fn apply(
        &mut self,
        ticket: &LookupTicket,
        result: GatewayResult<OptionList>,
    ) -> CascadeResult<ApplyOutcome> {
        self.key(ticket.level)?;

        if self.levels[ticket.level].latest_seq != Some(ticket.seq) {
            let seq = ticket.seq.to_string();
            log_event_with_fields(
                Event::LookupStale,
                &[("level", ticket.key.as_str()), ("seq", seq.as_str())],
            );
            if let Some(metrics) = &self.metrics {
                metrics.increment_stale_lookups();
            }
            return Ok(ApplyOutcome::Stale);
        }

        let slot = &mut self.levels[ticket.level];
        slot.latest_seq = None;
        match result {
            Ok(options) => {
                let cleared = keep_if_offered(&mut slot.selection, &options);
                if let Some(cache) = &mut self.cache {
                    cache.insert((ticket.level, ticket.scope.cache_key()), options.clone());
                }
                self.levels[ticket.level].state = LevelState::Loaded(options);

                if cleared {
                    let tickets = self.reload_after(ticket.level);
                    if !tickets.is_empty() {
                        return Ok(ApplyOutcome::Reissued(tickets));
                    }
                }
            }
            Err(err) => {
                slot.state = LevelState::Error(err.to_string());
            }
        }

        Ok(ApplyOutcome::Applied)
    }

    /// Re-issue the lookup for a level whose last lookup failed
    pub fn retry(&mut self, level: usize) -> CascadeResult<LookupTicket> {
        let key = self.key(level)?.to_string();
        if !matches!(self.levels[level].state, LevelState::Error(_)) {
            return Err(CascadeError::NothingToRetry { key });
        }
        Ok(self.issue(level))
    }

    // Bring every level after `level` in line with the selections up to it
    fn reload_after(&mut self, level: usize) -> Vec<LookupTicket> {
        let mut tickets = Vec::new();
        for dependent in level + 1..self.levels.len() {
            if self.blocked(dependent) {
                let slot = &mut self.levels[dependent];
                slot.selection = None;
                slot.state = LevelState::Unselected;
                slot.latest_seq = None;
                continue;
            }

            if let Some(options) = self.cached(dependent) {
                let slot = &mut self.levels[dependent];
                keep_if_offered(&mut slot.selection, &options);
                slot.state = LevelState::Loaded(options);
                slot.latest_seq = None;
                continue;
            }

            tickets.push(self.issue(dependent));
        }
        tickets
    }

    fn key(&self, level: usize) -> CascadeResult<&str> {
        self.spec
            .levels()
            .get(level)
            .map(|l| l.key.as_str())
            .ok_or(CascadeError::UnknownLevel(level))
    }

    // A required level before `level` has no value
    fn blocked(&self, level: usize) -> bool {
        self.spec.levels()[..level]
            .iter()
            .zip(&self.levels)
            .any(|(spec, state)| spec.required && state.selection.is_none())
    }

    fn scope_before(&self, level: usize) -> FilterSet {
        let mut scope = FilterSet::new();
        for (spec, state) in self.spec.levels().iter().zip(&self.levels).take(level) {
            if let Some(value) = &state.selection {
                scope.insert(spec.key.clone(), value.clone());
            }
        }
        scope
    }

    fn cached(&self, level: usize) -> Option<OptionList> {
        let cache = self.cache.as_ref()?;
        cache
            .get(&(level, self.scope_before(level).cache_key()))
            .cloned()
    }

    fn issue(&mut self, level: usize) -> LookupTicket {
        let seq = self.next_seq;
        self.next_seq += 1;

        let scope = self.scope_before(level);
        let slot = &mut self.levels[level];
        slot.state = LevelState::Loading;
        slot.latest_seq = Some(seq);

        LookupTicket {
            level,
            key: self.spec.levels()[level].key.clone(),
            seq,
            scope,
        }
    }
}

/// Clear `selection` unless `options` offers it; true if it was cleared
fn keep_if_offered(selection: &mut Option<Scalar>, options: &OptionList) -> bool {
    match selection {
        Some(selected) if !options.contains(selected) => {
            *selection = None;
            true
        }
        _ => false,
    }
}
