//! Runs chain lookups against an option source

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::gateway::GatewayResult;

use super::chain::{ApplyOutcome, CascadeResult, FilterChain, LookupTicket};
use super::options::{FilterSet, OptionList, Scalar};

/// Where a level's options come from
#[async_trait]
pub trait OptionSource: Send + Sync {
    /// Options for the level named `key`, scoped by the selected parent values
    async fn options(&self, key: &str, scope: &FilterSet) -> GatewayResult<OptionList>;
}

/// Drives a [`FilterChain`]: issues tickets, runs their lookups concurrently and applies
/// each result on its own
pub struct CascadeDriver<S> {
    source: S,
    chain: FilterChain,
}

impl<S: OptionSource> CascadeDriver<S> {
    pub fn new(source: S, chain: FilterChain) -> Self {
        Self { source, chain }
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn into_chain(self) -> FilterChain {
        self.chain
    }

    pub async fn load_root(&mut self) -> CascadeResult<ApplyOutcome> {
        let ticket = self.chain.load_root()?;
        let outcomes = self.run(vec![ticket]).await?;
        Ok(outcomes.into_iter().next().unwrap_or(ApplyOutcome::Stale))
    }

    pub async fn select(
        &mut self,
        level: usize,
        value: Option<Scalar>,
    ) -> CascadeResult<Vec<ApplyOutcome>> {
        let tickets = self.chain.select(level, value)?;
        self.run(tickets).await
    }

    pub async fn retry(&mut self, level: usize) -> CascadeResult<ApplyOutcome> {
        let ticket = self.chain.retry(level)?;
        let outcomes = self.run(vec![ticket]).await?;
        Ok(outcomes.into_iter().next().unwrap_or(ApplyOutcome::Stale))
    }

    /// Look up every ticket concurrently; a failure only affects its own level
    ///
    /// Lookups reissued because a kept selection turned out invalid run as a further
    /// batch. Outcomes are returned in ticket order, first batch first.
    pub async fn run(&mut self, tickets: Vec<LookupTicket>) -> CascadeResult<Vec<ApplyOutcome>> {
        let mut outcomes = Vec::with_capacity(tickets.len());
        let mut batch = tickets;

        while !batch.is_empty() {
            let source = &self.source;
            let results = join_all(
                batch
                    .iter()
                    .map(|ticket| source.options(&ticket.key, &ticket.scope)),
            )
            .await;

            let mut reissued = Vec::new();
            for (ticket, result) in batch.iter().zip(results) {
                let outcome = self.chain.apply(ticket, result)?;
                if let ApplyOutcome::Reissued(tickets) = &outcome {
                    reissued.extend(tickets.iter().cloned());
                }
                outcomes.push(outcome);
            }
            batch = reissued;
        }

        Ok(outcomes)
    }
}
