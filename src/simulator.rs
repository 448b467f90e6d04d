//! Factory simulator: owns the clock and drives the generation cycle
//!
//! One cycle: refresh perturbation offsets when due, compute and commit every
//! tag value for the current tick, publish every value, advance the clock.
//! Cycles are separated by the configured pacing delay; a shutdown signal
//! ends the loop during the wait or between two publish writes.

use crate::config::SimulatorConfig;
use crate::error::{PublishError, SimResult, StateError};
use crate::publish::PublishAdapter;
use crate::simulation::{
    Clock, CyclePacing, PerturbationScheduler, RandomSource, RngSource, RuntimeState,
    SignalGenerator, TickSnapshot,
};
use crate::topology::{Factory, TagId};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Outcome of one generation cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub tick: u64,
    /// Perturbation offsets were redrawn before computing this tick
    pub refreshed: bool,
    pub published: usize,
    /// Paths of tags whose write failed
    pub failed: Vec<String>,
    /// Shutdown arrived before every value was published
    pub interrupted: bool,
}

/// Totals over a run of cycles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub cycles: u64,
    pub published: u64,
    pub failed: u64,
    pub refreshes: u64,
}

impl RunSummary {
    fn absorb(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.published += report.published as u64;
        self.failed += report.failed.len() as u64;
        if report.refreshed {
            self.refreshes += 1;
        }
    }
}

/// Shutdown signal for [`FactorySimulator::run`]; send `true` to stop
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

pub struct FactorySimulator<A: PublishAdapter> {
    factory: Factory,
    state: Arc<RuntimeState>,
    clock: Clock,
    scheduler: PerturbationScheduler,
    generator: SignalGenerator,
    pacing: CyclePacing,
    adapter: A,
    handles: Vec<A::Handle>,
    source: Box<dyn RandomSource>,
}

impl<A: PublishAdapter> FactorySimulator<A> {
    /// Build the factory from `config` and register it with `adapter`
    pub async fn new(config: &SimulatorConfig, adapter: A) -> SimResult<Self> {
        let factory = config.build_factory()?;
        let source = Box::new(RngSource::new(config.engine.seed));
        Self::with_source(config, factory, adapter, source).await
    }

    /// Build around an explicit factory and random source
    pub async fn with_source(
        config: &SimulatorConfig,
        factory: Factory,
        adapter: A,
        mut source: Box<dyn RandomSource>,
    ) -> SimResult<Self> {
        let state = Arc::new(RuntimeState::new(&factory));
        let scheduler = config.perturbation_scheduler();
        scheduler.initialize(&state, source.as_mut());

        let handles = adapter.register(&factory).await?;
        if handles.len() != state.len() {
            return Err(PublishError::Registration(format!(
                "adapter returned {} handles for {} tags",
                handles.len(),
                state.len()
            ))
            .into());
        }

        info!(
            lines = factory.lines().len(),
            tags = state.len(),
            refresh_interval = scheduler.refresh_interval(),
            "Factory simulator ready"
        );

        Ok(Self {
            factory,
            state,
            clock: Clock::new(),
            scheduler,
            generator: SignalGenerator::new(config.generator_settings()),
            pacing: config.pacing,
            adapter,
            handles,
            source,
        })
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Shared runtime state, readable from other tasks
    pub fn state(&self) -> Arc<RuntimeState> {
        Arc::clone(&self.state)
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn handles(&self) -> &[A::Handle] {
        &self.handles
    }

    /// Tick the next cycle will generate
    pub fn tick(&self) -> u64 {
        self.clock.current()
    }

    pub fn snapshot(&self) -> Arc<TickSnapshot> {
        self.state.snapshot()
    }

    /// Accept a value written by an external client.
    ///
    /// It stays visible until the next cycle overwrites it.
    pub fn apply_client_write(&self, id: TagId, value: f64) -> Result<(), StateError> {
        self.state.apply_external_write(id, value)
    }

    /// Run one full cycle, publishing every tag
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle(None).await
    }

    async fn cycle(&mut self, shutdown: Option<&watch::Receiver<bool>>) -> CycleReport {
        let tick = self.clock.current();
        let refreshed = self
            .scheduler
            .maybe_refresh(tick, &self.state, self.source.as_mut());
        let snapshot = self.generator.step(tick, &self.state, self.source.as_mut());

        let mut report = CycleReport {
            tick,
            refreshed,
            ..CycleReport::default()
        };

        for (reading, handle) in snapshot.readings.iter().zip(&self.handles) {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                report.interrupted = true;
                break;
            }

            match self.adapter.write(handle, reading.value).await {
                Ok(()) => report.published += 1,
                Err(e) => {
                    warn!(tag = %reading.path, tick, error = %e, "Failed to publish tag value");
                    report.failed.push(reading.path.clone());
                }
            }
        }

        self.clock.advance();
        debug!(
            tick,
            refreshed,
            published = report.published,
            failed = report.failed.len(),
            "Cycle complete"
        );
        report
    }

    /// Run until `shutdown` turns `true` or its sender is dropped
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) -> RunSummary {
        self.run_until(None, shutdown).await
    }

    /// Run at most `max_cycles` cycles, stopping earlier on shutdown
    pub async fn run_until(
        &mut self,
        max_cycles: Option<u64>,
        mut shutdown: watch::Receiver<bool>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(pacing = ?self.pacing, max_cycles = ?max_cycles, "Starting generation loop");

        loop {
            if *shutdown.borrow() || max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            let report = self.cycle(Some(&shutdown)).await;
            summary.absorb(&report);
            if report.interrupted || max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            let delay = self.pacing.next_delay(self.source.as_mut());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            cycles = summary.cycles,
            published = summary.published,
            failed = summary.failed,
            "Generation loop stopped"
        );
        summary
    }
}
