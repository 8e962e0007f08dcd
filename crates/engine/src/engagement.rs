// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engagement façade.
//!
//! Owns the jobs of one operator session and drives each of them from
//! submission to DONE/FAILED:
//!
//! 1. `submit` creates the job, describes the host and asks the generator
//!    for commands (or `submit_commands` takes them literally)
//! 2. `tick` polls the backend, summarises newly finished commands and, once
//!    every command is terminal, either requests replacements for runtime
//!    failures or finalizes the job
//! 3. `wait` ticks until the job is terminal
//!
//! Backend starts and replacement requests run outside any engagement-wide
//! lock: command batches start on tracked background tasks, and a job being
//! submitted or retried is claimed so ticks leave it alone meanwhile.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::executor::CommandExecutor;
use crate::retry::{record_api_error, take_failures, RetryCoordinator};
use crate::tracker::{completion_message, StatusTracker};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use wsh_adapters::{
    CommandGenerator, ExecutionBackend, FailureClass, GenerateRequest, Launch, LogAnalyzer,
};
use wsh_core::{
    Clock, CommandKey, CommandResult, CommandSpec, CommandState, Job, JobEvent, JobId, SharedJob,
    SystemClock, TerminalOutcome,
};
use wsh_storage::{JobStore, LogDirFactory};

/// Collaborators an [`Engagement`] is built from
pub struct EngagementDeps<B, G, A> {
    pub backend: Arc<B>,
    pub generator: Arc<G>,
    pub analyzer: Arc<A>,
    pub store: Arc<dyn JobStore>,
    pub log_dirs: Arc<dyn LogDirFactory>,
}

#[derive(Clone, Default)]
struct EventSink(Option<mpsc::Sender<JobEvent>>);

impl EventSink {
    async fn emit(&self, event: JobEvent) {
        let Some(ref tx) = self.0 else {
            return;
        };
        tracing::debug!(event = event.name(), job_id = %event.job_id(), "emit");
        if tx.send(event).await.is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

/// Jobs currently being submitted, advanced or retried
#[derive(Clone, Default)]
struct Claims(Arc<Mutex<HashSet<JobId>>>);

impl Claims {
    fn try_claim(&self, job_id: &JobId) -> Option<Claim> {
        if !self.0.lock().insert(job_id.clone()) {
            return None;
        }
        Some(Claim { claims: self.clone(), job_id: job_id.clone() })
    }
}

/// Exclusive right to advance one job, released on drop
struct Claim {
    claims: Claims,
    job_id: JobId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.claims.0.lock().remove(&self.job_id);
    }
}

/// Starts command batches on background tasks the engagement owns
struct Launcher<B, C: Clock> {
    executor: CommandExecutor<B, C>,
    events: EventSink,
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl<B, C: Clock> Clone for Launcher<B, C> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            events: self.events.clone(),
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl<B: ExecutionBackend, C: Clock> Launcher<B, C> {
    fn prepare(&self, job: &SharedJob, specs: Vec<CommandSpec>, is_retry: bool) -> Vec<Launch> {
        self.executor.prepare_batch(job, specs, is_retry)
    }

    /// Announce and start prepared launches. Returns once every command is
    /// recorded and tracked; a remote start keeps awaiting its response on
    /// the background task.
    async fn start(&self, job: &SharedJob, launches: Vec<Launch>) {
        let job_id = job.lock().id.clone();
        let mut started = Vec::with_capacity(launches.len());
        let mut registered = Vec::with_capacity(launches.len());
        let launches: Vec<Launch> = launches
            .into_iter()
            .map(|launch| {
                started.push(JobEvent::CommandStarted {
                    job_id: job_id.clone(),
                    seq: launch.seq,
                    command: launch.spec.command.clone(),
                    is_retry: launch.is_retry,
                });
                let (tx, rx) = oneshot::channel();
                registered.push(rx);
                launch.notify_registered(tx)
            })
            .collect();
        for event in started {
            self.events.emit(event).await;
        }

        let executor = self.executor.clone();
        let shared = Arc::clone(job);
        self.spawn(async move { executor.launch_batch(&shared, launches).await });
        for rx in registered {
            // A dropped sender means the launch ended before signalling,
            // which settles it just the same
            let _ = rx.await;
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.lock().spawn(task);
    }

    /// Collect finished background tasks
    fn reap(&self) {
        let mut tasks = self.tasks.lock();
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "background launch task failed");
            }
        }
    }
}

pub struct Engagement<B, G, A, C: Clock = SystemClock> {
    executor: CommandExecutor<B, C>,
    tracker: StatusTracker<B, C>,
    retry: RetryCoordinator<B, G, C>,
    launcher: Launcher<B, C>,
    generator: Arc<G>,
    analyzer: Arc<A>,
    log_dirs: Arc<dyn LogDirFactory>,
    clock: C,
    config: EngineConfig,
    events: EventSink,
    jobs: Mutex<BTreeMap<JobId, SharedJob>>,
    /// A claimed job is never advanced by a second caller
    claims: Claims,
}

impl<B, G, A, C> Engagement<B, G, A, C>
where
    B: ExecutionBackend,
    G: CommandGenerator,
    A: LogAnalyzer,
    C: Clock,
{
    pub fn new(deps: EngagementDeps<B, G, A>, config: EngineConfig, clock: C) -> Self {
        let executor = CommandExecutor::new(deps.backend, clock.clone());
        Self {
            tracker: StatusTracker::new(executor.clone(), deps.store, clock.clone()),
            retry: RetryCoordinator::new(executor.clone(), Arc::clone(&deps.generator), clock.clone()),
            launcher: Launcher {
                executor: executor.clone(),
                events: EventSink::default(),
                tasks: Arc::new(Mutex::new(JoinSet::new())),
            },
            executor,
            generator: deps.generator,
            analyzer: deps.analyzer,
            log_dirs: deps.log_dirs,
            clock,
            config,
            events: EventSink::default(),
            jobs: Mutex::new(BTreeMap::new()),
            claims: Claims::default(),
        }
    }

    /// Stream [`JobEvent`]s to `tx`
    pub fn with_events(mut self, tx: mpsc::Sender<JobEvent>) -> Self {
        self.events = EventSink(Some(tx));
        self.launcher.events = self.events.clone();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn executor(&self) -> &CommandExecutor<B, C> {
        &self.executor
    }

    /// Create a job for `goal` and start the commands the generator proposes
    pub async fn submit(
        &self,
        goal: &str,
        context: BTreeMap<String, String>,
    ) -> Result<JobId, EngineError> {
        let (job, claim) = self.create_job(goal, context).await?;
        let host = self.executor.describe_host(false).await;
        if host.is_degraded() {
            tracing::warn!(host = %host, "continuing with degraded host description");
        }
        let request = {
            let mut job = job.lock();
            job.context.extend(host.to_context());
            GenerateRequest { context: job.context.clone(), ..GenerateRequest::new(goal) }
        };

        match self.generator.generate(&request).await {
            Ok(specs) if specs.is_empty() => {
                self.record_synthetic(
                    &job,
                    CommandState::Others,
                    "No commands were generated for this goal.",
                );
            }
            Ok(specs) => {
                let launches = self.launcher.prepare(&job, specs, false);
                self.launcher.start(&job, launches).await;
            }
            Err(e) => {
                tracing::warn!(goal, error = %e, "command generation failed");
                record_api_error(&job, &e.to_string(), self.clock.epoch_ms());
            }
        }
        drop(claim);
        self.advance_logged(&job).await;
        Ok(self.job_id(&job))
    }

    /// Create a job that runs `specs` as given, without generation
    pub async fn submit_commands(
        &self,
        goal: &str,
        specs: Vec<CommandSpec>,
    ) -> Result<JobId, EngineError> {
        let (job, claim) = self.create_job(goal, BTreeMap::new()).await?;
        if specs.is_empty() {
            self.record_synthetic(&job, CommandState::Others, "No commands were given.");
        } else {
            let launches = self.launcher.prepare(&job, specs, false);
            self.launcher.start(&job, launches).await;
        }
        drop(claim);
        self.advance_logged(&job).await;
        Ok(self.job_id(&job))
    }

    /// Poll once and advance every active job. A job that fails to advance
    /// is logged and retried on the next tick; the others still advance.
    pub async fn tick(&self) -> Result<(), EngineError> {
        self.launcher.reap();
        self.executor.check_running().await;
        let active: Vec<SharedJob> =
            self.jobs.lock().values().filter(|job| !job.lock().is_terminal()).cloned().collect();
        for job in active {
            self.advance_logged(&job).await;
        }
        Ok(())
    }

    /// Tick until the job is DONE or FAILED and return its final snapshot
    pub async fn wait(&self, job_id: &JobId) -> Result<Job, EngineError> {
        let job = self.shared(job_id)?;
        loop {
            self.tick().await?;
            {
                let job = job.lock();
                if job.is_terminal() {
                    return Ok(job.clone());
                }
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// Cancel one command of a job
    pub async fn cancel(&self, job_id: &JobId, seq: u32) -> String {
        self.executor.cancel(&CommandKey::new(job_id.clone(), seq)).await
    }

    /// Cancel every running command of a job
    pub async fn cancel_job(&self, job_id: &JobId) -> Vec<String> {
        let Ok(job) = self.shared(job_id) else {
            return Vec::new();
        };
        let running = job.lock().running_seqs();
        let mut messages = Vec::with_capacity(running.len());
        for seq in running {
            messages.push(self.cancel(job_id, seq).await);
        }
        messages
    }

    /// Cancel every in-flight command on the backend, whichever job owns it
    pub async fn cancel_all(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for key in self.executor.in_flight() {
            messages.push(self.executor.cancel(&key).await);
        }
        messages
    }

    /// Snapshot of one job
    pub fn status(&self, job_id: &JobId) -> Option<Job> {
        self.jobs.lock().get(job_id).map(|job| job.lock().clone())
    }

    /// Snapshots of every job, oldest first
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.lock().values().map(|job| job.lock().clone()).collect();
        jobs.sort_by_key(|job| job.created_at_ms);
        jobs
    }

    /// Create and register a job, claimed by the caller until its first
    /// commands are recorded
    async fn create_job(
        &self,
        goal: &str,
        context: BTreeMap<String, String>,
    ) -> Result<(SharedJob, Claim), EngineError> {
        let id = JobId::new();
        let log_dir = self
            .log_dirs
            .create_dir(&id)
            .map_err(|source| EngineError::LogDir { job_id: id.clone(), source })?;
        let mut job = Job::with_id(id.clone(), goal, log_dir, self.clock.epoch_ms());
        job.context = context;
        let job = job.into_shared();
        let claim =
            self.claims.try_claim(&id).ok_or_else(|| EngineError::UnknownJob(id.to_string()))?;
        self.jobs.lock().insert(id.clone(), Arc::clone(&job));
        tracing::info!(job_id = %id, goal, "job created");
        self.events.emit(JobEvent::JobCreated { job_id: id, goal: goal.to_string() }).await;
        Ok((job, claim))
    }

    /// Record a terminal result for a job that has nothing to run
    fn record_synthetic(&self, job: &SharedJob, state: CommandState, summary: &str) {
        let mut job = job.lock();
        let seq = job.reserve_seq();
        let result = CommandResult::terminal_at_creation(
            seq,
            &CommandSpec::new(job.goal.clone(), 0),
            TerminalOutcome::new(state, -1).with_summary(summary),
            self.clock.epoch_ms(),
        );
        if let Err(e) = job.insert_result(result) {
            tracing::warn!(error = %e, "failed to record synthetic result");
        }
    }

    async fn advance_logged(&self, job: &SharedJob) {
        if let Err(e) = self.advance(job).await {
            tracing::error!(job_id = %self.job_id(job), error = %e, "failed to advance job");
        }
    }

    async fn advance(&self, job: &SharedJob) -> Result<(), EngineError> {
        let Some(claim) = self.claims.try_claim(&self.job_id(job)) else {
            return Ok(());
        };
        self.report_finished(job).await;

        let (all_done, any_failed, retry_count) = {
            let job = job.lock();
            let (all_done, any_failed) = job.is_all_completed();
            (all_done, any_failed, job.retry_count)
        };
        if !all_done {
            return Ok(());
        }

        if any_failed && retry_count < self.config.max_retries {
            if let Some(request) = take_failures(job) {
                self.spawn_retry(job, request, claim);
                return Ok(());
            }
        }

        self.finalize(job).await
    }

    /// Request and start replacements in the background. The job stays
    /// claimed until its replacement commands are recorded.
    fn spawn_retry(&self, job: &SharedJob, request: GenerateRequest, claim: Claim) {
        let retry = self.retry.clone();
        let launcher = self.launcher.clone();
        let job = Arc::clone(job);
        self.launcher.spawn(async move {
            let job_id = claim.job_id.clone();
            let classification = request.classification.unwrap_or(FailureClass::Other);
            match retry.replacements(&job, &request).await {
                Ok(specs) if specs.is_empty() => {}
                Ok(specs) => {
                    let launches = launcher.prepare(&job, specs, true);
                    let seqs = launches.iter().map(|launch| launch.seq).collect();
                    launcher
                        .events
                        .emit(JobEvent::RetrySubmitted {
                            job_id,
                            classification: classification.to_string(),
                            seqs,
                        })
                        .await;
                    launcher.start(&job, launches).await;
                }
                Err(error) => {
                    launcher.events.emit(JobEvent::RetryFailed { job_id, error }).await;
                }
            }
            drop(claim);
        });
    }

    /// Summarise terminal results not yet analyzed and announce them
    async fn report_finished(&self, job: &SharedJob) {
        let pending: Vec<CommandResult> =
            job.lock().results.values().filter(|r| r.is_terminal() && !r.analyzed).cloned().collect();

        for result in pending {
            let summary = self.summarize(&result).await;
            let recorded = {
                let mut job = job.lock();
                let recorded = job.result_mut(result.seq).map(|r| r.record_analysis(summary.clone()));
                recorded.unwrap_or(false)
            };
            if !recorded {
                continue;
            }
            self.events.emit(JobEvent::CommandFinished {
                job_id: self.job_id(job),
                seq: result.seq,
                state: result.state,
                exit_code: result.exit_code,
                summary: Some(summary),
            })
            .await;
        }
    }

    async fn summarize(&self, result: &CommandResult) -> String {
        let fallback = || result.log_summary.clone().unwrap_or_else(|| result.state.to_string());
        if result.start_failed {
            return fallback();
        }
        match self.analyzer.analyze(result).await {
            Ok(analysis) => {
                if analysis.state != result.state {
                    tracing::debug!(
                        seq = result.seq,
                        recorded = %result.state,
                        suggested = %analysis.state,
                        "analyzer disagrees with recorded state"
                    );
                }
                analysis.summary
            }
            Err(e) => {
                tracing::warn!(seq = result.seq, error = %e, "log analysis failed");
                fallback()
            }
        }
    }

    /// Finalize if every command is terminal, announcing the result once
    async fn finalize(&self, job: &SharedJob) -> Result<(), EngineError> {
        self.report_finished(job).await;
        if !self.tracker.update_job_state(job)? {
            return Ok(());
        }
        let (job_id, state, message) = {
            let job = job.lock();
            (job.id.clone(), job.state, completion_message(&job))
        };
        self.events.emit(JobEvent::JobFinished { job_id, state, message }).await;
        Ok(())
    }

    fn shared(&self, job_id: &JobId) -> Result<SharedJob, EngineError> {
        self.jobs
            .lock()
            .get(job_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownJob(job_id.to_string()))
    }

    fn job_id(&self, job: &SharedJob) -> JobId {
        job.lock().id.clone()
    }
}

#[cfg(test)]
#[path = "engagement_tests.rs"]
mod tests;
