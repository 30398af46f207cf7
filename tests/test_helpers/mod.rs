//! Shared wiring for scheduler integration tests.

use chrono::{DateTime, Local, Utc};
use metronome::config::SchedulerSettings;
use metronome::cycle::services::PollCycleOrchestrator;
use metronome::dispatch::adapters::{
    BatchingEventDispatcher, EventEnvelope,
    memory::{InMemoryMessageBroker, StaticTokenProvider},
};
use metronome::feature::{
    adapters::memory::{InMemoryCacheStore, StaticFeatureFlags},
    services::FeatureGate,
};
use metronome::history::{domain::HISTORY_EVENT_KEY, services::HistoryRecorder};
use metronome::schedule::{
    adapters::memory::InMemoryScheduleRepository,
    domain::{
        CronDefinition, PersistedScheduleData, RuntimeQueue, Schedule, ScheduleId, ScheduleName,
        ScheduleType, UnixTimestamp,
    },
    ports::ScheduleRepository,
    services::{CronScheduleEvaluator, ScheduleService, ScheduleTriggerEngine},
};
use metronome::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::TaskId,
    services::{TaskDispatchCoordinator, TaskRequest, TaskService},
};
use mockable::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing_subscriber::EnvFilter;

/// 2026-01-01T12:00:30Z
pub const START: i64 = 1_767_268_830;
/// 2026-01-01T13:00:00Z, the first top of the hour after [`START`].
pub const NEXT_HOUR: i64 = 1_767_272_400;
pub const HOUR: i64 = 3_600;
pub const TASK_CLIENT: &str = "client-a";

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct SteppedClock {
    secs: AtomicI64,
}

impl SteppedClock {
    pub const fn at_secs(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn now(&self) -> UnixTimestamp {
        UnixTimestamp::from_secs(self.secs.load(Ordering::SeqCst))
    }
}

impl Clock for SteppedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now().to_datetime()
    }
}

pub type Orchestrator = PollCycleOrchestrator<
    InMemoryScheduleRepository,
    InMemoryTaskRepository,
    StaticTokenProvider,
    BatchingEventDispatcher<InMemoryMessageBroker>,
    StaticFeatureFlags,
    InMemoryCacheStore<SteppedClock>,
    SteppedClock,
>;

/// A complete in-memory scheduler.
pub struct SchedulerFixture {
    pub settings: SchedulerSettings,
    pub clock: Arc<SteppedClock>,
    pub schedules: Arc<InMemoryScheduleRepository>,
    pub broker: Arc<InMemoryMessageBroker>,
    pub flags: Arc<StaticFeatureFlags>,
    pub schedule_service: ScheduleService<InMemoryScheduleRepository, SteppedClock>,
    pub task_service: TaskService<InMemoryTaskRepository, SteppedClock>,
    pub orchestrator: Orchestrator,
}

/// Routes scheduler logs to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
    {
        tracing::trace!(%err, "tracing subscriber already installed");
    }
}

impl SchedulerFixture {
    pub fn new() -> Self {
        init_tracing();
        let settings = SchedulerSettings {
            timezone: chrono_tz::UTC,
            ..SchedulerSettings::default()
        };
        let clock = Arc::new(SteppedClock::at_secs(START));
        let schedules = Arc::new(InMemoryScheduleRepository::new());
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let broker = Arc::new(InMemoryMessageBroker::new());
        let tokens = Arc::new(
            StaticTokenProvider::new()
                .with_token(TASK_CLIENT, "task-token")
                .with_token(settings.history_identity_client_id.clone(), "history-token"),
        );
        let flags = Arc::new(
            StaticFeatureFlags::new()
                .with_flag(settings.flags.scheduler.as_str(), true)
                .with_flag(settings.flags.history.as_str(), true),
        );
        let evaluator = Arc::new(CronScheduleEvaluator::new());
        let dispatcher = Arc::new(BatchingEventDispatcher::from_settings(
            Arc::clone(&broker),
            &settings,
        ));

        let orchestrator = PollCycleOrchestrator::new(
            Arc::clone(&schedules),
            ScheduleTriggerEngine::new(
                Arc::clone(&schedules),
                Arc::clone(&evaluator),
                Arc::clone(&clock),
                &settings,
            ),
            TaskDispatchCoordinator::new(
                Arc::clone(&tasks),
                Arc::clone(&tokens),
                Arc::clone(&dispatcher),
                Arc::clone(&clock),
            ),
            HistoryRecorder::new(tokens, dispatcher, Arc::clone(&clock), &settings),
            FeatureGate::new(
                Arc::clone(&flags),
                Arc::new(InMemoryCacheStore::new(Arc::clone(&clock))),
                &settings,
            ),
            &settings,
        );

        Self {
            schedule_service: ScheduleService::new(
                Arc::clone(&schedules),
                evaluator,
                Arc::clone(&clock),
            ),
            task_service: TaskService::new(tasks, Arc::clone(&clock)),
            settings,
            clock,
            schedules,
            broker,
            flags,
            orchestrator,
        }
    }

    /// Registers a task that posts to a per-name endpoint.
    pub async fn add_task(&self, name: &str) -> eyre::Result<TaskId> {
        let task = self
            .task_service
            .create(
                TaskRequest::new(name)
                    .with_request("POST", format!("https://jobs.example.test/{name}"))
                    .with_identity_client(TASK_CLIENT),
            )
            .await?;
        Ok(task.id())
    }

    /// Stores a schedule without CRON validation, as a legacy row would be.
    pub async fn insert_unchecked(
        &self,
        name: &str,
        cron: &str,
        next_runtime: Option<i64>,
        links: Vec<TaskId>,
    ) -> eyre::Result<Schedule> {
        let next = next_runtime.map(UnixTimestamp::from_secs);
        let queue: RuntimeQueue = next.into_iter().collect::<Vec<_>>().into();
        let schedule = Schedule::from_persisted(PersistedScheduleData {
            id: ScheduleId::new(),
            name: ScheduleName::new(name)?,
            schedule_type: ScheduleType::User,
            cron: CronDefinition::new(cron, false)?,
            last_runtime: None,
            next_runtime: next,
            queue,
            links,
            is_active: None,
            version: 0,
            created_at: self.clock.utc(),
            modified_at: None,
        });
        Ok(self.schedules.insert(&schedule).await?)
    }

    pub async fn schedule_named(&self, name: &str) -> eyre::Result<Schedule> {
        self.schedule_service
            .find_by_name(name, ScheduleType::User)
            .await?
            .ok_or_else(|| eyre::eyre!("schedule {name} is not stored"))
    }

    pub fn task_envelopes(&self) -> eyre::Result<Vec<EventEnvelope>> {
        Ok(self
            .broker
            .sent_envelopes()?
            .into_iter()
            .filter(|envelope| envelope.event.event_key != HISTORY_EVENT_KEY)
            .collect())
    }

    pub fn history_envelopes(&self) -> eyre::Result<Vec<EventEnvelope>> {
        Ok(self
            .broker
            .sent_envelopes()?
            .into_iter()
            .filter(|envelope| envelope.event.event_key == HISTORY_EVENT_KEY)
            .collect())
    }
}

impl Default for SchedulerFixture {
    fn default() -> Self {
        Self::new()
    }
}
