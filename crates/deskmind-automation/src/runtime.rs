//! Runtime wiring.
//!
//! Composes the stores, scheduler, dispatcher and services into one
//! ready-to-run object. The embedding server constructs this once at
//! startup; tests construct it per case and drive ticks by hand.

use std::sync::Arc;

use deskmind_core::{DirectoryStore, TicketStore};
use deskmind_notify::{ChannelRegistry, NotificationDispatcher};
use deskmind_scheduler::{JobScheduler, SchedulerConfig};
use deskmind_workflow::SlaPolicy;

use crate::config::AutomationConfig;
use crate::breach::SlaBreachMonitor;
use crate::escalation::EscalationEngine;
use crate::handlers::register_handlers;
use crate::lifecycle::TicketLifecycle;
use crate::survey::{SurveyScheduler, SurveyStore};

/// The assembled automation core.
pub struct AutomationRuntime {
    pub tickets: Arc<dyn TicketStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub scheduler: Arc<JobScheduler>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub lifecycle: Arc<TicketLifecycle>,
    pub monitor: Arc<SlaBreachMonitor>,
    pub engine: Arc<EscalationEngine>,
    pub surveys: SurveyStore,
}

impl AutomationRuntime {
    /// Wire the core against the given collaborators and register the job
    /// handlers.
    pub async fn new(
        tickets: Arc<dyn TicketStore>,
        directory: Arc<dyn DirectoryStore>,
        channels: Arc<ChannelRegistry>,
        sla: SlaPolicy,
        scheduler_config: SchedulerConfig,
        config: AutomationConfig,
    ) -> Self {
        let scheduler = Arc::new(JobScheduler::new(scheduler_config));
        let dispatcher = Arc::new(NotificationDispatcher::new(directory.clone(), channels));
        let monitor = Arc::new(SlaBreachMonitor::new(tickets.clone(), scheduler.clone()));
        let engine = Arc::new(EscalationEngine::new(
            tickets.clone(),
            directory.clone(),
            scheduler.clone(),
        ));
        let surveys = SurveyStore::new();
        let survey_scheduler = Arc::new(SurveyScheduler::new(
            scheduler.clone(),
            config.csat_delay_minutes,
        ));
        let lifecycle = Arc::new(TicketLifecycle::new(
            tickets.clone(),
            scheduler.clone(),
            dispatcher.clone(),
            survey_scheduler,
            sla,
            config,
        ));

        register_handlers(
            &scheduler,
            monitor.clone(),
            engine.clone(),
            tickets.clone(),
            dispatcher.clone(),
            surveys.clone(),
        )
        .await;

        Self {
            tickets,
            directory,
            scheduler,
            dispatcher,
            lifecycle,
            monitor,
            engine,
            surveys,
        }
    }

    /// Start the background tick loop.
    pub async fn start(&self) -> deskmind_scheduler::Result<()> {
        self.scheduler.start().await
    }

    /// Stop the background tick loop.
    pub async fn stop(&self) -> deskmind_scheduler::Result<()> {
        self.scheduler.stop().await
    }

    /// Check if the background loop is running.
    pub async fn is_running(&self) -> bool {
        self.scheduler.is_running().await
    }
}
