//! Job handlers.
//!
//! One handler per job kind, each mapping the automation error taxonomy
//! onto the scheduler's outcome vocabulary: transient failures retry with
//! backoff, terminal ones dead-letter, and deliberate declines complete.

use std::sync::Arc;

use async_trait::async_trait;
use deskmind_core::{TicketEvent, TicketEventType, TicketStatus, TicketStore};
use deskmind_notify::{Notification, NotificationDispatcher};
use deskmind_scheduler::{Job, JobHandler, JobKind, JobOutcome, JobPayload, JobScheduler};

use crate::breach::SlaBreachMonitor;
use crate::error::AutomationError;
use crate::escalation::EscalationEngine;
use crate::survey::SurveyStore;

fn outcome_for_error(err: &AutomationError) -> JobOutcome {
    if err.is_transient() {
        JobOutcome::Retry {
            reason: err.to_string(),
        }
    } else {
        JobOutcome::Dead {
            reason: err.to_string(),
        }
    }
}

/// Handler for `CheckSlaBreach` jobs.
pub struct BreachCheckHandler {
    monitor: Arc<SlaBreachMonitor>,
}

impl BreachCheckHandler {
    pub fn new(monitor: Arc<SlaBreachMonitor>) -> Self {
        Self { monitor }
    }
}

#[async_trait]
impl JobHandler for BreachCheckHandler {
    async fn execute(&self, job: &Job) -> JobOutcome {
        let JobPayload::CheckSlaBreach { ticket_id } = &job.payload else {
            return JobOutcome::Dead {
                reason: format!("payload mismatch for job {}", job.id),
            };
        };
        match self.monitor.check(*ticket_id).await {
            Ok(_) => JobOutcome::Completed,
            Err(e) => outcome_for_error(&e),
        }
    }
}

/// Handler for `AutoEscalate` jobs.
pub struct EscalateHandler {
    engine: Arc<EscalationEngine>,
}

impl EscalateHandler {
    pub fn new(engine: Arc<EscalationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl JobHandler for EscalateHandler {
    async fn execute(&self, job: &Job) -> JobOutcome {
        let JobPayload::AutoEscalate { ticket_id, reason } = &job.payload else {
            return JobOutcome::Dead {
                reason: format!("payload mismatch for job {}", job.id),
            };
        };
        match self.engine.auto_escalate(*ticket_id, *reason).await {
            Ok(_) => JobOutcome::Completed,
            Err(e @ AutomationError::MissingEscalationTarget { .. }) => {
                // Configuration gap: surface loudly and keep the job
                // inspectable in the dead letter list.
                tracing::error!(
                    ticket_id = %ticket_id,
                    error = %e,
                    "Escalation impossible; fix the team escalation chain"
                );
                JobOutcome::Dead {
                    reason: e.to_string(),
                }
            }
            Err(e) => outcome_for_error(&e),
        }
    }
}

/// Handler for `SendNotification` jobs.
pub struct NotifyHandler {
    tickets: Arc<dyn TicketStore>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl NotifyHandler {
    pub fn new(tickets: Arc<dyn TicketStore>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            tickets,
            dispatcher,
        }
    }
}

#[async_trait]
impl JobHandler for NotifyHandler {
    async fn execute(&self, job: &Job) -> JobOutcome {
        let JobPayload::SendNotification {
            kind,
            ticket_id,
            message,
            user_ids,
        } = &job.payload
        else {
            return JobOutcome::Dead {
                reason: format!("payload mismatch for job {}", job.id),
            };
        };

        let ticket = match self.tickets.get(*ticket_id).await {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                return JobOutcome::Dead {
                    reason: format!("ticket {ticket_id} no longer exists"),
                }
            }
            Err(e) => return outcome_for_error(&AutomationError::Store(e)),
        };

        let notification = Notification::new(
            *kind,
            ticket.id,
            ticket.code.clone(),
            format!("[{}] {kind}", ticket.code),
            message.clone(),
        );

        // Per-recipient send failures are absorbed (and logged) inside the
        // dispatcher; only recipient resolution itself can fail here.
        match self
            .dispatcher
            .dispatch(&ticket, &notification, user_ids.as_deref())
            .await
        {
            Ok(_) => JobOutcome::Completed,
            Err(e) => outcome_for_error(&AutomationError::Notify(e)),
        }
    }
}

/// Handler for `SendCsatSurvey` jobs.
pub struct SurveyHandler {
    tickets: Arc<dyn TicketStore>,
    dispatcher: Arc<NotificationDispatcher>,
    surveys: SurveyStore,
}

impl SurveyHandler {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        dispatcher: Arc<NotificationDispatcher>,
        surveys: SurveyStore,
    ) -> Self {
        Self {
            tickets,
            dispatcher,
            surveys,
        }
    }
}

#[async_trait]
impl JobHandler for SurveyHandler {
    async fn execute(&self, job: &Job) -> JobOutcome {
        let JobPayload::SendCsatSurvey { ticket_id } = &job.payload else {
            return JobOutcome::Dead {
                reason: format!("payload mismatch for job {}", job.id),
            };
        };

        let ticket = match self.tickets.get(*ticket_id).await {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                return JobOutcome::Dead {
                    reason: format!("ticket {ticket_id} no longer exists"),
                }
            }
            Err(e) => return outcome_for_error(&AutomationError::Store(e)),
        };

        // A ticket reopened inside the delay window must not receive a
        // stale survey.
        if ticket.status != TicketStatus::Resolved {
            tracing::info!(
                ticket_id = %ticket_id,
                status = %ticket.status,
                "Declining CSAT survey for ticket no longer resolved"
            );
            return JobOutcome::Completed;
        }

        let recipients = match self
            .dispatcher
            .resolve_recipients(&ticket, deskmind_core::NotificationKind::CsatSurvey, None)
            .await
        {
            Ok(recipients) => recipients,
            Err(e) => return outcome_for_error(&AutomationError::Notify(e)),
        };
        if recipients.is_empty() {
            return JobOutcome::Dead {
                reason: format!(
                    "requester {} missing or inactive for ticket {ticket_id}",
                    ticket.requester_id
                ),
            };
        }

        let survey = self.surveys.create(ticket.id, ticket.requester_id).await;
        if let Err(e) = self
            .tickets
            .append_event(TicketEvent::new(
                ticket.id,
                None,
                TicketEventType::SurveySent,
                format!("CSAT survey {} dispatched", survey.token),
            ))
            .await
        {
            return outcome_for_error(&AutomationError::Store(e));
        }

        let notification = Notification::new(
            deskmind_core::NotificationKind::CsatSurvey,
            ticket.id,
            ticket.code.clone(),
            format!("How did we do on {}?", ticket.code),
            format!(
                "Your ticket {} was resolved. Rate us 1-5 using survey token {}.",
                ticket.code, survey.token
            ),
        );
        match self.dispatcher.dispatch(&ticket, &notification, None).await {
            Ok(_) => JobOutcome::Completed,
            Err(e) => outcome_for_error(&AutomationError::Notify(e)),
        }
    }
}

/// Register all four handlers on a scheduler.
pub async fn register_handlers(
    scheduler: &JobScheduler,
    monitor: Arc<SlaBreachMonitor>,
    engine: Arc<EscalationEngine>,
    tickets: Arc<dyn TicketStore>,
    dispatcher: Arc<NotificationDispatcher>,
    surveys: SurveyStore,
) {
    scheduler
        .register_handler(
            JobKind::CheckSlaBreach,
            Arc::new(BreachCheckHandler::new(monitor)),
        )
        .await;
    scheduler
        .register_handler(JobKind::AutoEscalate, Arc::new(EscalateHandler::new(engine)))
        .await;
    scheduler
        .register_handler(
            JobKind::SendNotification,
            Arc::new(NotifyHandler::new(tickets.clone(), dispatcher.clone())),
        )
        .await;
    scheduler
        .register_handler(
            JobKind::SendCsatSurvey,
            Arc::new(SurveyHandler::new(tickets, dispatcher, surveys)),
        )
        .await;
}
