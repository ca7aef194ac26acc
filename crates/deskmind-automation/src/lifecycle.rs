//! The ticket lifecycle service.
//!
//! Entry point for ticket mutations: creation, status transitions,
//! assignment, priority changes and first-response stamping. Each
//! operation validates against the state machine where applicable,
//! persists the ticket, appends exactly one audit event, and wires up the
//! deferred jobs the new state requires.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use deskmind_core::{
    ApprovalStatus, NotificationKind, OrgId, Ticket, TicketEvent, TicketEventType, TicketId,
    TicketPriority, TicketStatus, TicketStore, UserId,
};
use deskmind_notify::{Notification, NotificationDispatcher};
use deskmind_scheduler::JobScheduler;
use deskmind_workflow::{validate_transition, SlaPolicy, TransitionAction, TransitionContext};
use tokio::sync::Mutex;

use crate::breach::schedule_breach_checks;
use crate::config::{AutomationConfig, DueDatePolicy};
use crate::error::{AutomationError, Result};
use crate::survey::SurveyScheduler;

/// Inputs for creating a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub org_id: OrgId,
    pub code: String,
    pub subject: String,
    pub description: Option<String>,
    pub priority: TicketPriority,
    pub requester_id: UserId,
    pub team_id: Option<deskmind_core::TeamId>,
    pub assignee_id: Option<UserId>,
    pub requires_approval: bool,
}

impl NewTicket {
    pub fn new(
        org_id: OrgId,
        code: impl Into<String>,
        subject: impl Into<String>,
        requester_id: UserId,
    ) -> Self {
        Self {
            org_id,
            code: code.into(),
            subject: subject.into(),
            description: None,
            priority: TicketPriority::default(),
            requester_id,
            team_id: None,
            assignee_id: None,
            requires_approval: false,
        }
    }

    pub fn priority(mut self, priority: TicketPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn team(mut self, team_id: deskmind_core::TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    pub fn requires_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

/// Drives ticket mutations and their automation side-effects.
pub struct TicketLifecycle {
    tickets: Arc<dyn TicketStore>,
    scheduler: Arc<JobScheduler>,
    dispatcher: Arc<NotificationDispatcher>,
    surveys: Arc<SurveyScheduler>,
    sla: SlaPolicy,
    config: AutomationConfig,
    /// Per-ticket locks: transition validation and the field mutation must
    /// happen atomically per ticket, or two concurrent transitions could
    /// both validate against a stale status.
    locks: Mutex<HashMap<TicketId, Arc<Mutex<()>>>>,
}

impl TicketLifecycle {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        scheduler: Arc<JobScheduler>,
        dispatcher: Arc<NotificationDispatcher>,
        surveys: Arc<SurveyScheduler>,
        sla: SlaPolicy,
        config: AutomationConfig,
    ) -> Self {
        Self {
            tickets,
            scheduler,
            dispatcher,
            surveys,
            sla,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn ticket_lock(&self, id: TicketId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, id: TicketId) -> Result<Ticket> {
        self.tickets
            .get(id)
            .await?
            .ok_or(AutomationError::TicketNotFound(id))
    }

    /// Fetch a ticket.
    pub async fn ticket(&self, id: TicketId) -> Result<Ticket> {
        self.load(id).await
    }

    /// Fetch the audit log of a ticket.
    pub async fn events(&self, id: TicketId) -> Result<Vec<TicketEvent>> {
        Ok(self.tickets.events_for(id).await?)
    }

    /// Create a ticket, compute its SLA deadlines, and schedule the breach
    /// checks.
    pub async fn create_ticket(&self, new: NewTicket) -> Result<Ticket> {
        let mut ticket = Ticket::new(new.org_id, new.code, new.subject, new.requester_id)
            .with_priority(new.priority);
        ticket.description = new.description;
        ticket.team_id = new.team_id;
        ticket.assignee_id = new.assignee_id;
        if new.requires_approval {
            ticket.requires_approval = true;
            ticket.approval_status = Some(ApprovalStatus::Pending);
        }

        ticket.due_at = Some(self.sla.resolution_due(ticket.priority, ticket.created_at)?);
        ticket.first_response_due =
            Some(self.sla.first_response_due(ticket.priority, ticket.created_at)?);

        self.tickets.insert(ticket.clone()).await?;
        self.tickets
            .append_event(TicketEvent::new(
                ticket.id,
                Some(ticket.requester_id),
                TicketEventType::Created,
                format!("Ticket {} created", ticket.code),
            ))
            .await?;

        schedule_breach_checks(&self.scheduler, &ticket, self.config.breach_lead_minutes).await;

        self.notify(
            &ticket,
            NotificationKind::TicketCreated,
            format!("New ticket {}", ticket.code),
            format!("Ticket {} was created: {}", ticket.code, ticket.subject),
        )
        .await;

        tracing::info!(
            ticket_id = %ticket.id,
            code = %ticket.code,
            priority = %ticket.priority,
            due_at = ?ticket.due_at,
            "Ticket created"
        );
        Ok(ticket)
    }

    /// Apply a status transition.
    ///
    /// Validation and mutation run under the per-ticket lock. An accepted
    /// transition persists the new status together with its declarative
    /// side-effects and appends exactly one audit event; a rejected one
    /// changes nothing and surfaces the valid destinations to the caller.
    pub async fn transition(
        &self,
        ticket_id: TicketId,
        to: TicketStatus,
        actor: Option<UserId>,
    ) -> Result<Ticket> {
        let lock = self.ticket_lock(ticket_id).await;
        let _guard = lock.lock().await;

        let mut ticket = self.load(ticket_id).await?;
        let from = ticket.status;
        let ctx = TransitionContext::from(&ticket);
        let transition = validate_transition(from, to, &ctx)?;

        let now = Utc::now();
        for action in transition.actions {
            match action {
                TransitionAction::SetResolvedAt => ticket.resolved_at = Some(now),
                TransitionAction::SetClosedAt => ticket.closed_at = Some(now),
                TransitionAction::ClearResolvedAt => ticket.resolved_at = None,
            }
        }
        ticket.status = to;
        ticket.updated_at = now;

        self.tickets.update(&ticket).await?;
        self.tickets
            .append_event(
                TicketEvent::new(
                    ticket_id,
                    actor,
                    TicketEventType::StatusChanged,
                    format!("Status changed from {from} to {to}"),
                )
                .with_change(from.as_str(), to.as_str()),
            )
            .await?;

        if to == TicketStatus::Resolved {
            self.surveys.schedule(&ticket).await;
        }

        tracing::info!(
            ticket_id = %ticket_id,
            from = %from,
            to = %to,
            "Ticket transitioned"
        );
        Ok(ticket)
    }

    /// Assign the ticket to an agent.
    pub async fn assign(
        &self,
        ticket_id: TicketId,
        assignee_id: UserId,
        actor: Option<UserId>,
    ) -> Result<Ticket> {
        let lock = self.ticket_lock(ticket_id).await;
        let _guard = lock.lock().await;

        let mut ticket = self.load(ticket_id).await?;
        let old = ticket
            .assignee_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unassigned".to_string());
        ticket.assignee_id = Some(assignee_id);
        ticket.updated_at = Utc::now();

        self.tickets.update(&ticket).await?;
        self.tickets
            .append_event(
                TicketEvent::new(
                    ticket_id,
                    actor,
                    TicketEventType::Assigned,
                    format!("Ticket assigned to {assignee_id}"),
                )
                .with_change(old, assignee_id.to_string()),
            )
            .await?;

        self.notify(
            &ticket,
            NotificationKind::TicketAssigned,
            format!("Ticket {} assigned to you", ticket.code),
            format!("You are now responsible for ticket {}.", ticket.code),
        )
        .await;

        Ok(ticket)
    }

    /// Change the ticket's priority.
    ///
    /// Under `DueDatePolicy::Recompute` the deadline is recomputed from
    /// `created_at` with the new priority and fresh breach checks are
    /// scheduled; under `Freeze` the original deadline stands. Stale
    /// breach-check jobs re-read the live deadline at execution time, so
    /// they cannot fire against the old one.
    pub async fn change_priority(
        &self,
        ticket_id: TicketId,
        priority: TicketPriority,
        actor: Option<UserId>,
    ) -> Result<Ticket> {
        let lock = self.ticket_lock(ticket_id).await;
        let _guard = lock.lock().await;

        let mut ticket = self.load(ticket_id).await?;
        if ticket.priority == priority {
            return Ok(ticket);
        }
        let old = ticket.priority;
        ticket.priority = priority;

        let recompute =
            self.config.due_date_policy == DueDatePolicy::Recompute && ticket.sla_active();
        if recompute {
            ticket.due_at = Some(self.sla.resolution_due(priority, ticket.created_at)?);
            ticket.first_response_due =
                Some(self.sla.first_response_due(priority, ticket.created_at)?);
        }
        ticket.updated_at = Utc::now();

        self.tickets.update(&ticket).await?;
        self.tickets
            .append_event(
                TicketEvent::new(
                    ticket_id,
                    actor,
                    TicketEventType::PriorityChanged,
                    format!("Priority changed from {old} to {priority}"),
                )
                .with_change(old.as_str(), priority.as_str()),
            )
            .await?;

        if recompute {
            schedule_breach_checks(&self.scheduler, &ticket, self.config.breach_lead_minutes)
                .await;
        }

        tracing::info!(
            ticket_id = %ticket_id,
            old = %old,
            new = %priority,
            recomputed = recompute,
            "Priority changed"
        );
        Ok(ticket)
    }

    /// Record the first agent response on a ticket. Idempotent.
    pub async fn record_first_response(
        &self,
        ticket_id: TicketId,
        actor: Option<UserId>,
    ) -> Result<Ticket> {
        let lock = self.ticket_lock(ticket_id).await;
        let _guard = lock.lock().await;

        let mut ticket = self.load(ticket_id).await?;
        if ticket.first_response_at.is_some() {
            return Ok(ticket);
        }
        ticket.first_response_at = Some(Utc::now());
        ticket.updated_at = Utc::now();

        self.tickets.update(&ticket).await?;
        self.tickets
            .append_event(TicketEvent::new(
                ticket_id,
                actor,
                TicketEventType::FirstResponseRecorded,
                "First response recorded",
            ))
            .await?;
        Ok(ticket)
    }

    /// Dispatch a notification, absorbing failures into the log.
    async fn notify(
        &self,
        ticket: &Ticket,
        kind: NotificationKind,
        subject: String,
        body: String,
    ) {
        let notification = Notification::new(kind, ticket.id, ticket.code.clone(), subject, body);
        if let Err(e) = self.dispatcher.dispatch(ticket, &notification, None).await {
            tracing::error!(
                ticket_id = %ticket.id,
                kind = %kind,
                error = %e,
                "Failed to dispatch notification"
            );
        }
    }
}
