//! CSAT survey scheduling and storage.
//!
//! Surveys are token-addressed resources with a single-response invariant:
//! at most one response per survey, score in 1..=5.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use deskmind_core::{Ticket, TicketId, UserId};
use deskmind_scheduler::{JobId, JobPayload, JobScheduler};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AutomationError, Result};

/// A dispatched satisfaction survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    /// Unique survey ID
    pub id: Uuid,
    /// Opaque token the response endpoint is addressed by
    pub token: String,
    /// Ticket the survey is about
    pub ticket_id: TicketId,
    /// Recipient
    pub requester_id: UserId,
    /// Recorded score, if a response came in
    pub score: Option<u8>,
    /// Free-form comment from the response
    pub comment: Option<String>,
    /// When the survey was dispatched
    pub sent_at: DateTime<Utc>,
    /// When the response was recorded
    pub responded_at: Option<DateTime<Utc>>,
}

/// In-memory survey store.
#[derive(Clone, Default)]
pub struct SurveyStore {
    surveys: Arc<RwLock<HashMap<String, Survey>>>,
}

impl SurveyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a survey for a resolved ticket.
    pub async fn create(&self, ticket_id: TicketId, requester_id: UserId) -> Survey {
        let survey = Survey {
            id: Uuid::new_v4(),
            token: Uuid::new_v4().simple().to_string(),
            ticket_id,
            requester_id,
            score: None,
            comment: None,
            sent_at: Utc::now(),
            responded_at: None,
        };
        self.surveys
            .write()
            .await
            .insert(survey.token.clone(), survey.clone());
        survey
    }

    /// Fetch a survey by token.
    pub async fn get(&self, token: &str) -> Option<Survey> {
        self.surveys.read().await.get(token).cloned()
    }

    /// All surveys dispatched for a ticket.
    pub async fn for_ticket(&self, ticket_id: TicketId) -> Vec<Survey> {
        let surveys = self.surveys.read().await;
        let mut matched: Vec<Survey> = surveys
            .values()
            .filter(|s| s.ticket_id == ticket_id)
            .cloned()
            .collect();
        matched.sort_by_key(|s| s.sent_at);
        matched
    }

    /// Record a response.
    ///
    /// A response is accepted at most once per survey, and only scores in
    /// 1..=5 are valid.
    pub async fn submit_response(
        &self,
        token: &str,
        score: u8,
        comment: Option<String>,
    ) -> Result<Survey> {
        if !(1..=5).contains(&score) {
            return Err(AutomationError::InvalidSurveyScore(score));
        }

        let mut surveys = self.surveys.write().await;
        let survey = surveys
            .get_mut(token)
            .ok_or_else(|| AutomationError::SurveyNotFound(token.to_string()))?;

        if survey.responded_at.is_some() {
            return Err(AutomationError::SurveyAlreadySubmitted(token.to_string()));
        }

        survey.score = Some(score);
        survey.comment = comment;
        survey.responded_at = Some(Utc::now());
        tracing::info!(
            ticket_id = %survey.ticket_id,
            token = %token,
            score,
            "Survey response recorded"
        );
        Ok(survey.clone())
    }
}

/// Enqueues the CSAT survey job a fixed delay after resolution.
pub struct SurveyScheduler {
    scheduler: Arc<JobScheduler>,
    csat_delay_minutes: i64,
}

impl SurveyScheduler {
    pub fn new(scheduler: Arc<JobScheduler>, csat_delay_minutes: i64) -> Self {
        Self {
            scheduler,
            csat_delay_minutes,
        }
    }

    /// Schedule the survey job for a ticket that just entered Resolved.
    pub async fn schedule(&self, ticket: &Ticket) -> JobId {
        let resolved_at = ticket.resolved_at.unwrap_or_else(Utc::now);
        let send_at = resolved_at + chrono::Duration::minutes(self.csat_delay_minutes);
        tracing::debug!(
            ticket_id = %ticket.id,
            send_at = %send_at,
            "CSAT survey scheduled"
        );
        self.scheduler
            .enqueue(
                JobPayload::SendCsatSurvey {
                    ticket_id: ticket.id,
                },
                send_at,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_survey_round_trip() {
        let store = SurveyStore::new();
        let ticket_id = TicketId::new();
        let survey = store.create(ticket_id, Uuid::new_v4()).await;

        let fetched = store.get(&survey.token).await.unwrap();
        assert_eq!(fetched.id, survey.id);
        assert!(fetched.score.is_none());

        let responded = store
            .submit_response(&survey.token, 4, Some("quick fix, thanks".to_string()))
            .await
            .unwrap();
        assert_eq!(responded.score, Some(4));
        assert!(responded.responded_at.is_some());
    }

    #[tokio::test]
    async fn test_second_response_rejected() {
        let store = SurveyStore::new();
        let survey = store.create(TicketId::new(), Uuid::new_v4()).await;

        store.submit_response(&survey.token, 5, None).await.unwrap();
        assert!(matches!(
            store.submit_response(&survey.token, 1, None).await,
            Err(AutomationError::SurveyAlreadySubmitted(_))
        ));

        // The original response is untouched.
        assert_eq!(store.get(&survey.token).await.unwrap().score, Some(5));
    }

    #[tokio::test]
    async fn test_score_range_enforced() {
        let store = SurveyStore::new();
        let survey = store.create(TicketId::new(), Uuid::new_v4()).await;

        assert!(matches!(
            store.submit_response(&survey.token, 0, None).await,
            Err(AutomationError::InvalidSurveyScore(0))
        ));
        assert!(matches!(
            store.submit_response(&survey.token, 6, None).await,
            Err(AutomationError::InvalidSurveyScore(6))
        ));
        // Rejected scores leave the survey unanswered.
        assert!(store.get(&survey.token).await.unwrap().responded_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let store = SurveyStore::new();
        assert!(matches!(
            store.submit_response("nope", 3, None).await,
            Err(AutomationError::SurveyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_schedule_uses_resolution_time() {
        let scheduler = Arc::new(JobScheduler::default());
        let survey_scheduler = SurveyScheduler::new(scheduler.clone(), 30);

        let mut ticket = Ticket::new(Uuid::new_v4(), "TCK-1", "Subject", Uuid::new_v4());
        let resolved_at = Utc::now() - Duration::minutes(5);
        ticket.resolved_at = Some(resolved_at);

        let id = survey_scheduler.schedule(&ticket).await;
        let job = scheduler.job(id).await.unwrap();
        assert_eq!(job.scheduled_for, resolved_at + Duration::minutes(30));
    }
}
