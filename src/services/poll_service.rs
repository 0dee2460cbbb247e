use super::activity::{kinds, ActivityService};
use super::AccessService;
use crate::error::{AppError, AppResult};
use crate::models::poll::{CastVote, CreatePoll};
use crate::models::{Poll, PollOptionTally, PollResults};
use crate::permissions::Permission;
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::PollRepository;
use crate::validation::Validate;
use chrono::{NaiveDateTime, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Assemble what a client sees for one poll
pub fn build_results(
    poll: Poll,
    options: Vec<PollOptionTally>,
    my_votes: Vec<Uuid>,
    now: NaiveDateTime,
) -> PollResults {
    PollResults {
        is_closed: poll.is_closed_at(now),
        total_votes: options.iter().map(|o| o.votes).sum(),
        poll,
        options,
        my_votes,
    }
}

/// Check a ballot against the poll before anything is written
pub fn check_ballot(poll: &Poll, options: &[PollOptionTally], option_ids: &[Uuid]) -> AppResult<()> {
    if option_ids.is_empty() {
        return Err(AppError::invalid_field("optionIds", "Select at least one option"));
    }
    let unique: HashSet<&Uuid> = option_ids.iter().collect();
    if unique.len() != option_ids.len() {
        return Err(AppError::invalid_field("optionIds", "Duplicate options"));
    }
    if option_ids.len() > 1 && !poll.allow_multiple {
        return Err(AppError::invalid_field(
            "optionIds",
            "This poll allows a single choice",
        ));
    }
    if !option_ids
        .iter()
        .all(|id| options.iter().any(|o| o.id == *id))
    {
        return Err(AppError::invalid_field(
            "optionIds",
            "Option does not belong to this poll",
        ));
    }
    Ok(())
}

/// Trip polls
pub struct PollService {
    poll_repo: Arc<PollRepository>,
    access: Arc<AccessService>,
    activity: Arc<ActivityService>,
    emitter: RelayEmitter,
}

impl PollService {
    pub fn new(
        poll_repo: Arc<PollRepository>,
        access: Arc<AccessService>,
        activity: Arc<ActivityService>,
        emitter: RelayEmitter,
    ) -> Self {
        Self {
            poll_repo,
            access,
            activity,
            emitter,
        }
    }

    pub async fn list(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<Vec<PollResults>> {
        self.access.require(trip_id, user_id, Permission::View).await?;

        let polls = self.poll_repo.list_for_trip(trip_id).await?;
        let mut results = Vec::with_capacity(polls.len());
        for poll in polls {
            results.push(self.results(poll, user_id).await?);
        }
        Ok(results)
    }

    pub async fn get(&self, trip_id: Uuid, poll_id: Uuid, user_id: Uuid) -> AppResult<PollResults> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        let poll = self.find(trip_id, poll_id).await?;
        self.results(poll, user_id).await
    }

    pub async fn create(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        input: &CreatePoll,
    ) -> AppResult<PollResults> {
        input.validate()?;
        self.access.require(trip_id, user_id, Permission::View).await?;

        let poll = self.poll_repo.create(trip_id, user_id, input).await?;
        info!("Created poll {} on trip {}", poll.id, trip_id);

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::POLL_CREATED,
                format!("Started a poll: \"{}\"", poll.question),
                json!({ "pollId": poll.id }),
            )
            .await;

        let results = self.results(poll, user_id).await?;
        self.emit(trip_id, "created", &results);
        Ok(results)
    }

    /// Replace the caller's ballot
    pub async fn vote(
        &self,
        trip_id: Uuid,
        poll_id: Uuid,
        user_id: Uuid,
        input: &CastVote,
    ) -> AppResult<PollResults> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        let poll = self.find(trip_id, poll_id).await?;

        if poll.is_closed_at(Utc::now().naive_utc()) {
            return Err(AppError::Gone("Poll is closed".to_string()));
        }

        let options = self.poll_repo.tallies(poll_id).await?;
        check_ballot(&poll, &options, &input.option_ids)?;

        self.poll_repo
            .replace_votes(poll_id, user_id, &input.option_ids)
            .await?;

        let results = self.results(poll, user_id).await?;
        self.emit(trip_id, "voted", &results);
        Ok(results)
    }

    /// Poll authors and trip admins may close a poll
    pub async fn close(&self, trip_id: Uuid, poll_id: Uuid, user_id: Uuid) -> AppResult<PollResults> {
        let (_, access) = self.access.require(trip_id, user_id, Permission::View).await?;
        let poll = self.find(trip_id, poll_id).await?;

        if poll.author_id != user_id && !access.can_admin() {
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }
        if poll.closed_at.is_some() || !self.poll_repo.close(poll_id).await? {
            return Err(AppError::Gone("Poll is closed".to_string()));
        }

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::POLL_CLOSED,
                format!("Closed the poll \"{}\"", poll.question),
                json!({ "pollId": poll_id }),
            )
            .await;

        let poll = self.find(trip_id, poll_id).await?;
        let results = self.results(poll, user_id).await?;
        self.emit(trip_id, "closed", &results);
        Ok(results)
    }

    async fn results(&self, poll: Poll, user_id: Uuid) -> AppResult<PollResults> {
        let options = self.poll_repo.tallies(poll.id).await?;
        let my_votes = self.poll_repo.user_votes(poll.id, user_id).await?;
        Ok(build_results(poll, options, my_votes, Utc::now().naive_utc()))
    }

    async fn find(&self, trip_id: Uuid, poll_id: Uuid) -> AppResult<Poll> {
        self.poll_repo
            .find(trip_id, poll_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }

    /// Broadcast tallies only; `myVotes` is per-viewer
    fn emit(&self, trip_id: Uuid, action: &str, results: &PollResults) {
        self.emitter.emit(
            trip_id,
            RelayEvent::PollUpdated,
            json!({
                "action": action,
                "pollId": results.poll.id,
                "isClosed": results.is_closed,
                "totalVotes": results.total_votes,
                "options": &results.options,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(allow_multiple: bool) -> Poll {
        Poll {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            question: "Which beach?".into(),
            allow_multiple,
            closes_at: None,
            closed_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn option(poll: &Poll, label: &str, votes: i64) -> PollOptionTally {
        PollOptionTally {
            id: Uuid::new_v4(),
            poll_id: poll.id,
            label: label.into(),
            position: 0,
            votes,
        }
    }

    #[test]
    fn single_choice_poll_rejects_two_options() {
        let p = poll(false);
        let options = vec![option(&p, "North", 0), option(&p, "South", 0)];
        assert!(check_ballot(&p, &options, &[options[0].id]).is_ok());
        assert!(check_ballot(&p, &options, &[options[0].id, options[1].id]).is_err());
        assert!(check_ballot(&p, &options, &[]).is_err());
    }

    #[test]
    fn ballot_must_reference_this_poll() {
        let p = poll(true);
        let options = vec![option(&p, "North", 0), option(&p, "South", 0)];
        assert!(check_ballot(&p, &options, &[options[0].id, options[1].id]).is_ok());
        assert!(check_ballot(&p, &options, &[Uuid::new_v4()]).is_err());
        assert!(check_ballot(&p, &options, &[options[0].id, options[0].id]).is_err());
    }

    #[test]
    fn results_sum_votes_and_report_closure() {
        let mut p = poll(false);
        let now = Utc::now().naive_utc();
        p.closes_at = Some(now - chrono::Duration::minutes(5));
        let options = vec![option(&p, "North", 3), option(&p, "South", 2)];
        let results = build_results(p, options, vec![], now);
        assert_eq!(results.total_votes, 5);
        assert!(results.is_closed);
    }
}
