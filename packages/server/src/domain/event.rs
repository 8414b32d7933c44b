//! Domain events and their canonical routing rules.
//!
//! The event taxonomy is closed: every state-changing operation of the portal
//! maps to exactly one [`EventKind`], and every kind has exactly one
//! target-resolution rule. Request handlers never pick channels by hand;
//! they describe *who was involved* via [`EventContext`] and the table here
//! decides *who hears about it*.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::value_object::{ChannelName, CohortId, Role, Timestamp, UserId};

/// The closed set of domain event types emitted by the portal's CRUD layer.
///
/// Wire names follow the `<aggregate>:<change>` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "registration")]
    Registration,
    #[serde(rename = "entry:created")]
    EntryCreated,
    #[serde(rename = "entry:statusChanged")]
    EntryStatusChanged,
    #[serde(rename = "comment:added")]
    CommentAdded,
    #[serde(rename = "task:assigned")]
    TaskAssigned,
    #[serde(rename = "task:updated")]
    TaskUpdated,
    #[serde(rename = "task:completed")]
    TaskCompleted,
    #[serde(rename = "doubt:created")]
    DoubtCreated,
    #[serde(rename = "doubt:answered")]
    DoubtAnswered,
    #[serde(rename = "doubt:resolved")]
    DoubtResolved,
    #[serde(rename = "doubt:statusChanged")]
    DoubtStatusChanged,
    #[serde(rename = "quiz:questionCreated")]
    QuizQuestionCreated,
    #[serde(rename = "quiz:questionUpdated")]
    QuizQuestionUpdated,
    #[serde(rename = "quiz:questionDeleted")]
    QuizQuestionDeleted,
    #[serde(rename = "quiz:answerSubmitted")]
    QuizAnswerSubmitted,
    #[serde(rename = "schedule:created")]
    ScheduleCreated,
    #[serde(rename = "schedule:updated")]
    ScheduleUpdated,
    #[serde(rename = "schedule:cancelled")]
    ScheduleCancelled,
    #[serde(rename = "taskQuestion:added")]
    TaskQuestionAdded,
    #[serde(rename = "taskQuestion:answered")]
    TaskQuestionAnswered,
}

impl EventKind {
    /// Wire name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Registration => "registration",
            EventKind::EntryCreated => "entry:created",
            EventKind::EntryStatusChanged => "entry:statusChanged",
            EventKind::CommentAdded => "comment:added",
            EventKind::TaskAssigned => "task:assigned",
            EventKind::TaskUpdated => "task:updated",
            EventKind::TaskCompleted => "task:completed",
            EventKind::DoubtCreated => "doubt:created",
            EventKind::DoubtAnswered => "doubt:answered",
            EventKind::DoubtResolved => "doubt:resolved",
            EventKind::DoubtStatusChanged => "doubt:statusChanged",
            EventKind::QuizQuestionCreated => "quiz:questionCreated",
            EventKind::QuizQuestionUpdated => "quiz:questionUpdated",
            EventKind::QuizQuestionDeleted => "quiz:questionDeleted",
            EventKind::QuizAnswerSubmitted => "quiz:answerSubmitted",
            EventKind::ScheduleCreated => "schedule:created",
            EventKind::ScheduleUpdated => "schedule:updated",
            EventKind::ScheduleCancelled => "schedule:cancelled",
            EventKind::TaskQuestionAdded => "taskQuestion:added",
            EventKind::TaskQuestionAnswered => "taskQuestion:answered",
        }
    }

    /// Resolve the canonical target set for this event kind.
    ///
    /// This is the single routing table for the whole subsystem. The match is
    /// exhaustive on purpose: adding a kind without a rule does not compile.
    pub fn targets(&self, ctx: &EventContext) -> TargetSpec {
        match self {
            // Mentors learn about new students.
            EventKind::Registration => TargetSpec::to_role(Role::Mentor),

            // Entry writes flow student -> mentor; status flows back.
            EventKind::EntryCreated => ctx.mentor_or_role(),
            EventKind::EntryStatusChanged => ctx.owner_or_actor(),
            EventKind::CommentAdded => ctx.owner_or_actor(),

            // Task lifecycle: assignments reach the student, completion the mentor.
            EventKind::TaskAssigned | EventKind::TaskUpdated => ctx.owner_or_actor(),
            EventKind::TaskCompleted => ctx.mentor_or_role(),

            // A new doubt goes to every mentor plus the asking student's
            // own channel (their other tabs keep their doubt list fresh).
            EventKind::DoubtCreated => {
                TargetSpec::to_role(Role::Mentor).and(ctx.owner_or_actor())
            }
            EventKind::DoubtAnswered
            | EventKind::DoubtResolved
            | EventKind::DoubtStatusChanged => ctx.owner_or_actor(),

            // Quiz content changes reach the cohort when known, otherwise
            // every student; submitted answers reach the mentor.
            EventKind::QuizQuestionCreated
            | EventKind::QuizQuestionUpdated
            | EventKind::QuizQuestionDeleted => ctx.cohort_or_role(Role::Student),
            EventKind::QuizAnswerSubmitted => ctx.mentor_or_role(),

            // Schedules are cohort-wide.
            EventKind::ScheduleCreated
            | EventKind::ScheduleUpdated
            | EventKind::ScheduleCancelled => ctx.cohort_or_role(Role::Student),

            // Task questions flow student -> mentor and back.
            EventKind::TaskQuestionAdded => ctx.mentor_or_role(),
            EventKind::TaskQuestionAnswered => ctx.owner_or_actor(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who was involved in the write that produced an event.
///
/// Filled in by the calling request handler; the routing table reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    /// The user whose request caused the write.
    pub actor: UserId,
    /// The student owning the affected aggregate (entry, task, doubt...).
    pub owner: Option<UserId>,
    /// The mentor assigned to the owner, when one exists.
    pub mentor: Option<UserId>,
    /// The cohort the aggregate belongs to, when scoped to one.
    pub cohort: Option<CohortId>,
}

impl EventContext {
    /// Context with only an actor; the routing rules fall back from here.
    pub fn from_actor(actor: UserId) -> Self {
        Self {
            actor,
            owner: None,
            mentor: None,
            cohort: None,
        }
    }

    fn owner_or_actor(&self) -> TargetSpec {
        TargetSpec::to_user(self.owner.unwrap_or(self.actor))
    }

    fn mentor_or_role(&self) -> TargetSpec {
        match self.mentor {
            Some(mentor) => TargetSpec::to_user(mentor),
            None => TargetSpec::to_role(Role::Mentor),
        }
    }

    fn cohort_or_role(&self, fallback: Role) -> TargetSpec {
        match self.cohort {
            Some(cohort) => TargetSpec::to_cohort(cohort),
            None => TargetSpec::to_role(fallback),
        }
    }
}

/// One delivery target: a user, a whole role, or a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    User(UserId),
    Role(Role),
    Cohort(CohortId),
}

impl Target {
    /// The channel this target resolves to.
    pub fn channel(&self) -> ChannelName {
        match self {
            Target::User(id) => ChannelName::User(*id),
            Target::Role(role) => ChannelName::Role(*role),
            Target::Cohort(id) => ChannelName::Cohort(*id),
        }
    }
}

/// A set of delivery targets for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetSpec {
    targets: Vec<Target>,
}

impl TargetSpec {
    /// Target a single user's private channel.
    pub fn to_user(id: UserId) -> Self {
        Self {
            targets: vec![Target::User(id)],
        }
    }

    /// Target every connection of a role.
    pub fn to_role(role: Role) -> Self {
        Self {
            targets: vec![Target::Role(role)],
        }
    }

    /// Target a cohort's shared channel.
    pub fn to_cohort(id: CohortId) -> Self {
        Self {
            targets: vec![Target::Cohort(id)],
        }
    }

    /// Combine two target sets.
    pub fn and(mut self, other: TargetSpec) -> Self {
        self.targets.extend(other.targets);
        self
    }

    /// The targets in this set.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Resolve every target to its channel.
    pub fn channels(&self) -> Vec<ChannelName> {
        self.targets.iter().map(Target::channel).collect()
    }
}

/// A fact emitted after a successful write in the portal's CRUD layer.
///
/// Immutable and not persisted by this subsystem; `occurred_at` is assigned
/// by the server at emission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    pub kind: EventKind,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(kind: EventKind, payload: serde_json::Value, occurred_at: Timestamp) -> Self {
        Self {
            kind,
            payload,
            occurred_at,
        }
    }
}
