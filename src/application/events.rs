use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync {
    fn event_id(&self) -> &str;
    fn aggregate_id(&self) -> &str;
    fn occurred_at(&self) -> DateTime<Utc>;
    fn event_type(&self) -> &str;
}

/// Scheme-related domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeCreatedEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub scheme_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeUpdatedEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub scheme_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeDeletedEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub scheme_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAttachedToSchemeEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub scheme_id: String,
    pub team_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDetachedFromSchemeEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub scheme_id: String,
    pub team_id: String,
}

/// Role-related domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermissionsEditedEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub role_id: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGroupToggledEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub role_id: String,
    pub group_id: String,
    pub toggled: Vec<String>,
}

macro_rules! impl_domain_event {
    ($event:ty, $event_type:expr) => {
        impl DomainEvent for $event {
            fn event_id(&self) -> &str {
                &self.event_id
            }
            fn aggregate_id(&self) -> &str {
                &self.aggregate_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &str {
                $event_type
            }
        }
    };
}

impl_domain_event!(SchemeCreatedEvent, "scheme_created");
impl_domain_event!(SchemeUpdatedEvent, "scheme_updated");
impl_domain_event!(SchemeDeletedEvent, "scheme_deleted");
impl_domain_event!(TeamAttachedToSchemeEvent, "team_attached_to_scheme");
impl_domain_event!(TeamDetachedFromSchemeEvent, "team_detached_from_scheme");
impl_domain_event!(RolePermissionsEditedEvent, "role_permissions_edited");
impl_domain_event!(PermissionGroupToggledEvent, "permission_group_toggled");

/// Event factory stamping ids and timestamps.
pub struct EventFactory;

impl EventFactory {
    pub fn scheme_created(scheme_id: String, display_name: String) -> SchemeCreatedEvent {
        SchemeCreatedEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: scheme_id.clone(),
            occurred_at: Utc::now(),
            scheme_id,
            display_name,
        }
    }

    pub fn scheme_updated(scheme_id: String) -> SchemeUpdatedEvent {
        SchemeUpdatedEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: scheme_id.clone(),
            occurred_at: Utc::now(),
            scheme_id,
        }
    }

    pub fn scheme_deleted(scheme_id: String) -> SchemeDeletedEvent {
        SchemeDeletedEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: scheme_id.clone(),
            occurred_at: Utc::now(),
            scheme_id,
        }
    }

    pub fn team_attached_to_scheme(scheme_id: String, team_id: String) -> TeamAttachedToSchemeEvent {
        TeamAttachedToSchemeEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: scheme_id.clone(),
            occurred_at: Utc::now(),
            scheme_id,
            team_id,
        }
    }

    pub fn team_detached_from_scheme(
        scheme_id: String,
        team_id: String,
    ) -> TeamDetachedFromSchemeEvent {
        TeamDetachedFromSchemeEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: scheme_id.clone(),
            occurred_at: Utc::now(),
            scheme_id,
            team_id,
        }
    }

    pub fn role_permissions_edited(
        role_id: String,
        permissions: Vec<String>,
    ) -> RolePermissionsEditedEvent {
        RolePermissionsEditedEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: role_id.clone(),
            occurred_at: Utc::now(),
            role_id,
            permissions,
        }
    }

    pub fn permission_group_toggled(
        role_id: String,
        group_id: String,
        toggled: Vec<String>,
    ) -> PermissionGroupToggledEvent {
        PermissionGroupToggledEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: role_id.clone(),
            occurred_at: Utc::now(),
            role_id,
            group_id,
            toggled,
        }
    }
}

/// Append-only store for domain events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, event: Box<dyn DomainEvent + Send + Sync>);
    async fn events_for(&self, aggregate_id: &str) -> Vec<String>;
}

/// In-memory event store keeping (aggregate_id, event_type) pairs.
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<(String, String)>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: Box<dyn DomainEvent + Send + Sync>) {
        let mut events = self.events.write().await;
        events.push((
            event.aggregate_id().to_string(),
            event.event_type().to_string(),
        ));
    }

    async fn events_for(&self, aggregate_id: &str) -> Vec<String> {
        let events = self.events.read().await;
        events
            .iter()
            .filter(|(id, _)| id == aggregate_id)
            .map(|(_, event_type)| event_type.clone())
            .collect()
    }
}
