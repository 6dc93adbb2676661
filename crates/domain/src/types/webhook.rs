//! Intuit webhook notification payload.

use serde::{Deserialize, Serialize};

use super::SyncEntity;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub event_notifications: Vec<EventNotification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotification {
    #[serde(default)]
    pub realm_id: Option<String>,
    #[serde(default)]
    pub data_change_event: Option<DataChangeEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataChangeEvent {
    #[serde(default)]
    pub entities: Vec<ChangedEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedEntity {
    pub name: String,
    pub id: String,
    pub operation: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl WebhookPayload {
    pub fn changed_entities(&self) -> impl Iterator<Item = &ChangedEntity> {
        self.event_notifications
            .iter()
            .filter_map(|notification| notification.data_change_event.as_ref())
            .flat_map(|event| event.entities.iter())
    }

    /// Distinct local collections touched by this delivery, first seen first.
    pub fn affected_entities(&self) -> Vec<SyncEntity> {
        let mut seen = Vec::new();
        for entity in self.changed_entities() {
            if let Some(kind) = SyncEntity::from_quickbooks_name(&entity.name) {
                if !seen.contains(&kind) {
                    seen.push(kind);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affected_entities_are_distinct_and_ordered() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{"eventNotifications":[
                {"realmId":"123","dataChangeEvent":{"entities":[
                    {"name":"Item","id":"1","operation":"Update",
                     "lastUpdated":"2024-01-01T00:00:00Z"},
                    {"name":"Estimate","id":"9","operation":"Create"},
                    {"name":"Customer","id":"2","operation":"Create"}
                ]}},
                {"realmId":"123","dataChangeEvent":{"entities":[
                    {"name":"Item","id":"3","operation":"Delete"},
                    {"name":"Invoice","id":"4","operation":"Update"}
                ]}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(payload.changed_entities().count(), 5);
        assert_eq!(
            payload.affected_entities(),
            vec![SyncEntity::Produtos, SyncEntity::Clientes, SyncEntity::Pedidos]
        );
    }

    #[test]
    fn empty_payload_has_no_entities() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.affected_entities().is_empty());
    }
}
