//! Identity and context attached to every telemetry item.

use crate::{
    device::Device,
    identity::{IdentityStore, USER_ID_KEY},
    models::{context_tag_keys as tags, Properties, Tags},
    Error,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

const ROOT_OPERATION: &str = "Root";

/// End user of the application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    /// Anonymous user id, stable across sessions.
    pub id: String,
}

/// One run of the application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    /// Session id.
    pub id: String,
}

/// Logical unit of work, e.g. the current screen or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Operation instance id.
    pub id: String,
    /// Operation name.
    pub name: String,
}

impl Default for Operation {
    fn default() -> Self {
        Operation {
            id: new_id(),
            name: ROOT_OPERATION.into(),
        }
    }
}

/// Telemetry context: device, user, session, operation and custom properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    /// Device the application runs on.
    pub device: Device,
    /// Current user.
    pub user: User,
    /// Current session.
    pub session: Session,
    /// Current operation.
    pub operation: Operation,
    /// Custom properties sent as tags with every item.
    pub properties: Properties,
}

/// Owns the telemetry [`Context`] and keeps the user id durable.
#[derive(Debug)]
pub struct ContextManager {
    context: Context,
    identity_store: Arc<dyn IdentityStore>,
    application_version: Option<String>,
    initialized: bool,
}

impl ContextManager {
    /// Create a manager for `device`, persisting the user id in `identity_store`.
    pub fn new(device: Device, identity_store: Arc<dyn IdentityStore>) -> Self {
        ContextManager {
            context: Context {
                device,
                ..Default::default()
            },
            identity_store,
            application_version: None,
            initialized: false,
        }
    }

    /// Application version reported as the `Version` client property.
    pub fn with_application_version(mut self, version: impl Into<String>) -> Self {
        self.application_version = Some(version.into());
        self
    }

    /// Populate user, session and client properties.
    ///
    /// Only the first call does any work; later calls return the existing context.
    pub fn initialize(&mut self, instrumentation_key: &str) -> Result<&Context, Error> {
        if instrumentation_key.trim().is_empty() {
            return Err(Error::MissingInstrumentationKey);
        }
        if !self.initialized {
            if self.context.user.id.is_empty() {
                self.set_user_id(None);
            }
            if self.context.session.id.is_empty() {
                self.set_session_id(None);
            }
            let client_properties = self
                .context
                .device
                .client_properties(self.application_version.as_deref());
            for (key, value) in client_properties {
                self.context.properties.entry(key).or_insert(value);
            }
            self.initialized = true;
            debug!(
                session_id = %self.context.session.id,
                user_id = %self.context.user.id,
                device_id = %self.context.device.id,
                "Telemetry context initialized"
            );
        }
        Ok(&self.context)
    }

    /// Whether [`initialize`](Self::initialize) succeeded before.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Set the user id.
    ///
    /// A non-empty `id` is used as is. Otherwise the id kept in the identity store is reused,
    /// or a new one is generated and stored.
    pub fn set_user_id(&mut self, id: Option<&str>) {
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            self.context.user.id = id.to_string();
            return;
        }
        if let Some(stored) = self
            .identity_store
            .get(USER_ID_KEY)
            .filter(|stored| !stored.is_empty())
        {
            debug!(user_id = %stored, "Welcome back");
            self.context.user.id = stored;
            return;
        }
        let generated = new_id();
        if let Err(err) = self.identity_store.set(USER_ID_KEY, &generated) {
            warn!(error = %err, "Failed to persist user id; it will change on next start");
        }
        self.context.user.id = generated;
    }

    /// Set the session id, or start a new session if `id` is empty.
    pub fn set_session_id(&mut self, id: Option<&str>) {
        self.context.session.id = match id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => new_id(),
        };
    }

    /// Start a new operation called `name` and return its id.
    pub fn new_operation(&mut self, name: impl Into<String>) -> String {
        let id = new_id();
        self.context.operation = Operation {
            id: id.clone(),
            name: name.into(),
        };
        id
    }

    /// Set a custom property sent with every item.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.context.properties.insert(key.into(), value.into());
    }

    /// Remove a custom property.
    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.context.properties.remove(key)
    }

    /// Flatten the current context into envelope tags.
    pub fn snapshot(&self) -> Tags {
        let ctx = &self.context;
        let mut result: Tags = ctx.properties.clone();
        for key in tags::WELL_KNOWN {
            let value = match key {
                tags::DEVICE_ID => &ctx.device.id,
                tags::DEVICE_LOCALE => &ctx.device.locale,
                tags::DEVICE_MODEL => &ctx.device.model,
                tags::DEVICE_OEM_NAME => &ctx.device.oem_name,
                tags::DEVICE_OS_VERSION => &ctx.device.operating_system,
                tags::DEVICE_TYPE => &ctx.device.device_type,
                tags::USER_ID => &ctx.user.id,
                tags::SESSION_ID => &ctx.session.id,
                tags::OPERATION_ID => &ctx.operation.id,
                tags::OPERATION_NAME => &ctx.operation.name,
                _ => continue,
            };
            result.insert(key.as_str().to_string(), value.clone());
        }
        result
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityStore;

    fn device() -> Device {
        Device {
            id: "device-1".into(),
            model: "HoloLens".into(),
            oem_name: "HoloLens".into(),
            operating_system: "Windows".into(),
            device_type: "Handheld".into(),
            locale: "en-US".into(),
            os_description: "Windows 10  (10.0.17134) 64bit".into(),
        }
    }

    fn manager(store: Arc<dyn IdentityStore>) -> ContextManager {
        ContextManager::new(device(), store)
    }

    #[test]
    fn initialize_requires_key() {
        let mut manager = manager(Arc::new(MemoryIdentityStore::new()));
        assert!(matches!(
            manager.initialize(" "),
            Err(Error::MissingInstrumentationKey)
        ));
        assert!(!manager.is_initialized());
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut manager = manager(Arc::new(MemoryIdentityStore::new()));
        let first = manager.initialize("key").unwrap().clone();
        let second = manager.initialize("key").unwrap().clone();
        assert_eq!(first, second);
        assert!(!first.user.id.is_empty());
        assert!(!first.session.id.is_empty());
        assert_eq!("Root", first.operation.name);
        assert_eq!("10.0.17134", first.properties["OSVersion"]);
    }

    #[test]
    fn user_id_is_stable_across_managers() {
        let store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());
        let mut first = manager(Arc::clone(&store));
        first.set_user_id(None);
        let mut second = manager(Arc::clone(&store));
        second.set_user_id(None);
        assert_eq!(first.context().user.id, second.context().user.id);
        assert_eq!(Some(first.context().user.id.clone()), store.get(USER_ID_KEY));
    }

    #[test]
    fn explicit_user_id_wins_and_is_not_persisted() {
        let store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());
        store.set(USER_ID_KEY, "stored").unwrap();
        let mut manager = manager(Arc::clone(&store));
        manager.set_user_id(Some("explicit"));
        assert_eq!("explicit", manager.context().user.id);
        assert_eq!(Some("stored".to_string()), store.get(USER_ID_KEY));
        manager.set_user_id(Some(""));
        assert_eq!("stored", manager.context().user.id);
    }

    #[test]
    fn session_ids() {
        let mut manager = manager(Arc::new(MemoryIdentityStore::new()));
        manager.set_session_id(Some("s-1"));
        assert_eq!("s-1", manager.context().session.id);
        manager.set_session_id(None);
        let generated = manager.context().session.id.clone();
        assert_ne!("s-1", generated);
        manager.set_session_id(Some(""));
        assert_ne!(generated, manager.context().session.id);
    }

    #[test]
    fn snapshot_reflects_current_operation() {
        let mut manager = manager(Arc::new(MemoryIdentityStore::new()));
        manager.initialize("key").unwrap();
        let id = manager.new_operation("Scene-MR");
        let tags = manager.snapshot();
        assert_eq!("Scene-MR", tags["ai.operation.name"]);
        assert_eq!(id, tags["ai.operation.id"]);

        let next = manager.new_operation("Scene-Menu");
        assert_ne!(id, next);
        assert_eq!(next, manager.snapshot()["ai.operation.id"]);
    }

    #[test]
    fn snapshot_contains_all_well_known_keys_and_properties() {
        let mut manager = manager(Arc::new(MemoryIdentityStore::new()));
        manager.initialize("key").unwrap();
        manager.set_property("level", "3");
        manager.set_property("ai.user.id", "shadowed");
        let tags = manager.snapshot();
        for key in [
            "ai.device.id",
            "ai.device.locale",
            "ai.device.model",
            "ai.device.oemName",
            "ai.device.osVersion",
            "ai.device.type",
            "ai.user.id",
            "ai.session.id",
            "ai.operation.id",
            "ai.operation.name",
        ] {
            assert!(tags.contains_key(key), "missing {}", key);
        }
        assert_eq!("device-1", tags["ai.device.id"]);
        assert_eq!("Windows", tags["ai.device.osVersion"]);
        assert_eq!("3", tags["level"]);
        assert_eq!(manager.context().user.id, tags["ai.user.id"]);

        assert_eq!(Some("3".to_string()), manager.remove_property("level"));
        assert!(!manager.snapshot().contains_key("level"));
    }
}
