use crate::models::Sanitize;
use std::collections::BTreeMap;

/// Context tags attached to every envelope: well-known `ai.*` keys plus custom properties.
pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContextTagKey(&'static str);

impl ContextTagKey {
    const fn new(key: &'static str) -> Self {
        ContextTagKey(key)
    }

    pub(crate) const fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Unique client device id. Computer name in most cases.
pub(crate) const DEVICE_ID: ContextTagKey = ContextTagKey::new("ai.device.id");

/// Device locale using <language>-<REGION> pattern, following RFC 5646. Example 'en-US'.
pub(crate) const DEVICE_LOCALE: ContextTagKey = ContextTagKey::new("ai.device.locale");

/// Model of the device the end user of the application is using.
pub(crate) const DEVICE_MODEL: ContextTagKey = ContextTagKey::new("ai.device.model");

/// Client device OEM name.
pub(crate) const DEVICE_OEM_NAME: ContextTagKey = ContextTagKey::new("ai.device.oemName");

/// Operating system of the device the end user of the application is using.
pub(crate) const DEVICE_OS_VERSION: ContextTagKey = ContextTagKey::new("ai.device.osVersion");

/// The type of the device the end user of the application is using. Examples: 'Desktop',
/// 'Handheld', 'Console'.
pub(crate) const DEVICE_TYPE: ContextTagKey = ContextTagKey::new("ai.device.type");

/// A unique identifier for the operation instance. Used for finding all the telemetry items for
/// a specific operation instance.
pub(crate) const OPERATION_ID: ContextTagKey = ContextTagKey::new("ai.operation.id");

/// The name (group) of the operation, e.g. the current screen or view.
pub(crate) const OPERATION_NAME: ContextTagKey = ContextTagKey::new("ai.operation.name");

/// Session ID - the instance of the user's interaction with the app.
pub(crate) const SESSION_ID: ContextTagKey = ContextTagKey::new("ai.session.id");

/// Anonymous user id. Represents the end user of the application.
pub(crate) const USER_ID: ContextTagKey = ContextTagKey::new("ai.user.id");

pub(crate) const WELL_KNOWN: [ContextTagKey; 10] = [
    DEVICE_ID,
    DEVICE_LOCALE,
    DEVICE_MODEL,
    DEVICE_OEM_NAME,
    DEVICE_OS_VERSION,
    DEVICE_TYPE,
    USER_ID,
    SESSION_ID,
    OPERATION_ID,
    OPERATION_NAME,
];

fn max_len(key: &str) -> Option<usize> {
    Some(match key {
        k if k == DEVICE_ID.as_str() => 1024,
        k if k == DEVICE_LOCALE.as_str() => 64,
        k if k == DEVICE_MODEL.as_str() => 256,
        k if k == DEVICE_OEM_NAME.as_str() => 256,
        k if k == DEVICE_OS_VERSION.as_str() => 256,
        k if k == DEVICE_TYPE.as_str() => 64,
        k if k == OPERATION_ID.as_str() => 128,
        k if k == OPERATION_NAME.as_str() => 1024,
        k if k == SESSION_ID.as_str() => 64,
        k if k == USER_ID.as_str() => 128,
        _ => return None,
    })
}

/// Well-known tags are truncated to the backend's limits. Custom property tags follow the
/// property limits.
pub(crate) fn sanitize_tags(tags: &mut Tags) {
    let (mut well_known, mut custom): (Tags, Tags) =
        std::mem::take(tags).into_iter().partition(|(k, _)| max_len(k).is_some());
    for (key, value) in well_known.iter_mut() {
        if let Some(len) = max_len(key) {
            truncate_chars(value, len);
        }
    }
    custom.sanitize();
    // well-known keys win over custom keys of the same name
    custom.append(&mut well_known);
    *tags = custom;
}

pub(crate) fn truncate_chars(value: &mut String, max_chars: usize) {
    if let Some((idx, _)) = value.char_indices().nth(max_chars) {
        value.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_tags_are_truncated_per_key() {
        let mut tags = Tags::new();
        tags.insert(OPERATION_ID.as_str().into(), "1".repeat(200));
        tags.insert(DEVICE_LOCALE.as_str().into(), "l".repeat(100));
        tags.insert("custom".into(), "c".repeat(9000));
        sanitize_tags(&mut tags);
        assert_eq!(128, tags[OPERATION_ID.as_str()].len());
        assert_eq!(64, tags[DEVICE_LOCALE.as_str()].len());
        assert_eq!(8192, tags["custom"].len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut value = "äöü".to_string();
        truncate_chars(&mut value, 2);
        assert_eq!("äö", value);
    }
}
