use crate::models::context_tag_keys::truncate_chars;
use std::collections::BTreeMap;
use tracing::debug;

const MAX_KEY_LEN: usize = 150;
const MAX_PROPERTY_VALUE_LEN: usize = 8192;

/// Enforces the ingestion length limits in place.
pub(crate) trait Sanitize {
    fn sanitize(&mut self);
}

/// Shortens over-long keys. A shortened key replaces an existing entry with the same name.
fn truncate_keys<V>(map: &mut BTreeMap<String, V>) {
    let too_long = map
        .keys()
        .filter(|key| key.chars().count() > MAX_KEY_LEN)
        .cloned()
        .collect::<Vec<_>>();
    for original in too_long {
        let Some(value) = map.remove(&original) else {
            continue;
        };
        let mut shortened = original.clone();
        truncate_chars(&mut shortened, MAX_KEY_LEN);
        if let Some(replaced) = map.insert(shortened, value).map(|_| original) {
            debug!(key = %replaced, "Shortened key replaced an existing entry");
        }
    }
}

impl Sanitize for BTreeMap<String, String> {
    fn sanitize(&mut self) {
        truncate_keys(self);
        self.values_mut()
            .for_each(|value| truncate_chars(value, MAX_PROPERTY_VALUE_LEN));
    }
}

impl Sanitize for BTreeMap<String, f64> {
    fn sanitize(&mut self) {
        truncate_keys(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_are_truncated() {
        let key = |c: &str, n| c.repeat(n);
        let mut properties: BTreeMap<String, String> = [
            (key("a", 3), "x".repeat(9000)),
            (key("b", 151), "short".to_string()),
            (key("c", 150), "kept".to_string()),
            (key("c", 200), "wins".to_string()),
        ]
        .into_iter()
        .collect();

        properties.sanitize();

        assert_eq!(3, properties.len());
        assert_eq!(MAX_PROPERTY_VALUE_LEN, properties["aaa"].len());
        assert_eq!("short", properties[&key("b", 150)]);
        assert_eq!("wins", properties[&key("c", 150)]);
    }

    #[test]
    fn multibyte_values_are_cut_on_char_boundaries() {
        let mut properties: BTreeMap<String, String> =
            [("scene".to_string(), "é".repeat(8200))].into_iter().collect();
        properties.sanitize();
        assert_eq!(MAX_PROPERTY_VALUE_LEN, properties["scene"].chars().count());
    }

    #[test]
    fn measurement_keys_are_truncated() {
        let mut measurements: BTreeMap<String, f64> =
            [("m".repeat(200), 1.0)].into_iter().collect();
        measurements.sanitize();
        assert_eq!(Some(&1.0), measurements.get(&"m".repeat(150)));
    }
}
