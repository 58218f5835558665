use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::DeviceId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceRecord {
    #[serde(flatten)]
    pub info: BTreeMap<String, Value>,
    pub last_updated: DateTime<Utc>,
}

/// Free-form per-device details (model, wattage, notes...) entered by the user.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ApplianceInfo(BTreeMap<DeviceId, ApplianceRecord>);

impl ApplianceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge: keys in `info` overwrite, other existing keys stay.
    pub fn update(&mut self, device_id: DeviceId, info: BTreeMap<String, Value>) -> &ApplianceRecord {
        let now = Utc::now();
        let record = self
            .0
            .entry(device_id)
            .or_insert_with(|| ApplianceRecord { info: BTreeMap::new(), last_updated: now });
        record.info.extend(info);
        // lastUpdated is ours, never a user key
        record.info.remove("lastUpdated");
        record.last_updated = now;
        record
    }

    pub fn get(&self, device_id: DeviceId) -> Option<&ApplianceRecord> {
        self.0.get(&device_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_merges_keys() {
        let mut info = ApplianceInfo::new();
        let id = DeviceId::new();
        info.update(id, BTreeMap::from([("model".into(), json!("X1")), ("watts".into(), json!(60))]));
        let rec = info.update(id, BTreeMap::from([("watts".into(), json!(75))])).clone();

        assert_eq!(rec.info["model"], json!("X1"));
        assert_eq!(rec.info["watts"], json!(75));
    }

    #[test]
    fn serializes_keyed_by_device() {
        let mut info = ApplianceInfo::new();
        let id = DeviceId::new();
        info.update(id, BTreeMap::from([("model".into(), json!("X1"))]));

        let v = serde_json::to_value(&info).unwrap();
        assert_eq!(v[id.to_string()]["model"], json!("X1"));
        assert!(v[id.to_string()].get("lastUpdated").is_some());

        let back: ApplianceInfo = serde_json::from_value(v).unwrap();
        assert_eq!(back, info);
    }
}
