use crate::error::{CaptureError, Result};
use crate::offsets::OffsetMap;
use crate::types::{Offset, Resolution};
use serde::Serialize;

/// A target device: its resolution and the fine-tuning offsets it needs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeviceProfile {
    pub id: &'static str,
    pub resolution: Resolution,
    pub offsets: &'static [(&'static str, Offset)],
}

impl DeviceProfile {
    pub fn offset_map(&self) -> OffsetMap {
        self.offsets
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }
}

/// Every device the catalog has been tuned for.
pub const PROFILES: &[DeviceProfile] = &[
    DeviceProfile {
        id: "huaweipura",
        resolution: Resolution::new(2772, 1284),
        offsets: &[],
    },
    DeviceProfile {
        id: "huaweimate",
        resolution: Resolution::new(2720, 1260),
        offsets: &[],
    },
    DeviceProfile {
        id: "oppofindx",
        resolution: Resolution::new(2772, 1272),
        offsets: &[],
    },
];

pub fn lookup(id: &str) -> Result<&'static DeviceProfile> {
    PROFILES
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| CaptureError::UnknownProfile(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_profiles_have_valid_resolutions() {
        for p in PROFILES {
            p.resolution.validate().unwrap();
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(lookup("huaweimate").unwrap().resolution, Resolution::new(2720, 1260));
        assert!(matches!(lookup("pixel"), Err(CaptureError::UnknownProfile(_))));
    }
}
