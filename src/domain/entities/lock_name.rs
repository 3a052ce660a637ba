use crate::domain::errors::LockError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifiers of the scheduled jobs that must never overlap.
///
/// One lock per job type. The string form is what the lock store sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockName {
    #[serde(rename = "cron_sync_inventory")]
    SyncInventory,
    #[serde(rename = "cron_sync_shopify_orders")]
    SyncShopifyOrders,
    #[serde(rename = "cron_sync_netsuite_wholesale")]
    SyncNetsuiteWholesale,
    #[serde(rename = "cron_sync_google_ads")]
    SyncGoogleAds,
    #[serde(rename = "cron_sync_shiphero")]
    SyncShiphero,
    #[serde(rename = "cron_refresh_days_of_inventory")]
    RefreshDaysOfInventory,
}

impl LockName {
    pub const ALL: [LockName; 6] = [
        LockName::SyncInventory,
        LockName::SyncShopifyOrders,
        LockName::SyncNetsuiteWholesale,
        LockName::SyncGoogleAds,
        LockName::SyncShiphero,
        LockName::RefreshDaysOfInventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LockName::SyncInventory => "cron_sync_inventory",
            LockName::SyncShopifyOrders => "cron_sync_shopify_orders",
            LockName::SyncNetsuiteWholesale => "cron_sync_netsuite_wholesale",
            LockName::SyncGoogleAds => "cron_sync_google_ads",
            LockName::SyncShiphero => "cron_sync_shiphero",
            LockName::RefreshDaysOfInventory => "cron_refresh_days_of_inventory",
        }
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockName {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s.trim())
            .ok_or_else(|| LockError::UnknownLock(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        for name in LockName::ALL {
            assert_eq!(name.as_str().parse::<LockName>().unwrap(), name);
        }
        assert_eq!(
            "cron_sync_inventory".parse::<LockName>().unwrap(),
            LockName::SyncInventory
        );
    }

    #[test]
    fn test_parse_unknown_name_is_rejected() {
        let err = "cron_sync_everything".parse::<LockName>().unwrap_err();
        assert_eq!(err, LockError::UnknownLock("cron_sync_everything".to_string()));
        assert!("".parse::<LockName>().is_err());
    }

    #[test]
    fn test_serde_uses_lock_string() {
        let json = serde_json::to_string(&LockName::SyncShiphero).unwrap();
        assert_eq!(json, "\"cron_sync_shiphero\"");
        let back: LockName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LockName::SyncShiphero);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = LockName::ALL.iter().map(|n| n.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), LockName::ALL.len());
    }
}
