//! Entity trait shared by every row type of the ledger

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Base trait for all entities in the system.
///
/// Every entity carries:
/// - id: Unique identifier
/// - created_at: Creation timestamp
/// - updated_at: Last modification timestamp
///
/// Relationship pointers are entity-specific and live on the owning side
/// only (a store points at its mall and owner, never the reverse).
pub trait Entity: Clone + Send + Sync + 'static {
    /// The plural resource name used in URLs (e.g., "malls", "payments")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "mall", "payment")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Kiosk {
        id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl Entity for Kiosk {
        fn resource_name() -> &'static str {
            "kiosks"
        }

        fn resource_name_singular() -> &'static str {
            "kiosk"
        }

        fn id(&self) -> Uuid {
            self.id
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn updated_at(&self) -> DateTime<Utc> {
            self.updated_at
        }
    }

    #[test]
    fn test_entity_metadata() {
        assert_eq!(Kiosk::resource_name(), "kiosks");
        assert_eq!(Kiosk::resource_name_singular(), "kiosk");

        let now = Utc::now();
        let kiosk = Kiosk {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(kiosk.created_at(), kiosk.updated_at());
        assert_ne!(kiosk.id(), Uuid::nil());
    }
}
