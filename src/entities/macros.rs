//! Macros for reducing boilerplate when defining entities
//!
//! Every ledger entity shares the same base columns (id, created_at,
//! updated_at) and the same [`Entity`](crate::core::entity::Entity)
//! implementation; only the specific fields differ.

/// Create a ledger entity with automatic trait implementations
///
/// Generates the struct with base fields, the `Entity` impl and a `new`
/// constructor taking the specific fields in declaration order. The id is
/// a fresh v4 UUID and both timestamps are set to now (UTC).
///
/// # Example
///
/// ```rust,ignore
/// use malltrack::prelude::*;
///
/// impl_ledger_entity!(
///     Kiosk,
///     "kiosk",
///     {
///         name: String,
///         mall_id: Uuid,
///     }
/// );
///
/// let kiosk = Kiosk::new("Coffee Cart".to_string(), mall.id);
/// assert_eq!(Kiosk::resource_name(), "kiosks");
/// ```
#[macro_export]
macro_rules! impl_ledger_entity {
    (
        $(#[$meta:meta])*
        $type:ident,
        $type_name:literal,
        {
            $( $(#[$field_meta:meta])* $specific_field:ident : $specific_type:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier for this entity
            pub id: ::uuid::Uuid,

            /// When this entity was created (UTC)
            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            /// When this entity was last updated (UTC)
            pub updated_at: ::chrono::DateTime<::chrono::Utc>,

            $( $(#[$field_meta])* pub $specific_field : $specific_type ),*
        }

        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                concat!($type_name, "s")
            }

            fn resource_name_singular() -> &'static str {
                $type_name
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }
        }

        impl $type {
            /// Create a new entity with a fresh id and current timestamps
            #[allow(clippy::too_many_arguments)]
            pub fn new($( $specific_field: $specific_type ),*) -> Self {
                let now = ::chrono::Utc::now();
                Self {
                    id: ::uuid::Uuid::new_v4(),
                    created_at: now,
                    updated_at: now,
                    $( $specific_field ),*
                }
            }

            /// Bump `updated_at` to now
            pub fn touch(&mut self) {
                self.updated_at = ::chrono::Utc::now();
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::entity::Entity;

    crate::impl_ledger_entity!(
        /// Test-only entity
        Kiosk,
        "kiosk",
        {
            /// Display name
            name: String,
            slots: u32,
        }
    );

    #[test]
    fn test_macro_generates_entity() {
        let kiosk = Kiosk::new("Coffee Cart".to_string(), 3);

        assert_eq!(Kiosk::resource_name(), "kiosks");
        assert_eq!(Kiosk::resource_name_singular(), "kiosk");
        assert_eq!(kiosk.name, "Coffee Cart");
        assert_eq!(kiosk.slots, 3);
        assert_eq!(kiosk.created_at(), kiosk.updated_at());
    }

    #[test]
    fn test_touch_moves_updated_at_forward() {
        let mut kiosk = Kiosk::new("Cart".to_string(), 1);
        let before = kiosk.updated_at;
        kiosk.touch();
        assert!(kiosk.updated_at >= before);
        assert_eq!(kiosk.created_at, before);
    }

    #[test]
    fn test_entity_serializes_base_fields() {
        let kiosk = Kiosk::new("Cart".to_string(), 2);
        let json = serde_json::to_value(&kiosk).unwrap();

        assert_eq!(json["id"], kiosk.id.to_string());
        assert!(json["created_at"].is_string());
        assert_eq!(json["slots"], 2);
    }
}
