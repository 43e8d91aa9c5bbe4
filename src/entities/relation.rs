//! One-to-one pairing index
//!
//! A [`OneToOne`] records a single optional pairing between an entity
//! (store, mall) and a user, together with the user → entity
//! back-reference. Both directions are updated by the same call, so a
//! pairing can never be visible from one side only.

use std::collections::HashMap;
use uuid::Uuid;

/// A pairing request collided with an existing pairing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user '{user_id}' is already paired with '{paired_with}'")]
pub struct PairingConflict {
    pub user_id: Uuid,
    pub paired_with: Uuid,
}

/// Bidirectional 1:1 index between entities and users
#[derive(Debug, Clone, Default)]
pub struct OneToOne {
    by_entity: HashMap<Uuid, Uuid>,
    by_user: HashMap<Uuid, Uuid>,
}

impl OneToOne {
    pub fn new() -> Self {
        Self::default()
    }

    /// User currently paired with `entity_id`
    pub fn user_of(&self, entity_id: &Uuid) -> Option<Uuid> {
        self.by_entity.get(entity_id).copied()
    }

    /// Entity currently paired with `user_id`
    pub fn entity_of(&self, user_id: &Uuid) -> Option<Uuid> {
        self.by_user.get(user_id).copied()
    }

    /// Check whether `entity_id` may be paired with `user_id`
    ///
    /// Fails when the user is already paired with a different entity.
    /// Re-pairing the same pair, or taking over an entity that has another
    /// user, is allowed.
    pub fn check(&self, entity_id: Uuid, user_id: Option<Uuid>) -> Result<(), PairingConflict> {
        let Some(user_id) = user_id else {
            return Ok(());
        };
        match self.by_user.get(&user_id) {
            Some(paired_with) if *paired_with != entity_id => Err(PairingConflict {
                user_id,
                paired_with: *paired_with,
            }),
            _ => Ok(()),
        }
    }

    /// Pair `entity_id` with `user_id` (or release it with `None`)
    ///
    /// Returns the user that was previously paired with the entity and has
    /// now been released, if any.
    pub fn pair(
        &mut self,
        entity_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, PairingConflict> {
        self.check(entity_id, user_id)?;

        let previous = match user_id {
            Some(user_id) => self.by_entity.insert(entity_id, user_id),
            None => self.by_entity.remove(&entity_id),
        };

        if let Some(previous) = previous {
            self.by_user.remove(&previous);
        }
        if let Some(user_id) = user_id {
            self.by_user.insert(user_id, entity_id);
        }

        Ok(previous.filter(|prev| Some(*prev) != user_id))
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}
