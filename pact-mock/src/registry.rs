use crate::interaction::{Interaction, InteractionKey};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionId(u64);

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredInteraction {
    id: InteractionId,
    interaction: Interaction,
}

impl RegisteredInteraction {
    pub fn id(&self) -> InteractionId {
        self.id
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }
}

/// Reported when a registration replaces an interaction with the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateInteraction {
    pub key: InteractionKey,
    pub replaced: String,
    pub replacement: String,
}

impl fmt::Display for DuplicateInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interaction \"{}\" replaced \"{}\" registered for the same request ({})",
            self.replacement, self.replaced, self.key
        )
    }
}

/// The interactions declared for one session, in registration order.
#[derive(Debug, Default)]
pub struct InteractionRegistry {
    entries: Vec<RegisteredInteraction>,
    next_id: u64,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interaction. An entry with the same key is dropped and reported back, so only
    /// the newest one stays reachable.
    pub fn register(&mut self, interaction: Interaction) -> Option<DuplicateInteraction> {
        let key = interaction.key();
        let position = self
            .entries
            .iter()
            .position(|entry| entry.interaction.key() == key);
        let duplicate = position.map(|index| {
            let replaced = self.entries.remove(index);
            DuplicateInteraction {
                key: key.clone(),
                replaced: replaced.interaction.description().into(),
                replacement: interaction.description().into(),
            }
        });

        if let Some(duplicate) = &duplicate {
            warn!(%duplicate, "duplicate interaction registered");
        }

        let id = InteractionId(self.next_id);
        self.next_id += 1;

        debug!(%id, %key, description = interaction.description(), "interaction registered");
        self.entries.push(RegisteredInteraction { id, interaction });

        duplicate
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn list(&self) -> &[RegisteredInteraction] {
        &self.entries
    }

    /// The interactions that belong to `provider_state`, or all of them when no state is given.
    pub fn active<'a>(
        &'a self,
        provider_state: Option<&'a str>,
    ) -> impl Iterator<Item = &'a RegisteredInteraction> + 'a {
        self.entries.iter().filter(move |entry| match provider_state {
            Some(state) => entry.interaction.provider_state() == Some(state),
            None => true,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
