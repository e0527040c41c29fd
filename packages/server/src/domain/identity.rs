//! Anonymous identity assignment.
//!
//! Assignment is a function of the currently active identity set: a bounded
//! number of random draws, then a numeric suffix on the last draw. The
//! returned name is never a member of the active set.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::value_object::{AnonymousIdentity, UserId};

const PREFIX: &str = "Anonymous";

const ANIMALS: &[&str] = &[
    "Badger", "Crane", "Deer", "Dolphin", "Finch", "Fox", "Hare", "Heron", "Koala", "Lynx",
    "Otter", "Owl", "Panda", "Robin", "Seal", "Sparrow", "Swan", "Turtle", "Whale", "Wren",
];

/// Names are drawn from `1..=MAX_NUMBER`.
const MAX_NUMBER: u32 = 99;

#[derive(Debug, Clone, Copy)]
pub struct IdentityAssigner {
    max_attempts: usize,
}

impl IdentityAssigner {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// Pick an identity that is not in `active`.
    ///
    /// The external user id is deliberately not part of the name: the same
    /// user reconnecting gets a fresh identity.
    pub fn assign<R: Rng + ?Sized>(
        &self,
        user_id: &UserId,
        active: &HashSet<AnonymousIdentity>,
        rng: &mut R,
    ) -> AnonymousIdentity {
        let mut last_draw = None;
        for attempt in 1..=self.max_attempts {
            let candidate = random_name(rng);
            if !active.contains(&candidate) {
                return candidate;
            }
            tracing::debug!(
                "Identity '{}' already active (attempt {}/{}) for user '{}'",
                candidate,
                attempt,
                self.max_attempts,
                user_id.as_str()
            );
            last_draw = Some(candidate);
        }

        let base = last_draw.unwrap_or_else(|| random_name(rng));
        with_free_suffix(&base, active)
    }
}

impl Default for IdentityAssigner {
    fn default() -> Self {
        Self::new(8)
    }
}

fn random_name<R: Rng + ?Sized>(rng: &mut R) -> AnonymousIdentity {
    let animal = ANIMALS.choose(rng).copied().unwrap_or("Fox");
    let number = rng.gen_range(1..=MAX_NUMBER);
    AnonymousIdentity::generated(format!("{} {} {}", PREFIX, animal, number))
}

/// `"<base> (2)"`, `"<base> (3)"`, ... until one is free. At most
/// `active.len() + 1` candidates are examined.
fn with_free_suffix(base: &AnonymousIdentity, active: &HashSet<AnonymousIdentity>) -> AnonymousIdentity {
    let mut suffix: usize = 2;
    loop {
        let candidate = AnonymousIdentity::generated(format!("{} ({})", base, suffix));
        if !active.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
