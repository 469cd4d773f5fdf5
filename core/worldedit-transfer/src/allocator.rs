//! Collision-free ids and names for new entities.
//!
//! The allocator keeps no registry. Callers scan the working set for the
//! ids and names in use, pass them in, and add each allocated value to
//! their sets before allocating the next one.

use std::collections::HashSet;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};
use worldedit_types::EntityId;

use crate::config::AllocationLimits;
use crate::error::{TransferError, TransferResult};

/// Fallback id when no ids exist at all.
const EMPTY_SET_FALLBACK_ID: u64 = 1_000_000_000_000_000_000;

/// Suffix appended to copied names.
pub const COPY_SUFFIX: &str = "_Copy";

/// Caller-supplied id candidates.
pub type IdHint<'a> = dyn FnMut() -> EntityId + 'a;
/// Caller-supplied name candidates, given the original name.
pub type NameHint<'a> = dyn FnMut(&str) -> String + 'a;

/// Source of the microsecond timestamp that seeds id probes.
pub type Clock = fn() -> i64;

fn utc_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub struct UniquenessAllocator {
    rng: StdRng,
    clock: Clock,
    limits: AllocationLimits,
}

impl UniquenessAllocator {
    pub fn new(limits: AllocationLimits) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            clock: utc_micros,
            limits,
        }
    }

    /// Deterministic allocator for tests and reproducible batches.
    pub fn seeded(seed: u64, limits: AllocationLimits) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock: utc_micros,
            limits,
        }
    }

    /// Replaces the timestamp source used as the probe base.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn limits(&self) -> &AllocationLimits {
        &self.limits
    }

    /// Allocates an id not in `existing`.
    ///
    /// Tiers, in order: the hint (bounded attempts), time-seeded random
    /// probes (bounded attempts), then `max(existing) + 1`.
    pub fn allocate_id(
        &mut self,
        existing: &HashSet<EntityId>,
        hint: Option<&mut IdHint<'_>>,
    ) -> TransferResult<EntityId> {
        let free = |id: EntityId| id.get() != 0 && id.is_valid() && !existing.contains(&id);

        if let Some(hint) = hint {
            for attempt in 0..self.limits.id_hint_attempts {
                let id = hint();
                if free(id) {
                    debug!(id = %id, attempt, "id taken from hint");
                    return Ok(id);
                }
            }
            debug!(attempts = self.limits.id_hint_attempts, "id hint exhausted");
        }

        let base = u64::try_from((self.clock)()).unwrap_or_default();
        for attempt in 0..self.limits.id_probe_attempts as u64 {
            let mut candidate = base
                .saturating_add(self.rng.gen_range(1_000..999_999))
                .saturating_add(attempt);
            if candidate > EntityId::MAX_VALID {
                candidate = self
                    .rng
                    .gen_range(1_000_000_000_000_000_000..9_000_000_000_000_000_000);
            }
            let id = EntityId::new(candidate);
            if free(id) {
                return Ok(id);
            }
        }

        let fallback = match existing.iter().max() {
            Some(max) => max.get().checked_add(1),
            None => Some(EMPTY_SET_FALLBACK_ID),
        };
        match fallback.map(EntityId::new).filter(|id| free(*id)) {
            Some(id) => {
                warn!(id = %id, "id probes exhausted, using max + 1");
                Ok(id)
            }
            None => Err(TransferError::AllocationExhausted(format!(
                "no free id after {} probes among {} ids",
                self.limits.id_probe_attempts,
                existing.len()
            ))),
        }
    }

    /// Allocates a name not in `existing`, derived from `original`.
    ///
    /// A hint is accepted only if free. Otherwise any `_Copy` / `_Copy_N`
    /// suffix is stripped and `base_Copy`, `base_Copy_1`, `base_Copy_2`, ...
    /// are tried. The final timestamp-derived name is returned unchecked.
    pub fn allocate_name(
        &mut self,
        original: &str,
        existing: &HashSet<String>,
        hint: Option<&mut NameHint<'_>>,
    ) -> String {
        if let Some(hint) = hint {
            let candidate = hint(original);
            if !candidate.is_empty() && !existing.contains(&candidate) {
                return candidate;
            }
        }

        let base = base_name(original);
        let first = format!("{base}{COPY_SUFFIX}");
        if !existing.contains(&first) {
            return first;
        }
        for n in 1..=self.limits.name_attempts {
            let candidate = format!("{base}{COPY_SUFFIX}_{n}");
            if !existing.contains(&candidate) {
                return candidate;
            }
        }

        let stamp = Utc::now().timestamp().rem_euclid(100_000);
        let last = format!("{base}{COPY_SUFFIX}_{stamp}");
        warn!(name = %last, "name suffixes exhausted, using timestamp name");
        last
    }
}

/// Strips trailing `_Copy` and `_Copy_N` suffixes.
pub fn base_name(name: &str) -> &str {
    let mut base = name;
    loop {
        if let Some(stripped) = base.strip_suffix(COPY_SUFFIX) {
            base = stripped;
            continue;
        }
        if let Some((head, digits)) = base.rsplit_once('_')
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && let Some(stripped) = head.strip_suffix(COPY_SUFFIX)
        {
            base = stripped;
            continue;
        }
        return base;
    }
}
