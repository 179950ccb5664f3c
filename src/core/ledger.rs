//! # Slot ledger: active/limit counters per request type and globally.
//!
//! Pure state, no I/O. The engine owns one ledger inside its state mutex, so
//! reserve-then-enqueue is atomic with respect to concurrent submissions.
//!
//! ## Invariants
//! - `global.active == Σ types[*].active`
//! - a reservation only succeeds while `types[t].active < types[t].limit`
//!   **and** `global.active < global.limit`
//! - lowering a limit below `active` never evicts; admission simply stops
//!   until usage drains

use std::collections::HashMap;

use crate::error::LimitMisuse;
use crate::requests::RequestType;

/// Occupancy of one scope (a request type, or the whole engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slots {
    pub limit: usize,
    pub active: usize,
}

impl Slots {
    fn new(limit: usize) -> Self {
        Self { limit, active: 0 }
    }

    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.active < self.limit
    }
}

/// Two-level concurrency budget.
#[derive(Debug)]
pub(crate) struct SlotLedger {
    global: Slots,
    types: HashMap<RequestType, Slots>,
}

impl SlotLedger {
    pub fn new(global_limit: usize) -> Self {
        Self {
            global: Slots::new(global_limit),
            types: HashMap::new(),
        }
    }

    /// Registers a type with the given limit. No-op if already present.
    ///
    /// Returns `true` if the type was newly created.
    pub fn register(&mut self, ty: &RequestType, limit: usize) -> bool {
        if self.types.contains_key(ty) {
            return false;
        }
        self.types.insert(ty.clone(), Slots::new(limit));
        true
    }

    pub fn contains(&self, ty: &RequestType) -> bool {
        self.types.contains_key(ty)
    }

    #[inline]
    pub fn global(&self) -> Slots {
        self.global
    }

    #[cfg(test)]
    pub fn get(&self, ty: &RequestType) -> Option<Slots> {
        self.types.get(ty).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RequestType, &Slots)> {
        self.types.iter()
    }

    /// True if the type still has per-type room (global capacity not considered).
    pub fn type_has_capacity(&self, ty: &RequestType) -> bool {
        self.types.get(ty).is_some_and(Slots::has_capacity)
    }

    #[inline]
    pub fn global_has_capacity(&self) -> bool {
        self.global.has_capacity()
    }

    /// Reserves one slot for `ty` if both scopes have room.
    ///
    /// Returns `false` with no side effects otherwise (including unknown types).
    pub fn try_reserve(&mut self, ty: &RequestType) -> bool {
        if !self.global.has_capacity() {
            return false;
        }
        match self.types.get_mut(ty) {
            Some(slots) if slots.has_capacity() => {
                slots.active += 1;
                self.global.active += 1;
                true
            }
            _ => false,
        }
    }

    /// Releases one slot for `ty`.
    ///
    /// Releasing more than was reserved leaves the counters untouched and
    /// reports [`LimitMisuse`].
    pub fn release(&mut self, ty: &RequestType) -> Result<(), LimitMisuse> {
        let slots = self
            .types
            .get_mut(ty)
            .ok_or_else(|| LimitMisuse::UnregisteredType {
                request_type: ty.clone(),
            })?;
        if slots.active == 0 || self.global.active == 0 {
            return Err(LimitMisuse::ReleaseWithoutReserve {
                request_type: ty.clone(),
            });
        }
        slots.active -= 1;
        self.global.active -= 1;
        Ok(())
    }

    /// Sets (or creates) the per-type limit.
    ///
    /// Returns the previous limit, `None` if the type was new.
    pub fn set_type_limit(&mut self, ty: &RequestType, limit: usize) -> Option<usize> {
        match self.types.get_mut(ty) {
            Some(slots) => Some(std::mem::replace(&mut slots.limit, limit)),
            None => {
                self.types.insert(ty.clone(), Slots::new(limit));
                None
            }
        }
    }

    /// Sets the global limit, returning the previous one.
    pub fn set_global_limit(&mut self, limit: usize) -> usize {
        std::mem::replace(&mut self.global.limit, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> RequestType {
        RequestType::from(s)
    }

    #[test]
    fn test_reserve_respects_type_limit() {
        let mut ledger = SlotLedger::new(10);
        ledger.register(&ty("a"), 2);

        assert!(ledger.try_reserve(&ty("a")));
        assert!(ledger.try_reserve(&ty("a")));
        assert!(!ledger.try_reserve(&ty("a")));
        assert_eq!(ledger.get(&ty("a")), Some(Slots { limit: 2, active: 2 }));
        assert_eq!(ledger.global().active, 2);
    }

    #[test]
    fn test_reserve_respects_global_limit() {
        let mut ledger = SlotLedger::new(1);
        ledger.register(&ty("a"), 5);
        ledger.register(&ty("b"), 5);

        assert!(ledger.try_reserve(&ty("a")));
        assert!(!ledger.try_reserve(&ty("b")));
        // Failed reservation has no side effects.
        assert_eq!(ledger.get(&ty("b")).map(|s| s.active), Some(0));
        assert_eq!(ledger.global().active, 1);
    }

    #[test]
    fn test_unknown_type_never_admitted() {
        let mut ledger = SlotLedger::new(3);
        assert!(!ledger.try_reserve(&ty("ghost")));
        assert_eq!(ledger.global().active, 0);
    }

    #[test]
    fn test_release_frees_both_scopes() {
        let mut ledger = SlotLedger::new(1);
        ledger.register(&ty("a"), 1);
        ledger.register(&ty("b"), 1);

        assert!(ledger.try_reserve(&ty("a")));
        ledger.release(&ty("a")).unwrap();
        assert!(ledger.try_reserve(&ty("b")));
    }

    #[test]
    fn test_double_release_is_misuse() {
        let mut ledger = SlotLedger::new(2);
        ledger.register(&ty("a"), 2);
        assert!(ledger.try_reserve(&ty("a")));
        ledger.release(&ty("a")).unwrap();

        let err = ledger.release(&ty("a")).unwrap_err();
        assert_eq!(
            err,
            LimitMisuse::ReleaseWithoutReserve {
                request_type: ty("a")
            }
        );
        assert_eq!(ledger.global().active, 0);

        let err = ledger.release(&ty("nope")).unwrap_err();
        assert!(matches!(err, LimitMisuse::UnregisteredType { .. }));
    }

    #[test]
    fn test_lowering_limit_below_active_blocks_without_evicting() {
        let mut ledger = SlotLedger::new(5);
        ledger.register(&ty("a"), 3);
        for _ in 0..3 {
            assert!(ledger.try_reserve(&ty("a")));
        }

        assert_eq!(ledger.set_type_limit(&ty("a"), 1), Some(3));
        assert_eq!(ledger.get(&ty("a")).map(|s| s.active), Some(3));
        assert!(!ledger.try_reserve(&ty("a")));

        ledger.release(&ty("a")).unwrap();
        ledger.release(&ty("a")).unwrap();
        assert!(!ledger.try_reserve(&ty("a")), "still at limit with 1 active");
        ledger.release(&ty("a")).unwrap();
        assert!(ledger.try_reserve(&ty("a")));
    }

    #[test]
    fn test_zero_limit_pauses_scope() {
        let mut ledger = SlotLedger::new(0);
        ledger.register(&ty("a"), 1);
        assert!(!ledger.try_reserve(&ty("a")));
        assert_eq!(ledger.set_global_limit(1), 0);
        assert!(ledger.try_reserve(&ty("a")));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut ledger = SlotLedger::new(1);
        assert!(ledger.register(&ty("a"), 2));
        assert!(!ledger.register(&ty("a"), 7));
        assert_eq!(ledger.get(&ty("a")).map(|s| s.limit), Some(2));
        assert!(ledger.contains(&ty("a")));
        assert_eq!(ledger.set_type_limit(&ty("new"), 4), None);
        assert!(ledger.type_has_capacity(&ty("new")));
    }
}
