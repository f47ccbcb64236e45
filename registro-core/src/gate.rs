//! Memo of the last executed key, used to skip repeated loads and recomputations.

/// Remembers the key of the last run and lets a caller skip runs for an unchanged key.
///
/// Superseded runs are not cancelled; a new key simply lets the next run through.
#[derive(Debug, Clone)]
pub struct LoadGate<K> {
    last: Option<K>,
}

impl<K> Default for LoadGate<K> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<K: PartialEq> LoadGate<K> {
    /// Empty gate; the first key always passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` and report whether it differs from the previous one.
    pub fn enter(&mut self, key: K) -> bool {
        if self.last.as_ref() == Some(&key) {
            return false;
        }
        self.last = Some(key);
        true
    }

    /// Forget the last key so the next run always passes.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_are_skipped() {
        let mut gate = LoadGate::new();
        assert!(gate.enter(("actualizar", Some(3_u64))));
        assert!(!gate.enter(("actualizar", Some(3))));
        assert!(gate.enter(("baja", Some(3))));
        assert!(gate.enter(("actualizar", Some(3))));
    }

    #[test]
    fn reset_lets_the_same_key_through() {
        let mut gate = LoadGate::new();
        assert!(gate.enter("ABC-123"));
        gate.reset();
        assert!(gate.enter("ABC-123"));
    }
}
