use crate::error::Result;
use crate::registry::TagRegistry;

/// Parameter keys threaded through one decode or encode pass.
///
/// Presence of a key is determined by the code path, not the data: a record
/// codec that reads a key its parent never set is a bug, so `get` panics on
/// an absent key rather than returning a recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ContextKey {
    /// Movie format version byte.
    Version,
    /// Colors on the wire carry an alpha channel (DefineShape3 bodies,
    /// place-tag color transforms).
    AlphaColors,
    /// Style arrays may escape a 0xFF count byte to a 16-bit count
    /// (DefineShape2 and later).
    ExtendedStyleArrays,
    /// Current bit width of fill style indices in shape records.
    FillIndexBits,
    /// Current bit width of line style indices in shape records.
    LineIndexBits,
    /// Running bit total of the shape being sized, so alignment padding is
    /// computed from the true bit position.
    ShapeBitTotal,
    /// Tag code of the record currently being decoded.
    CurrentTag,
}

const KEY_COUNT: usize = ContextKey::CurrentTag as usize + 1;

/// Transient scratchpad for one decode or encode call.
///
/// Carries inherited parameters between nested record codecs plus a
/// reference to the active tag registry. Entries pushed for a nested record
/// must be restored on exit so sibling records never observe them; use
/// [`Context::with`] for that discipline.
pub struct Context<'a> {
    registry: &'a TagRegistry,
    values: [Option<i32>; KEY_COUNT],
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a TagRegistry) -> Self {
        Self {
            registry,
            values: [None; KEY_COUNT],
        }
    }

    /// The registry driving record dispatch for this pass.
    pub fn registry(&self) -> &'a TagRegistry {
        self.registry
    }

    /// Look up a key that the current code path guarantees is present.
    ///
    /// # Panics
    ///
    /// Panics if the key was never `put` — a codec bug, not a data error.
    pub fn get(&self, key: ContextKey) -> i32 {
        self.values[key as usize]
            .unwrap_or_else(|| panic!("context key {key:?} read before being set"))
    }

    /// Look up a key, falling back to `default` when absent.
    pub fn get_or(&self, key: ContextKey, default: i32) -> i32 {
        self.values[key as usize].unwrap_or(default)
    }

    pub fn put(&mut self, key: ContextKey, value: i32) {
        self.values[key as usize] = Some(value);
    }

    pub fn remove(&mut self, key: ContextKey) {
        self.values[key as usize] = None;
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.values[key as usize].is_some()
    }

    /// Run `body` with `entries` installed, restoring the prior values on
    /// every exit path (including errors) so siblings of the nested record
    /// never see its private parameters.
    pub fn with<T>(
        &mut self,
        entries: &[(ContextKey, i32)],
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved: Vec<(ContextKey, Option<i32>)> = entries
            .iter()
            .map(|&(key, _)| (key, self.values[key as usize]))
            .collect();
        for &(key, value) in entries {
            self.put(key, value);
        }
        let out = body(self);
        for (key, old) in saved {
            self.values[key as usize] = old;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove() {
        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        assert!(!ctx.contains(ContextKey::Version));
        ctx.put(ContextKey::Version, 10);
        assert_eq!(ctx.get(ContextKey::Version), 10);
        ctx.remove(ContextKey::Version);
        assert!(!ctx.contains(ContextKey::Version));
        assert_eq!(ctx.get_or(ContextKey::Version, 7), 7);
    }

    #[test]
    #[should_panic(expected = "read before being set")]
    fn get_absent_key_panics() {
        let registry = TagRegistry::default();
        let ctx = Context::new(&registry);
        ctx.get(ContextKey::FillIndexBits);
    }

    #[test]
    fn with_restores_on_success_and_error() {
        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        ctx.put(ContextKey::FillIndexBits, 3);

        ctx.with(&[(ContextKey::FillIndexBits, 5)], |ctx| {
            assert_eq!(ctx.get(ContextKey::FillIndexBits), 5);
            // Nested codecs may overwrite freely; the scope still restores.
            ctx.put(ContextKey::FillIndexBits, 7);
            Ok(())
        })
        .unwrap();
        assert_eq!(ctx.get(ContextKey::FillIndexBits), 3);

        let err: Result<()> = ctx.with(&[(ContextKey::AlphaColors, 1)], |_| {
            Err(crate::error::Error::InvalidValue {
                context: "test",
                value: 0,
            })
        });
        assert!(err.is_err());
        assert!(!ctx.contains(ContextKey::AlphaColors));
    }
}
