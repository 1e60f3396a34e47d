//! Selection of how a cache key is produced for each call

use crate::Arg;
use crate::key::derive_key;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Caller-supplied key generator
pub type KeyGenerator = Arc<dyn Fn(&[Arg]) -> String + Send + Sync>;

/// How cache keys are produced
///
/// Evaluated per call, in order:
/// 1. random names: a fresh UUID v4, ignoring the arguments
/// 2. a custom generator, whose output is used as-is
/// 3. [`derive_key`]
#[derive(Clone, Default)]
pub struct KeyStrategy {
    generator: Option<KeyGenerator>,
    use_random_name: bool,
}

impl KeyStrategy {
    /// Strategy using the default key derivation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom generator for every key
    #[must_use]
    pub fn with_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&[Arg]) -> String + Send + Sync + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Give every call a fresh random name
    #[must_use]
    pub const fn with_random_name(mut self, enabled: bool) -> Self {
        self.use_random_name = enabled;
        self
    }

    /// Produce the key for an argument list
    #[must_use]
    pub fn key_for(&self, args: &[Arg]) -> String {
        if self.use_random_name {
            Uuid::new_v4().to_string()
        } else if let Some(generator) = &self.generator {
            generator(args)
        } else {
            derive_key(args)
        }
    }
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.use_random_name {
            "random"
        } else if self.generator.is_some() {
            "custom"
        } else {
            "default"
        };
        f.debug_struct("KeyStrategy").field("mode", &mode).finish()
    }
}
