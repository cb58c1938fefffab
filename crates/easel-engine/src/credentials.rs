use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{GenerateError, Result};

/// Rotating cursor over interchangeable session tokens.
///
/// The pool is owned by whoever drives a request; cloning it gives an
/// independent cursor, so concurrent requests never share rotation state.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    tokens: Vec<String>,
    cursor: usize,
    rng: StdRng,
}

impl CredentialPool {
    pub fn new(tokens: Vec<String>) -> Result<Self> {
        Self::with_rng(tokens, StdRng::from_entropy())
    }

    /// Deterministic `random()` jumps, for reproducible rotation.
    pub fn seeded(tokens: Vec<String>, seed: u64) -> Result<Self> {
        Self::with_rng(tokens, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tokens: Vec<String>, rng: StdRng) -> Result<Self> {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(GenerateError::validation(
                "credential pool needs at least one session token",
            ));
        }
        Ok(Self {
            tokens,
            cursor: 0,
            rng,
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &str {
        &self.tokens[self.cursor]
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &str {
        self.cursor = (self.cursor + 1) % self.tokens.len();
        self.current()
    }

    pub fn random(&mut self) -> &str {
        self.cursor = self.rng.gen_range(0..self.tokens.len());
        self.current()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(CredentialPool::new(Vec::new()).is_err());
        assert!(CredentialPool::new(tokens(&["  ", ""])).is_err());
    }

    #[test]
    fn next_wraps_around() -> anyhow::Result<()> {
        let mut pool = CredentialPool::new(tokens(&["a", "b", "c"]))?;
        assert_eq!(pool.current(), "a");
        assert_eq!(pool.next(), "b");
        assert_eq!(pool.next(), "c");
        assert_eq!(pool.next(), "a");
        assert_eq!(pool.cursor(), 0);
        Ok(())
    }

    #[test]
    fn random_keeps_cursor_in_range() -> anyhow::Result<()> {
        let mut pool = CredentialPool::seeded(tokens(&["a", "b", "c", "d"]), 7)?;
        for _ in 0..200 {
            pool.random();
            assert!(pool.cursor() < pool.len());
        }
        Ok(())
    }

    #[test]
    fn seeded_pools_jump_identically() -> anyhow::Result<()> {
        let mut left = CredentialPool::seeded(tokens(&["a", "b", "c"]), 42)?;
        let mut right = CredentialPool::seeded(tokens(&["a", "b", "c"]), 42)?;
        for _ in 0..10 {
            assert_eq!(left.random().to_string(), right.random().to_string());
        }
        Ok(())
    }

    #[test]
    fn clones_rotate_independently() -> anyhow::Result<()> {
        let mut original = CredentialPool::new(tokens(&["a", "b"]))?;
        let mut copy = original.clone();
        copy.next();
        assert_eq!(original.current(), "a");
        assert_eq!(copy.current(), "b");
        assert_eq!(original.next(), "b");
        Ok(())
    }
}
