use std::collections::HashSet;

use anyhow::{Result, bail};
use rand::Rng;
use rand::rngs::ThreadRng;

const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random SKUs that never repeat within one generator.
pub struct SkuGenerator {
    prefix: String,
    length: usize,
    used: HashSet<String>,
    rng: ThreadRng,
}

impl SkuGenerator {
    pub fn new(prefix: impl Into<String>, length: usize) -> Result<Self> {
        if length == 0 {
            bail!("SKU length must be at least 1");
        }
        Ok(Self {
            prefix: prefix.into(),
            length,
            used: HashSet::new(),
            rng: rand::rng(),
        })
    }

    pub fn issued(&self) -> usize {
        self.used.len()
    }

    fn capacity(&self) -> usize {
        u32::try_from(self.length)
            .ok()
            .and_then(|length| CHARSET.len().checked_pow(length))
            .unwrap_or(usize::MAX)
    }

    pub fn next_sku(&mut self) -> Result<String> {
        if self.used.len() >= self.capacity() {
            bail!(
                "all {} SKUs of length {} are used",
                self.capacity(),
                self.length
            );
        }

        loop {
            let suffix: String = (0..self.length)
                .map(|_| CHARSET[self.rng.random_range(0..CHARSET.len())] as char)
                .collect();
            let sku = format!("{}{suffix}", self.prefix);
            if self.used.insert(sku.clone()) {
                return Ok(sku);
            }
        }
    }
}
