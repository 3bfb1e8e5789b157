use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use rand::Rng;

use adboard_core::types::ObjectId;

const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Hands out object ids for one process: a random 5-byte process marker
/// fixed at construction plus a wrapping 24-bit counter.
#[derive(Debug)]
pub struct IdGenerator {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl IdGenerator {
    pub fn new() -> Self {
        let mut process_unique = [0u8; 5];
        rand::thread_rng().fill(&mut process_unique);
        IdGenerator {
            process_unique,
            counter: AtomicU32::new(0),
        }
    }

    pub fn next_id(&self) -> ObjectId {
        let timestamp = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;
        ObjectId::from_parts(timestamp, self.process_unique, counter)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
