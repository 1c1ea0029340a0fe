use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{Datastore, WindowCounts};

#[derive(Debug, Clone, Copy)]
struct Counter {
    window: u64,
    current: u64,
    previous: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    data: Arc<Mutex<HashMap<String, Counter>>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn increment(&self, key: &str, window: u64, _window_millis: u64) -> Result<WindowCounts> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock for key: {}", key))?;
        let counter = data.entry(key.to_string()).or_insert(Counter {
            window,
            current: 0,
            previous: 0,
        });
        if counter.window != window {
            counter.previous = if counter.window + 1 == window {
                counter.current
            } else {
                0
            };
            counter.current = 0;
            counter.window = window;
        }
        counter.current += 1;
        Ok(WindowCounts {
            previous: counter.previous,
            current: counter.current,
        })
    }
}
