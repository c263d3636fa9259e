use crate::data::{DataError, MarketDataProvider, PriceSeries};
use crate::engine::frame::BacktestFrame;
use crate::strategy::SignalEngine;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

//exact parameter tuple a frame was built from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub engine: SignalEngine,
}

type Slot = Arc<Mutex<Option<Arc<BacktestFrame>>>>;

//process-lifetime memo of loaded and derived frames
//each key has its own slot lock: concurrent identical requests wait on one fetch,
//distinct keys load in parallel, failed loads are not stored
pub struct SeriesCache {
    provider: Arc<dyn MarketDataProvider>,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl SeriesCache {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        SeriesCache {
            provider,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn get_or_load(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        engine: &SignalEngine,
    ) -> Result<Arc<BacktestFrame>, DataError> {
        let key = CacheKey {
            ticker: ticker.to_string(),
            start,
            end,
            engine: *engine,
        };

        //hold the map lock only long enough to find or create the slot
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(frame) = entry.as_ref() {
            debug!(ticker, %start, %end, "series cache hit");
            return Ok(Arc::clone(frame));
        }

        debug!(ticker, %start, %end, provider = self.provider.name(), "series cache miss");

        let loaded = self
            .provider
            .fetch(ticker, start, end)
            .and_then(|bars| PriceSeries::new(ticker, bars));

        let series = match loaded {
            Ok(series) => series,
            Err(err) => {
                drop(entry);
                self.forget_empty(&key, &slot);
                return Err(err);
            }
        };

        let frame = Arc::new(BacktestFrame::build(series, engine));

        *entry = Some(Arc::clone(&frame));
        Ok(frame)
    }

    //drops the slot of a failed load so failing keys do not pile up
    //a slot another caller is working on is left in place
    fn forget_empty(&self, key: &CacheKey, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        let removable = match slots.get(key) {
            Some(current) if Arc::ptr_eq(current, slot) => current
                .try_lock()
                .map(|entry| entry.is_none())
                .unwrap_or(false),
            _ => false,
        };

        if removable {
            slots.remove(key);
        }
    }

    //number of keys with a stored frame
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        slots
            .iter()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
