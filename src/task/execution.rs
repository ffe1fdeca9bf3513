//! Execute lifecycle -- one full pass over the item map.
//!
//! Phases:
//! 1. Resolve: read the item map and the `enabled`/`multithread` flags
//! 2. Delegate the whole pass to one isolated worker, or
//! 3. Dispatch every item to the process hook concurrently
//! 4. Reassemble results in item-map order and hand them to `on_finish`

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::logging::INFO;
use crate::options::{ItemMap, MULTITHREAD, Options, overlay};
use crate::worker::{ThreadWorker, WorkerHandle};

use super::context::ItemContext;
use super::{Task, TaskHooks};

/// What a resolved execute call will do
enum Plan {
    Skip(SkipReason),
    Delegate,
    Dispatch(ItemMap),
}

#[derive(Debug)]
enum SkipReason {
    NoItems,
    Disabled,
}

/// Default result aggregation: a single result is returned as-is, any other
/// count as an array in item-map order
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskkit::collapse_results;
///
/// assert_eq!(collapse_results(vec![json!(123)]), json!(123));
/// assert_eq!(collapse_results(vec![json!(1), json!(2)]), json!([1, 2]));
/// assert_eq!(collapse_results(vec![]), json!([]));
/// ```
pub fn collapse_results(mut results: Vec<Value>) -> Value {
    if results.len() == 1 {
        results.pop().unwrap_or(Value::Null)
    } else {
        Value::Array(results)
    }
}

impl<H: TaskHooks> Task<H> {
    /// Run the task over its item map
    ///
    /// Returns `Value::Null` without calling any hook when the item map is
    /// missing or empty, or when `enabled` is false. With `multithread` the
    /// whole pass runs in one isolated worker and its result is relayed back.
    /// Otherwise every item is processed concurrently and the ordered results
    /// go through [`TaskHooks::on_finish`].
    ///
    /// # Errors
    ///
    /// The first hook failure to be reported fails the whole call. Sibling
    /// items already running are left to finish; their results are dropped.
    pub async fn execute(&self) -> Result<Value> {
        // snapshot: update_options during a run does not affect it
        let options = Arc::clone(&self.options);

        let items = match self.resolve(&options)? {
            Plan::Skip(reason) => {
                debug!(task = %self.name, ?reason, "task skipped");
                return Ok(Value::Null);
            }
            Plan::Delegate => {
                let payload = self.delegate(&options).await?;
                return self.hooks.on_finish(vec![payload]).await;
            }
            Plan::Dispatch(items) => items,
        };

        let started = Instant::now();
        let results = self.dispatch(options, items).await?;
        self.log(
            &[INFO],
            &format!(
                "Processed all {} in {:.3} sec",
                self.name,
                started.elapsed().as_secs_f64()
            ),
        );

        self.hooks.on_finish(results).await
    }

    fn resolve(&self, options: &Options) -> Result<Plan> {
        let items = match options.item_map() {
            Ok(None) => return Ok(Plan::Skip(SkipReason::NoItems)),
            Ok(Some(items)) if items.is_empty() => return Ok(Plan::Skip(SkipReason::NoItems)),
            other => other,
        };

        let settings = options.settings()?;
        if !settings.enabled {
            self.log(&[INFO], &format!("{} skipped because it is disabled", self.name));
            return Ok(Plan::Skip(SkipReason::Disabled));
        }

        let Some(items) = items? else {
            return Ok(Plan::Skip(SkipReason::NoItems));
        };
        if settings.multithread {
            return Ok(Plan::Delegate);
        }
        Ok(Plan::Dispatch(items))
    }

    /// Run the whole pass in one isolated worker: one request, one reply
    async fn delegate(&self, options: &Options) -> Result<Value> {
        let mut payload = options.clone();
        payload.insert(MULTITHREAD, false);

        let worker: Box<dyn WorkerHandle> = match &self.worker {
            Some(spawner) => spawner.spawn(&self.name)?,
            None => Box::new(ThreadWorker::new(
                self.name.clone(),
                Arc::clone(&self.hooks),
                Arc::clone(&self.logger),
            )),
        };

        debug!(task = %self.name, "delegating execution to isolated worker");
        let started = Instant::now();
        let result = worker.round_trip(payload).await;
        debug!(
            task = %self.name,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "isolated worker finished"
        );
        result
    }

    /// Start every item on its own tokio task and collect results by position
    async fn dispatch(&self, options: Arc<Options>, items: ItemMap) -> Result<Vec<Value>> {
        let total = items.len();
        let mut pending = FuturesUnordered::new();

        for (index, (output, spec)) in items.into_iter().enumerate() {
            let effective = overlay(&options, &spec);
            let ctx = ItemContext::new(
                self.name.clone(),
                output.clone(),
                effective.clone(),
                Arc::clone(&self.logger),
            );
            let hooks = Arc::clone(&self.hooks);
            let logger = Arc::clone(&self.logger);
            let item = output.clone();

            let handle = tokio::spawn(async move {
                let started = Instant::now();
                let result = hooks.process(spec.input(), &item, &effective, &ctx).await;
                if result.is_ok() {
                    logger.log(
                        &[INFO],
                        &format!(
                            "Processed {} in {:.3} sec",
                            item,
                            started.elapsed().as_secs_f64()
                        ),
                    );
                }
                result
            });
            pending.push(async move { (index, output, handle.await) });
        }

        let mut slots: Vec<Option<Value>> = vec![None; total];
        while let Some((index, output, joined)) = pending.next().await {
            match joined {
                Ok(Ok(value)) => slots[index] = Some(value),
                Ok(Err(e)) => {
                    debug!(task = %self.name, output = %output, error = %e, "item failed");
                    return Err(Error::hook_from(output, e));
                }
                Err(e) => {
                    return Err(Error::hook(output, format!("hook panicked: {}", e)));
                }
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Value::Null))
            .collect())
    }
}
