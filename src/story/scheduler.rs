use std::time::Duration;

struct Scheduled<T> {
    due: Duration,
    generation: u64,
    seq: u64,
    task: T,
}

/// A task that came due, with the scene generation it was scheduled under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask<T> {
    pub generation: u64,
    pub task: T,
}

/// Delayed tasks tagged with the scene generation current when they were
/// scheduled.
///
/// Nothing is ever cancelled: the consumer compares each due task's
/// generation against the live one and drops it on mismatch.
pub struct Scheduler<T> {
    tasks: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Duration, generation: u64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(Scheduled {
            due,
            generation,
            seq,
            task,
        });
    }

    /// Removes and returns every task due at `now`, earliest first; ties keep
    /// scheduling order.
    pub fn due(&mut self, now: Duration) -> Vec<DueTask<T>> {
        let (mut ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.due <= now);
        self.tasks = pending;
        ready.sort_by_key(|t| (t.due, t.seq));
        ready
            .into_iter()
            .map(|t| DueTask {
                generation: t.generation,
                task: t.task,
            })
            .collect()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.tasks.iter().map(|t| t.due).min()
    }

    /// Drops tasks scheduled under any generation other than `generation`.
    pub fn retain_generation(&mut self, generation: u64) {
        self.tasks.retain(|t| t.generation == generation);
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
