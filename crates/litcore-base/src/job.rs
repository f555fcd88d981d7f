use std::sync::Mutex;

/// A join point for errors raised inside worker jobs.
///
/// Mirrors the thread-local-slot-joined-by-parent-wait policy from §7: each
/// worker records into this slot via [`JobErrors::record`]; the first error
/// recorded wins, later ones are dropped. The view thread calls
/// [`JobErrors::take`] after `rayon::join`/`par_iter` returns to see whether
/// any worker failed.
#[derive(Default)]
pub struct JobErrors<E> {
    slot: Mutex<Option<E>>,
}

impl<E> JobErrors<E> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Records `err` if no error has been recorded yet.
    pub fn record(&self, err: E) {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    /// Takes the recorded error, if any, clearing the slot for reuse.
    pub fn take(&self) -> Option<E> {
        self.slot.lock().unwrap().take()
    }
}
