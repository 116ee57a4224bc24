//! Lazy, one-time loading of the sketch generator.

use super::{SketchGenerator, StyleError, rough::RoughGenerator};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type LoadedGenerator = Result<Rc<dyn SketchGenerator>, StyleError>;

/// Shared handle every caller awaits while a load is in flight.
pub type PendingGenerator = Shared<LocalBoxFuture<'static, LoadedGenerator>>;

type Source = Box<dyn Fn() -> LocalBoxFuture<'static, LoadedGenerator>>;

/// Loads a [`SketchGenerator`] at most once.
///
/// Concurrent callers get clones of the same pending future. A failed load is
/// forgotten so the next call can try again.
pub struct GeneratorLoader {
    source: Source,
    pending: RefCell<Option<PendingGenerator>>,
    attempts: Cell<usize>,
}

impl GeneratorLoader {
    pub fn new<F>(source: F) -> Self
    where
        F: Fn() -> LocalBoxFuture<'static, LoadedGenerator> + 'static,
    {
        Self {
            source: Box::new(source),
            pending: RefCell::new(None),
            attempts: Cell::new(0),
        }
    }

    /// Loader that resolves immediately to the built-in [`RoughGenerator`].
    pub fn builtin() -> Self {
        Self::new(|| {
            let generator: Rc<dyn SketchGenerator> = Rc::new(RoughGenerator::default());
            futures::future::ready(Ok(generator)).boxed_local()
        })
    }

    /// The in-flight (or finished) load, starting one if needed.
    pub fn load(&self) -> PendingGenerator {
        let mut pending = self.pending.borrow_mut();
        if let Some(existing) = pending.as_ref() {
            if !matches!(existing.peek(), Some(Err(_))) {
                return existing.clone();
            }
            log::info!("retrying sketch generator load");
        }
        self.attempts.set(self.attempts.get() + 1);
        let future = (self.source)().shared();
        *pending = Some(future.clone());
        future
    }

    /// Generator if a load already finished successfully.
    pub fn ready(&self) -> Option<Rc<dyn SketchGenerator>> {
        self.pending
            .borrow()
            .as_ref()
            .and_then(|p| p.peek().cloned())
            .and_then(Result::ok)
    }

    /// How many times the source has been invoked.
    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }
}
