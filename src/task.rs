//! Cooperative single-threaded task scheduling.
//!
//! Layout proceeds as a chain of steps that usually complete synchronously but
//! may suspend at well-defined points, e.g. when view materialization has to
//! wait for an external resource. [`TaskResult`] is a value that is either
//! already available or still pending; [`Frame`] is one logical asynchronous
//! procedure that is completed exactly once; [`Frame::run_loop`] drives an
//! iterative body without growing the call stack when iterations resolve
//! synchronously.
//!
//! There is no parallelism. Continuations run on the thread that resolved the
//! value, through a thread-local FIFO queue, so resolution cascades execute in
//! a flat loop and callback order stays deterministic.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::mem;
use std::rc::Rc;

thread_local! {
  static MICROTASKS: RefCell<VecDeque<Box<dyn FnOnce()>>> = const { RefCell::new(VecDeque::new()) };
  static DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Enqueues a continuation and drains the queue unless a drain is already in
/// progress higher up the stack.
fn schedule(job: Box<dyn FnOnce()>) {
  MICROTASKS.with(|queue| queue.borrow_mut().push_back(job));
  if DRAINING.with(Cell::get) {
    return;
  }
  DRAINING.with(|draining| draining.set(true));
  while let Some(job) = MICROTASKS.with(|queue| queue.borrow_mut().pop_front()) {
    job();
  }
  DRAINING.with(|draining| draining.set(false));
}

enum ResultState<T> {
  Ready(T),
  Pending(Vec<Box<dyn FnOnce(T)>>),
}

/// A value that is either already available or still being computed.
///
/// Cloning a `TaskResult` clones the handle, not the value: all clones observe
/// the same resolution. Continuations registered with [`TaskResult::then`] run
/// inline when the value is already available, and in registration order once
/// a pending value resolves.
pub struct TaskResult<T: 'static> {
  state: Rc<RefCell<ResultState<T>>>,
}

impl<T> Clone for TaskResult<T> {
  fn clone(&self) -> Self {
    Self {
      state: Rc::clone(&self.state),
    }
  }
}

impl<T: Clone + 'static> TaskResult<T> {
  /// An already-resolved result.
  pub fn ready(value: T) -> Self {
    Self {
      state: Rc::new(RefCell::new(ResultState::Ready(value))),
    }
  }

  fn pending() -> Self {
    Self {
      state: Rc::new(RefCell::new(ResultState::Pending(Vec::new()))),
    }
  }

  /// True until the value becomes available.
  pub fn is_pending(&self) -> bool {
    matches!(&*self.state.borrow(), ResultState::Pending(_))
  }

  /// The value, if already available.
  pub fn value(&self) -> Option<T> {
    match &*self.state.borrow() {
      ResultState::Ready(value) => Some(value.clone()),
      ResultState::Pending(_) => None,
    }
  }

  fn resolve(&self, value: T) {
    let waiters = {
      let mut state = self.state.borrow_mut();
      match mem::replace(&mut *state, ResultState::Ready(value.clone())) {
        ResultState::Pending(waiters) => waiters,
        ResultState::Ready(_) => panic!("task result resolved twice"),
      }
    };
    for waiter in waiters {
      let value = value.clone();
      schedule(Box::new(move || waiter(value)));
    }
  }

  /// Runs `continuation` with the value: inline if it is already available,
  /// otherwise once it resolves.
  pub fn then<F>(&self, continuation: F)
  where
    F: FnOnce(T) + 'static,
  {
    let value = match &mut *self.state.borrow_mut() {
      ResultState::Ready(value) => value.clone(),
      ResultState::Pending(waiters) => {
        waiters.push(Box::new(continuation));
        return;
      }
    };
    continuation(value);
  }

  /// Chains a continuation that is itself asynchronous, flattening the nested
  /// result.
  pub fn then_async<U, F>(&self, continuation: F) -> TaskResult<U>
  where
    U: Clone + 'static,
    F: FnOnce(T) -> TaskResult<U> + 'static,
  {
    let chained = TaskResult::pending();
    let resolver = chained.clone();
    self.then(move |value| {
      continuation(value).then(move |inner| resolver.resolve(inner));
    });
    chained
  }

  /// Discards the value and yields `replacement` once this result resolves.
  pub fn then_return<U: Clone + 'static>(&self, replacement: U) -> TaskResult<U> {
    self.then_async(move |_| TaskResult::ready(replacement))
  }
}

/// One logical asynchronous procedure with a single completion value.
///
/// Handles to the eventual value are obtained with [`Frame::result`] before
/// the frame is handed to whatever code completes it. A frame is finished
/// exactly once; finishing twice is a programming error and panics.
pub struct Frame<T: Clone + 'static> {
  name: &'static str,
  finished: Cell<bool>,
  result: TaskResult<T>,
}

impl<T: Clone + 'static> Frame<T> {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      finished: Cell::new(false),
      result: TaskResult::pending(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// A handle resolved when [`Frame::finish`] is called.
  pub fn result(&self) -> TaskResult<T> {
    self.result.clone()
  }

  /// Completes the frame.
  ///
  /// # Panics
  ///
  /// Panics if the frame was already finished.
  pub fn finish(&self, value: T) {
    if self.finished.replace(true) {
      panic!("frame `{}` finished twice", self.name);
    }
    self.result.resolve(value);
  }
}

impl Frame<()> {
  /// Drives `body` until it yields `false`.
  ///
  /// The body returns `true` to request another iteration. Synchronously
  /// resolving iterations execute in a flat loop; the stack unwinds to the
  /// scheduler only when an iteration suspends. The returned result resolves
  /// once the loop stops.
  pub fn run_loop<F>(name: &'static str, body: F) -> TaskResult<()>
  where
    F: FnMut() -> TaskResult<bool> + 'static,
  {
    let frame = Frame::new(name);
    let done = frame.result();
    spin(frame, body);
    done
  }
}

fn spin<F>(frame: Frame<()>, mut body: F)
where
  F: FnMut() -> TaskResult<bool> + 'static,
{
  loop {
    let step = body();
    if step.is_pending() {
      step.then(move |again| {
        if again {
          spin(frame, body);
        } else {
          frame.finish(());
        }
      });
      return;
    }
    match step.value() {
      Some(true) => {}
      _ => {
        frame.finish(());
        return;
      }
    }
  }
}
