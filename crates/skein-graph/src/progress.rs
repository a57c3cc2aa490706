use std::sync::Arc;

/// Sink invoked after each unit of traversal work.
///
/// The engine calls it twice per module: once when the module is
/// discovered and once when its transform has returned and its children
/// have been enqueued. Each call receives `(finished, discovered)` totals
/// for the current traversal; both are non-decreasing and their sum grows
/// by exactly one per call.
pub type ProgressSink = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Per-traversal counters feeding the sink. Events are emitted from the
/// serialized mutation context only, never from in-flight transform tasks.
#[derive(Debug, Default)]
pub(crate) struct ProgressCounter {
    finished: usize,
    discovered: usize,
}

impl ProgressCounter {
    pub(crate) fn discovered(&mut self, sink: &Option<ProgressSink>) {
        self.discovered += 1;
        if let Some(sink) = sink {
            sink(self.finished, self.discovered);
        }
    }

    pub(crate) fn finished(&mut self, sink: &Option<ProgressSink>) {
        self.finished += 1;
        if let Some(sink) = sink {
            sink(self.finished, self.discovered);
        }
    }
}
