//! Completion tracker: the decide → execute → record protocol.
//!
//! One `run()` invocation walks the lifecycle for a single task identity:
//! consult the marker, clear prior output when a (re-)run is due, invoke
//! the task body exactly once, then record a success marker carrying the
//! run's timing and host-resource metadata. The marker's existence is the
//! completion signal observed by every later check; its content is
//! diagnostic only.
//!
//! The tracker is a single-writer design: it assumes it is the only writer
//! to a task's output location for the duration of one `run()` call and
//! takes no locks. Exclusivity across processes is the caller's problem.

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info};

use crate::errors::TrackerError;
use crate::frame::{Frame, FrameStore, JsonlFrameStore, LazyFrame};
use crate::locator::OutputLocator;
use crate::models::{RunInfo, TaskIdentity};
use crate::store::ObjectStore;

/// Completion state of a task identity, derived per call, never stored.
///
/// `run()` returns this so a caller that just executed a task can thread
/// the "it finished in this call chain" fact explicitly to whatever asks
/// next, instead of the tracker keeping hidden instance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No success marker, or a forced re-run is pending.
    Incomplete,
    /// The body executed and the marker was recorded by this call chain.
    JustCompleted,
    /// A success marker from an earlier run is present.
    Complete,
}

impl Completion {
    /// Whether the task's output can be trusted as done.
    pub fn is_complete(&self) -> bool {
        !matches!(self, Completion::Incomplete)
    }
}

impl std::fmt::Display for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Incomplete => write!(f, "Incomplete"),
            Completion::JustCompleted => write!(f, "JustCompleted"),
            Completion::Complete => write!(f, "Complete"),
        }
    }
}

/// What a task body sees while executing: the locations it owns and the
/// collaborators to materialize output with.
///
/// The body may write anything under its output location except the
/// success marker itself; the tracker records that after the body returns.
pub struct TaskContext<'a> {
    task: &'a TaskIdentity,
    locator: &'a OutputLocator,
    store: &'a dyn ObjectStore,
    frames: &'a dyn FrameStore,
}

impl<'a> TaskContext<'a> {
    pub fn task(&self) -> &TaskIdentity {
        self.task
    }

    /// The task's output directory key.
    pub fn output_dir(&self) -> String {
        self.locator.output_dir(self.task)
    }

    /// Key of the output location, or of a named sub-output.
    pub fn resolve(&self, subdir: Option<&str>) -> Result<String, TrackerError> {
        self.locator.resolve(self.task, subdir)
    }

    /// Raw store access for bodies that write something other than frames.
    pub fn store(&self) -> &dyn ObjectStore {
        self.store
    }

    /// Persists a frame under the task's output location and logs its
    /// schema for diagnostics.
    pub fn save_frame(&self, frame: &Frame, subdir: Option<&str>) -> Result<(), TrackerError> {
        let location = self.resolve(subdir)?;
        self.frames.write_frame(&location, frame)?;
        info!(location = %location, schema = %frame.schema_summary(), "output frame saved");
        Ok(())
    }

    /// Lazy handle on a frame stored under the task's output location.
    pub fn load_frame(&self, subdir: Option<&str>) -> Result<LazyFrame, TrackerError> {
        let location = self.resolve(subdir)?;
        Ok(self.frames.read_frame(&location))
    }
}

/// The work a task performs, supplied by the caller.
///
/// The tracker treats the body as opaque: it may do arbitrary I/O against
/// the output location but must not write the success marker.
pub trait TaskBody {
    fn execute(&self, ctx: &TaskContext<'_>) -> anyhow::Result<()>;
}

impl<F> TaskBody for F
where
    F: Fn(&TaskContext<'_>) -> anyhow::Result<()>,
{
    fn execute(&self, ctx: &TaskContext<'_>) -> anyhow::Result<()> {
        self(ctx)
    }
}

/// Owns the decide → execute → record lifecycle for task outputs in one
/// object store.
pub struct Tracker {
    store: Arc<dyn ObjectStore>,
    frames: Arc<dyn FrameStore>,
    locator: OutputLocator,
}

impl Tracker {
    /// Creates a tracker over `store`, materializing frames with the
    /// bundled JSON-lines codec.
    pub fn new(store: Arc<dyn ObjectStore>, locator: OutputLocator) -> Self {
        let frames: Arc<dyn FrameStore> = Arc::new(JsonlFrameStore::new(Arc::clone(&store)));
        Self {
            store,
            frames,
            locator,
        }
    }

    /// Swaps in a different frame codec.
    pub fn with_frame_store(mut self, frames: Arc<dyn FrameStore>) -> Self {
        self.frames = frames;
        self
    }

    pub fn locator(&self) -> &OutputLocator {
        &self.locator
    }

    fn context<'a>(&'a self, task: &'a TaskIdentity) -> TaskContext<'a> {
        TaskContext {
            task,
            locator: &self.locator,
            store: self.store.as_ref(),
            frames: self.frames.as_ref(),
        }
    }

    /// Reports the task's completion state without side effects.
    ///
    /// With `force` set this is `Incomplete` unconditionally and no store
    /// call is made: a forced re-run must not short-circuit on a stale
    /// marker. A caller that already ran the task in this call chain holds
    /// the [`Completion::JustCompleted`] it got back from [`Tracker::run`]
    /// and should consult that value instead of asking again with `force`.
    ///
    /// A failed existence check propagates as
    /// [`TrackerError::StorageUnavailable`]; "could not ask" is never
    /// reported as "incomplete".
    pub fn check(&self, task: &TaskIdentity, force: bool) -> Result<Completion, TrackerError> {
        if force {
            debug!(task = %task, "force flag set, reporting incomplete");
            return Ok(Completion::Incomplete);
        }
        let marker = self.locator.marker_path(task);
        if self.store.exists(&marker)? {
            Ok(Completion::Complete)
        } else {
            Ok(Completion::Incomplete)
        }
    }

    /// Runs the task to completion, unless it already is complete.
    ///
    /// * marker present and not forced: returns [`Completion::Complete`]
    ///   immediately; the body does not execute and no I/O happens beyond
    ///   the existence check.
    /// * otherwise: clears every object under the output prefix (stale
    ///   forced output, or partial output left by an earlier failed
    ///   attempt), executes the body, and on normal return records a fresh
    ///   success marker with this run's metadata, returning
    ///   [`Completion::JustCompleted`].
    ///
    /// A body failure propagates as [`TrackerError::TaskExecution`] with no
    /// marker written; whatever partial output exists is left in place for
    /// the next run's clean pass. A marker that cannot be written after a
    /// successful body is [`TrackerError::MarkerWriteFailed`]: the one
    /// case where output exists without being recorded, surfaced loudly so
    /// nobody blindly re-runs finished work.
    pub fn run(
        &self,
        task: &TaskIdentity,
        force: bool,
        body: &dyn TaskBody,
    ) -> Result<Completion, TrackerError> {
        let marker = self.locator.marker_path(task);
        if !force && self.store.exists(&marker)? {
            debug!(task = %task, "success marker present, skipping execution");
            return Ok(Completion::Complete);
        }

        self.clean_output(task)?;

        let start = Local::now();
        info!(task = %task, force, "executing task body");
        body.execute(&self.context(task))
            .map_err(|source| TrackerError::TaskExecution {
                task: task.to_string(),
                source,
            })?;
        let end = Local::now();

        let run_info = RunInfo::capture(start, end);
        let bytes =
            serde_json::to_vec(&run_info).map_err(|e| TrackerError::MarkerWriteFailed {
                task: task.to_string(),
                path: marker.clone(),
                source: e.into(),
            })?;
        self.store
            .put(&marker, &bytes)
            .map_err(|e| TrackerError::MarkerWriteFailed {
                task: task.to_string(),
                path: marker.clone(),
                source: e.into(),
            })?;

        info!(task = %task, elapsed = run_info.elapsed, "task complete, success marker recorded");
        Ok(Completion::JustCompleted)
    }

    /// Deletes every stored object under the task's output prefix,
    /// including the marker. Succeeds when there is nothing to delete.
    pub fn clean_output(&self, task: &TaskIdentity) -> Result<(), TrackerError> {
        let dir = self.locator.output_dir(task);
        self.store.delete_by_prefix(&dir)?;
        debug!(task = %task, dir = %dir, "output cleared");
        Ok(())
    }

    /// Reads the recorded run metadata back from the success marker.
    ///
    /// Diagnostic read: completion checks never validate marker content,
    /// so this can fail on a marker that still counts as complete.
    pub fn run_info(&self, task: &TaskIdentity) -> Result<RunInfo, TrackerError> {
        let marker = self.locator.marker_path(task);
        if !self.store.exists(&marker)? {
            return Err(TrackerError::NotComplete(task.to_string()));
        }
        let bytes = self.store.get(&marker)?;
        serde_json::from_slice(&bytes).map_err(|source| TrackerError::MalformedMarker {
            path: marker,
            source,
        })
    }

    /// Lazy handle on the task's stored output.
    pub fn load_output(
        &self,
        task: &TaskIdentity,
        subdir: Option<&str>,
    ) -> Result<LazyFrame, TrackerError> {
        self.context(task).load_frame(subdir)
    }

    /// Persists `frame` as the task's output and logs its schema.
    pub fn save_output(
        &self,
        task: &TaskIdentity,
        frame: &Frame,
        subdir: Option<&str>,
    ) -> Result<(), TrackerError> {
        self.context(task).save_frame(frame, subdir)
    }
}
