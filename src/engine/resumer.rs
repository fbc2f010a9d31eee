// src/engine/resumer.rs

/// One-shot wake-up hook for a driver waiting on the engine.
///
/// Registered through `WorkflowEngine::resume_on_work`; invoked at most once,
/// from whichever thread made work available (or finished the run).
/// Implementations must not call back into the engine's `run()`.
pub trait Resumer: Send + 'static {
    fn resume(self: Box<Self>);
}

impl<F> Resumer for F
where
    F: FnOnce() + Send + 'static,
{
    fn resume(self: Box<Self>) {
        (*self)()
    }
}
