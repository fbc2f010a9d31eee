// tests/resumption.rs

use std::thread;
use std::time::Duration;

use workflow_engine::engine::run_to_completion;
use workflow_engine::{Task, TaskState, WorkflowEngine};
use workflow_engine_test_utils::tasks::{ParkedTasks, ScriptedTask};
use workflow_engine_test_utils::{ResumeProbe, init_tracing};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn resumer_fires_once_when_another_thread_readies_work() {
    init_tracing();

    let mut engine = WorkflowEngine::new("resume");
    let parked = ParkedTasks::new();
    let a = ScriptedTask::paused("A", &parked, true);
    let b = ScriptedTask::paused("B", &parked, true);
    let c = ScriptedTask::succeeding("C");
    let d = ScriptedTask::succeeding("D");
    let ia = engine.add_task(a.clone());
    let ib = engine.add_task(b.clone());
    let ic = engine.add_task(c.clone());
    let id = engine.add_task(d.clone());
    engine.add_dependency(ic, ia);
    engine.add_dependency(id, ib);

    assert!(!engine.run().unwrap());
    assert!(!engine.is_work_available());
    assert_eq!(parked.len(), 2);

    let probe = ResumeProbe::new();
    engine.resume_on_work(probe.resumer());
    assert_eq!(probe.fired(), 0);

    let mut waiting = parked.take_all();
    let b_parked = waiting.pop().expect("B parked second");
    let a_parked = waiting.pop().expect("A parked first");

    let worker = thread::spawn(move || a_parked.complete());
    assert!(probe.wait(WAIT), "resumer never fired");
    worker.join().unwrap();
    assert_eq!(probe.fired(), 1);
    assert!(engine.is_work_available());

    // Nothing is registered any more, so this completion wakes nobody.
    thread::spawn(move || b_parked.complete()).join().unwrap();
    assert_eq!(probe.fired(), 1);

    assert!(engine.run().unwrap());
    assert_eq!(c.state(), TaskState::CompletedSuccessfully);
    assert_eq!(d.state(), TaskState::CompletedSuccessfully);
    assert_eq!(probe.fired(), 1);
}

#[test]
fn resumer_fires_immediately_when_work_is_queued() {
    let mut engine = WorkflowEngine::new("queued");
    let parked = ParkedTasks::new();
    let a = ScriptedTask::paused("A", &parked, true);
    let b = ScriptedTask::succeeding("B");
    let ia = engine.add_task(a.clone());
    let ib = engine.add_task(b.clone());
    engine.add_dependency(ib, ia);

    assert!(!engine.run().unwrap());
    parked.complete_all();
    assert_eq!(b.base().state(), TaskState::Ready);

    let probe = ResumeProbe::new();
    engine.resume_on_work(probe.resumer());
    assert_eq!(probe.fired(), 1);

    assert!(engine.run().unwrap());
}

#[test]
fn resumer_fires_when_the_last_task_finishes() {
    let mut engine = WorkflowEngine::new("last");
    let parked = ParkedTasks::new();
    let a = ScriptedTask::paused("A", &parked, false);
    engine.add_task(a.clone());

    assert!(!engine.run().unwrap());

    let probe = ResumeProbe::new();
    engine.resume_on_work(probe.resumer());
    assert_eq!(probe.fired(), 0);

    let unpauser = {
        let parked = parked.clone();
        thread::spawn(move || parked.complete_all())
    };
    assert!(probe.wait(WAIT));
    assert_eq!(unpauser.join().unwrap(), 1);

    let err = engine.run().unwrap_err();
    assert_eq!(err.to_string(), "paused task 'A' failed");
    assert!(engine.is_done());
}

#[test]
fn registering_again_replaces_the_pending_resumer() {
    let mut engine = WorkflowEngine::new("replace");
    let parked = ParkedTasks::new();
    engine.add_task(ScriptedTask::paused("A", &parked, true));
    assert!(!engine.run().unwrap());

    let first = ResumeProbe::new();
    let second = ResumeProbe::new();
    engine.resume_on_work(first.resumer());
    engine.resume_on_work(second.resumer());

    parked.complete_all();
    assert_eq!(first.fired(), 0);
    assert_eq!(second.fired(), 1);
    assert!(engine.run().unwrap());
}

#[test]
fn blocking_driver_sleeps_until_workers_finish() {
    init_tracing();

    let mut engine = WorkflowEngine::new("driver");
    let parked = ParkedTasks::new();
    let mut previous = None;
    let mut tasks = Vec::new();
    for i in 0..20 {
        let task = ScriptedTask::paused(&format!("step {i}"), &parked, true);
        let index = engine.add_task(task.clone());
        if let Some(prev) = previous {
            engine.add_dependency(index, prev);
        }
        previous = Some(index);
        tasks.push(task);
    }

    let unpauser = {
        let parked = parked.clone();
        thread::spawn(move || {
            let mut completed = 0;
            while completed < 20 {
                completed += parked.complete_all();
                thread::sleep(Duration::from_millis(1));
            }
            completed
        })
    };

    run_to_completion(&mut engine).unwrap();
    assert_eq!(unpauser.join().unwrap(), 20);
    assert!(tasks.iter().all(|t| t.runs() == 1));
    assert_eq!(engine.progress().succeeded, 20);
}
