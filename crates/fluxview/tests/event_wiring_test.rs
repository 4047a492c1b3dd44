//! Integration tests for solver event wiring.

use fluxview::{bind_windows, EventBridge, GraphicsWindow, VizConfig, WindowAction, WindowsManager};
use fluxview_objects::{ContourProps, GraphicsObject, MonitorProps};
use fluxview_render::backend::headless::AnimationManifest;
use fluxview_render::RendererRegistry;
use fluxview_shared::{EventInfo, SessionId, SimulatedSession, SolverEvent, SolverNotification};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

fn contour_window(manager: &Arc<WindowsManager>, session: &Arc<SimulatedSession>) -> GraphicsWindow {
    let window = GraphicsWindow::new(manager);
    window
        .add_graphics(
            GraphicsObject::new(session.clone(), ContourProps::of("pressure", ["wall"])).unwrap(),
            (0, 0),
        )
        .unwrap();
    window.show().unwrap();
    window
}

#[test]
fn test_real_time_update_refreshes_on_timestep() {
    let manager = WindowsManager::with_defaults();
    let log = manager.registry().headless_log().clone();
    let bridge = EventBridge::new();
    let session = SimulatedSession::duct("s1");
    let window = contour_window(&manager, &session);

    let ids = window.real_time_update(&bridge, &[SolverEvent::TimestepEnded]);
    assert_eq!(ids.len(), 1);
    let s1 = SessionId::new("s1");
    assert_eq!(bridge.callback_count(&s1, SolverEvent::TimestepEnded), 1);

    let before = log.render_count();
    let report = bridge.dispatch(&s1, SolverEvent::TimestepEnded, EventInfo::at_index(1));
    assert_eq!(report.invoked, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(log.render_count(), before + 1);

    // Other events and sessions are ignored.
    bridge.dispatch(&s1, SolverEvent::IterationEnded, EventInfo::default());
    bridge.dispatch(&SessionId::new("s2"), SolverEvent::TimestepEnded, EventInfo::default());
    assert_eq!(log.render_count(), before + 1);
}

#[test]
fn test_real_time_update_after_window_dropped() {
    let manager = WindowsManager::with_defaults();
    let log = manager.registry().headless_log().clone();
    let bridge = EventBridge::new();
    let session = SimulatedSession::duct("s1");
    let window = contour_window(&manager, &session);
    window.real_time_update(&bridge, &[SolverEvent::DataRead]);
    window.close().unwrap();
    drop(window);

    let before = log.render_count();
    let report = bridge.dispatch(&SessionId::new("s1"), SolverEvent::DataRead, EventInfo::default());
    assert_eq!(report.invoked, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(log.render_count(), before);
}

#[test]
fn test_bound_animation_collects_queued_timesteps() {
    let dir = tempfile::tempdir().unwrap();
    let config = VizConfig {
        interactive: false,
        output_dir: dir.path().to_path_buf(),
        ..VizConfig::default()
    };
    let manager = WindowsManager::new(Arc::new(RendererRegistry::new()), config).unwrap();
    let bridge = EventBridge::new();
    let session = SimulatedSession::duct("s1");
    let s1 = SessionId::new("s1");
    contour_window(&manager, &session);

    bind_windows(&bridge, &manager, &s1, &[SolverEvent::SolutionInitialized], WindowAction::Animate);
    bind_windows(&bridge, &manager, &s1, &[SolverEvent::TimestepEnded], WindowAction::Refresh);

    let report = bridge.dispatch(&s1, SolverEvent::SolutionInitialized, EventInfo::default());
    assert_eq!((report.invoked, report.failed), (1, 0));

    let sender = bridge.sender();
    let solver = thread::spawn(move || {
        for step in 1..=3 {
            assert!(sender.send(SolverNotification::new(
                SessionId::new("s1"),
                SolverEvent::TimestepEnded,
                EventInfo::at_index(step),
            )));
        }
    });
    solver.join().unwrap();
    assert_eq!(bridge.pending(), 3);
    assert_eq!(bridge.pump(), 3);
    assert_eq!(bridge.pending(), 0);

    let closed = manager.close_windows(&s1, None);
    assert!(closed.is_ok());
    assert_eq!(closed.outputs.len(), 1);
    let manifest: AnimationManifest =
        toml::from_str(&std::fs::read_to_string(&closed.outputs[0]).unwrap()).unwrap();
    assert_eq!(manifest.frames.len(), 4);
    assert!(manager.is_empty());
}

#[test]
fn test_failing_callback_does_not_stop_the_next() {
    let bridge = EventBridge::new();
    let ran = Arc::new(Mutex::new(Vec::new()));

    bridge.register_callback("s1", SolverEvent::IterationEnded, |_| Err("first broke".into()));
    bridge.register_callback("s1", SolverEvent::IterationEnded, |_| panic!("second panicked"));
    let tail = Arc::clone(&ran);
    bridge.register_callback("s1", SolverEvent::IterationEnded, move |notification| {
        tail.lock().push(notification.info.index);
        Ok(())
    });

    let report = bridge.dispatch(&SessionId::new("s1"), SolverEvent::IterationEnded, EventInfo::at_index(7));
    assert_eq!(report.invoked, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(*ran.lock(), vec![Some(7)]);
}

#[test]
fn test_bound_refresh_reports_window_failure() {
    let manager = WindowsManager::with_defaults();
    let bridge = EventBridge::new();
    let session = SimulatedSession::duct("s1");
    let s1 = SessionId::new("s1");

    let broken = GraphicsWindow::new(&manager);
    broken
        .add_graphics(GraphicsObject::new(session.clone(), MonitorProps::of("lift")).unwrap(), (0, 0))
        .unwrap();
    manager.register("broken", &broken).unwrap();
    contour_window(&manager, &session);

    bind_windows(&bridge, &manager, &s1, &[SolverEvent::IterationEnded], WindowAction::Refresh);
    let report = bridge.dispatch(&s1, SolverEvent::IterationEnded, EventInfo::default());
    assert_eq!((report.invoked, report.failed), (1, 1));

    let fan_out = manager.refresh_windows(&s1, None);
    assert_eq!(fan_out.succeeded.len(), 1);
    assert_eq!(fan_out.failed.len(), 1);
}

#[test]
fn test_callback_may_register_during_dispatch() {
    let bridge = Arc::new(EventBridge::new());
    let inner = Arc::clone(&bridge);
    bridge.register_callback("s1", SolverEvent::DataRead, move |_| {
        inner.register_callback("s1", SolverEvent::DataRead, |_| Ok(()));
        Ok(())
    });

    let s1 = SessionId::new("s1");
    assert_eq!(bridge.dispatch(&s1, SolverEvent::DataRead, EventInfo::default()).invoked, 1);
    assert_eq!(bridge.callback_count(&s1, SolverEvent::DataRead), 2);
}

#[test]
fn test_concurrent_refresh_from_threads() {
    let manager = WindowsManager::with_defaults();
    let log = manager.registry().headless_log().clone();
    let s1 = SimulatedSession::duct("s1");
    let s2 = SimulatedSession::duct("s2");
    let windows: Vec<GraphicsWindow> = [&s1, &s2, &s1]
        .into_iter()
        .map(|session| contour_window(&manager, session))
        .collect();
    log.clear();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let session = SessionId::new(if i % 2 == 0 { "s1" } else { "s2" });
                for _ in 0..5 {
                    assert!(manager.refresh_windows(&session, None).is_ok());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Two threads x five rounds x two s1 windows, plus the same for one s2 window.
    assert_eq!(log.render_count(), 2 * 5 * 2 + 2 * 5);
    assert_eq!(manager.len(), windows.len());
}
