use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use crate::config::KernelConfig;
use crate::event::types::{QUIT, START};
use crate::host::HostNotification;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::{Error, KernelLifecyclePhase};
use crate::kernel::lifecycle::{QuitHandler, quit_handler_fn};
use crate::kernel::tests::common::{MockHost, Recorder, RecordingPlugin, TextNode, test_app};
use crate::plugin_system::error::{PLUGIN_DEPENDENCY, PLUGIN_ERROR};
use crate::plugin_system::hooks::HookKind;
use crate::plugin_system::{FnPlugin, HookResult, Plugin};

/// Quit handler logging "<label>:start" and "<label>:end" around an
/// optional delay
fn recording_quit_handler(
    log: Recorder,
    label: &'static str,
    delay_ms: u64,
    fail: bool,
) -> impl QuitHandler {
    quit_handler_fn(move || {
        let log = log.clone();
        async move {
            log.push(format!("{}:start", label));
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            log.push(format!("{}:end", label));
            let result: HookResult = if fail {
                Err(format!("{} failed", label).into())
            } else {
                Ok(())
            };
            result
        }
    })
}

fn counter_for(app: &Application, event: &str) -> Arc<AtomicU32> {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = Arc::clone(&counter);
    app.on(event, move |_| {
        counter_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    counter
}

#[test]
fn test_dependency_orders_install() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("b", &log).depends_on("a").shared());
    app.register(RecordingPlugin::new("a", &log).shared());

    app.start().expect("start should succeed");
    assert_eq!(app.installed_plugins(), vec!["a", "b"]);
    assert_eq!(log.with_suffix("install"), vec!["a", "b"]);
}

#[test]
fn test_after_orders_install_like_a_dependency() {
    let log = Recorder::new();
    let host = MockHost::new(80, 24);
    let plugins: Vec<Arc<dyn Plugin>> = vec![
        RecordingPlugin::new("b", &log).after("a").shared(),
        RecordingPlugin::new("a", &log).shared(),
    ];
    let mut app = Application::with_plugins(host, KernelConfig::default(), plugins);

    app.start().expect("start should succeed");
    assert_eq!(app.installed_plugins(), vec!["a", "b"]);
}

#[test]
fn test_missing_dependency_fails_start() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("dependent", &log).depends_on("missing").shared());

    let err = app.start().unwrap_err();
    assert!(
        err.to_string().contains("depends on \"missing\" which is not available"),
        "unexpected message: {}",
        err
    );
    assert_eq!(err.code(), Some(PLUGIN_DEPENDENCY));
    assert!(!app.is_running());
    assert!(log.entries().is_empty(), "Nothing should be installed");
}

#[test]
fn test_cycle_fails_start() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("a", &log).depends_on("b").shared());
    app.register(RecordingPlugin::new("b", &log).depends_on("a").shared());

    let err = app.start().unwrap_err();
    assert!(err.to_string().contains("circular dependency"), "unexpected message: {}", err);
    assert_eq!(err.code(), Some(PLUGIN_ERROR));
    assert!(app.installed_plugins().is_empty());
}

#[test]
fn test_unsatisfiable_before_is_dropped_with_warning() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("a", &log).shared());
    app.register(RecordingPlugin::new("b", &log).before("a").after("a").shared());

    app.start().expect("an unsatisfiable before must not fail start");
    assert_eq!(app.installed_plugins(), vec!["a", "b"]);

    let warnings = app.resolution_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].to_string().contains("unsatisfiable \"before\" constraint"));
}

#[tokio::test]
async fn test_teardown_runs_in_reverse_install_order() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("p1", &log).shared());
    app.register(RecordingPlugin::new("p2", &log).shared());

    app.start().expect("start should succeed");
    app.quit().await;

    assert_eq!(log.with_suffix("destroy"), vec!["p2", "p1"]);
    assert!(app.installed_plugins().is_empty(), "quit clears the install list");
    assert_eq!(app.pending_plugins(), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_start_and_quit_are_idempotent() {
    let (mut app, host) = test_app();
    let starts = counter_for(&app, START);
    let quits = counter_for(&app, QUIT);

    app.start().expect("first start");
    app.start().expect("second start is a no-op");
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(host.active_subscriptions(), 2);

    app.quit().await;
    app.quit().await;
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    assert_eq!(host.active_subscriptions(), 0, "quit cancels host subscriptions");

    // Quitting before ever starting is also a no-op
    let (mut idle, _host) = test_app();
    let idle_quits = counter_for(&idle, QUIT);
    idle.quit().await;
    assert_eq!(idle_quits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_restart_resolves_and_installs_again() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("a", &log).shared());

    app.start().expect("first start");
    app.quit().await;
    app.start().expect("second start");

    assert_eq!(log.count("a:install"), 2);
    assert_eq!(app.installed_plugins(), vec!["a"]);
}

#[test]
fn test_install_failure_aborts_start() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("a", &log).shared());
    app.register(RecordingPlugin::new("b", &log).failing_in(HookKind::Install).shared());
    app.register(RecordingPlugin::new("c", &log).shared());

    let err = app.start().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Plugin system error: Failed to install plugin \"b\": install failed"
    );
    assert_eq!(err.code(), Some(PLUGIN_ERROR));
    assert!(!app.is_running());
    // Plugins installed before the failure stay installed
    assert_eq!(app.installed_plugins(), vec!["a"]);
    assert_eq!(log.with_suffix("install"), vec!["a", "b"]);

    // A retry does not reinstall "a"
    assert!(app.start().is_err());
    assert_eq!(log.count("a:install"), 1);
}

#[test]
fn test_panicking_install_is_reported_as_install_failure() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("boom", &log).panicking_in(HookKind::Install).shared());

    let err = app.start().unwrap_err();
    assert!(
        err.to_string()
            .contains("Failed to install plugin \"boom\": panic: boom panicked in install")
    );
}

#[test]
fn test_start_from_install_hook_is_rejected() {
    let nested_failed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&nested_failed);
    let (mut app, _host) = test_app();
    app.register(Arc::new(FnPlugin::new("reentrant", move |app: &mut Application| {
        let nested = app.start();
        flag.store(
            matches!(
                nested,
                Err(Error::KernelLifecycleError {
                    phase: KernelLifecyclePhase::Start,
                    ..
                })
            ),
            Ordering::SeqCst,
        );
        Ok(())
    })));

    app.start().expect("outer start should succeed");
    assert!(nested_failed.load(Ordering::SeqCst));
    assert_eq!(app.installed_plugins(), vec!["reentrant"]);
}

#[test]
fn test_use_plugin_while_idle_queues() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.use_plugin(RecordingPlugin::new("late", &log).depends_on("early").shared())
        .expect("queueing never fails");
    app.use_plugin(RecordingPlugin::new("early", &log).shared())
        .expect("queueing never fails");

    assert!(log.entries().is_empty());
    assert_eq!(app.pending_plugins(), vec!["late", "early"]);

    app.start().expect("start should succeed");
    assert_eq!(app.installed_plugins(), vec!["early", "late"]);
    assert!(app.pending_plugins().is_empty());
}

#[tokio::test]
async fn test_use_plugin_while_running_installs_immediately() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("base", &log).shared());
    app.start().expect("start should succeed");
    app.mount(TextNode::new("ui", &log));
    app.tick();
    assert!(!app.is_dirty());

    app.use_plugin(RecordingPlugin::new("hot", &log).shared())
        .expect("hot install should succeed");
    assert_eq!(app.installed_plugins(), vec!["base", "hot"]);
    assert!(app.is_dirty(), "a hot install schedules a redraw");

    // Installing the same name again is ignored
    app.use_plugin(RecordingPlugin::new("hot", &log).shared())
        .expect("duplicate hot install is ignored");
    assert_eq!(log.count("hot:install"), 1);

    let err = app
        .use_plugin(RecordingPlugin::new("broken", &log).failing_in(HookKind::Install).shared())
        .unwrap_err();
    assert!(err.to_string().contains("Failed to install plugin \"broken\""));
    assert_eq!(app.installed_plugins(), vec!["base", "hot"]);

    app.quit().await;
    assert_eq!(log.with_suffix("destroy"), vec!["hot", "base"]);
}

#[tokio::test]
async fn test_quit_handlers_run_sequentially_before_destroy() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("p", &log).shared());

    app.on_quit(recording_quit_handler(log.clone(), "slow", 20, false));
    app.on_quit(recording_quit_handler(log.clone(), "failing", 0, true));
    app.on_quit(recording_quit_handler(log.clone(), "fast", 0, false));

    app.start().expect("start should succeed");
    log.clear();
    app.quit().await;

    assert_eq!(
        log.entries(),
        vec![
            "slow:start",
            "slow:end",
            "failing:start",
            "failing:end",
            "fast:start",
            "fast:end",
            "p:destroy"
        ]
    );
}

#[tokio::test]
async fn test_panicking_quit_handler_does_not_stop_teardown() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    let quits = counter_for(&app, QUIT);
    app.register(RecordingPlugin::new("p", &log).shared());

    let explode = true;
    app.on_quit(quit_handler_fn(move || async move {
        if explode {
            panic!("handler blew up");
        }
        let result: HookResult = Ok(());
        result
    }));
    app.on_quit(recording_quit_handler(log.clone(), "second", 0, false));

    app.start().expect("start should succeed");
    app.quit().await;

    assert_eq!(
        log.entries(),
        vec!["p:install", "second:start", "second:end", "p:destroy"]
    );
    assert!(!app.is_running());
    assert!(app.installed_plugins().is_empty());
    assert_eq!(quits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_quit_handlers_persist_and_can_be_removed() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();

    app.on_quit(recording_quit_handler(log.clone(), "kept", 0, false));
    let removed = app.on_quit(recording_quit_handler(log.clone(), "removed", 0, false));
    assert!(app.remove_quit_handler(removed));
    assert!(!app.remove_quit_handler(removed));

    for _ in 0..2 {
        app.start().expect("start should succeed");
        app.quit().await;
    }
    assert_eq!(log.with_suffix("end"), vec!["kept", "kept"]);
}

#[tokio::test]
async fn test_destroy_failures_do_not_stop_teardown() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    let quits = counter_for(&app, QUIT);
    app.register(RecordingPlugin::new("a", &log).shared());
    app.register(RecordingPlugin::new("b", &log).failing_in(HookKind::Destroy).shared());
    app.register(RecordingPlugin::new("c", &log).panicking_in(HookKind::Destroy).shared());

    app.start().expect("start should succeed");
    app.quit().await;

    assert_eq!(log.with_suffix("destroy"), vec!["c", "b", "a"]);
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    assert!(app.error().is_none(), "destroy failures are only logged");
}

#[tokio::test]
async fn test_quit_handle_stops_pumped_kernel() {
    let (mut app, _host) = test_app();
    let quits = counter_for(&app, QUIT);
    app.start().expect("start should succeed");

    let handle = app.quit_handle();
    assert!(handle.clone().request_quit());
    assert!(app.is_running(), "requests are only acted on when pumped");

    assert_eq!(app.pump().await, 1);
    assert!(!app.is_running());
    assert_eq!(quits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_loop_renders_until_quit_requested() {
    let log = Recorder::new();
    let host = MockHost::new(40, 10);
    let mut app = Application::new(host, KernelConfig::default().with_fps(200));
    app.register(RecordingPlugin::new("painter", &log).shared());
    app.mount(TextNode::new("hello", &log));
    let starts = counter_for(&app, START);
    let quits = counter_for(&app, QUIT);

    let handle = app.quit_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.request_quit();
    });

    app.run().await.expect("run should finish cleanly");

    assert!(!app.is_running());
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    assert!(log.count("painter:render") >= 1, "the initial dirty frame is rendered");
    assert_eq!(log.with_suffix("destroy"), vec!["painter"]);

    // The loop hands the notification channel back, so it can run again
    let handle = app.quit_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.request_quit();
    });
    app.run().await.expect("second run should finish cleanly");
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_eq!(quits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_run_loop_survives_fps_above_millisecond_resolution() {
    let host = MockHost::new(40, 10);
    let mut app = Application::new(host, KernelConfig::default().with_fps(2000));
    assert_eq!(app.config().frame_interval(), Duration::from_millis(1));

    let handle = app.quit_handle();
    let driver = tokio::spawn(async move {
        let result = app.run().await;
        (app, result)
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.request_quit();

    let (app, result) = driver.await.expect("run loop should not panic");
    result.expect("run should finish cleanly");
    assert!(!app.is_running());
}

#[tokio::test]
async fn test_stop_requests_made_while_idle_are_discarded_on_start() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    let quits = counter_for(&app, QUIT);
    app.register(RecordingPlugin::new("p", &log).shared());

    assert!(app.quit_handle().request_quit());
    app.notifier().send(HostNotification::Terminate).expect("channel is open");
    app.start().expect("start should succeed");

    assert_eq!(app.pump().await, 0, "stale requests were dropped");
    assert!(app.is_running());
    assert_eq!(log.entries(), vec!["p:install"]);
    assert_eq!(quits.load(Ordering::SeqCst), 0);

    app.quit_handle().request_quit();
    assert_eq!(app.pump().await, 1);
    assert!(!app.is_running());
    assert_eq!(log.entries(), vec!["p:install", "p:destroy"]);
}

#[tokio::test]
async fn test_resize_reported_while_idle_is_applied_on_start() {
    let (mut app, host) = test_app();
    host.set_size(120, 40);
    app.notifier().send(HostNotification::Resize).expect("channel is open");

    app.start().expect("start should succeed");
    assert_eq!(app.dimensions(), (120, 40));
    assert_eq!(app.pump().await, 0);
}

#[tokio::test]
async fn test_run_propagates_start_failure() {
    let log = Recorder::new();
    let (mut app, _host) = test_app();
    app.register(RecordingPlugin::new("dependent", &log).depends_on("missing").shared());

    let err = app.run().await.unwrap_err();
    assert_eq!(err.code(), Some(PLUGIN_DEPENDENCY));
    assert!(!app.is_running());
}
