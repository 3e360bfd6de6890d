use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use mvcore_commands::*;
use mvcore_permissions::{GrantTable, Issuer};

fn reply(name: &str, text: &'static str) -> CommandDefinition {
    CommandDefinition::new(name, move |_: &Invocation| Ok(CommandOutput::message(text)))
}

fn output_text(outcome: DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Executed(output) => output.messages.join("\n"),
        other => panic!("expected execution, got {:?}", other),
    }
}

fn dispatcher_with_expiry(expiry: Duration) -> CommandDispatcher {
    CommandDispatcher::new(
        Arc::new(GrantTable::new()),
        Arc::new(ConfirmationQueue::with_expiry(expiry)),
        Arc::new(ModuleCommandRegistry::new()),
    )
}

#[test]
fn test_activation_during_dispatch_never_tears() {
    let dispatcher = Arc::new(dispatcher_with_expiry(DEFAULT_EXPIRY));
    dispatcher
        .modules()
        .register_placeholder("mvp", reply("mvp", "stub"));

    let start = Arc::new(Barrier::new(5));
    let mut workers = Vec::new();
    for _ in 0..4 {
        let dispatcher = Arc::clone(&dispatcher);
        let start = Arc::clone(&start);
        workers.push(thread::spawn(move || {
            start.wait();
            for _ in 0..500 {
                let text = output_text(
                    dispatcher
                        .dispatch(&Issuer::console(), "mvp", vec![])
                        .unwrap(),
                );
                assert!(text == "stub" || text == "real", "torn dispatch: {}", text);
            }
        }));
    }

    start.wait();
    let previous = dispatcher.modules().activate_module("mvp", reply("mvp", "real"));
    assert_eq!(previous.unwrap().name, "mvp");

    for _ in 0..20 {
        let text = output_text(dispatcher.dispatch(&Issuer::console(), "mvp", vec![]).unwrap());
        assert_eq!(text, "real");
    }

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_concurrent_activation_last_write_wins() {
    let registry = Arc::new(ModuleCommandRegistry::new());
    registry.register_placeholder("mvinv", reply("mvinv", "stub"));

    let handles: Vec<_> = ["first", "second", "third"]
        .into_iter()
        .map(|label| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry.activate_module("mvinv", reply("mvinv", label));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 1);
    assert!(registry.is_active("mvinv"));
    let inv = Invocation::new(Issuer::console(), "mvinv", vec![]);
    let text = registry.get("mvinv").unwrap().execute(&inv).unwrap().messages.join("");
    assert!(["first", "second", "third"].contains(&text.as_str()));
}

#[test]
fn test_concurrent_enqueue_and_confirm_run_each_action_once() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let queue = Arc::new(ConfirmationQueue::<DeferredAction>::new());
    let runs: Arc<Vec<AtomicUsize>> =
        Arc::new((0..THREADS * ROUNDS).map(|_| AtomicUsize::new(0)).collect());
    let confirms = Arc::new(AtomicUsize::new(0));
    let issuer = Issuer::console().id;
    let start = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let queue = Arc::clone(&queue);
            let runs = Arc::clone(&runs);
            let confirms = Arc::clone(&confirms);
            let issuer = issuer.clone();
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for round in 0..ROUNDS {
                    let slot = t * ROUNDS + round;
                    let runs = Arc::clone(&runs);
                    let action: DeferredAction = Box::new(move || {
                        runs[slot].fetch_add(1, Ordering::SeqCst);
                        Ok(CommandOutput::new())
                    });
                    queue.enqueue(&issuer, action, Some(format!("purge {}", slot)));

                    if let Some(action) = queue.try_confirm(&issuer) {
                        confirms.fetch_add(1, Ordering::SeqCst);
                        action().unwrap();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(queue.len() <= 1);
    let total: usize = runs.iter().map(|r| r.load(Ordering::SeqCst)).sum();
    assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) <= 1));
    assert_eq!(total, confirms.load(Ordering::SeqCst));

    // Whatever is left is still confirmable exactly once
    let leftover = queue.len();
    if let Some(action) = queue.try_confirm(&issuer) {
        action().unwrap();
    }
    assert!(queue.try_confirm(&issuer).is_none());
    let total: usize = runs.iter().map(|r| r.load(Ordering::SeqCst)).sum();
    assert_eq!(total, confirms.load(Ordering::SeqCst) + leftover);
    assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) <= 1));
}

#[test]
fn test_confirmation_expires() {
    let mut dispatcher = dispatcher_with_expiry(Duration::from_millis(20));
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    dispatcher
        .register_command(
            CommandDefinition::new("purge", move |_: &Invocation| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(CommandOutput::new())
            })
            .with_confirmation(true),
        )
        .unwrap();

    let console = Issuer::console();
    dispatcher.dispatch(&console, "purge", vec![]).unwrap();
    thread::sleep(Duration::from_millis(50));

    assert_eq!(
        dispatcher.dispatch(&console, "confirm", vec![]).unwrap(),
        DispatchOutcome::NothingToConfirm
    );
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_pending_entries_are_per_issuer() {
    let mut dispatcher = dispatcher_with_expiry(DEFAULT_EXPIRY);
    dispatcher
        .register_command(
            CommandDefinition::new("delete", |inv: &Invocation| {
                Ok(CommandOutput::message(format!(
                    "{} deleted {}",
                    inv.issuer.name,
                    inv.arg(0).unwrap_or_default()
                )))
            })
            .with_confirmation(true),
        )
        .unwrap();

    let console = Issuer::console();
    let other_console = Issuer {
        id: "remote-console".into(),
        ..Issuer::console()
    };

    dispatcher.dispatch(&console, "delete", vec!["worldA".into()]).unwrap();
    dispatcher
        .dispatch(&other_console, "delete", vec!["worldB".into()])
        .unwrap();

    assert_eq!(
        output_text(dispatcher.dispatch(&other_console, "confirm", vec![]).unwrap()),
        "CONSOLE deleted worldB"
    );
    assert_eq!(
        output_text(dispatcher.dispatch(&console, "confirm", vec![]).unwrap()),
        "CONSOLE deleted worldA"
    );
}

#[test]
fn test_static_commands_shadow_module_commands() {
    let mut dispatcher = dispatcher_with_expiry(DEFAULT_EXPIRY);
    dispatcher.register_command(reply("mvp", "builtin")).unwrap();
    dispatcher
        .modules()
        .activate_module("mvp", reply("mvp", "module"));

    let text = output_text(dispatcher.dispatch(&Issuer::console(), "mvp", vec![]).unwrap());
    assert_eq!(text, "builtin");
}

#[test]
fn test_alias_dispatch_uses_canonical_name_for_confirmation() {
    let mut dispatcher = dispatcher_with_expiry(DEFAULT_EXPIRY);
    dispatcher
        .register_command(
            reply("regen", "regenerated")
                .with_alias("regenerate")
                .with_confirmation(true),
        )
        .unwrap();

    let console = Issuer::console();
    let outcome = dispatcher
        .dispatch(&console, "regenerate", vec!["worldB".into()])
        .unwrap();
    assert!(matches!(
        outcome,
        DispatchOutcome::ConfirmationRequired { ref coalesce_key, .. } if coalesce_key == "regen worldB"
    ));

    // Re-issuing under the canonical name confirms the same flow
    let text = output_text(
        dispatcher
            .dispatch(&console, "regen", vec!["worldB".into()])
            .unwrap(),
    );
    assert_eq!(text, "regenerated");
}
