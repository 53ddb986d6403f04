use std::sync::Once;
use std::time::Duration;

use gridwatch_core::{update, ConnectionState, Effect, LinkState, Msg, ReconnectPolicy};
use pretty_assertions::assert_eq;

const INTERVAL: Duration = Duration::from_millis(5000);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(gridwatch_logging::initialize_for_tests);
}

fn link(max_attempts: u32) -> LinkState {
    LinkState::new(ReconnectPolicy::new(max_attempts, INTERVAL))
}

/// Applies a failure and, when a retry is scheduled, lets it fire.
fn fail_and_retry(state: LinkState) -> (LinkState, Vec<Effect>) {
    let (state, mut effects) = update(state, Msg::Closed);
    if state.retry_pending() {
        let (state, retry_effects) = update(state, Msg::RetryElapsed);
        effects.extend(retry_effects);
        return (state, effects);
    }
    (state, effects)
}

fn count_opens(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::OpenConnection))
        .count()
}

#[test]
fn start_opens_a_connection() {
    init_logging();
    let (mut state, effects) = update(link(5), Msg::Start);

    assert_eq!(effects, vec![Effect::OpenConnection]);
    assert_eq!(state.connection(), ConnectionState::Connecting);
    assert!(state.consume_dirty());
}

#[test]
fn open_success_publishes_true_and_resets_attempts() {
    init_logging();
    let (state, _) = update(link(5), Msg::Start);
    let (state, _) = fail_and_retry(state);
    assert_eq!(state.policy().attempts_so_far(), 1);

    let (state, effects) = update(state, Msg::Opened);
    assert_eq!(effects, vec![Effect::PublishStatus(true)]);
    assert_eq!(state.connection(), ConnectionState::Connected);
    assert_eq!(state.policy().attempts_so_far(), 0);
    assert!(state.view().connected());
}

#[test]
fn close_publishes_false_and_schedules_one_retry() {
    init_logging();
    let (state, _) = update(link(5), Msg::Start);
    let (state, _) = update(state, Msg::Opened);
    let (state, effects) = update(state, Msg::Closed);

    assert_eq!(
        effects,
        vec![
            Effect::PublishStatus(false),
            Effect::ScheduleRetry {
                attempt: 1,
                delay: INTERVAL
            },
        ]
    );
    assert_eq!(state.connection(), ConnectionState::Disconnected);
    assert!(state.retry_pending());

    // A duplicate close for the same outage does not schedule a second retry.
    let (_state, effects) = update(state, Msg::Closed);
    assert!(effects.is_empty());
}

#[test]
fn retries_stop_once_the_budget_is_spent() {
    init_logging();
    let max_attempts = 3;
    let (mut state, effects) = update(link(max_attempts), Msg::Start);
    let mut opens = count_opens(&effects);

    for _ in 0..10 {
        let (next, effects) = fail_and_retry(state);
        opens += count_opens(&effects);
        state = next;
    }

    // The initial attempt plus one per retry.
    assert_eq!(opens, 1 + max_attempts as usize);
    let view = state.view();
    assert_eq!(view.state, ConnectionState::Disconnected);
    assert!(view.exhausted);
    assert!(!view.retry_pending);
    assert!(!view.connected());
}

#[test]
fn success_between_failures_refills_the_budget() {
    init_logging();
    let max_attempts = 4;
    let (state, _) = update(link(max_attempts), Msg::Start);

    let (state, _) = fail_and_retry(state);
    let (state, _) = fail_and_retry(state);
    assert_eq!(state.policy().attempts_so_far(), 2);

    let (mut state, _) = update(state, Msg::Opened);
    let mut reconnects = 0;
    loop {
        let (next, effects) = fail_and_retry(state);
        reconnects += count_opens(&effects);
        state = next;
        if state.view().exhausted {
            break;
        }
    }

    assert_eq!(reconnects, max_attempts as usize);
}

#[test]
fn stale_retry_after_stop_is_ignored() {
    init_logging();
    let (state, _) = update(link(5), Msg::Start);
    let (state, _) = update(state, Msg::Closed);
    let (state, effects) = update(state, Msg::Stop);
    assert_eq!(effects, vec![Effect::CancelRetry]);

    let (state, effects) = update(state, Msg::RetryElapsed);
    assert!(effects.is_empty());
    assert_eq!(state.connection(), ConnectionState::Disconnected);
}

#[test]
fn stop_is_idempotent() {
    init_logging();
    let (state, _) = update(link(5), Msg::Start);
    let (state, _) = update(state, Msg::Opened);

    let (state, effects) = update(state, Msg::Stop);
    assert_eq!(
        effects,
        vec![Effect::CloseConnection, Effect::PublishStatus(false)]
    );

    let (state, effects) = update(state, Msg::Stop);
    assert!(effects.is_empty());
    let (_state, effects) = update(state, Msg::Stop);
    assert!(effects.is_empty());
}

#[test]
fn stop_while_connecting_closes_without_status_change() {
    init_logging();
    let (state, _) = update(link(5), Msg::Start);
    let (state, effects) = update(state, Msg::Stop);

    assert_eq!(effects, vec![Effect::CloseConnection]);
    // A late open outcome for the abandoned attempt changes nothing.
    let (state, effects) = update(state, Msg::Opened);
    assert!(effects.is_empty());
    assert_eq!(state.connection(), ConnectionState::Disconnected);
}

#[test]
fn external_start_restarts_after_exhaustion() {
    init_logging();
    let (state, _) = update(link(1), Msg::Start);
    let (state, _) = fail_and_retry(state);
    let (state, _) = fail_and_retry(state);
    assert!(state.view().exhausted);

    let (state, effects) = update(state, Msg::Start);
    assert_eq!(effects, vec![Effect::OpenConnection]);
    assert!(!state.view().exhausted);
    assert_eq!(state.policy().attempts_so_far(), 0);
}

#[test]
fn start_during_pending_retry_connects_immediately() {
    init_logging();
    let (state, _) = update(link(5), Msg::Start);
    let (state, _) = update(state, Msg::Closed);

    let (state, effects) = update(state, Msg::Start);
    assert_eq!(effects, vec![Effect::CancelRetry, Effect::OpenConnection]);
    assert!(!state.retry_pending());
}

#[test]
fn start_while_connected_is_a_noop() {
    init_logging();
    let (state, _) = update(link(5), Msg::Start);
    let (state, _) = update(state, Msg::Opened);
    let (next, effects) = update(state.clone(), Msg::Start);

    assert!(effects.is_empty());
    assert_eq!(next.connection(), state.connection());
}

#[test]
fn zero_attempt_budget_never_retries() {
    init_logging();
    let (state, _) = update(link(0), Msg::Start);
    let (state, effects) = update(state, Msg::Closed);

    assert_eq!(effects, vec![Effect::PublishStatus(false)]);
    assert!(state.view().exhausted);
}
