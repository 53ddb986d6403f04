use crate::{ConnectionState, Effect, LinkState, Msg};

/// Pure update function: applies a message to the link state and returns the
/// effects the engine must carry out, in order.
pub fn update(mut state: LinkState, msg: Msg) -> (LinkState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start => match state.connection() {
            ConnectionState::Disconnected => {
                // An external start is a restart: the retry budget is refilled.
                let mut effects = Vec::with_capacity(2);
                if state.retry_pending() {
                    state.set_retry_pending(false);
                    effects.push(Effect::CancelRetry);
                }
                state.policy_mut().reset();
                state.set_exhausted(false);
                state.set_connection(ConnectionState::Connecting);
                effects.push(Effect::OpenConnection);
                effects
            }
            ConnectionState::Connecting | ConnectionState::Connected => Vec::new(),
        },
        Msg::Opened => {
            if state.connection() == ConnectionState::Connecting {
                state.set_connection(ConnectionState::Connected);
                state.policy_mut().reset();
                vec![Effect::PublishStatus(true)]
            } else {
                Vec::new()
            }
        }
        Msg::Closed => match state.connection() {
            ConnectionState::Disconnected => Vec::new(),
            ConnectionState::Connecting | ConnectionState::Connected => {
                state.set_connection(ConnectionState::Disconnected);
                let mut effects = vec![Effect::PublishStatus(false)];
                let delay = state.policy().interval;
                match state.policy_mut().next_attempt() {
                    Some(attempt) => {
                        state.set_retry_pending(true);
                        effects.push(Effect::ScheduleRetry { attempt, delay });
                    }
                    None => state.set_exhausted(true),
                }
                effects
            }
        },
        Msg::RetryElapsed => {
            if state.retry_pending() && state.connection() == ConnectionState::Disconnected {
                state.set_retry_pending(false);
                state.set_connection(ConnectionState::Connecting);
                vec![Effect::OpenConnection]
            } else {
                Vec::new()
            }
        }
        Msg::Stop => {
            let mut effects = Vec::new();
            if state.retry_pending() {
                state.set_retry_pending(false);
                effects.push(Effect::CancelRetry);
            }
            match state.connection() {
                ConnectionState::Disconnected => {}
                ConnectionState::Connecting => {
                    state.set_connection(ConnectionState::Disconnected);
                    effects.push(Effect::CloseConnection);
                }
                ConnectionState::Connected => {
                    state.set_connection(ConnectionState::Disconnected);
                    effects.push(Effect::CloseConnection);
                    effects.push(Effect::PublishStatus(false));
                }
            }
            effects
        }
    };

    (state, effects)
}
