use std::time::Duration;

use gridwatch_engine::{Topic, ENERGY_UPDATE};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn drain<T>(sub: &mut gridwatch_engine::Subscription<T>) -> Vec<T> {
    let mut values = Vec::new();
    while let Some(value) = sub.try_recv() {
        values.push(value);
    }
    values
}

#[test]
fn late_subscriber_first_sees_latest_value() {
    let topic = Topic::new("numbers");
    topic.publish(1);
    topic.publish(2);

    let mut sub = topic.subscribe();
    assert_eq!(sub.try_recv(), Some(2));
    assert_eq!(sub.try_recv(), None);
}

#[test]
fn attached_subscriber_receives_every_publish_in_order() {
    let topic = Topic::new("numbers");
    let mut sub = topic.subscribe();

    let published: Vec<u32> = (1..=50).collect();
    for value in &published {
        topic.publish(*value);
    }

    assert_eq!(drain(&mut sub), published);
}

#[test]
fn every_subscriber_gets_the_same_values() {
    let topic = Topic::new("numbers");
    let mut first = topic.subscribe();
    topic.publish(10);
    let mut second = topic.subscribe();
    topic.publish(11);
    topic.publish(12);

    assert_eq!(drain(&mut first), vec![10, 11, 12]);
    assert_eq!(drain(&mut second), vec![10, 11, 12]);
}

#[tokio::test]
async fn energy_topic_replays_latest_then_waits_for_next_publish() {
    let topic: Topic<Value> = Topic::new(ENERGY_UPDATE);
    topic.publish(json!({"total": 100}));
    topic.publish(json!({"total": 120}));

    let mut sub = topic.subscribe();
    assert_eq!(sub.recv().await, Some(json!({"total": 120})));

    // Nothing further until the next publish.
    let idle = tokio::time::timeout(Duration::from_millis(50), sub.recv()).await;
    assert!(idle.is_err());

    topic.publish(json!({"total": 130}));
    assert_eq!(sub.recv().await, Some(json!({"total": 130})));
    assert_eq!(sub.try_recv(), None);
}

#[test]
fn unsubscribed_handle_sees_nothing_more() {
    let topic = Topic::new("numbers");
    let mut leaving = topic.subscribe();
    let mut staying = topic.subscribe();

    topic.publish(1);
    leaving.unsubscribe();
    leaving.unsubscribe();
    topic.publish(2);

    assert_eq!(leaving.try_recv(), None);
    assert!(!leaving.is_active());
    assert_eq!(drain(&mut staying), vec![1, 2]);
    assert_eq!(topic.subscriber_count(), 1);
}

#[tokio::test]
async fn recv_ends_when_unsubscribed() {
    let topic = Topic::new("numbers");
    let mut sub = topic.subscribe();
    topic.publish(5);
    sub.unsubscribe();

    assert_eq!(sub.recv().await, None);
}

#[tokio::test]
async fn recv_ends_when_topic_is_dropped() {
    let topic = Topic::new("numbers");
    let mut sub = topic.subscribe();
    topic.publish(5);
    drop(topic);

    assert_eq!(sub.recv().await, Some(5));
    assert_eq!(sub.recv().await, None);
}

#[tokio::test]
async fn subscriber_on_another_task_observes_publishes() {
    let topic = Topic::new("numbers");
    let mut sub = topic.subscribe();
    let reader = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(value) = sub.recv().await {
            seen.push(value);
            if seen.len() == 3 {
                break;
            }
        }
        seen
    });

    topic.publish(1);
    topic.publish(2);
    topic.publish(3);

    assert_eq!(reader.await.unwrap(), vec![1, 2, 3]);
}
