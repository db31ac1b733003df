use std::time::Duration;

use tokio::time::timeout;
use typebus::{Bus, BusConfig, BusError};

const WAIT: Duration = Duration::from_millis(500);

#[tokio::test]
async fn test_subscribe_publish_unsubscribe_close() {
    let bus = Bus::new();

    let mut ch1 = bus.subscribe::<i32>().await.unwrap();
    let mut ch2 = bus.subscribe::<i32>().await.unwrap();

    bus.publish(1).await.unwrap();
    assert_eq!(ch1.recv().await, Some(1));
    assert_eq!(ch2.recv().await, Some(1));

    bus.publish(2).await.unwrap();
    assert_eq!(ch1.recv().await, Some(2));
    assert_eq!(ch2.recv().await, Some(2));

    let channel = bus.channel::<i32>().await.unwrap();
    assert!(channel.unsubscribe(&ch1));

    bus.publish(3).await.unwrap();
    assert_eq!(ch2.recv().await, Some(3));
    assert_eq!(timeout(WAIT, ch1.recv_or_default()).await.unwrap(), 0);

    assert!(channel.close());
    for _ in 0..3 {
        assert_eq!(timeout(WAIT, ch2.recv_or_default()).await.unwrap(), 0);
    }
    assert!(matches!(bus.publish(4).await, Err(BusError::Closed(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rendezvous_bus_fans_out_to_concurrent_readers() {
    let bus = Bus::with_config(BusConfig::default().rendezvous());

    let mut readers = Vec::new();
    for _ in 0..4 {
        let mut sub = bus.subscribe::<u64>().await.unwrap();
        readers.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(value) = sub.recv().await {
                seen.push(value);
            }
            seen
        }));
    }

    for value in 0..50u64 {
        bus.publish(value).await.unwrap();
    }
    assert_eq!(bus.close_all().await, 1);

    let expected: Vec<u64> = (0..50).collect();
    for reader in readers {
        let seen = timeout(Duration::from_secs(5), reader)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen, expected);
    }
}

#[tokio::test]
async fn test_buffer_capacity_bounds_unread_values() {
    let bus = Bus::with_config(BusConfig::default().subscriber_capacity(3));
    let mut sub = bus.subscribe::<u8>().await.unwrap();

    for value in 0..3u8 {
        timeout(WAIT, bus.publish(value)).await.unwrap().unwrap();
    }
    assert_eq!(sub.len(), 3);

    // A fourth publish has to wait for the reader
    assert!(timeout(Duration::from_millis(50), bus.publish(3u8))
        .await
        .is_err());

    assert_eq!(sub.recv().await, Some(0));
    timeout(WAIT, bus.publish(4u8)).await.unwrap().unwrap();

    let mut rest = Vec::new();
    while let Ok(value) = sub.try_recv() {
        rest.push(value);
    }
    assert_eq!(rest, vec![1, 2, 4]);
}
