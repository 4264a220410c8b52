//! Unit tests for the EventBus carrying session updates.

#[cfg(test)]
mod bus_tests {
    use crate::bus::{EventBus, SessionUpdate};
    use crate::events::{AgentId, ThoughtEvent};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_eventbus_new() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
    }

    #[tokio::test]
    async fn test_eventbus_publish_without_subscribers() {
        let bus = EventBus::new(100);
        // No receivers: send reports an error, nothing panics
        assert!(bus.publish(SessionUpdate::Cleared).is_err());
    }

    #[tokio::test]
    async fn test_eventbus_publish_subscribe() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        let update = SessionUpdate::Event {
            run_id,
            event: ThoughtEvent::AnalystStart {
                agent: AgentId::FundamentalAnalyst,
                instruction: "Review earnings".to_string(),
            },
        };
        assert!(bus.publish(update).is_ok());

        match rx.recv().await {
            Ok(SessionUpdate::Event { run_id: got, event }) => {
                assert_eq!(got, run_id);
                assert_eq!(event.agent(), Some(AgentId::FundamentalAnalyst));
            }
            other => panic!("Expected Event update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let run_id = Uuid::new_v4();

        bus.publish(SessionUpdate::RunFinished { run_id }).unwrap();

        assert!(matches!(rx1.recv().await, Ok(SessionUpdate::RunFinished { .. })));
        assert!(matches!(rx2.recv().await, Ok(SessionUpdate::RunFinished { .. })));
    }

    #[tokio::test]
    async fn test_eventbus_preserves_order() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        bus.publish(SessionUpdate::RunStarted {
            run_id,
            query: "AAPL outlook".to_string(),
        })
        .unwrap();
        bus.publish(SessionUpdate::RunFailed {
            run_id,
            message: "HTTP 502: Bad Gateway".to_string(),
        })
        .unwrap();
        bus.publish(SessionUpdate::RunFinished { run_id }).unwrap();

        assert!(matches!(rx.recv().await, Ok(SessionUpdate::RunStarted { .. })));
        assert!(matches!(rx.recv().await, Ok(SessionUpdate::RunFailed { .. })));
        assert!(matches!(rx.recv().await, Ok(SessionUpdate::RunFinished { .. })));
    }

    #[tokio::test]
    async fn test_eventbus_capacity() {
        let bus = EventBus::new(5);
        let _rx = bus.subscribe();

        for _ in 0..10 {
            let _ = bus.publish(SessionUpdate::Cleared);
        }
        // Should not panic - channel handles overflow by lagging
    }
}
