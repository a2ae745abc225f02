use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::entities::inventory_flow::FlowType;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with the receiving end of a bounded channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Hands events for already committed work to the channel without
    /// waiting. Events that do not fit, or find the channel closed, are
    /// counted and logged.
    pub fn publish_all<I>(&self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            let name = event.name();
            match self.sender.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    counter!("stockflow_events.dropped", 1, "event" => name, "reason" => "full");
                    warn!(event = name, "Event channel full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    counter!("stockflow_events.dropped", 1, "event" => name, "reason" => "closed");
                    warn!(event = name, "Event channel closed, event dropped");
                }
            }
        }
    }
}

/// Facts the movement engine announces after a unit of work commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StockTransferCreated {
        team_id: i32,
        order_id: i32,
        number: String,
        total_quantity: Decimal,
        timestamp: DateTime<Utc>,
    },
    StockTransferVoided {
        team_id: i32,
        order_id: i32,
        timestamp: DateTime<Utc>,
    },
    /// One balance row changed
    InventoryAdjusted {
        team_id: i32,
        warehouse_id: i32,
        goods_id: i32,
        flow_type: FlowType,
        quantity_before: Decimal,
        quantity_after: Decimal,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StockTransferCreated { .. } => "stock_transfer_created",
            Event::StockTransferVoided { .. } => "stock_transfer_voided",
            Event::InventoryAdjusted { .. } => "inventory_adjusted",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("stockflow_events.processed", 1, "event" => event.name());

        match event {
            Event::StockTransferCreated {
                team_id,
                order_id,
                number,
                total_quantity,
                ..
            } => {
                info!(team_id, order_id, %number, %total_quantity, "Stock transfer created");
            }
            Event::StockTransferVoided {
                team_id, order_id, ..
            } => {
                info!(team_id, order_id, "Stock transfer voided");
            }
            Event::InventoryAdjusted {
                team_id,
                warehouse_id,
                goods_id,
                flow_type,
                quantity_before,
                quantity_after,
            } => {
                if quantity_after < Decimal::ZERO {
                    warn!(
                        team_id,
                        warehouse_id,
                        goods_id,
                        %quantity_after,
                        "Inventory balance is negative"
                    );
                }
                info!(
                    team_id,
                    warehouse_id,
                    goods_id,
                    ?flow_type,
                    %quantity_before,
                    %quantity_after,
                    "Inventory adjusted"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn published_events_reach_the_receiver_in_order() {
        let (sender, mut rx) = EventSender::channel(4);
        sender
            .publish_all(vec![
                Event::StockTransferVoided {
                    team_id: 1,
                    order_id: 7,
                    timestamp: Utc::now(),
                },
                Event::InventoryAdjusted {
                    team_id: 1,
                    warehouse_id: 2,
                    goods_id: 3,
                    flow_type: FlowType::VoidStockTransferOut,
                    quantity_before: Decimal::from(40),
                    quantity_after: Decimal::from(50),
                },
            ]);

        assert_eq!(rx.recv().await.map(|e| e.name()), Some("stock_transfer_voided"));
        assert_eq!(rx.recv().await.map(|e| e.name()), Some("inventory_adjusted"));
    }

    #[tokio::test]
    async fn closed_channel_does_not_fail_publishing() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);

        assert!(sender
            .send(Event::StockTransferVoided {
                team_id: 1,
                order_id: 1,
                timestamp: Utc::now(),
            })
            .await
            .is_err());

        sender
            .publish_all(vec![Event::StockTransferVoided {
                team_id: 1,
                order_id: 1,
                timestamp: Utc::now(),
            }]);
    }

    #[test]
    fn full_channel_drops_instead_of_waiting() {
        let (sender, mut rx) = EventSender::channel(1);
        let voided = |order_id| Event::StockTransferVoided {
            team_id: 1,
            order_id,
            timestamp: Utc::now(),
        };

        sender.publish_all(vec![voided(1), voided(2), voided(3)]);

        assert_matches!(rx.try_recv(), Ok(Event::StockTransferVoided { order_id: 1, .. }));
        assert!(rx.try_recv().is_err());
    }
}
