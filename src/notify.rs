use async_trait::async_trait;

use crate::models::OrderResource;

/// Side-channel notification fired after an order has been committed.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn order_placed(&self, order: &OrderResource) -> anyhow::Result<()>;
}

/// Records the notification in the application log instead of sending mail.
pub struct LogNotifier {
    recipient: String,
}

impl LogNotifier {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn order_placed(&self, order: &OrderResource) -> anyhow::Result<()> {
        let items = order.order_details.as_ref().map_or(0, Vec::len);
        let customer = order
            .customer
            .as_ref()
            .map(|c| c.username.as_str())
            .unwrap_or("-");
        tracing::info!(
            recipient = %self.recipient,
            order_id = order.id,
            customer = %customer,
            items,
            total_price = %order.total_price,
            "order notification"
        );
        Ok(())
    }
}
