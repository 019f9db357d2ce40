use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderCancelledEvent, OrderPaidEvent, OrderPlacedEvent};

/// The publishing side of the configured hooks. API objects hold a clone each. An event type with no hook has no
/// producers, and publishing it is a no-op.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_placed_producer: Vec<EventProducer<OrderPlacedEvent>>,
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub order_cancelled_producer: Vec<EventProducer<OrderCancelledEvent>>,
}

pub struct EventHandlers {
    pub on_order_placed: Option<EventHandler<OrderPlacedEvent>>,
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_order_cancelled: Option<EventHandler<OrderCancelledEvent>>,
}

impl EventHandlers {
    /// Creates one channel, of capacity `buffer_size`, per configured hook.
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_placed: hooks.on_order_placed.map(|f| EventHandler::new(buffer_size, f)),
            on_order_paid: hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f)),
            on_order_cancelled: hooks.on_order_cancelled.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_placed_producer: self.on_order_placed.iter().map(EventHandler::subscribe).collect(),
            order_paid_producer: self.on_order_paid.iter().map(EventHandler::subscribe).collect(),
            order_cancelled_producer: self.on_order_cancelled.iter().map(EventHandler::subscribe).collect(),
        }
    }

    /// Spawns a detached task for every configured handler.
    pub async fn start_handlers(self) {
        spawn_handler(self.on_order_placed);
        spawn_handler(self.on_order_paid);
        spawn_handler(self.on_order_cancelled);
    }
}

fn spawn_handler<E: Send + Sync + 'static>(handler: Option<EventHandler<E>>) {
    if let Some(handler) = handler {
        tokio::spawn(handler.start_handler());
    }
}

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Builder for the order lifecycle hooks.
///
/// ```rust,ignore
/// let mut hooks = EventHooks::default();
/// hooks.on_order_paid(|ev| async move { notify_seller(ev.order).await }.boxed());
/// ```
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_placed: Option<Handler<OrderPlacedEvent>>,
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_cancelled: Option<Handler<OrderCancelledEvent>>,
}

impl EventHooks {
    pub fn on_order_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPlacedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_placed = Some(Arc::new(f));
        self
    }

    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_cancelled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCancelledEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_cancelled = Some(Arc::new(f));
        self
    }
}
