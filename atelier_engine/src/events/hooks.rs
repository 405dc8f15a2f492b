use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    MessageSentEvent,
    OrderCompletedEvent,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    ReviewSubmittedEvent,
};

type BoxedHook = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub order_completed_producer: Vec<EventProducer<OrderCompletedEvent>>,
    pub review_submitted_producer: Vec<EventProducer<ReviewSubmittedEvent>>,
    pub message_sent_producer: Vec<EventProducer<MessageSentEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_order_completed: Option<EventHandler<OrderCompletedEvent>>,
    pub on_review_submitted: Option<EventHandler<ReviewSubmittedEvent>>,
    pub on_message_sent: Option<EventHandler<MessageSentEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_created: hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f)),
            on_order_status_changed: hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f)),
            on_order_completed: hooks.on_order_completed.map(|f| EventHandler::new(buffer_size, f)),
            on_review_submitted: hooks.on_review_submitted.map(|f| EventHandler::new(buffer_size, f)),
            on_message_sent: hooks.on_message_sent.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_completed {
            result.order_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_review_submitted {
            result.review_submitted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_message_sent {
            result.message_sent_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns every configured handler. Each one shuts down once all of its producers are dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_completed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_review_submitted {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_message_sent {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_order_completed: Option<Handler<OrderCompletedEvent>>,
    pub on_review_submitted: Option<Handler<ReviewSubmittedEvent>>,
    pub on_message_sent: Option<Handler<MessageSentEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_order_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCompletedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_completed = Some(Arc::new(f));
        self
    }

    pub fn on_review_submitted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReviewSubmittedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_review_submitted = Some(Arc::new(f));
        self
    }

    pub fn on_message_sent<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MessageSentEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_message_sent = Some(Arc::new(f));
        self
    }
}
