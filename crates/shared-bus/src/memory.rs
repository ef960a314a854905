//! # In-Memory Topic Exchange
//!
//! A process-local broker with the same routing and acknowledgement rules as
//! the AMQP transport. Suitable for tests and single-process deployments;
//! clones share the same exchanges, so several "services" in one process see
//! each other's events.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::RoutingKey;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::BrokerError;
use crate::topology::{BindingKey, ExchangeSpec};
use crate::transport::{Acknowledger, Channel, Delivery, DeliveryStream, Transport};

/// In-memory implementation of the broker transport.
#[derive(Clone)]
pub struct InMemoryTransport {
    broker: Arc<Broker>,
}

struct Broker {
    exchanges: Mutex<HashMap<String, Arc<MemoryExchange>>>,
    online: AtomicBool,
    connections_opened: AtomicU64,
    /// Bumped when every connection is severed; channels from an older
    /// generation are dead.
    generation: AtomicU64,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            broker: Arc::new(Broker {
                exchanges: Mutex::new(HashMap::new()),
                online: AtomicBool::new(true),
                connections_opened: AtomicU64::new(0),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Take the broker offline (or back online).
    ///
    /// While offline, `open` fails with `Unavailable` and open channels refuse
    /// to publish or bind.
    pub fn set_online(&self, online: bool) {
        self.broker.online.store(online, Ordering::SeqCst);
        info!(online, "In-memory broker availability changed");
    }

    /// Sever every open connection, as a broker restart would.
    ///
    /// Existing channels report closed and their delivery streams end. The
    /// broker stays online, so new connections succeed.
    pub fn drop_connections(&self) {
        self.broker.generation.fetch_add(1, Ordering::SeqCst);
        for exchange in self.broker.exchanges.lock().values() {
            let queues: Vec<_> = exchange.queues.write().drain(..).collect();
            for queue in queues {
                queue.close();
            }
        }
        warn!("In-memory broker dropped every connection");
    }

    /// Number of successful `open` calls.
    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        self.broker.connections_opened.load(Ordering::Relaxed)
    }

    /// Number of queues currently bound to `exchange`.
    #[must_use]
    pub fn bound_queues(&self, exchange: &str) -> usize {
        self.broker
            .exchanges
            .lock()
            .get(exchange)
            .map_or(0, |ex| ex.queues.read().len())
    }

    /// Number of messages published to `exchange` that matched no queue.
    #[must_use]
    pub fn messages_dropped(&self, exchange: &str) -> u64 {
        self.broker
            .exchanges
            .lock()
            .get(exchange)
            .map_or(0, |ex| ex.dropped.load(Ordering::Relaxed))
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn open(&self, exchange: &ExchangeSpec) -> Result<Arc<dyn Channel>, BrokerError> {
        if !self.broker.online.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable(
                "in-memory broker is offline".to_string(),
            ));
        }

        let declared = self
            .broker
            .exchanges
            .lock()
            .entry(exchange.name.clone())
            .or_insert_with(|| {
                debug!(exchange = %exchange.name, "Declaring topic exchange");
                Arc::new(MemoryExchange::new(exchange.clone()))
            })
            .clone();

        if declared.spec.durable != exchange.durable {
            return Err(BrokerError::ExchangeMismatch {
                name: exchange.name.clone(),
            });
        }

        self.broker.connections_opened.fetch_add(1, Ordering::Relaxed);

        Ok(Arc::new(MemoryChannel {
            exchange: declared,
            broker: Arc::clone(&self.broker),
            generation: self.broker.generation.load(Ordering::SeqCst),
            open: AtomicBool::new(true),
            owned_queues: Mutex::new(Vec::new()),
        }))
    }
}

#[derive(Clone)]
struct Message {
    routing_key: String,
    body: Vec<u8>,
    redelivered: bool,
}

struct MemoryExchange {
    spec: ExchangeSpec,
    queues: RwLock<Vec<Arc<MemoryQueue>>>,
    dropped: AtomicU64,
}

impl MemoryExchange {
    fn new(spec: ExchangeSpec) -> Self {
        Self {
            spec,
            queues: RwLock::new(Vec::new()),
            dropped: AtomicU64::new(0),
        }
    }

    /// Copy the message into every matching queue. Returns the number of queues reached.
    fn route(&self, routing_key: &str, body: &[u8]) -> usize {
        let queues = self.queues.read();
        let mut routed = 0;
        for queue in queues.iter().filter(|q| q.binding.matches(routing_key)) {
            queue.push_back(Message {
                routing_key: routing_key.to_string(),
                body: body.to_vec(),
                redelivered: false,
            });
            routed += 1;
        }
        routed
    }

    fn bind(&self, queue: Arc<MemoryQueue>) {
        self.queues.write().push(queue);
    }

    fn unbind(&self, queue_name: &str) {
        self.queues.write().retain(|q| q.name != queue_name);
    }
}

struct MemoryQueue {
    name: String,
    binding: BindingKey,
    messages: Mutex<VecDeque<Message>>,
    notify: Notify,
    closed: AtomicBool,
}

impl MemoryQueue {
    fn new(binding: BindingKey) -> Self {
        Self {
            name: format!("amq.gen-{}", Uuid::new_v4().simple()),
            binding,
            messages: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn push_back(&self, message: Message) {
        self.messages.lock().push_back(message);
        self.notify.notify_one();
    }

    fn push_front(&self, message: Message) {
        self.messages.lock().push_front(message);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<Message> {
        self.messages.lock().pop_front()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MemoryChannel {
    exchange: Arc<MemoryExchange>,
    broker: Arc<Broker>,
    generation: u64,
    open: AtomicBool,
    owned_queues: Mutex<Vec<Weak<MemoryQueue>>>,
}

impl MemoryChannel {
    fn is_severed(&self) -> bool {
        self.broker.generation.load(Ordering::SeqCst) != self.generation
    }

    fn ensure_usable(&self) -> Result<(), BrokerError> {
        if !self.open.load(Ordering::SeqCst) || self.is_severed() {
            return Err(BrokerError::Closed);
        }
        if !self.broker.online.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable(
                "in-memory broker is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn publish(&self, routing_key: &RoutingKey, body: Vec<u8>) -> Result<(), BrokerError> {
        self.ensure_usable()?;

        let routed = self.exchange.route(routing_key.as_str(), &body);
        if routed == 0 {
            self.exchange.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                exchange = %self.exchange.spec.name,
                routing_key = %routing_key,
                "Event dropped (no bound queues)"
            );
        } else {
            debug!(routing_key = %routing_key, queues = routed, "Event routed");
        }
        Ok(())
    }

    async fn bind_exclusive_queue(
        &self,
        binding: &BindingKey,
    ) -> Result<Box<dyn DeliveryStream>, BrokerError> {
        self.ensure_usable()?;

        let queue = Arc::new(MemoryQueue::new(binding.clone()));
        self.exchange.bind(Arc::clone(&queue));
        self.owned_queues.lock().push(Arc::downgrade(&queue));

        debug!(queue = %queue.name, binding = %binding, "Exclusive queue bound");

        Ok(Box::new(MemoryDeliveryStream {
            queue,
            exchange: Arc::clone(&self.exchange),
        }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.open.store(false, Ordering::SeqCst);
        let owned: Vec<_> = self.owned_queues.lock().drain(..).collect();
        for queue in owned.iter().filter_map(Weak::upgrade) {
            self.exchange.unbind(&queue.name);
            queue.close();
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
            && !self.is_severed()
            && self.broker.online.load(Ordering::SeqCst)
    }
}

struct MemoryDeliveryStream {
    queue: Arc<MemoryQueue>,
    exchange: Arc<MemoryExchange>,
}

#[async_trait]
impl DeliveryStream for MemoryDeliveryStream {
    fn queue_name(&self) -> &str {
        &self.queue.name
    }

    async fn next(&mut self) -> Option<Result<Delivery, BrokerError>> {
        loop {
            if let Some(message) = self.queue.pop() {
                return Some(Ok(Delivery::new(
                    message.routing_key.clone(),
                    message.body.clone(),
                    message.redelivered,
                    Box::new(MemoryAcker {
                        queue: Arc::downgrade(&self.queue),
                        message,
                    }),
                )));
            }
            if self.queue.is_closed() {
                return None;
            }
            self.queue.notify.notified().await;
        }
    }
}

impl Drop for MemoryDeliveryStream {
    fn drop(&mut self) {
        // Exclusive queues disappear with their consumer.
        self.exchange.unbind(&self.queue.name);
        self.queue.close();
        debug!(queue = %self.queue.name, "Exclusive queue deleted");
    }
}

struct MemoryAcker {
    queue: Weak<MemoryQueue>,
    message: Message,
}

#[async_trait]
impl Acknowledger for MemoryAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        if !requeue {
            return Ok(());
        }
        if let Some(queue) = self.queue.upgrade().filter(|q| !q.is_closed()) {
            queue.push_front(Message {
                redelivered: true,
                ..self.message.clone()
            });
        }
        Ok(())
    }
}
