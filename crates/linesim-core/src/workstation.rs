//! Single-server workstation.
//!
//! A workstation starts a job only when it is idle and every required queue
//! holds at least one component; starting consumes exactly one unit from
//! each required queue.

use crate::event::Event;
use crate::id::{ComponentId, ProductId, QueueId, WorkstationId};
use crate::queue::QueueSet;
use crate::rng::ServiceTime;

/// What a successful [`Workstation::attempt_service`] consumed and scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStart {
    pub product: ProductId,
    /// The `ProductionDone` event for the new job.
    pub departure: Event,
    /// Components taken, one per required queue, in required-queue order.
    pub consumed: Vec<(QueueId, ComponentId)>,
}

#[derive(Debug)]
pub struct Workstation {
    id: WorkstationId,
    required: &'static [QueueId],
    service: ServiceTime,
    in_service: Option<ProductId>,
    last_event_time: f64,
    total_busy: f64,
    products_made: u64,
    next_product: u64,
}

impl Workstation {
    pub fn new(id: WorkstationId, service: ServiceTime) -> Self {
        Self {
            id,
            required: id.required_queues(),
            service,
            in_service: None,
            last_event_time: 0.0,
            total_busy: 0.0,
            products_made: 0,
            next_product: 0,
        }
    }

    pub fn id(&self) -> WorkstationId {
        self.id
    }

    pub fn required_queues(&self) -> &'static [QueueId] {
        self.required
    }

    pub fn is_busy(&self) -> bool {
        self.in_service.is_some()
    }

    pub fn in_service(&self) -> Option<ProductId> {
        self.in_service
    }

    /// Products completed over the whole run.
    pub fn products_made(&self) -> u64 {
        self.products_made
    }

    /// Busy time including the ongoing job up to `as_of`.
    pub fn busy_time(&self, as_of: f64) -> f64 {
        if self.is_busy() {
            self.total_busy + (as_of - self.last_event_time)
        } else {
            self.total_busy
        }
    }

    fn accrue(&mut self, time: f64) {
        debug_assert!(time >= self.last_event_time, "workstation clock regressed");
        if self.is_busy() {
            self.total_busy += time - self.last_event_time;
        }
        self.last_event_time = time;
    }

    /// Start a job if idle and every required queue is non-empty.
    pub fn attempt_service(&mut self, queues: &mut QueueSet, time: f64) -> Option<ServiceStart> {
        self.accrue(time);
        if self.is_busy() || !queues.all_nonempty(self.required) {
            return None;
        }

        let consumed = self
            .required
            .iter()
            .map(|&q| (q, queues[q].dequeue(time)))
            .collect();

        let product = ProductId {
            station: self.id,
            sequence: self.next_product,
        };
        self.next_product += 1;
        self.in_service = Some(product);

        let duration = self.service.sample();
        Some(ServiceStart {
            product,
            departure: Event::ProductionDone {
                time: time + duration,
                station: self.id,
                product,
            },
            consumed,
        })
    }

    /// Finish the current job.
    ///
    /// # Panics
    ///
    /// Panics if the station is idle.
    pub fn complete_service(&mut self, time: f64) -> ProductId {
        self.accrue(time);
        let product = self
            .in_service
            .take()
            .unwrap_or_else(|| panic!("{} completed service while idle", self.id.name()));
        self.products_made += 1;
        product
    }

    /// Restart busy-time statistics at `time`, keeping any job in progress.
    pub fn reset_statistics(&mut self, time: f64) {
        self.last_event_time = time;
        self.total_busy = 0.0;
    }
}
