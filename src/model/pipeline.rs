// src/model/pipeline.rs

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

/// A replenishment order in transit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Order {
    pub created_day: usize,
    pub arrival_day: usize,
    pub quantity: f64,
}

/// Outstanding orders, delivered a fixed lead time after they are placed.
#[derive(Debug, Clone)]
pub struct OrderPipeline {
    orders: VecDeque<Order>,
    lead_time: usize,
    total_placed: f64,
    total_delivered: f64,
    orders_placed: usize,
}

impl OrderPipeline {
    pub fn new(lead_time: usize) -> Self {
        Self {
            orders: VecDeque::new(),
            lead_time,
            total_placed: 0.0,
            total_delivered: 0.0,
            orders_placed: 0,
        }
    }

    pub fn lead_time(&self) -> usize {
        self.lead_time
    }

    /// Places an order on `day`; it arrives on `day + lead_time`.
    pub fn place_order(&mut self, day: usize, quantity: f64) -> Order {
        let order = Order {
            created_day: day,
            arrival_day: day + self.lead_time,
            quantity,
        };
        debug!(day, arrival_day = order.arrival_day, quantity, "order placed");

        self.orders.push_back(order);
        self.total_placed += quantity;
        self.orders_placed += 1;
        order
    }

    /// Delivers every order due on `day` and returns the delivered quantity.
    ///
    /// Delivered orders leave the pipeline, so a second call for the same day
    /// returns 0.
    pub fn manage_order(&mut self, day: usize) -> f64 {
        let mut delivered = 0.0;
        self.orders.retain(|order| {
            if order.arrival_day == day {
                delivered += order.quantity;
                false
            } else {
                true
            }
        });
        self.total_delivered += delivered;
        delivered
    }

    /// Quantity still in transit after `day` (orders due today excluded).
    pub fn get_incoming_orders(&self, day: usize) -> f64 {
        self.orders
            .iter()
            .filter(|order| order.arrival_day > day)
            .map(|order| order.quantity)
            .sum()
    }

    /// Quantity scheduled to arrive exactly on `day`.
    pub fn arriving_on(&self, day: usize) -> f64 {
        self.orders
            .iter()
            .filter(|order| order.arrival_day == day)
            .map(|order| order.quantity)
            .sum()
    }

    /// Quantity of every order not yet delivered.
    pub fn outstanding(&self) -> f64 {
        self.orders.iter().map(|order| order.quantity).sum()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn total_placed(&self) -> f64 {
        self.total_placed
    }

    pub fn total_delivered(&self) -> f64 {
        self.total_delivered
    }

    pub fn orders_placed(&self) -> usize {
        self.orders_placed
    }
}
