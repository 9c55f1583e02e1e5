//! Specialist routing

use super::topic::Topic;
use super::traits::Specialist;
use std::sync::Arc;

/// Where a resolved topic label leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Specialist(Topic),
    /// Label outside the known set; no specialist is invoked
    Unroutable(String),
}

impl Route {
    pub fn for_label(label: &str) -> Self {
        match Topic::parse(label) {
            Some(topic) => Route::Specialist(topic),
            None => Route::Unroutable(label.to_string()),
        }
    }
}

/// Diagnostic answer for an unroutable classification
pub fn unroutable_answer(label: &str) -> String {
    format!(
        "I couldn't classify your question into water, food, transport, or energy. Classification: {label}"
    )
}

/// Fixed binding of the four topics to their specialists
#[derive(Clone)]
pub struct SpecialistRouter {
    food: Arc<dyn Specialist>,
    water: Arc<dyn Specialist>,
    transport: Arc<dyn Specialist>,
    energy: Arc<dyn Specialist>,
}

impl SpecialistRouter {
    pub fn new(
        food: Arc<dyn Specialist>,
        water: Arc<dyn Specialist>,
        transport: Arc<dyn Specialist>,
        energy: Arc<dyn Specialist>,
    ) -> Self {
        Self {
            food,
            water,
            transport,
            energy,
        }
    }

    /// Build a router by asking `make` for each topic's specialist
    pub fn from_fn(mut make: impl FnMut(Topic) -> Arc<dyn Specialist>) -> Self {
        Self::new(
            make(Topic::Food),
            make(Topic::Water),
            make(Topic::Transport),
            make(Topic::Energy),
        )
    }

    pub fn specialist(&self, topic: Topic) -> &Arc<dyn Specialist> {
        match topic {
            Topic::Food => &self.food,
            Topic::Water => &self.water,
            Topic::Transport => &self.transport,
            Topic::Energy => &self.energy,
        }
    }
}
