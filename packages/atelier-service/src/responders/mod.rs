pub mod advisor;
pub mod onboarding;

pub use advisor::AdvisorResponder;
pub use onboarding::OnboardingResponder;

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};

use atelier_domain::ResponderKind;

use crate::{BoxFuture, ContextBundle, MemoryService, Result};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResponderOutput {
	pub answer: String,
	pub sources: Vec<String>,
	pub confidence: f32,
	pub extra: Map<String, Value>,
}

/// A domain-specialised capability the supervisor dispatches a turn to.
pub trait Responder
where
	Self: Send + Sync,
{
	fn kind(&self) -> ResponderKind;

	fn process<'a>(
		&'a self,
		input: &'a str,
		context: &'a ContextBundle,
		metadata: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<ResponderOutput>>;
}

#[derive(Clone, Default)]
pub struct ResponderSet {
	responders: HashMap<ResponderKind, Arc<dyn Responder>>,
}
impl ResponderSet {
	/// Onboarding plus one advisor for every other responder kind.
	pub fn standard(memory: Arc<MemoryService>) -> Self {
		let mut set = Self::default().with(Arc::new(OnboardingResponder::new(memory.clone())));

		for kind in ResponderKind::ALL {
			if kind != ResponderKind::Onboarding {
				set = set.with(Arc::new(AdvisorResponder::new(kind, memory.clone())));
			}
		}

		set
	}

	/// Registers `responder`, replacing any previous one of the same kind.
	pub fn with(mut self, responder: Arc<dyn Responder>) -> Self {
		self.responders.insert(responder.kind(), responder);

		self
	}

	pub fn get(&self, kind: ResponderKind) -> Option<&Arc<dyn Responder>> {
		self.responders.get(&kind)
	}
}
