use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} {value:?}.")]
pub struct ParseKindError {
	pub kind: &'static str,
	pub value: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
	Conversational,
	Profile,
	Strategy,
	Knowledge,
}
impl MemoryType {
	pub const ALL: [Self; 4] = [Self::Conversational, Self::Profile, Self::Strategy, Self::Knowledge];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Conversational => "conversational",
			Self::Profile => "profile",
			Self::Strategy => "strategy",
			Self::Knowledge => "knowledge",
		}
	}
}
impl fmt::Display for MemoryType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for MemoryType {
	type Err = ParseKindError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s.trim())
			.ok_or_else(|| ParseKindError { kind: "memory type", value: s.to_string() })
	}
}

/// The fixed responder catalogue a turn can be dispatched to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ResponderKind {
	#[serde(rename = "onboarding")]
	Onboarding,
	#[serde(rename = "producto")]
	Product,
	#[serde(rename = "legal")]
	Legal,
	#[serde(rename = "presencia_digital")]
	DigitalPresence,
	#[serde(rename = "faq")]
	Faq,
	#[serde(rename = "pricing")]
	Pricing,
}
impl ResponderKind {
	pub const ALL: [Self; 6] = [
		Self::Onboarding,
		Self::Product,
		Self::Legal,
		Self::DigitalPresence,
		Self::Faq,
		Self::Pricing,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Onboarding => "onboarding",
			Self::Product => "producto",
			Self::Legal => "legal",
			Self::DigitalPresence => "presencia_digital",
			Self::Faq => "faq",
			Self::Pricing => "pricing",
		}
	}

	/// Scales the importance of memories this responder writes.
	pub fn importance_multiplier(self) -> f32 {
		match self {
			Self::Onboarding => 1.1,
			Self::Pricing | Self::Legal => 1.0,
			Self::Product => 0.9,
			Self::DigitalPresence => 0.8,
			Self::Faq => 0.5,
		}
	}

	/// One-line description used in the routing catalogue.
	pub fn description(self) -> &'static str {
		match self {
			Self::Onboarding =>
				"Maturity assessment from the 16-question onboarding questionnaire; first contact with a new artisan.",
			Self::Product => "Product design, materials, catalogue and craft technique questions.",
			Self::Legal => "Formalization, taxes, intellectual property and contracts.",
			Self::DigitalPresence => "Social media, online shops, photography and digital marketing.",
			Self::Faq => "General questions, greetings and anything that fits no other responder.",
			Self::Pricing => "Costing, pricing strategy, margins and market price comparisons.",
		}
	}
}
impl fmt::Display for ResponderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for ResponderKind {
	type Err = ParseKindError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let needle = s.trim().to_ascii_lowercase();

		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == needle)
			.ok_or_else(|| ParseKindError { kind: "responder", value: s.to_string() })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn responder_ids_round_trip_through_serde_and_from_str() {
		for kind in ResponderKind::ALL {
			let json = serde_json::to_value(kind).expect("Failed to serialize responder.");

			assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
			assert_eq!(kind.as_str().parse::<ResponderKind>(), Ok(kind));
		}
	}

	#[test]
	fn unknown_responder_is_rejected() {
		let err = "marketing".parse::<ResponderKind>().expect_err("Expected parse failure.");

		assert_eq!(err.to_string(), "Unknown responder \"marketing\".");
	}

	#[test]
	fn memory_type_parses_trimmed_input() {
		assert_eq!(" strategy ".parse::<MemoryType>(), Ok(MemoryType::Strategy));
		assert!("episodic".parse::<MemoryType>().is_err());
	}
}
