//! Structured facts recovered from stored profile memories by line pattern.

use std::sync::LazyLock;

use regex::Regex;

static CRAFT_TYPE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?m)^\s*Tipo de artesan[ií]a:[ \t]*(.+?)\s*$").ok());
static EXPERIENCE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?m)^\s*Experiencia:[ \t]*(.+?)\s*$").ok());
static OVERALL_MATURITY: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r"(?m)^\s*(?:\*\*)?(?:Nivel de )?Madurez General:(?:\*\*)?[ \t]*(.+?)\s*$").ok()
});

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProfileFacts {
	pub craft_type: Option<String>,
	pub experience: Option<String>,
	pub overall_maturity: Option<String>,
}
impl ProfileFacts {
	pub fn is_empty(&self) -> bool {
		self.craft_type.is_none() && self.experience.is_none() && self.overall_maturity.is_none()
	}

	/// Fills fields still unset from `other`; earlier sources win.
	pub fn absorb(&mut self, other: ProfileFacts) {
		if self.craft_type.is_none() {
			self.craft_type = other.craft_type;
		}
		if self.experience.is_none() {
			self.experience = other.experience;
		}
		if self.overall_maturity.is_none() {
			self.overall_maturity = other.overall_maturity;
		}
	}
}

pub fn extract(text: &str) -> ProfileFacts {
	ProfileFacts {
		craft_type: capture(&CRAFT_TYPE, text),
		experience: capture(&EXPERIENCE, text),
		overall_maturity: capture(&OVERALL_MATURITY, text),
	}
}

fn capture(pattern: &LazyLock<Option<Regex>>, text: &str) -> Option<String> {
	pattern
		.as_ref()?
		.captures(text)
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str().trim().to_string())
		.filter(|value| !value.is_empty() && value != "N/A")
}
