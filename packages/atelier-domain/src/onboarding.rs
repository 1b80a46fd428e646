//! The 16-question onboarding questionnaire and the maturity assessment derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::json;

pub static REQUIRED_KEYS: [&str; 16] = [
	"Q1", "Q2", "Q3", "Q4", "Q5", "Q6", "Q7", "Q8", "Q9", "Q10", "Q11", "Q12", "Q13", "Q14", "Q15",
	"Q16",
];
/// The question whose answer names the artisan's craft.
pub const CRAFT_TYPE_KEY: &str = "Q1";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Category {
	CraftIdentity,
	CommercialReality,
	CustomersAndMarket,
	OperationsAndGrowth,
}
impl Category {
	pub const ALL: [Self; 4] = [
		Self::CraftIdentity,
		Self::CommercialReality,
		Self::CustomersAndMarket,
		Self::OperationsAndGrowth,
	];

	pub fn title(self) -> &'static str {
		match self {
			Self::CraftIdentity => "Identidad Artesanal",
			Self::CommercialReality => "Realidad Comercial",
			Self::CustomersAndMarket => "Clientes y Mercado",
			Self::OperationsAndGrowth => "Operación y Crecimiento",
		}
	}

	/// Key used in the profile maturity snapshot.
	pub fn snapshot_key(self) -> &'static str {
		match self {
			Self::CraftIdentity => "identidad_artesanal",
			Self::CommercialReality => "realidad_comercial",
			Self::CustomersAndMarket => "clientes_y_mercado",
			Self::OperationsAndGrowth => "operacion_y_crecimiento",
		}
	}

	/// Key the assessment model uses for this category's level.
	pub fn assessment_key(self) -> String {
		format!("madurez_{}", self.snapshot_key())
	}

	pub fn questions(self) -> &'static [&'static str] {
		let start = match self {
			Self::CraftIdentity => 0,
			Self::CommercialReality => 4,
			Self::CustomersAndMarket => 8,
			Self::OperationsAndGrowth => 12,
		};

		&REQUIRED_KEYS[start..start + 4]
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub enum MaturityLevel {
	Inicial,
	Intermedio,
	Avanzado,
}
impl MaturityLevel {
	pub fn from_label(label: &str) -> Option<Self> {
		match label.trim().to_lowercase().as_str() {
			"inicial" => Some(Self::Inicial),
			"intermedio" => Some(Self::Intermedio),
			"avanzado" => Some(Self::Avanzado),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Inicial => "Inicial",
			Self::Intermedio => "Intermedio",
			Self::Avanzado => "Avanzado",
		}
	}

	fn rank(self) -> f32 {
		match self {
			Self::Inicial => 1.0,
			Self::Intermedio => 2.0,
			Self::Avanzado => 3.0,
		}
	}

	/// Rounds the mean rank of `levels` to the nearest level; empty input is `Inicial`.
	pub fn overall(levels: &[Self]) -> Self {
		if levels.is_empty() {
			return Self::Inicial;
		}

		let mean = levels.iter().map(|level| level.rank()).sum::<f32>() / levels.len() as f32;

		if mean < 1.5 {
			Self::Inicial
		} else if mean < 2.5 {
			Self::Intermedio
		} else {
			Self::Avanzado
		}
	}
}
impl fmt::Display for MaturityLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Questionnaire answers keyed `Q1`..`Q16`.
#[derive(Clone, Debug, PartialEq)]
pub struct Answers(Map<String, Value>);
impl Answers {
	/// Accepts `input` only when it holds a JSON object with every required key.
	pub fn parse(input: &str) -> Option<Self> {
		let map = json::parse_lenient_object(input)?;

		REQUIRED_KEYS.iter().all(|key| map.contains_key(*key)).then_some(Self(map))
	}

	pub fn answer_text(&self, key: &str) -> String {
		match self.0.get(key) {
			Some(Value::String(text)) => text.clone(),
			Some(Value::Null) | None => "N/A".to_string(),
			Some(other) => other.to_string(),
		}
	}

	pub fn craft_type(&self) -> String {
		self.answer_text(CRAFT_TYPE_KEY)
	}
}

pub fn is_onboarding_payload(input: &str) -> bool {
	Answers::parse(input).is_some()
}

/// Renders the answers grouped by category for the assessment prompt.
pub fn assessment_message(answers: &Answers) -> String {
	let mut parts = vec!["Respuestas del artesano al cuestionario de diagnóstico:".to_string()];

	for category in Category::ALL {
		let questions = category.questions();
		let (first, last) = (questions[0], questions[questions.len() - 1]);

		parts.push(format!("\n### {} ({first}-{last})", category.title()));

		for key in questions {
			parts.push(format!("{key}: {}", answers.answer_text(key)));
		}
	}

	parts.push(
		"\nPor favor, analiza estas respuestas y genera la evaluación completa según las instrucciones del sistema."
			.to_string(),
	);

	parts.join("\n")
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryAssessment {
	pub category: Category,
	pub level: MaturityLevel,
	pub reason: String,
	pub tasks: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assessment {
	pub categories: Vec<CategoryAssessment>,
	pub overall: MaturityLevel,
	pub summary: String,
	pub raw: Map<String, Value>,
}
impl Assessment {
	/// Builds an assessment from the model's JSON, filling gaps deterministically.
	///
	/// Missing or unrecognised category levels count as `Inicial`; a missing overall level is
	/// derived from the category levels.
	pub fn from_model_output(raw: Map<String, Value>) -> Self {
		let categories = Category::ALL
			.into_iter()
			.map(|category| {
				let key = category.assessment_key();
				let level = raw
					.get(&key)
					.and_then(Value::as_str)
					.and_then(MaturityLevel::from_label)
					.unwrap_or(MaturityLevel::Inicial);
				let reason = raw
					.get(&format!("{key}_razon"))
					.and_then(Value::as_str)
					.unwrap_or_default()
					.to_string();
				let tasks = raw.get(&format!("{key}_tareas")).cloned().unwrap_or(Value::Null);

				CategoryAssessment { category, level, reason, tasks }
			})
			.collect::<Vec<_>>();
		let overall = raw
			.get("madurez_general")
			.and_then(Value::as_str)
			.and_then(MaturityLevel::from_label)
			.unwrap_or_else(|| {
				MaturityLevel::overall(&categories.iter().map(|c| c.level).collect::<Vec<_>>())
			});
		let summary = raw
			.get("resumen")
			.and_then(Value::as_str)
			.filter(|text| !text.trim().is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| format!("Artisan with {overall} maturity level"));

		Self { categories, overall, summary, raw }
	}

	/// Category levels plus `general`, keyed for the profile maturity snapshot.
	pub fn maturity_snapshot(&self) -> Map<String, Value> {
		let mut snapshot = Map::new();

		for entry in &self.categories {
			snapshot.insert(
				entry.category.snapshot_key().to_string(),
				Value::String(entry.level.as_str().to_string()),
			);
		}

		snapshot.insert("general".to_string(), Value::String(self.overall.as_str().to_string()));

		snapshot
	}

	/// Up to three recommended tasks for the craft-identity category.
	pub fn top_priorities(&self) -> Value {
		let tasks = self
			.categories
			.iter()
			.find(|entry| entry.category == Category::CraftIdentity)
			.map(|entry| &entry.tasks);

		match tasks {
			Some(Value::Array(items)) => Value::Array(items.iter().take(3).cloned().collect()),
			Some(Value::String(text)) => Value::Array(
				text.lines()
					.map(|line| line.trim().trim_start_matches(['-', '*']).trim())
					.filter(|line| !line.is_empty())
					.take(3)
					.map(|line| Value::String(line.to_string()))
					.collect(),
			),
			_ => Value::Array(Vec::new()),
		}
	}

	pub fn render_markdown(&self) -> String {
		let mut out = format!(
			"## Evaluación de Madurez Empresarial\n\n**Nivel de Madurez General:** {}\n\n### Áreas Evaluadas:\n",
			self.overall
		);

		for (idx, entry) in self.categories.iter().enumerate() {
			out.push_str(&format!(
				"\n**{}. {}:** {}\n{}\n\n**Tareas recomendadas:**\n{}\n\n---\n",
				idx + 1,
				entry.category.title(),
				entry.level,
				entry.reason,
				render_tasks(&entry.tasks),
			));
		}

		out.push_str(&format!("\n### Resumen:\n{}\n", self.summary));

		out
	}
}

fn render_tasks(tasks: &Value) -> String {
	match tasks {
		Value::String(text) => text.clone(),
		Value::Array(items) => items
			.iter()
			.map(|item| match item {
				Value::String(text) => format!("- {text}"),
				other => format!("- {other}"),
			})
			.collect::<Vec<_>>()
			.join("\n"),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
