use std::sync::Arc;

use serde_json::{Map, Value};

use atelier_domain::{
	MemoryType, ResponderKind, json,
	onboarding::{self, Answers, Assessment},
};
use atelier_providers::{ChatMessage, GenerationRequest};

use crate::{
	BoxFuture, ContextBundle, Error, MemoryService, ProfileUpdate, Responder, ResponderOutput,
	Result, WriteRequest, prompts,
};

const ASSESSMENT_TEMPERATURE: f32 = 0.3;
const ASSESSMENT_MAX_TOKENS: u32 = 3_000;
const PROFILE_MEMORY_IMPORTANCE: f32 = 0.95;
const ASSESSMENT_CONFIDENCE: f32 = 0.9;

/// Turns the 16-answer questionnaire into a maturity assessment and seeds the artisan profile.
pub struct OnboardingResponder {
	memory: Arc<MemoryService>,
}
impl OnboardingResponder {
	pub fn new(memory: Arc<MemoryService>) -> Self {
		Self { memory }
	}

	async fn run(
		&self,
		input: &str,
		context: &ContextBundle,
		metadata: &Map<String, Value>,
	) -> Result<ResponderOutput> {
		let Some(answers) = Answers::parse(input) else {
			return Err(Error::InvalidRequest {
				message: "onboarding input must be a JSON object with answers Q1-Q16.".to_string(),
			});
		};
		let request = GenerationRequest {
			system_prompt: prompts::ONBOARDING_SYSTEM_PROMPT.to_string(),
			messages: vec![ChatMessage::user(onboarding::assessment_message(&answers))],
			temperature: ASSESSMENT_TEMPERATURE,
			max_tokens: ASSESSMENT_MAX_TOKENS,
		};
		let completion = self.memory.generate(&request).await?;
		let Some(raw) = json::parse_lenient_object(&completion) else {
			return Err(Error::GenerationUnavailable {
				message: "Assessment completion holds no JSON object.".to_string(),
			});
		};
		let assessment = Assessment::from_model_output(raw);
		let snapshot = assessment.maturity_snapshot();

		self.remember(&answers, &assessment, context, metadata).await;

		let mut extra = Map::new();

		extra.insert("craft_type".to_string(), Value::String(answers.craft_type()));
		extra.insert(
			"maturity_level".to_string(),
			Value::String(assessment.overall.as_str().to_string()),
		);
		extra.insert("maturity_snapshot".to_string(), Value::Object(snapshot));
		extra.insert("top_priorities".to_string(), assessment.top_priorities());
		extra.insert("assessment".to_string(), Value::Object(assessment.raw.clone()));

		Ok(ResponderOutput {
			answer: assessment.render_markdown(),
			sources: Vec::new(),
			confidence: ASSESSMENT_CONFIDENCE,
			extra,
		})
	}

	/// Stores the profile memory and the artisan profile; failures are logged only.
	async fn remember(
		&self,
		answers: &Answers,
		assessment: &Assessment,
		context: &ContextBundle,
		metadata: &Map<String, Value>,
	) {
		let craft_type = answers.craft_type();
		let mut request = WriteRequest::new(
			MemoryType::Profile,
			ResponderKind::Onboarding.as_str(),
			profile_memory_content(&craft_type, assessment),
			ResponderKind::Onboarding.as_str(),
		);

		request.owner_id = context.owner_id;
		request.session_id = Some(context.session_id.clone());
		request.summary = Some(format!("Onboarding: {}", assessment.overall));
		request.importance = Some(PROFILE_MEMORY_IMPORTANCE);
		request.metadata.insert("tipo_artesania".to_string(), Value::String(craft_type.clone()));
		request
			.metadata
			.insert("madurez_general".to_string(), Value::String(assessment.overall.to_string()));

		if !metadata.is_empty() {
			request.metadata.insert("request".to_string(), Value::Object(metadata.clone()));
		}

		if let Err(err) = self.memory.write(request).await {
			tracing::warn!(
				error = %err,
				session_id = %context.session_id,
				"Failed to store onboarding profile memory."
			);
		}

		let Some(owner_id) = context.owner_id else {
			tracing::warn!(
				session_id = %context.session_id,
				"Onboarding completed without an owner id. Artisan profile not created."
			);

			return;
		};
		let snapshot = assessment.maturity_snapshot();
		let mut key_insights = Map::new();

		key_insights.insert("tipo_artesania".to_string(), Value::String(craft_type));
		key_insights.insert("onboarding_completed".to_string(), Value::Bool(true));
		key_insights.insert("maturity_levels".to_string(), Value::Object(snapshot.clone()));
		key_insights.insert("top_priorities".to_string(), assessment.top_priorities());

		let update = ProfileUpdate {
			owner_id,
			summary: assessment.summary.clone(),
			key_insights,
			maturity_snapshot: snapshot,
			increment: false,
		};

		if let Err(err) = self.memory.update_profile(update).await {
			tracing::warn!(error = %err, owner_id = %owner_id, "Failed to update artisan profile.");
		}
	}
}
impl Responder for OnboardingResponder {
	fn kind(&self) -> ResponderKind {
		ResponderKind::Onboarding
	}

	fn process<'a>(
		&'a self,
		input: &'a str,
		context: &'a ContextBundle,
		metadata: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<ResponderOutput>> {
		Box::pin(self.run(input, context, metadata))
	}
}

fn profile_memory_content(craft_type: &str, assessment: &Assessment) -> String {
	let mut lines = vec![
		"Perfil de Onboarding:".to_string(),
		format!("Tipo de artesanía: {craft_type}"),
		format!("Madurez General: {}", assessment.overall),
	];

	for entry in &assessment.categories {
		lines.push(format!("Madurez {}: {}", entry.category.title(), entry.level));
	}

	lines.push(format!("Resumen: {}", assessment.summary));

	lines.join("\n")
}
