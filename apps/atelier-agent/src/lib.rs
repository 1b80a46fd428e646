pub mod state;

use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use atelier_service::{DocumentWrite, TurnRequest};

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = atelier_cli::VERSION,
	rename_all = "kebab",
	styles = atelier_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run one supervisor turn and print the outcome as JSON.
	Turn {
		#[arg(long, short = 's')]
		session: String,
		#[arg(long, short = 'o', value_name = "UUID")]
		owner: Option<String>,
		/// Request metadata as a JSON object.
		#[arg(long, value_name = "JSON")]
		metadata: Option<String>,
		/// User input; read from stdin when omitted or `-`.
		input: Option<String>,
	},
	/// Chunk a document and store it as knowledge for one responder.
	Ingest {
		#[arg(long, short = 'r')]
		responder: String,
		#[arg(long)]
		category: String,
		#[arg(long, value_name = "UUID")]
		document_id: Option<Uuid>,
		#[arg(long, short = 'o', value_name = "UUID")]
		owner: Option<Uuid>,
		file: PathBuf,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = atelier_config::load(&args.config)?;

	init_tracing(&config)?;

	let state = AppState::new(config).await?;

	match args.command {
		Command::Turn { session, owner, metadata, input } => {
			let mut request = TurnRequest::new(session, atelier_cli::inline_or_stdin(input)?);

			request.owner_id = owner;
			request.metadata = parse_metadata(metadata.as_deref())?;

			let outcome = state.supervisor.process(request).await?;

			println!("{}", serde_json::to_string_pretty(&outcome)?);
		},
		Command::Ingest { responder, category, document_id, owner, file } => {
			let text = fs::read_to_string(&file)?;
			let document_id = document_id.unwrap_or_else(Uuid::new_v4);
			let ids = state
				.memory
				.write_document(DocumentWrite {
					document_id,
					responder_id: responder,
					category,
					text,
					owner_id: owner,
					metadata: Map::from_iter([(
						"source".to_string(),
						Value::String(file.display().to_string()),
					)]),
				})
				.await?;

			tracing::info!(%document_id, chunks = ids.len(), "Document stored.");

			println!("{}", serde_json::json!({ "document_id": document_id, "entry_ids": ids }));
		},
	}

	Ok(())
}

pub fn parse_metadata(raw: Option<&str>) -> color_eyre::Result<Map<String, Value>> {
	match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
		None => Ok(Map::new()),
		Some(raw) => match serde_json::from_str::<Value>(raw)? {
			Value::Object(map) => Ok(map),
			_ => Err(eyre::eyre!("--metadata must be a JSON object.")),
		},
	}
}

fn init_tracing(config: &atelier_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
