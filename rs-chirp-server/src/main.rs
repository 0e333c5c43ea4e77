use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info};

use serde::{Deserialize, Serialize};
use rs_chirp_core::{Config, CorpusLoader, Error, GenerationService, ReadinessGate, WordChain};

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	input: Option<String> // text to answer, none for a fresh post
}

/// Response body of `/v1/status`
#[derive(Serialize)]
struct Status {
	ready: bool,
	seeded: usize,
	total: usize,
	prefixes: Option<usize>
}

/// Rebuild progress, written by the loader thread.
#[derive(Default)]
struct Progress {
	seeded: AtomicUsize,
	total: AtomicUsize
}

struct SharedData {
	service: GenerationService,
	gate: Arc<ReadinessGate<WordChain>>,
	progress: Arc<Progress>
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a post, or a reply when `input` is given. Waits for the model
/// when it is still being built.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let input = query.input.as_deref().filter(|s| !s.trim().is_empty());

	match data.service.generate(input).await {
		Ok(result) => HttpResponse::Ok().body(result),
		Err(e @ Error::EmptyModel) => HttpResponse::UnprocessableEntity().body(e.to_string()),
		Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

#[get("/v1/status")]
async fn get_status(data: web::Data<SharedData>) -> impl Responder {
	let model = data.gate.get();
	HttpResponse::Ok().json(Status {
		ready: model.is_some(),
		seeded: data.progress.seeded.load(Ordering::Relaxed),
		total: data.progress.total.load(Ordering::Relaxed),
		prefixes: model.map(|m| m.len())
	})
}

/// Reads the configuration file named by `RS_CHIRP_CONFIG`, or the
/// environment when unset.
fn load_config() -> rs_chirp_core::Result<Config> {
	match std::env::var("RS_CHIRP_CONFIG") {
		Ok(path) => Config::from_file(path),
		Err(_) => Config::from_env()
	}
}

/// Builds the model on a dedicated thread and publishes it on `gate`.
///
/// A corpus failure is fatal: the server would otherwise wait forever.
fn spawn_loader(loader: CorpusLoader, gate: Arc<ReadinessGate<WordChain>>, progress: Arc<Progress>) {
	thread::spawn(move || {
		let result = loader.run(&gate, |seeded, total| {
			progress.total.store(total, Ordering::Relaxed);
			progress.seeded.store(seeded, Ordering::Relaxed);
			if seeded % 1000 == 0 || seeded == total {
				info!("{}/{}", seeded, total);
			}
		});

		if let Err(e) = result {
			error!("model build failed: {e}");
			std::process::exit(1);
		}
	});
}

/// Main entry point for the server.
///
/// Starts the model build in the background and serves generation requests
/// right away; requests received before the model is ready are answered as
/// soon as it is.
///
/// # Notes
/// - The server binds to `RS_CHIRP_BIND`, 127.0.0.1:5000 by default.
/// - Log verbosity follows `RUST_LOG` (default `info`).
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = load_config().map_err(|e| {
		error!("{e}");
		io::Error::other(e)
	})?;
	let loader = CorpusLoader::from_config(&config).map_err(io::Error::other)?;

	let gate = Arc::new(ReadinessGate::new());
	gate.on_ready(|model: Arc<WordChain>| info!("model ready ({} prefixes)", model.len()));
	let progress = Arc::new(Progress::default());
	spawn_loader(loader, Arc::clone(&gate), Arc::clone(&progress));

	let shared_data = web::Data::new(SharedData {
		service: GenerationService::from_config(Arc::clone(&gate), &config),
		gate,
		progress
	});

	let bind = std::env::var("RS_CHIRP_BIND").unwrap_or_else(|_| "127.0.0.1:5000".to_owned());
	info!("listening on {bind}");

	HttpServer::new(move || {
		App::new()
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_status)
	})
		.bind(bind)?
		.run()
		.await
}
