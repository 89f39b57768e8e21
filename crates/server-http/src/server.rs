// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lifecycle of the HTTP control server.

use std::{
	net::SocketAddr,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use parking_lot::RwLock;
use tokio::{net::TcpListener, runtime, sync::Notify};
use vncmgr_manager::VncManager;

use crate::{
	config::HttpConfig,
	error::ServerError,
	handlers::AppState,
	routes::router,
};

/// HTTP control server in front of a [`VncManager`].
///
/// ```ignore
/// let server = HttpServer::new(HttpConfig::default().port(18480), manager);
/// server.run_blocked(&uuid)?;   // returns once `/internal/stop` was hit
/// ```
pub struct HttpServer {
	config: HttpConfig,
	manager: Arc<VncManager>,
	/// Actual bound address (available while serving).
	actual_addr: RwLock<Option<SocketAddr>>,
	/// Flag indicating if the server is running.
	running: AtomicBool,
	/// Set once the server was told to stop for good.
	exit: AtomicBool,
	shutdown: Arc<Notify>,
}

impl HttpServer {
	pub fn new(config: HttpConfig, manager: Arc<VncManager>) -> Self {
		Self {
			config,
			manager,
			actual_addr: RwLock::new(None),
			running: AtomicBool::new(false),
			exit: AtomicBool::new(false),
			shutdown: Arc::new(Notify::new()),
		}
	}

	/// Get the actual bound address, while serving.
	pub fn local_addr(&self) -> Option<SocketAddr> {
		*self.actual_addr.read()
	}

	pub fn port(&self) -> Option<u16> {
		self.local_addr().map(|addr| addr.port())
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	/// Serve requests on a runtime owned by the calling thread until the
	/// server is stopped.
	pub fn run_blocked(&self, uuid: &str) -> Result<(), ServerError> {
		let runtime = runtime::Builder::new_multi_thread()
			.worker_threads(self.config.worker_threads)
			.thread_name("vncmgr-http")
			.enable_all()
			.build()
			.map_err(ServerError::Runtime)?;
		runtime.block_on(self.serve(uuid))
	}

	/// Serve requests until the server is stopped.
	pub async fn serve(&self, uuid: &str) -> Result<(), ServerError> {
		if self.exit.load(Ordering::SeqCst) {
			return Ok(());
		}
		if self.running.swap(true, Ordering::SeqCst) {
			return Err(ServerError::AlreadyRunning);
		}

		let result = self.serve_inner(uuid).await;
		*self.actual_addr.write() = None;
		self.running.store(false, Ordering::SeqCst);
		result
	}

	async fn serve_inner(&self, uuid: &str) -> Result<(), ServerError> {
		let addr = self.config.bind_addr();
		let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
			addr,
			source,
		})?;
		let actual_addr = listener.local_addr().map_err(|source| ServerError::Bind {
			addr,
			source,
		})?;
		*self.actual_addr.write() = Some(actual_addr);
		tracing::info!("Start http server({})", actual_addr);

		let state = AppState {
			manager: self.manager.clone(),
			uuid: uuid.to_string(),
			shutdown: self.shutdown.clone(),
		};
		let shutdown = self.shutdown.clone();
		axum::serve(listener, router(state))
			.with_graceful_shutdown(async move {
				shutdown.notified().await;
				tracing::info!("HTTP server received shutdown signal");
			})
			.await
			.map_err(ServerError::Serve)?;

		tracing::info!("HTTP server stopped");
		Ok(())
	}

	/// Stop serving from within this process.
	///
	/// A server that is not running yet will stop as soon as it starts.
	pub fn shutdown(&self) {
		self.exit.store(true, Ordering::SeqCst);
		self.shutdown.notify_one();
	}

	/// Stop the server the way a remote caller would, through its own
	/// `/internal/stop` endpoint. Fire and forget.
	pub fn stop_safely(&self) {
		if self.exit.swap(true, Ordering::SeqCst) {
			return;
		}
		let Some(port) = self.port() else {
			return;
		};
		self.manager.stop_http_server(port);
	}
}
