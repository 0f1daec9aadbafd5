use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::http::{header, HeaderName};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use filegate_blob::FilesController;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::files::{self, REQUEST_ID_HEADER};
use crate::FilegateState;

#[derive(Clone)]
pub struct FilegateApp {
    pub state: FilegateState,
    routes: Router<()>,
}

impl FilegateApp {
    pub fn new(files: FilesController) -> Self {
        let state = FilegateState::new(files);
        Self {
            routes: file_routes(state.clone()),
            state,
        }
    }

    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.routes = self.routes.route(path, get(handler));
        self
    }

    pub fn service<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.use_get(path, handler)
    }

    /// Every registered route with request tracing, request ids, CORS and the
    /// upload size limit applied.
    pub fn router(&self) -> Router<()> {
        with_layers(self.routes.clone(), self.state.config().max_upload_bytes)
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "filegate listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

fn file_routes(state: FilegateState) -> Router<()> {
    let guarded_delete = delete(files::delete_file).route_layer(middleware::from_fn_with_state(
        state.clone(),
        files::require_master_key,
    ));

    Router::new()
        .route("/files", post(files::missing_file_name))
        .route(
            "/files/{filename}",
            post(files::create_file).merge(guarded_delete),
        )
        .route("/files/{app_id}/{filename}", get(files::get_file))
        .route("/wxfiles/{filename}", post(files::create_from_envelope))
        .with_state(state)
}

fn with_layers(router: Router<()>, max_upload_bytes: usize) -> Router<()> {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(DefaultBodyLimit::max(max_upload_bytes)).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .expose_headers([
                        header::CONTENT_RANGE,
                        header::ACCEPT_RANGES,
                        header::CONTENT_LENGTH,
                        header::LOCATION,
                    ]),
            ),
    )
}

pub fn filegate(files: FilesController) -> FilegateApp {
    FilegateApp::new(files)
}
