pub mod client;
pub mod config;
pub mod error;
pub mod game;
pub mod res;
pub mod rooms;

use std::ops::Deref;

use axum::{
    Router,
    extract::FromRef,
    response::{Html, IntoResponse},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use rooms::Lobby;

pub use error::{SessionError, SessionResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub lobby: Lobby,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            lobby: Lobby::new(config.chat_cooldown),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(res::index))
        .merge(rooms::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub struct Markdown<T>(pub T);

impl<T> IntoResponse for Markdown<T>
where
    T: Deref<Target = str>,
{
    fn into_response(self) -> axum::response::Response {
        use pulldown_cmark::{Options, Parser};

        let parser = Parser::new_ext(&*self.0, Options::ENABLE_TABLES);

        let mut html_output = String::new();
        pulldown_cmark::html::push_html(&mut html_output, parser);
        Html(html_output).into_response()
    }
}
