mod book;
mod index;

pub use self::{book::*, index::*};

use crate::handler::AppModule;
use axum::Router;
use kernel::interface::query::DependOnBookQuery;
use kernel::interface::update::DependOnBookModifier;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router<D>(module: AppModule<D>) -> Router
where
    D: DependOnBookQuery + DependOnBookModifier,
{
    Router::<AppModule<D>>::new()
        .route_index()
        .route_book()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new())
        .with_state(module)
}
