use axum::routing::get;
use axum::{Json, Router};

pub trait IndexRouter {
    fn route_index(self) -> Self;
}

impl<S> IndexRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn route_index(self) -> Self {
        self.route("/", get(|| async { Json("Hello World") }))
    }
}
