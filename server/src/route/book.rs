use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::request::{
    BookTransformer, CreateBookRequest, DeleteBookRequest, GetBookRequest, SearchBookRequest,
    UpdateBookRequest,
};
use crate::response::{
    BookPresenter, CreatedBookPresenter, SearchedBookPresenter, UpdatedBookPresenter,
};
use application::service::{
    CreateBookService, DeleteBookService, GetBookService, UpdateBookService,
};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use error_stack::Report;
use kernel::interface::query::DependOnBookQuery;
use kernel::interface::update::DependOnBookModifier;
use kernel::KernelError;

pub trait BookRouter {
    fn route_book(self) -> Self;
}

fn book_not_found(id: i64) -> ErrorStatus {
    Report::new(KernelError::NotFound)
        .attach_printable(format!("No book with id {id}"))
        .into()
}

impl<D> BookRouter for Router<AppModule<D>>
where
    D: DependOnBookQuery + DependOnBookModifier,
{
    fn route_book(self) -> Self {
        self.route(
            "/books",
            get(|State(module): State<AppModule<D>>| async move {
                Controller::new((), BookPresenter)
                    .bypass(|| module.database().get_all_books())
                    .await
                    .map_err(ErrorStatus::from)
            }),
        )
        .route(
            "/books/create",
            post(
                |State(module): State<AppModule<D>>, Json(req): Json<CreateBookRequest>| async move {
                    Controller::new(BookTransformer, CreatedBookPresenter)
                        .intake(req)
                        .handle(|dto| module.database().create_book(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/books/filtered/:search",
            get(
                |State(module): State<AppModule<D>>, Path(search): Path<String>| async move {
                    Controller::new(BookTransformer, SearchedBookPresenter)
                        .intake(SearchBookRequest::new(search))
                        .handle(|dto| async move { module.database().search_books(&dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/books/:id",
            get(
                |State(module): State<AppModule<D>>, Path(id): Path<i64>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(GetBookRequest::new(id))
                        .handle(|dto| async move { module.database().get_book(&dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                        .and_then(|res| res.ok_or_else(|| book_not_found(id)))
                },
            )
            .put(
                |State(module): State<AppModule<D>>,
                 Path(id): Path<i64>,
                 Json(req): Json<UpdateBookRequest>| async move {
                    Controller::new(BookTransformer, UpdatedBookPresenter)
                        .intake((id, req))
                        .handle(|dto| module.database().update_book(dto))
                        .await
                        .map_err(ErrorStatus::from)
                        .and_then(|res| res.ok_or_else(|| book_not_found(id)))
                },
            )
            .delete(
                |State(module): State<AppModule<D>>, Path(id): Path<i64>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(DeleteBookRequest::new(id))
                        .handle(|dto| module.database().delete_book(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}

#[cfg(test)]
mod test {
    use axum::body::{to_bytes, Body};
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use driver::database::InMemoryDatabase;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::handler::{AppModule, Handler};
    use crate::route::router;

    fn app() -> Router {
        router(AppModule::from_handler(Handler::new(
            InMemoryDatabase::default(),
        )))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn create_dune(app: &Router) -> Value {
        let (status, body) = send_json(
            app,
            Method::POST,
            "/books/create",
            Some(json!({"title": "Dune", "author": "Herbert"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn index_says_hello() {
        let (status, body) = send_json(&app(), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Hello World"));
    }

    #[tokio::test]
    async fn list_starts_empty() {
        let (status, body) = send_json(&app(), Method::GET, "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn create_then_list() {
        let app = app();
        let created = create_dune(&app).await;
        assert_eq!(
            created,
            json!({"books": {"id": 1, "title": "Dune", "author": "Herbert"}})
        );

        let (_, bytes) = send(&app, Method::GET, "/books", None).await;
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"[{"id":1,"title":"Dune","author":"Herbert"}]"#
        );
    }

    #[tokio::test]
    async fn create_rejects_incomplete_body() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/books/create",
            Some(json!({"title": "Dune"})),
        )
        .await;
        assert!(status.is_client_error());

        let (status, _) = send(
            &app,
            Method::POST,
            "/books/create",
            Some(json!({"id": 9, "title": "Dune", "author": "Herbert"})),
        )
        .await;
        assert!(status.is_client_error());

        let (_, body) = send_json(&app, Method::GET, "/books", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn get_by_id_is_array_wrapped() {
        let app = app();
        create_dune(&app).await;

        let (status, body) = send_json(&app, Method::GET, "/books/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": 1, "title": "Dune", "author": "Herbert"}]));
    }

    #[tokio::test]
    async fn get_missing_id_is_server_error() {
        let (status, _) = send(&app(), Method::GET, "/books/1", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let (status, _) = send(&app(), Method::GET, "/books/dune", None).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn filtered_matches_title_prefix() {
        let app = app();
        create_dune(&app).await;

        let (status, body) = send_json(&app, Method::GET, "/books/filtered/Du", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": 1, "title": "Dune", "author": "Herbert"}]));
    }

    #[tokio::test]
    async fn filtered_falls_back_to_author() {
        let app = app();
        create_dune(&app).await;

        let (status, body) = send_json(&app, Method::GET, "/books/filtered/Her", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": 1, "title": "Dune", "author": "Herbert"}]));
    }

    #[tokio::test]
    async fn filtered_without_match_is_not_found() {
        let app = app();
        create_dune(&app).await;

        let (status, bytes) = send(&app, Method::GET, "/books/filtered/une", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"message":"This book don't exist"}"#
        );
    }

    #[tokio::test]
    async fn edit_keeps_omitted_fields() {
        let app = app();
        create_dune(&app).await;

        let (status, body) = send_json(
            &app,
            Method::PUT,
            "/books/1",
            Some(json!({"title": "Dune Messiah"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"book": {"id": 1, "title": "Dune Messiah", "author": "Herbert"}})
        );

        let (_, body) = send_json(&app, Method::GET, "/books/1", None).await;
        assert_eq!(
            body,
            json!([{"id": 1, "title": "Dune Messiah", "author": "Herbert"}])
        );
    }

    #[tokio::test]
    async fn edit_ignores_empty_values() {
        let app = app();
        create_dune(&app).await;

        let (status, body) = send_json(
            &app,
            Method::PUT,
            "/books/1",
            Some(json!({"title": "", "author": "Frank Herbert"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"book": {"id": 1, "title": "Dune", "author": "Frank Herbert"}})
        );
    }

    #[tokio::test]
    async fn edit_missing_id_is_server_error() {
        let (status, _) = send(
            &app(),
            Method::PUT,
            "/books/5",
            Some(json!({"title": "Dune"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn delete_answers_no_content() {
        let app = app();
        create_dune(&app).await;

        let (status, bytes) = send(&app, Method::DELETE, "/books/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(bytes.is_empty());

        let (_, body) = send_json(&app, Method::GET, "/books", None).await;
        assert_eq!(body, json!([]));

        let (status, bytes) = send(&app, Method::DELETE, "/books/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(bytes.is_empty());
    }
}
