use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use locallib_app::modules::catalog::models::{Author, Book, Genre};
use locallib_db::{DocumentStore, ObjectId};
use locallib_kernel::settings::Settings;
use tower::ServiceExt;

const BOUNDARY: &str = "locallib-test-boundary";

fn app(store: &DocumentStore) -> Router {
    locallib_app::bootstrap::router(&Settings::default(), store)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(app: &Router, uri: &str, pairs: &[(&str, &str)]) -> Response {
    let body = pairs
        .iter()
        .map(|(name, value)| format!("{name}={}", value.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&");
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn multipart_body(fields: &[(&str, &str)], cover: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = cover {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cover\"; filename=\"cover.png\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_multipart(app: &Router, uri: &str, body: Vec<u8>) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

fn location(response: &Response) -> String {
    response.headers()[header::LOCATION].to_str().unwrap().to_string()
}

async fn insert_genre(store: &DocumentStore, name: &str) -> Genre {
    let genre = Genre {
        id: ObjectId::new(),
        name: name.to_string(),
    };
    store.collection::<Genre>().insert(&genre).await.unwrap();
    genre
}

async fn create_author(app: &Router, first_name: &str, family_name: &str) -> String {
    let response = post_form(
        app,
        "/catalog/author/create",
        &[
            ("first_name", first_name),
            ("family_name", family_name),
            ("date_of_birth", ""),
            ("date_of_death", ""),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    location(&response).trim_start_matches("/catalog/author/").to_string()
}

async fn create_book(app: &Router, title: &str, author_id: &str, genres: &[&str]) -> String {
    let mut fields = vec![
        ("title", title),
        ("author", author_id),
        ("summary", "A summary"),
        ("isbn", "9780141439518"),
    ];
    fields.extend(genres.iter().map(|id| ("genre", *id)));
    let response = post_form(app, "/catalog/book/create", &fields).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    location(&response).trim_start_matches("/catalog/book/").to_string()
}

#[tokio::test]
async fn root_redirects_to_catalog_and_health_answers() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let response = get(&app, "/").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/catalog");

    let response = get(&app, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn home_page_shows_record_counts() {
    let store = DocumentStore::in_memory();
    let app = app(&store);
    insert_genre(&store, "Fantasy").await;

    let response = get(&app, "/catalog").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Local Library Home"));
    assert!(html.contains("<strong>Genres:</strong> 1"));
    assert!(html.contains("<strong>Books:</strong> 0"));
}

#[tokio::test]
async fn creating_an_author_redirects_to_its_detail_page() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let response = post_form(
        &app,
        "/catalog/author/create",
        &[
            ("first_name", "Jane"),
            ("family_name", "Austen"),
            ("date_of_birth", "1775-12-16"),
            ("date_of_death", "1817-07-18"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let url = location(&response);
    let id = ObjectId::parse_str(url.trim_start_matches("/catalog/author/")).unwrap();

    let stored = store.collection::<Author>().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.family_name, "Austen");

    let html = body_text(get(&app, &url).await).await;
    assert!(html.contains("Author: Austen, Jane"));
    assert!(html.contains("Dec 16, 1775"));
}

#[tokio::test]
async fn duplicate_author_redirects_to_the_existing_record() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let first = create_author(&app, "Jane", "Austen").await;
    let second = create_author(&app, "Jane", "Austen").await;

    assert_eq!(first, second);
    assert_eq!(store.collection::<Author>().count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_author_rerenders_the_form_without_saving() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let response = post_form(
        &app,
        "/catalog/author/create",
        &[("first_name", ""), ("family_name", "Austen")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("First name must be specified."));
    assert!(html.contains("value=\"Austen\""));
    assert_eq!(store.collection::<Author>().count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn author_with_books_cannot_be_deleted() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let author_id = create_author(&app, "Jane", "Austen").await;
    create_book(&app, "Emma", &author_id, &[]).await;
    create_book(&app, "Persuasion", &author_id, &[]).await;

    let delete_url = format!("/catalog/author/{author_id}/delete");
    let html = body_text(get(&app, &delete_url).await).await;
    assert!(html.contains("Delete the following books"));
    assert!(html.contains("Emma"));
    assert!(html.contains("Persuasion"));

    let response = post_form(&app, &delete_url, &[("authorid", author_id.as_str())]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.collection::<Author>().count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn author_without_books_is_deleted() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let author_id = create_author(&app, "Bob", "Billings").await;
    let delete_url = format!("/catalog/author/{author_id}/delete");

    let html = body_text(get(&app, &delete_url).await).await;
    assert!(html.contains("Do you really want to delete this Author?"));

    let response = post_form(&app, &delete_url, &[("authorid", author_id.as_str())]).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/catalog/authors");
    assert_eq!(store.collection::<Author>().count(None).await.unwrap(), 0);

    let response = get(&app, &delete_url).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/catalog/authors");
}

#[tokio::test]
async fn book_update_normalizes_a_single_genre() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let fantasy = insert_genre(&store, "Fantasy").await;
    let poetry = insert_genre(&store, "French Poetry").await;
    let author_id = create_author(&app, "Patrick", "Rothfuss").await;
    let book_id = create_book(&app, "The Name of the Wind", &author_id, &[]).await;

    let update_url = format!("/catalog/book/{book_id}/update");
    let fantasy_hex = fantasy.id.to_hex();
    let response = post_form(
        &app,
        &update_url,
        &[
            ("title", "The Name of the Wind"),
            ("author", author_id.as_str()),
            ("summary", "A summary"),
            ("isbn", "9780756404741"),
            ("genre", fantasy_hex.as_str()),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/catalog/book/{book_id}"));

    let id = ObjectId::parse_str(&book_id).unwrap();
    let book = store.collection::<Book>().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(book.genre, vec![fantasy.id]);
    assert_eq!(book.isbn, "9780756404741");

    let html = body_text(get(&app, &update_url).await).await;
    assert!(html.contains(&format!("value=\"{fantasy_hex}\" checked")));
    assert!(!html.contains(&format!("value=\"{}\" checked", poetry.id.to_hex())));

    // No genre field at all clears the set.
    let response = post_form(
        &app,
        &update_url,
        &[
            ("title", "The Name of the Wind"),
            ("author", author_id.as_str()),
            ("summary", "A summary"),
            ("isbn", "9780756404741"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let book = store.collection::<Book>().find_by_id(&id).await.unwrap().unwrap();
    assert!(book.genre.is_empty());
}

#[tokio::test]
async fn book_with_unknown_author_is_rejected() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let response = post_form(
        &app,
        "/catalog/book/create",
        &[
            ("title", "Orphan"),
            ("author", "not-an-id"),
            ("summary", "A summary"),
            ("isbn", "123"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Author must be a valid selection"));
    assert_eq!(store.collection::<Book>().count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn uploaded_cover_is_served_back_and_kept_on_update() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let author_id = create_author(&app, "Isaac", "Asimov").await;
    let png: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let fields = [
        ("title", "Foundation"),
        ("author", author_id.as_str()),
        ("summary", "Psychohistory"),
        ("isbn", "9780553293357"),
    ];

    let response = post_multipart(
        &app,
        "/catalog/book/create",
        multipart_body(&fields, Some(("image/png", png))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let book_url = location(&response);

    let response = get(&app, &format!("{book_url}/cover")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response).await, png);

    // An update with an empty file part keeps the stored cover.
    let empty: &[u8] = &[];
    let response = post_multipart(
        &app,
        &format!("{book_url}/update"),
        multipart_body(&fields, Some(("application/octet-stream", empty))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = get(&app, &format!("{book_url}/cover")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, png);
}

#[tokio::test]
async fn book_without_cover_has_no_cover_resource() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let author_id = create_author(&app, "Ben", "Bova").await;
    let book_id = create_book(&app, "Death Wave", &author_id, &[]).await;

    let response = get(&app, &format!("/catalog/book/{book_id}/cover")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_api_lists_books_with_their_authors() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let author_id = create_author(&app, "Jane", "Austen").await;
    let book_id = create_book(&app, "Emma", &author_id, &[]).await;

    let response = get(&app, "/catalog/books/api").await;
    assert_eq!(response.status(), StatusCode::OK);
    let books: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let books = books.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["_id"], book_id);
    assert_eq!(books[0]["title"], "Emma");
    assert_eq!(books[0]["author"]["family_name"], "Austen");
    assert!(books[0].get("cover").is_none());
}

#[tokio::test]
async fn unreadable_form_body_gets_the_html_error_page() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/catalog/author/create")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("first_name=Jane"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body_text(response).await.contains("<h2>400</h2>"));
}

#[tokio::test]
async fn invalid_update_of_missing_author_is_not_found() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let uri = format!("/catalog/author/{}/update", ObjectId::new().to_hex());
    let response = post_form(&app, &uri, &[("first_name", ""), ("family_name", "")]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_and_malformed_ids_are_not_found() {
    let store = DocumentStore::in_memory();
    let app = app(&store);

    let missing_book = format!("/catalog/book/{}", ObjectId::new().to_hex());
    for uri in [
        "/nowhere",
        "/catalog/author/not-an-id",
        "/catalog/book/not-an-id",
        missing_book.as_str(),
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
