use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use mongodb::bson::{doc, Bson, Document};
use parler_search::handlers::configure;
use parler_search::models::models::User;
use parler_search::{
    get_entities, search_posts, search_users, MemoryStore, SearchQuery, StoreError,
};

fn seeded_store() -> MemoryStore {
    let mut store = MemoryStore::new();

    // 25 users match "ali" through either field, 5 do not
    for i in 0..25 {
        let user = if i % 2 == 0 {
            doc! { "name": format!("Alison {}", i), "username": format!("@member{}", i) }
        } else {
            doc! { "name": format!("Member {}", i), "username": format!("@VALI{}", i) }
        };
        store.insert("users", user);
    }
    for i in 0..5 {
        store.insert("users", doc! { "name": format!("Zed {}", i), "username": format!("@zed{}", i) });
    }

    store.insert_many("posts", vec![
        doc! { "username": "@bob", "text": "first post" },
        doc! {
            "username": "@carol",
            "text": "unrelated",
            "comments": [{ "username": "@bob", "text": "reply" }],
        },
        doc! {
            "username": "@dave",
            "text": "sharing",
            "echo": { "username": "@bob", "text": "original" },
        },
        doc! { "username": "@bobby", "text": "not bob" },
        doc! { "username": "@erin", "text": "Hello there" },
        doc! { "username": "@erin", "text": "say hello" },
        doc! { "username": "@frank", "text": "pics", "media": [{ "title": "HELLO world" }] },
        doc! { "username": "@grace", "text": "quoting", "echo": { "username": "@heidi", "text": "oh hello" } },
        doc! { "username": "@ivan", "text": "stored", "comment": { "text": "hello from a comment" } },
        doc! { "username": "@judy", "text": "a.c literal" },
        doc! { "username": "@judy", "text": "abc" },
    ]);

    store
}

#[tokio::test]
async fn users_search_paginates_matches() {
    let store = seeded_store();

    let page = search_users(&store, "ali", 0).await.unwrap();
    assert_eq!(page.page_count, 2);
    assert_eq!(page.records.len(), 20);
    assert_eq!(page.records[0].name, "Alison 0");
    assert_eq!(page.records[1].username, "@VALI1");

    let second = search_users(&store, "ali", 1).await.unwrap();
    assert_eq!(second.page_count, 2);
    assert_eq!(second.records.len(), 5);
    assert_eq!(second.records[4].name, "Alison 24");
}

#[tokio::test]
async fn posts_search_by_handle_covers_comments_and_echoes() {
    let store = seeded_store();

    for handle in ["bob", "@bob"] {
        let page = search_posts(&store, handle, "", 0).await.unwrap();
        let authors: Vec<&str> = page.records.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(authors, vec!["@bob", "@carol", "@dave"]);
        assert_eq!(page.page_count, 1);
    }
}

#[tokio::test]
async fn posts_search_by_content_on_second_page_is_empty() {
    let store = seeded_store();

    let first = search_posts(&store, "", "hello", 0).await.unwrap();
    assert_eq!(first.records.len(), 5);
    assert_eq!(first.page_count, 1);

    let second = search_posts(&store, "", "hello", 1).await.unwrap();
    assert_eq!(second.page_count, 1);
    assert!(second.records.is_empty());
}

#[tokio::test]
async fn posts_search_combines_handle_and_content() {
    let store = seeded_store();

    let page = search_posts(&store, "erin", "HELLO", 0).await.unwrap();
    assert_eq!(page.records.len(), 2);
    assert!(page.records.iter().all(|p| p.username == "@erin"));

    let none = search_posts(&store, "bob", "hello", 0).await.unwrap();
    assert_eq!(none.page_count, 1);
    assert!(none.records.is_empty());
}

#[tokio::test]
async fn empty_search_never_touches_the_store() {
    let store = seeded_store();

    let posts = search_posts(&store, "", "", 0).await.unwrap();
    assert_eq!(posts.page_count, 0);
    assert!(posts.records.is_empty());

    let users = search_users(&store, "", 3).await.unwrap();
    assert_eq!(users.page_count, 0);
    assert!(users.records.is_empty());

    assert_eq!(store.accesses(), 0);
}

#[tokio::test]
async fn search_text_is_matched_literally() {
    let store = seeded_store();

    let page = search_posts(&store, "", "a.c", 0).await.unwrap();
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].text, "a.c literal");

    // Unbalanced pattern syntax is just text after escaping
    let page = search_users(&store, "(ali", 0).await.unwrap();
    assert_eq!(page.page_count, 1);
    assert!(page.records.is_empty());
}

#[tokio::test]
async fn negative_page_is_the_first_page() {
    let store = seeded_store();

    let page = search_users(&store, "ali", -4).await.unwrap();
    assert_eq!(page.records.len(), 20);
    assert_eq!(page.records[0].name, "Alison 0");
}

#[tokio::test]
async fn largest_page_is_past_the_end() {
    let store = seeded_store();

    let page = search_users(&store, "ali", i64::MAX).await.unwrap();
    assert_eq!(page.page_count, 2);
    assert!(page.records.is_empty());
}

#[tokio::test]
async fn null_fields_do_not_fail_the_search() {
    let mut store = MemoryStore::new();
    store.insert("posts", doc! {
        "username": "@bob",
        "text": "hi",
        "echo": { "username": "@x", "text": Bson::Null },
    });
    store.insert("users", doc! { "name": Bson::Null, "username": "@ali" });

    let posts = search_posts(&store, "bob", "", 0).await.unwrap();
    assert_eq!(posts.records.len(), 1);
    assert_eq!(posts.records[0].echo.as_ref().unwrap().text, "");

    let users = search_users(&store, "ali", 0).await.unwrap();
    assert_eq!(users.records, vec![User { name: String::new(), username: "@ali".into(), bio: None }]);
}

#[tokio::test]
async fn malformed_filter_degrades_to_empty_page() {
    let store = seeded_store();
    let query = SearchQuery::Filter(doc! { "text": { "$regex": "(unclosed", "$options": "i" } });

    let page = get_entities::<_, Document>(&store, "posts", query, 0).await.unwrap();
    assert_eq!(page.page_count, 1);
    assert!(page.records.is_empty());
    assert_eq!(store.accesses(), 2);
}

#[tokio::test]
async fn query_failure_on_either_call_degrades() {
    let store = seeded_store();
    store.fail_count(StoreError::Query("bad count".into()));
    let page = search_users(&store, "ali", 0).await.unwrap();
    assert_eq!(page.page_count, 1);
    assert!(page.records.is_empty());

    let store = seeded_store();
    store.fail_find(StoreError::Query("bad find".into()));
    let page = search_users(&store, "ali", 0).await.unwrap();
    assert_eq!(page.page_count, 1);
    assert!(page.records.is_empty());
    assert_eq!(store.accesses(), 2);
}

#[tokio::test]
async fn other_store_failures_propagate() {
    let store = seeded_store();
    store.fail_find(StoreError::Unavailable("connection reset".into()));

    let err = search_posts(&store, "bob", "", 0).await.unwrap_err();
    assert_eq!(err, StoreError::Unavailable("connection reset".into()));
    // Both calls still ran to completion
    assert_eq!(store.accesses(), 2);

    let store = seeded_store();
    store.fail_count(StoreError::Unavailable("timed out".into()));
    let err = search_users(&store, "ali", 0).await.unwrap_err();
    assert!(!err.is_query_failure());
}

#[tokio::test]
async fn records_deserialize_into_models() {
    let mut store = MemoryStore::new();
    store.insert("users", doc! { "_id": 7, "name": "Ali", "username": "@ali", "bio": "hi", "extra": true });
    store.insert("users", doc! { "username": "@ali2" });

    let page = search_users(&store, "ali", 0).await.unwrap();
    assert_eq!(page.records, vec![
        User { name: "Ali".into(), username: "@ali".into(), bio: Some("hi".into()) },
        User { name: String::new(), username: "@ali2".into(), bio: None },
    ]);
}

// === HTTP surface ===

macro_rules! app {
    ($store:expr) => {
        test::init_service(App::new().app_data($store).configure(configure::<MemoryStore>)).await
    };
}

async fn body_text(resp: actix_web::dev::ServiceResponse) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

#[actix_web::test]
async fn users_page_renders_results() {
    let app = app!(web::Data::new(seeded_store()));

    let req = test::TestRequest::get().uri("/users?search_term=ali&page=1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.contains("Page 2 of 2"));
    assert!(body.contains("Alison 24"));
    assert!(!body.contains("Alison 0<"));
    assert!(body.contains(r#"value="ali""#));
}

#[actix_web::test]
async fn unparsable_page_defaults_to_first() {
    let app = app!(web::Data::new(seeded_store()));

    let req = test::TestRequest::get().uri("/users/?search_term=ali&page=two").to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Page 1 of 2"));
    assert!(body.contains("Alison 0<"));
}

#[actix_web::test]
async fn largest_page_number_renders() {
    let app = app!(web::Data::new(seeded_store()));

    let req = test::TestRequest::get()
        .uri("/users?search_term=ali&page=9223372036854775807")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.contains("Page 9223372036854775807 of 2"));
    assert!(body.contains("No results found."));
}

#[actix_web::test]
async fn posts_page_without_terms_is_a_bare_form() {
    let store = web::Data::new(seeded_store());
    let app = app!(store.clone());

    let req = test::TestRequest::get().uri("/posts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.contains(r#"action="/posts""#));
    assert!(!body.contains("pagination"));
    assert_eq!(store.accesses(), 0);
}

#[actix_web::test]
async fn posts_page_searches_content() {
    let app = app!(web::Data::new(seeded_store()));

    let req = test::TestRequest::get()
        .uri("/posts?search_term=&search_content=hello+from")
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("@ivan"));
    assert!(body.contains("Page 1 of 1"));
}

#[actix_web::test]
async fn home_reroutes_to_search_type() {
    let app = app!(web::Data::new(seeded_store()));

    let req = test::TestRequest::get()
        .uri("/?search_type=posts&search_term=bob&search_content=a%26b")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/posts?search_term=bob&search_content=a%26b"
    );
}

#[actix_web::test]
async fn home_without_search_type_renders_form() {
    let app = app!(web::Data::new(seeded_store()));

    for uri in ["/", "/?search_type=admin"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains(r#"name="search_type""#));
    }
}

#[actix_web::test]
async fn store_outage_renders_failure_page() {
    let store = web::Data::new(seeded_store());
    store.fail_count(StoreError::Unavailable("no primary".into()));
    let app = app!(store);

    let req = test::TestRequest::get().uri("/users?search_term=ali").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_text(resp).await;
    assert!(body.contains("Something went wrong"));
    assert!(!body.contains("no primary"));
}

#[actix_web::test]
async fn serves_assets_and_404s() {
    let app = app!(web::Data::new(seeded_store()));

    let req = test::TestRequest::get().uri("/style.css").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
