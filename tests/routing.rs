use futures::executor::block_on;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;
use turbomux::http::header;
use turbomux::{
  Action, Body, Error, MatchError, Request, Response, Router, StatusCode, TemplateError,
  VariableError,
};

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

fn get(uri: &str) -> Request {
  hyper::Request::builder()
    .method("GET")
    .uri(uri)
    .body(Body::empty())
    .unwrap()
}

fn text(body: &'static str) -> impl Action {
  move |_: Request| async move { Response::new(Body::from(body)) }
}

fn body(res: Response) -> String {
  let bytes = block_on(hyper::body::to_bytes(res.into_body())).unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
  pairs
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[test]
fn scenario_a_path_variables() {
  init_tracing();
  let mut router = Router::new();
  router.handle("/articles/{category}/{id:[0-9]+}", text("article"));

  let m = router.match_request(&get("/articles/technology/42")).unwrap();
  assert_eq!(m.vars, vars(&[("category", "technology"), ("id", "42")]));

  assert_eq!(
    router.match_request(&get("/articles/technology/abc")).err(),
    Some(MatchError::NotFound)
  );
}

#[test]
fn scenario_b_host_subrouter() {
  init_tracing();
  let mut router = Router::new();
  let articles = router.host("{subdomain:[a-z]+}.domain.com").subrouter();
  articles
    .handle("/articles/{category}/{id:[0-9]+}", text("article"))
    .name("article");

  let m = router
    .match_request(&get("http://news.domain.com/articles/technology/42"))
    .unwrap();
  assert_eq!(
    m.vars,
    vars(&[("subdomain", "news"), ("category", "technology"), ("id", "42")])
  );
  assert_eq!(
    m.route.unwrap().path_template().unwrap(),
    "/articles/{category}/{id:[0-9]+}"
  );

  assert!(router
    .match_request(&get("http://n3ws.domain.com/articles/technology/42"))
    .is_err());

  let url = router
    .get("article")
    .unwrap()
    .url(&["subdomain", "news", "category", "technology", "id", "42"])
    .unwrap();
  assert_eq!(url, "http://news.domain.com/articles/technology/42");
}

#[test]
fn scenario_b_through_serve() {
  let mut router = Router::new();
  router
    .host("{subdomain:[a-z]+}.domain.com")
    .subrouter()
    .handle("/articles/{id}", |req: Request| async move {
      let vars = turbomux::vars(&req).cloned().unwrap_or_default();
      Response::new(Body::from(format!("{}/{}", vars["subdomain"], vars["id"])))
    });

  let req = hyper::Request::builder()
    .uri("/articles/42")
    .header(header::HOST, "news.domain.com:8080")
    .body(Body::empty())
    .unwrap();
  assert_eq!(body(block_on(router.serve(req))), "news/42");
}

#[test]
fn scenario_c_url_building() {
  let mut router = Router::new();
  router
    .handle("/articles/{category}/{id:[0-9]+}", text("article"))
    .name("article");
  let route = router.get("article").unwrap();

  assert_eq!(
    route.url(&["category", "technology", "id", "42"]).unwrap(),
    "/articles/technology/42"
  );
  assert_eq!(
    route.url(&["category", "technology"]).unwrap_err(),
    Error::Variable(VariableError::Missing("id".into()))
  );
}

#[test]
fn scenario_d_unbalanced_template() {
  init_tracing();
  let mut router = Router::new();
  router.handle("/articles/{id", text("broken")).name("broken");
  router.handle("/articles/{id}", text("working"));

  let broken = router.get("broken");
  assert!(broken.is_none());

  let route = router.routes().next().unwrap();
  assert_eq!(
    route.err(),
    Some(&Error::Template(TemplateError::UnbalancedBraces(
      "/articles/{id".into()
    )))
  );

  let m = router.match_request(&get("/articles/1")).unwrap();
  assert!(m.route.unwrap().err().is_none());
  assert_eq!(body(block_on(router.serve(get("/articles/1")))), "working");
}

#[test]
fn round_trip() {
  let mut router = Router::new();
  router
    .host("{tenant}.example.com")
    .path("/users/{user}/posts/{post:[0-9]+}")
    .name("post");
  let route = router.get("post").unwrap();

  let cases = &[
    vars(&[("tenant", "acme"), ("user", "alice"), ("post", "1")]),
    vars(&[("tenant", "x-y"), ("user", "bob_smith"), ("post", "20210101")]),
    vars(&[("tenant", "acme"), ("user", "café au lait"), ("post", "3")]),
    vars(&[("tenant", "acme"), ("user", "50% off?"), ("post", "4")]),
  ];
  for values in cases {
    let url = route.url_with(values).unwrap();
    let m = router.match_request(&get(&url)).unwrap();
    assert_eq!(&m.vars, values, "round trip of {}", url);
  }
}

#[test]
fn disjoint_host_and_path_variables() {
  let mut router = Router::new();
  let route = router.host("{id}.example.com").path("/{id}").handler(text("never"));
  assert!(route.err().is_some());

  assert!(router.match_request(&get("http://a.example.com/a")).is_err());
}

#[test]
fn disjointness_across_subrouters() {
  let mut router = Router::new();
  let sub = router.host("{id}.example.com").subrouter();
  let route = sub.path("/{id}");
  assert!(route.err().is_some());
}

#[test]
fn first_registered_route_wins() {
  let mut router = Router::new();
  router.handle("/{anything}", text("first"));
  router.handle("/articles", text("second"));

  for _ in 0..3 {
    assert_eq!(body(block_on(router.serve(get("/articles")))), "first");
  }
}

#[test]
fn strict_slash() {
  let mut router = Router::new();
  router.strict_slash(true);
  router.handle("/articles/", text("articles"));

  let res = block_on(router.serve(get("/articles")));
  assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
  assert_eq!(res.headers()[header::LOCATION], "/articles/");

  let res = block_on(router.serve(get("/articles/")));
  assert_eq!(body(res), "articles");
}

#[test]
fn subrouter_paths_extend_the_prefix() {
  let mut router = Router::new();
  let products = router.path_prefix("/products/").subrouter();
  products.handle("/", text("index")).name("products");
  products.handle("/{key}", text("product")).name("product");
  router.handle("/other", text("other"));

  assert_eq!(body(block_on(router.serve(get("/products/")))), "index");
  assert_eq!(body(block_on(router.serve(get("/products/shirt")))), "product");
  assert_eq!(body(block_on(router.serve(get("/other")))), "other");

  let route = router.get("product").unwrap();
  assert_eq!(route.path_template().unwrap(), "/products/{key}");
  assert_eq!(route.url(&["key", "shirt"]).unwrap(), "/products/shirt");
}

#[test]
fn failed_parent_discards_subrouter_vars() {
  let mut router = Router::new();
  let parent = router.path_prefix("/api");
  parent.subrouter().handle("/{version}", text("versioned"));
  parent.headers(vec![("X-Api-Key", "")]);
  router.handle("/{first}/{second}", text("fallback"));

  let m = router.match_request(&get("/api/v1")).unwrap();
  assert_eq!(m.vars, vars(&[("first", "api"), ("second", "v1")]));
  assert_eq!(body(block_on(router.serve(get("/api/v1")))), "fallback");
}

#[test]
fn method_mismatch_inside_subrouter() {
  let mut router = Router::new();
  router
    .path_prefix("/api")
    .subrouter()
    .handle("/users", text("create"))
    .methods(&["POST"]);

  assert_eq!(
    router.match_request(&get("/api/users")).err(),
    Some(MatchError::MethodMismatch)
  );
  let res = block_on(router.serve(get("/api/users")));
  assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

  router.method_not_allowed_handler(text("nope"));
  assert_eq!(body(block_on(router.serve(get("/api/users")))), "nope");
}

#[test]
fn header_scheme_and_query_predicates() {
  let mut router = Router::new();
  router
    .handle("/feed", text("json"))
    .schemes(&["https"])
    .headers(vec![("Accept", "application/json")])
    .queries(vec![("format", "")]);
  router.handle("/feed", text("html"));

  let req = hyper::Request::builder()
    .uri("https://example.com/feed?format=compact")
    .header("Accept", "application/json")
    .body(Body::empty())
    .unwrap();
  assert_eq!(body(block_on(router.serve(req))), "json");
  assert_eq!(body(block_on(router.serve(get("https://example.com/feed")))), "html");
}

#[test]
fn concurrent_matching() {
  let mut router = Router::new();
  router.handle("/articles/{id:[0-9]+}", |req: Request| async move {
    let id = turbomux::vars(&req).unwrap()["id"].clone();
    Response::new(Body::from(id))
  });
  let router = Arc::new(router);

  let workers: Vec<_> = (0..8)
    .map(|i| {
      let router = Arc::clone(&router);
      thread::spawn(move || {
        for j in 0..50 {
          let id = (i * 1000 + j).to_string();
          let res = block_on(router.serve(get(&format!("/articles/{}", id))));
          assert_eq!(body(res), id);
        }
      })
    })
    .collect();

  for worker in workers {
    worker.join().unwrap();
  }
}
