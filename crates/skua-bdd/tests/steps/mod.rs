use cucumber::{given, then, when};
use skua_bdd::SessionWorld;

#[given("the browser is on the start page")]
async fn on_start_page(world: &mut SessionWorld) {
    let base = world.session.config().base_url.clone();
    world
        .session
        .goto(&base)
        .await
        .expect("navigation to the start page failed");
}

#[when(expr = "the user opens {string}")]
async fn open_path(world: &mut SessionWorld, path: String) {
    let url = world.session.resolve_url(&path);
    world
        .session
        .goto(&url)
        .await
        .unwrap_or_else(|e| panic!("navigation to {url} failed: {e}"));
}

#[then(expr = "the page title contains {string}")]
async fn title_contains(world: &mut SessionWorld, needle: String) {
    let title = world
        .session
        .eval_string("() => document.title")
        .await
        .expect("could not read the page title");
    assert!(
        title.contains(&needle),
        "page title {title:?} does not contain {needle:?}"
    );
}

#[then(expr = "the page URL contains {string}")]
async fn url_contains(world: &mut SessionWorld, needle: String) {
    let url = world
        .session
        .eval_string("() => window.location.href")
        .await
        .expect("could not read the page URL");
    assert!(url.contains(&needle), "URL {url:?} does not contain {needle:?}");
}
