//! Demo composing a request with the editors, sending it and printing the response.
//!
//! This demo shows how to:
//! - Fold query parameters into the URL
//! - Keep the header table in sync with headers added by the body editor
//! - Send the request and read the outcome
//! - Display the response through a `ResponseView`
//!
//! Run with: `cargo run --example compose_and_send`

use reqform::{
    BodyEditor, BodyMode, Dispatcher, Error, HeaderEditor, Method, QueryParamEditor,
    RequestModel, ResponseView, RowField,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("reqform=debug,compose_and_send=info")
        .init();

    let mut model = RequestModel::new();
    let mut changes = model.subscribe();

    model.set_method(Method::Post);
    model.set_url("https://httpbin.org/anything");

    println!("=== Query Parameters ===");
    let mut params = QueryParamEditor::new();
    params.set_field(&mut model, 0, RowField::Key, "search")?;
    params.set_field(&mut model, 0, RowField::Value, "rust & http")?;
    params.add_row(&mut model);
    params.set_field(&mut model, 1, RowField::Key, "page")?;
    params.set_field(&mut model, 1, RowField::Value, "2")?;
    println!("URL: {}", model.url());

    println!("=== Headers ===");
    let mut headers = HeaderEditor::new(&model);
    headers.set_field(&mut model, 0, RowField::Key, "Accept")?;
    headers.set_field(&mut model, 0, RowField::Value, "application/json")?;

    println!("=== Body ===");
    let mut body = BodyEditor::new();
    body.set_mode(BodyMode::UrlEncoded);
    body.set_field(&mut model, 0, RowField::Key, "name")?;
    body.set_field(&mut model, 0, RowField::Value, "Ada Lovelace")?;
    println!("Body: {}", model.body());

    if headers.sync_inbound(&model) {
        println!("Header table refreshed:");
    }
    for row in headers.rows() {
        println!("  {}: {}", row.key, row.value);
    }

    let revision = *changes.borrow_and_update();
    println!("Revision before send: {:?}", revision);

    println!();
    println!("=== Sending ===");
    let dispatcher = Dispatcher::builder()
        .timeout(Duration::from_secs(30))
        .default_header("User-Agent", "reqform-demo/0.1")?
        .build()?;

    let model = model.into_shared();
    let outcome = dispatcher.send(&model).await?;
    println!("Outcome: {:?}", outcome);

    let model = model.lock().unwrap();
    let view = ResponseView::new(model.response());

    println!();
    println!("=== Response ===");
    println!("Status: {} ({})", view.status_line(), view.status_class().label());
    println!("Size: {}", view.size_kb());
    println!("Type: {}", view.content_type().unwrap_or("-"));
    println!("Time: {:?}", view.elapsed());
    for line in view.header_lines() {
        println!("  {}: {}", line.name, line.value);
    }
    println!();
    println!("{}", view.body_text());

    Ok(())
}
