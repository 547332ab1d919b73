//! # reqform - request composition state engine
//!
//! reqform keeps the editing surfaces of an HTTP request builder (URL bar,
//! query parameter table, header table, body editor) consistent with one
//! shared [`RequestModel`], sends that model with a [`Dispatcher`], and
//! projects the recorded response for display with a [`ResponseView`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use reqform::{
//!     BodyEditor, BodyMode, Dispatcher, HeaderEditor, Method, QueryParamEditor,
//!     RequestModel, ResponseView, RowField,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqform::Error> {
//!     let mut model = RequestModel::new();
//!     model.set_method(Method::Post);
//!     model.set_url("https://httpbin.org/post");
//!
//!     // Query parameters are folded into the URL as they are typed
//!     let mut params = QueryParamEditor::new();
//!     params.set_field(&mut model, 0, RowField::Key, "debug")?;
//!     params.set_field(&mut model, 0, RowField::Value, "true")?;
//!
//!     let mut headers = HeaderEditor::new(&model);
//!     headers.set_field(&mut model, 0, RowField::Key, "Accept")?;
//!     headers.set_field(&mut model, 0, RowField::Value, "application/json")?;
//!
//!     // Raw JSON adds a Content-Type header when none is set
//!     let mut body = BodyEditor::new();
//!     body.set_mode(BodyMode::Raw);
//!     body.set_raw_text(&mut model, r#"{"name":"Ada"}"#);
//!     headers.sync_inbound(&model);
//!
//!     let model = model.into_shared();
//!     let dispatcher = Dispatcher::builder().build()?;
//!     let outcome = dispatcher.send(&model).await?;
//!     println!("Outcome: {:?}", outcome);
//!
//!     let model = model.lock().unwrap();
//!     let view = ResponseView::new(model.response());
//!     println!("{} ({})", view.status_line(), view.status_class().label());
//!     println!("{}", view.body_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **One shared model** - Setters per field group, each applied in one step with a generation counter
//! - **Query parameter editor** - Enabled rows become a percent-encoded query string in the URL
//! - **Header editor** - Two-way sync that ignores its own writes instead of echoing them back
//! - **Body editor** - none, form-data, x-www-form-urlencoded, raw (JSON or text) and binary modes
//! - **Content-Type defaults** - Added for urlencoded and raw bodies, never over an existing header
//! - **Dispatcher** - Single attempt, failures recorded as `status = 0` / `"Error"`, resubmission refused while in flight
//! - **Response view** - Status category, pretty-printed JSON with raw-text fallback, size and media type
//! - **Change subscription** - `tokio::sync::watch` receiver carrying per-group generations
//! - **Automatic logging** - Structured logging with `tracing`
//!
//! ## Error Handling
//!
//! Transport failures never surface as `Err`; they are written into the model:
//!
//! ```no_run
//! use reqform::{DispatchOutcome, Dispatcher, Error, RequestModel};
//!
//! # async fn example() -> Result<(), Error> {
//! let dispatcher = Dispatcher::builder().build()?;
//! let model = RequestModel::new().into_shared();
//! model.lock().unwrap().set_url("http://unreachable.invalid/");
//!
//! match dispatcher.send(&model).await {
//!     Ok(DispatchOutcome::Success { status, status_text }) => {
//!         println!("Got {} {}", status, status_text);
//!     }
//!     Ok(DispatchOutcome::Failure { message }) => {
//!         eprintln!("Request failed: {}", message);
//!         assert_eq!(model.lock().unwrap().response().status, 0);
//!     }
//!     Err(Error::SendInProgress) => {
//!         eprintln!("Still waiting for the previous request");
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod dispatch;
mod error;
pub mod headers;
mod model;
pub mod query;
mod response;
mod rows;

pub use body::{BodyEditor, BodyMode, RawKind};
pub use dispatch::{DispatchOutcome, DispatchState, Dispatcher, DispatcherBuilder};
pub use error::{Error, Result};
pub use headers::{HeaderEditor, HeaderRow};
pub use model::{
    Headers, Method, RequestModel, RequestSnapshot, ResponseState, Revision, SharedModel,
};
pub use query::{QueryParamEditor, QueryParamRow};
pub use response::{Badge, FormattedBody, HeaderLine, ResponseView, StatusClass};
pub use rows::{KeyValueRow, RowField};
