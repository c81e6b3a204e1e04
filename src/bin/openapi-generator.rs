//! Print the generated OpenAPI document as pretty JSON.

use trivia_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json().expect("serialize OpenAPI doc"));
}
