// src/handlers/about_handlers.rs
use actix_web::{get, HttpResponse};

use crate::dtos::pages::StaticPage;
use crate::handlers::render;

#[get("/about/author/")]
pub async fn author() -> HttpResponse {
    render(
        "About the author",
        StaticPage {
            template: "about/author.html",
            title: "About the author",
        },
    )
}

#[get("/about/tech/")]
pub async fn tech() -> HttpResponse {
    render(
        "Technologies",
        StaticPage {
            template: "about/tech.html",
            title: "Technologies",
        },
    )
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::test_support::{test_app, Fixture};

    #[actix_web::test]
    async fn static_pages_are_public() {
        let fx = Fixture::new();
        let app = test_app!(fx).await;

        for (uri, template) in [("/about/author/", "about/author.html"), ("/about/tech/", "about/tech.html")] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["data"]["template"], template);
        }
    }
}
