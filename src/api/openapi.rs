use super::handlers::{
    auth::{gate, session, sign_in},
    health, notes,
};
use axum::middleware;
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // Everything under /notes sits behind the session gate.
    let notes_router = OpenApiRouter::new()
        .routes(routes!(notes::list_notes, notes::create_note))
        .routes(routes!(
            notes::get_note,
            notes::update_note,
            notes::delete_note
        ))
        .route_layer(middleware::from_fn(gate::require_session));

    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(sign_in::sign_in))
        .routes(routes!(session::sign_out))
        .routes(routes!(session::session))
        .merge(notes_router);

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Passwordless sign-in and sessions".to_string());

    let mut notes_tag = Tag::new("notes");
    notes_tag.description = Some("Notes owned by the signed-in persona".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service and storage health".to_string());

    router.get_openapi_mut().tags = Some(vec![auth_tag, notes_tag, health_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(non_empty(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    // First listed author is the API contact.
    info.contact = env!("CARGO_PKG_AUTHORS")
        .split(';')
        .find_map(|author| Author::parse(author).map(Author::into_contact));
    info.license = non_empty(env!("CARGO_PKG_LICENSE")).map(|spdx| {
        let mut license = License::new(spdx);
        license.identifier = Some(spdx.to_string());
        license
    });

    OpenApiBuilder::new().info(info).build()
}

/// A Cargo author entry: `Name <email>`, `Name` or `<email>`.
#[derive(Debug, PartialEq, Eq)]
struct Author<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
}

impl<'a> Author<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let (name, email) = match raw.split_once('<') {
            Some((name, rest)) => (name, non_empty(rest.trim_end().trim_end_matches('>'))),
            None => (raw, None),
        };
        let author = Self {
            name: non_empty(name),
            email,
        };
        (author.name.is_some() || author.email.is_some()).then_some(author)
    }

    fn into_contact(self) -> Contact {
        let mut contact = Contact::new();
        contact.name = self.name.map(str::to_string);
        contact.email = self.email.map(str::to_string);
        contact
    }
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Passnote"));
            assert_eq!(contact.email.as_deref(), Some("team@passnote.dev"));
        }

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "notes"));
        for path in ["/sign-in", "/sign-out", "/session", "/notes", "/notes/{id}", "/health"] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn author_entries() {
        assert_eq!(
            Author::parse("Jane <jane@example.com>"),
            Some(Author {
                name: Some("Jane"),
                email: Some("jane@example.com"),
            })
        );
        assert_eq!(
            Author::parse(" Jane "),
            Some(Author {
                name: Some("Jane"),
                email: None,
            })
        );
        assert_eq!(
            Author::parse("<jane@example.com>"),
            Some(Author {
                name: None,
                email: Some("jane@example.com"),
            })
        );
        assert_eq!(Author::parse("  "), None);
        assert_eq!(Author::parse("<>"), None);
    }
}
