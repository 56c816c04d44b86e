//! Global request validation.
//!
//! # Responsibilities
//! - Check a JSON payload against the target shape's declared fields
//! - Run registered custom validators
//! - Convert the checked payload into the typed request (always on)
//!
//! # Design Decisions
//! - One fixed policy for the whole application
//! - All problems are reported at once, not just the first
//! - Rejections never touch process state; validation failures are a 400,
//!   unreadable bodies keep the JSON extractor's status

use std::sync::Arc;

use axum::extract::{FromRef, FromRequest, Request};
use axum::Json;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::validation::registry::ValidatorRegistry;
use crate::validation::shape::RequestShape;

/// Policy knobs of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Only declared fields are kept.
    pub whitelist: bool,
    /// Undeclared fields reject the request instead of being stripped.
    pub forbid_non_whitelisted: bool,
    /// Missing fields skip validation.
    pub skip_missing_properties: bool,
    /// Payloads that are not objects of a known shape are rejected.
    pub forbid_unknown_values: bool,
}

impl ValidationPolicy {
    /// The policy every application instance installs.
    pub const STRICT: Self = Self {
        whitelist: true,
        forbid_non_whitelisted: true,
        skip_missing_properties: false,
        forbid_unknown_values: true,
    };
}

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRejection {
    pub target: &'static str,
    pub details: Vec<String>,
}

/// The globally installed validation pipeline.
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    policy: ValidationPolicy,
    registry: Arc<ValidatorRegistry>,
}

impl ValidationPipeline {
    pub fn new(policy: ValidationPolicy, registry: ValidatorRegistry) -> Self {
        Self {
            policy,
            registry: Arc::new(registry),
        }
    }

    /// Validate `payload` against `T` and convert it.
    pub fn validate<T: RequestShape>(&self, payload: Value) -> Result<T, ValidationRejection> {
        let reject = |details: Vec<String>| ValidationRejection {
            target: T::NAME,
            details,
        };

        let mut object = match payload {
            Value::Object(object) => object,
            other if self.policy.forbid_unknown_values => {
                return Err(reject(vec![format!(
                    "an unknown value was passed to the validate function: expected object, got {}",
                    json_type(&other)
                )]));
            }
            _ => Map::new(),
        };

        let mut details = Vec::new();

        if self.policy.whitelist {
            let undeclared: Vec<String> = object
                .keys()
                .filter(|key| T::field(key).is_none())
                .cloned()
                .collect();
            for key in undeclared {
                if self.policy.forbid_non_whitelisted {
                    details.push(format!("property {key} should not exist"));
                } else {
                    object.remove(&key);
                }
            }
        }

        for spec in T::FIELDS {
            let value = match object.get(spec.name) {
                None | Some(Value::Null) if spec.required && !self.policy.skip_missing_properties => {
                    details.push(format!("{} should not be null or undefined", spec.name));
                    continue;
                }
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            if !spec.kind.matches(value) {
                details.push(format!("{} must be a {}", spec.name, spec.kind.as_str()));
                continue;
            }

            if let Some(rule) = spec.rule {
                let Some(resolution) = self.registry.resolve(rule) else {
                    tracing::warn!(
                        rule,
                        shape = T::NAME,
                        field = spec.name,
                        "No validator registered for rule"
                    );
                    details.push(format!(
                        "{} cannot be validated: no validator registered for rule {rule}",
                        spec.name
                    ));
                    continue;
                };
                tracing::trace!(rule, builtin = resolution.is_builtin(), "Rule resolved");
                if let Err(reason) = resolution.validator().validate(spec.name, value) {
                    details.push(reason);
                }
            }
        }

        if !details.is_empty() {
            return Err(reject(details));
        }

        serde_json::from_value(Value::Object(object))
            .map_err(|e| reject(vec![format!("payload could not be converted: {e}")]))
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::new(ValidationPolicy::STRICT, ValidatorRegistry::new())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extractor that runs the installed pipeline on a JSON body.
///
/// The handler only runs when the payload passed validation.
#[derive(Debug, Clone)]
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    T: RequestShape,
    Arc<ValidationPipeline>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let pipeline = Arc::<ValidationPipeline>::from_ref(state);

        let Json(payload) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::malformed(T::NAME, rejection.status(), rejection.body_text())
            })?;

        pipeline.validate::<T>(payload).map(Valid).map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::shape::{FieldKind, FieldSpec};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Signup {
        name: String,
        email: String,
        age: Option<u32>,
    }

    impl RequestShape for Signup {
        const NAME: &'static str = "Signup";
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::required("name", FieldKind::String).with_rule("non_empty"),
            FieldSpec::required("email", FieldKind::String).with_rule("email"),
            FieldSpec::optional("age", FieldKind::Integer).with_rule("positive"),
        ];
    }

    #[derive(Debug, Deserialize)]
    struct Tagged {
        #[allow(dead_code)]
        tag: String,
    }

    impl RequestShape for Tagged {
        const NAME: &'static str = "Tagged";
        const FIELDS: &'static [FieldSpec] =
            &[FieldSpec::required("tag", FieldKind::String).with_rule("unregistered")];
    }

    fn pipeline() -> ValidationPipeline {
        ValidationPipeline::default()
    }

    #[test]
    fn accepts_and_transforms_valid_payload() {
        let signup: Signup = pipeline()
            .validate(json!({"name": "Ada", "email": "ada@example.com", "age": 36}))
            .unwrap();
        assert_eq!(
            signup,
            Signup {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                age: Some(36)
            }
        );
    }

    #[test]
    fn rejects_undeclared_fields() {
        let err = pipeline()
            .validate::<Signup>(json!({"name": "Ada", "email": "ada@example.com", "admin": true}))
            .unwrap_err();
        assert_eq!(err.target, "Signup");
        assert_eq!(err.details, vec!["property admin should not exist"]);
    }

    #[test]
    fn rejects_missing_required_even_when_optional_fields_are_fine() {
        let err = pipeline()
            .validate::<Signup>(json!({"name": "Ada", "age": 36}))
            .unwrap_err();
        assert_eq!(err.details, vec!["email should not be null or undefined"]);
    }

    #[test]
    fn rejects_non_object_payloads() {
        for payload in [json!([1, 2]), json!("text"), json!(null), json!(7)] {
            assert!(pipeline().validate::<Signup>(payload).is_err());
        }
    }

    #[test]
    fn reports_every_problem() {
        let err = pipeline()
            .validate::<Signup>(json!({"name": "", "email": 5, "age": -1, "x": 1}))
            .unwrap_err();
        assert_eq!(
            err.details,
            vec![
                "property x should not exist",
                "name should not be empty",
                "email must be a string",
                "age must be a positive number",
            ]
        );
    }

    #[test]
    fn optional_null_is_absent() {
        let signup: Signup = pipeline()
            .validate(json!({"name": "Ada", "email": "ada@example.com", "age": null}))
            .unwrap();
        assert_eq!(signup.age, None);
    }

    #[test]
    fn unknown_rule_rejects_the_field() {
        let err = pipeline().validate::<Tagged>(json!({"tag": "ok"})).unwrap_err();
        assert_eq!(
            err.details,
            vec!["tag cannot be validated: no validator registered for rule unregistered"]
        );

        let err = pipeline().validate::<Tagged>(json!({"tag": 1})).unwrap_err();
        assert_eq!(err.details, vec!["tag must be a string"]);
    }

    #[derive(Debug, Deserialize)]
    struct Contact {
        #[allow(dead_code)]
        email: String,
    }

    impl RequestShape for Contact {
        const NAME: &'static str = "Contact";
        const FIELDS: &'static [FieldSpec] =
            &[FieldSpec::required("email", FieldKind::String).with_rule("emial")];
    }

    #[test]
    fn misspelled_rule_never_accepts() {
        let result = pipeline().validate::<Contact>(json!({"email": "definitely not an email"}));
        assert!(result.is_err());
    }

    #[test]
    fn registered_rule_runs() {
        let registry = ValidatorRegistry::new().register("emial", |field: &str, value: &Value| {
            match value.as_str() {
                Some(s) if s.contains('@') => Ok(()),
                _ => Err(format!("{field} must contain @")),
            }
        });
        let pipeline = ValidationPipeline::new(ValidationPolicy::STRICT, registry);

        assert!(pipeline.validate::<Contact>(json!({"email": "a@b"})).is_ok());
        let err = pipeline.validate::<Contact>(json!({"email": "ab"})).unwrap_err();
        assert_eq!(err.details, vec!["email must contain @"]);
    }

    #[tokio::test]
    async fn extractor_keeps_rejection_status() {
        use axum::body::Body;
        use axum::http::StatusCode;
        use axum::routing::post;
        use tower::ServiceExt;

        let app = axum::Router::new()
            .route("/", post(|Valid(_signup): Valid<Signup>| async { StatusCode::CREATED }))
            .with_state(Arc::new(pipeline()));

        let untyped = axum::http::Request::post("/")
            .body(Body::from(r#"{"name":"Ada","email":"ada@example.com"}"#))
            .unwrap();
        let response = app.clone().oneshot(untyped).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let broken = axum::http::Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();
        let response = app.oneshot(broken).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
