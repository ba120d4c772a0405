// Endpoint table: one row per proxied route

use axum::http::{Method, StatusCode};
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::proxy::common::schema::Schema;
use crate::proxy::common::schemas;

/// Whether the session credential must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Required,
    Public,
}

/// What to do with a successful upstream reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Relay the upstream body with the endpoint's success status
    Relay,
    /// Read the token from the reply and set it as the session cookie
    IssueSession,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: &'static str,
    pub method: Method,
    /// Inbound axum route, `:param` placeholders
    pub path: &'static str,
    /// Upstream path, `{param}` placeholders
    pub upstream: &'static str,
    pub schema: Option<&'static Schema>,
    pub credential: Credential,
    /// Attach the static backend API key
    pub api_key: bool,
    /// Inbound query keys forwarded upstream
    pub query: &'static [&'static str],
    pub success: StatusCode,
    pub mode: ResponseMode,
}

impl Endpoint {
    fn new(name: &'static str, method: Method, path: &'static str, upstream: &'static str) -> Self {
        let success = if method == Method::POST {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        };
        Self {
            name,
            method,
            path,
            upstream,
            schema: None,
            credential: Credential::Required,
            api_key: false,
            query: &[],
            success,
            mode: ResponseMode::Relay,
        }
    }

    fn get(name: &'static str, path: &'static str, upstream: &'static str) -> Self {
        Self::new(name, Method::GET, path, upstream)
    }

    fn post(name: &'static str, path: &'static str, upstream: &'static str) -> Self {
        Self::new(name, Method::POST, path, upstream)
    }

    fn patch(name: &'static str, path: &'static str, upstream: &'static str) -> Self {
        Self::new(name, Method::PATCH, path, upstream)
    }

    fn delete(name: &'static str, path: &'static str, upstream: &'static str) -> Self {
        Self::new(name, Method::DELETE, path, upstream)
    }

    fn schema(mut self, schema: &'static Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn public(mut self) -> Self {
        self.credential = Credential::Public;
        self
    }

    fn api_key(mut self) -> Self {
        self.api_key = true;
        self
    }

    fn query(mut self, keys: &'static [&'static str]) -> Self {
        self.query = keys;
        self
    }

    fn status(mut self, status: StatusCode) -> Self {
        self.success = status;
        self
    }

    fn issue_session(mut self) -> Self {
        self.mode = ResponseMode::IssueSession;
        self
    }

    /// Names of the `{param}` placeholders in the upstream template
    pub fn upstream_params(&self) -> impl Iterator<Item = &'static str> {
        self.upstream
            .split('/')
            .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
    }

    /// Substitute path parameters into the upstream template.
    ///
    /// Returns the name of the first placeholder with no (or an empty) value.
    pub fn render_upstream(&self, params: &HashMap<String, String>) -> Result<Vec<String>, String> {
        self.upstream
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => params
                        .get(name)
                        .map(|v| v.trim())
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .ok_or_else(|| name.to_string()),
                    None => Ok(segment.to_string()),
                }
            })
            .collect()
    }

    /// Forwarded query pairs, in declaration order
    pub fn forwarded_query(&self, query: &HashMap<String, String>) -> Vec<(String, String)> {
        self.query
            .iter()
            .filter_map(|key| {
                query
                    .get(*key)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (key.to_string(), v.trim().to_string()))
            })
            .collect()
    }
}

const READ_FILTERS: &[&str] = &["session_id", "term_id", "class_id"];

static ENDPOINTS: Lazy<Vec<Endpoint>> = Lazy::new(|| {
    vec![
        // Auth
        Endpoint::post("login", "/api/auth/login", "/api/auth/login")
            .schema(&schemas::LOGIN)
            .public()
            .api_key()
            .status(StatusCode::OK)
            .issue_session(),
        Endpoint::get("current_user", "/api/auth/me", "/api/users/me").api_key(),
        // School
        Endpoint::post("register_school", "/api/school/register", "/api/schools/register")
            .schema(&schemas::SCHOOL_REGISTRATION)
            .public()
            .api_key(),
        Endpoint::get("get_school", "/api/school/get/:school_id", "/api/schools/{school_id}"),
        Endpoint::patch(
            "update_school",
            "/api/school/update/:school_id",
            "/api/schools/{school_id}",
        )
        .schema(&schemas::SCHOOL_UPDATE),
        // Teachers
        Endpoint::get(
            "get_teachers",
            "/api/user/get-teachers/:school_id",
            "/api/users/teachers/{school_id}",
        )
        .api_key(),
        Endpoint::post(
            "create_teacher",
            "/api/user/create-teacher/:school_id",
            "/api/users/teachers/{school_id}",
        )
        .schema(&schemas::TEACHER)
        .api_key(),
        Endpoint::patch(
            "update_teacher",
            "/api/user/update-teacher/:teacher_id",
            "/api/users/teacher/{teacher_id}",
        )
        .schema(&schemas::TEACHER_UPDATE)
        .api_key(),
        Endpoint::delete(
            "delete_teacher",
            "/api/user/delete-teacher/:teacher_id",
            "/api/users/teacher/{teacher_id}",
        )
        .api_key(),
        // Students
        Endpoint::get(
            "get_students",
            "/api/user/get-students/:school_id",
            "/api/users/students/{school_id}",
        )
        .query(READ_FILTERS)
        .api_key(),
        Endpoint::post(
            "create_student",
            "/api/user/create-student/:school_id",
            "/api/users/students/{school_id}",
        )
        .schema(&schemas::STUDENT)
        .api_key(),
        Endpoint::patch(
            "update_student",
            "/api/user/update-student/:student_id",
            "/api/users/student/{student_id}",
        )
        .schema(&schemas::STUDENT_UPDATE)
        .api_key(),
        Endpoint::delete(
            "delete_student",
            "/api/user/delete-student/:student_id",
            "/api/users/student/{student_id}",
        )
        .api_key(),
        // Sessions
        Endpoint::get(
            "get_sessions",
            "/api/session/get-sessions/:school_id",
            "/api/sessions/{school_id}",
        ),
        Endpoint::post(
            "create_session",
            "/api/session/create/:school_id",
            "/api/sessions/{school_id}",
        )
        .schema(&schemas::ACADEMIC_SESSION),
        Endpoint::patch(
            "activate_session",
            "/api/session/activate/:school_id/:session_id",
            "/api/sessions/{school_id}/{session_id}/activate",
        ),
        Endpoint::delete(
            "delete_session",
            "/api/session/delete/:session_id",
            "/api/sessions/session/{session_id}",
        ),
        // Terms
        Endpoint::get("get_terms", "/api/term/get-terms/:school_id", "/api/terms/{school_id}")
            .query(&["session_id"]),
        Endpoint::post(
            "create_term",
            "/api/term/create/:school_id/:session_id",
            "/api/terms/{school_id}/{session_id}",
        )
        .schema(&schemas::TERM),
        Endpoint::patch(
            "activate_term",
            "/api/term/activate/:school_id/:term_id",
            "/api/terms/{school_id}/{term_id}/activate",
        ),
        // Subjects
        Endpoint::get(
            "get_subjects",
            "/api/subject/get-subjects/:school_id",
            "/api/subjects/{school_id}",
        ),
        Endpoint::post(
            "create_subject",
            "/api/subject/create/:school_id",
            "/api/subjects/{school_id}",
        )
        .schema(&schemas::SUBJECT),
        Endpoint::delete(
            "delete_subject",
            "/api/subject/delete/:subject_id",
            "/api/subjects/subject/{subject_id}",
        ),
        // Classes
        Endpoint::get(
            "get_classes",
            "/api/class/get-classes/:school_id",
            "/api/classes/{school_id}",
        ),
        Endpoint::post("create_class", "/api/class/create/:school_id", "/api/classes/{school_id}")
            .schema(&schemas::CLASS),
        // Scores
        Endpoint::get(
            "get_scores",
            "/api/score/get-scores/:school_id",
            "/api/scores/{school_id}",
        )
        .query(READ_FILTERS),
        Endpoint::post("record_score", "/api/score/record/:school_id", "/api/scores/{school_id}")
            .schema(&schemas::SCORE),
        // Messages
        Endpoint::get(
            "get_messages",
            "/api/message/get-messages/:school_id",
            "/api/messages/{school_id}",
        ),
        Endpoint::post("send_message", "/api/message/send/:school_id", "/api/messages/{school_id}")
            .schema(&schemas::MESSAGE),
        // Profile: read and update live on different upstream routes
        Endpoint::get("get_profile", "/api/profile", "/api/profile"),
        Endpoint::patch(
            "update_profile",
            "/api/profile/update/:user_id",
            "/api/users/profile/{user_id}",
        )
        .schema(&schemas::PROFILE),
        // Theme
        Endpoint::get("get_theme", "/api/theme/get/:school_id", "/api/themes/{school_id}"),
        Endpoint::patch(
            "update_theme",
            "/api/theme/update/:school_id",
            "/api/themes/{school_id}",
        )
        .schema(&schemas::THEME),
        // Plans
        Endpoint::post(
            "subscribe_plan",
            "/api/plan/subscribe/:school_id",
            "/api/plans/{school_id}/subscribe",
        )
        .schema(&schemas::SUBSCRIPTION),
    ]
});

pub fn endpoints() -> &'static [Endpoint] {
    &ENDPOINTS
}

pub fn find(name: &str) -> Option<&'static Endpoint> {
    endpoints().iter().find(|e| e.name == name)
}
